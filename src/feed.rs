use std::future::Future;
use std::path::PathBuf;

use log::{debug, info, warn};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;

use crate::config::FeedConfig;
use crate::models::{FeedDocument, FeedError};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Non-success response: {0}")]
    Status(StatusCode),

    #[error("Response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("Failed to read feed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid feed endpoint: {0}")]
    Endpoint(String),
}

/// Anything that can hand over one page of posts.
pub trait FeedSource {
    fn fetch(&self) -> impl Future<Output = Result<FeedDocument, FetchError>> + Send;
}

fn decode(body: &str) -> Result<FeedDocument, FetchError> {
    let value: Value = serde_json::from_str(body)?;
    Ok(FeedDocument::from_value(value)?)
}

/// Page feed from the Graph API. One GET, first page only.
pub struct GraphFeed {
    client: Client,
    config: FeedConfig,
}

impl GraphFeed {
    pub fn new(config: FeedConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: FeedConfig) -> Self {
        Self { client, config }
    }

    pub fn endpoint(&self) -> Result<Url, FetchError> {
        let base = self.config.base_url.trim_end_matches('/');
        let raw = format!("{}/{}/{}/feed", base, self.config.api_version, self.config.page_id);
        let mut url = Url::parse(&raw).map_err(|e| FetchError::Endpoint(format!("{}: {}", raw, e)))?;
        if let Some(token) = &self.config.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }
        Ok(url)
    }
}

impl FeedSource for GraphFeed {
    async fn fetch(&self) -> Result<FeedDocument, FetchError> {
        let url = self.endpoint()?;
        let mut shown = url.clone();
        shown.set_query(None);
        info!("Fetching feed: {}", shown);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!("Status code: {}", status);
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        let doc = decode(&body)?;
        if doc.is_empty() {
            warn!("Feed returned no posts");
        } else {
            info!("Fetched {} posts", doc.data.len());
        }
        Ok(doc)
    }
}

/// A feed saved to disk in the Graph API shape.
pub struct FileFeed {
    path: PathBuf,
}

impl FileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FeedSource for FileFeed {
    async fn fetch(&self) -> Result<FeedDocument, FetchError> {
        info!("Reading feed file: {}", self.path.display());
        let body = tokio::fs::read_to_string(&self.path).await?;
        decode(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::io::Write;
    use tokio::net::TcpListener;

    const FEED_PATH: &str = "/v2.6/drivethruboba/feed";

    fn graph(base_url: String) -> GraphFeed {
        let client = Client::builder().no_proxy().build().unwrap();
        GraphFeed::with_client(client, FeedConfig {
            base_url,
            access_token: Some("app|secret".to_string()),
            ..FeedConfig::default()
        })
    }

    /// Mock of the page feed endpoint that only answers when the token is sent.
    async fn mock_feed(server: &mut Server, status: usize, body: &str) -> mockito::Mock {
        server
            .mock("GET", FEED_PATH)
            .match_query(Matcher::UrlEncoded("access_token".to_string(), "app|secret".to_string()))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    #[test]
    fn endpoint_includes_version_page_and_token() {
        let feed = graph("https://graph.facebook.com/".to_string());
        let url = feed.endpoint().unwrap();
        assert_eq!(url.path(), "/v2.6/drivethruboba/feed");
        assert_eq!(
            url.query_pairs().find(|(k, _)| k == "access_token").map(|(_, v)| v.into_owned()),
            Some("app|secret".to_string())
        );
    }

    #[test]
    fn endpoint_without_token_has_no_query() {
        let feed = GraphFeed::new(FeedConfig::default());
        assert!(feed.endpoint().unwrap().query().is_none());
    }

    #[test]
    fn bad_base_url_is_an_endpoint_error() {
        let feed = graph("not a url".to_string());
        assert!(matches!(feed.endpoint(), Err(FetchError::Endpoint(_))));
    }

    #[tokio::test]
    async fn fetches_and_decodes_posts() {
        let mut server = Server::new_async().await;
        let mock = mock_feed(&mut server, 200, r#"{"data":[{"message":"MON 5/30 taro","id":"1"}]}"#).await;

        let doc = graph(server.url()).fetch().await.unwrap();

        mock.assert_async().await;
        assert_eq!(doc.data.len(), 1);
        assert_eq!(doc.data[0].message.as_deref(), Some("MON 5/30 taro"));
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let mut server = Server::new_async().await;
        let mock = mock_feed(&mut server, 400, r#"{"error":{"message":"Invalid OAuth access token."}}"#).await;

        let err = graph(server.url()).fetch().await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, FetchError::Status(code) if code == StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn non_json_body_is_a_parse_error() {
        let mut server = Server::new_async().await;
        let mock = mock_feed(&mut server, 200, "<html>oops</html>").await;

        let err = graph(server.url()).fetch().await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn missing_data_is_a_feed_error() {
        let mut server = Server::new_async().await;
        let mock = mock_feed(&mut server, 200, r#"{"paging":{}}"#).await;

        let err = graph(server.url()).fetch().await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, FetchError::Feed(FeedError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = graph(format!("http://{}", addr)).fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn reads_feed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"data":[{{"message":"WED 6/1 special"}},{{"story":"photo"}}]}}"#).unwrap();
        let doc = FileFeed::new(file.path()).fetch().await.unwrap();
        assert_eq!(doc.data.len(), 2);
        assert_eq!(doc.data[1].message, None);
    }

    #[tokio::test]
    async fn missing_feed_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileFeed::new(dir.path().join("feed.json")).fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
    }
}
