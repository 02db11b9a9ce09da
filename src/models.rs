use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Invalid feed document: {0}")]
    InvalidInput(String),
}

/// One entry of the page feed. Only `message` is read; everything else the
/// Graph API sends along (id, created_time, ...) is kept but ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default, deserialize_with = "text_or_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Post {
    #[cfg(test)]
    pub fn new(message: &str) -> Self {
        Self {
            message: Some(message.to_string()),
            extra: Map::new(),
        }
    }

    pub fn without_message() -> Self {
        Self {
            message: None,
            extra: Map::new(),
        }
    }
}

// A message that is null, a number or an object carries no date token, so it
// is dropped here instead of failing the whole document.
fn text_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

/// The posts returned by a single fetch, in the order the source delivered them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedDocument {
    pub data: Vec<Post>,
}

impl FeedDocument {
    #[cfg(test)]
    pub fn new(data: Vec<Post>) -> Self {
        Self { data }
    }

    /// Decode a parsed JSON body. The top-level `data` field must be an array.
    pub fn from_value(value: Value) -> Result<Self, FeedError> {
        let Value::Object(mut root) = value else {
            return Err(FeedError::InvalidInput("expected a JSON object".to_string()));
        };

        match root.remove("data") {
            Some(Value::Array(items)) => {
                let data = items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(_) => serde_json::from_value(item).unwrap_or_else(|e| {
                            debug!("Dropping undecodable post fields: {}", e);
                            Post::without_message()
                        }),
                        other => {
                            debug!("Feed entry is {}, not a post", kind_of(&other));
                            Post::without_message()
                        }
                    })
                    .collect();
                Ok(Self { data })
            }
            Some(other) => Err(FeedError::InvalidInput(format!(
                "`data` must be an array, got {}",
                kind_of(&other)
            ))),
            None => Err(FeedError::InvalidInput("missing `data` field".to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_graph_feed_shape() {
        let doc = FeedDocument::from_value(json!({
            "data": [
                { "message": "MON 5/30 taro and thai tea", "created_time": "2016-05-29T18:00:00+0000", "id": "1_2" },
                { "story": "Drive Through Boba updated their cover photo.", "id": "1_3" }
            ],
            "paging": { "next": "https://graph.facebook.com/..." }
        }))
        .unwrap();

        assert_eq!(doc.data.len(), 2);
        assert_eq!(doc.data[0].message.as_deref(), Some("MON 5/30 taro and thai tea"));
        assert_eq!(doc.data[0].extra["id"], json!("1_2"));
        assert_eq!(doc.data[1].message, None);
    }

    #[test]
    fn non_text_message_becomes_none() {
        let doc = FeedDocument::from_value(json!({
            "data": [ { "message": 42 }, { "message": null }, "not an object" ]
        }))
        .unwrap();

        assert_eq!(doc.data.len(), 3);
        assert!(doc.data.iter().all(|p| p.message.is_none()));
    }

    #[test]
    fn missing_data_is_invalid_input() {
        let err = FeedDocument::from_value(json!({ "error": { "code": 190 } })).unwrap_err();
        assert!(matches!(err, FeedError::InvalidInput(ref m) if m.contains("missing")));
    }

    #[test]
    fn non_array_data_is_invalid_input() {
        let err = FeedDocument::from_value(json!({ "data": { "message": "x" } })).unwrap_err();
        assert!(matches!(err, FeedError::InvalidInput(ref m) if m.contains("an object")));

        let err = FeedDocument::from_value(json!([])).unwrap_err();
        assert!(matches!(err, FeedError::InvalidInput(_)));
    }

    #[test]
    fn non_object_entry_becomes_post_without_message() {
        let doc = FeedDocument::from_value(json!({ "data": [ ["SAT 6/20"], "SAT 6/20", 7 ] })).unwrap();

        assert_eq!(doc.data.len(), 3);
        assert!(doc.data.iter().all(|p| *p == Post::without_message()));
    }

    #[test]
    fn empty_feed() {
        let doc = FeedDocument::from_value(json!({ "data": [] })).unwrap();
        assert!(doc.is_empty());
    }
}
