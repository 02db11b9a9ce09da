//! Voice platform envelope and intent dispatch.
//!
//! Each request kind and each intent name maps to one handler; the handlers
//! only gather a target date and hand over to the selector.

use std::collections::HashMap;

use chrono::NaiveDate;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::Config;
use crate::feed::FeedSource;
use crate::selector::{Clock, select_posts};
use crate::speech;
use crate::token::DateTokenParser;

#[derive(Debug, Error)]
pub enum SkillError {
    #[error("Invalid application id: {0}")]
    InvalidApplicationId(String),

    #[error("Unsupported intent: {0}")]
    UnknownIntent(String),

    #[error("Unsupported request type")]
    UnknownRequest,
}

/// What the voice platform posts for every user turn.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub session: Session,
    pub request: Request,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    #[serde(default)]
    pub new: bool,
    pub application: Application,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub application_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    LaunchRequest(RequestInfo),
    IntentRequest(IntentRequest),
    SessionEndedRequest(RequestInfo),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    pub request_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    pub request_id: String,
    pub intent: Intent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Intent {
    pub name: String,
    #[serde(default)]
    pub slots: HashMap<String, Slot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Slot {
    #[serde(default)]
    pub value: Option<String>,
}

impl Intent {
    /// Slot value, treating a missing slot and an empty value alike.
    pub fn slot_value(&self, name: &str) -> Option<&str> {
        self.slots
            .get(name)
            .and_then(|slot| slot.value.as_deref())
            .filter(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentKind {
    Oneshot,
    Dialog,
    Help,
    Stop,
    Cancel,
    Other(String),
}

impl From<&str> for IntentKind {
    fn from(name: &str) -> Self {
        match name {
            "OneshotDtbIntent" => IntentKind::Oneshot,
            "DialogDtbIntent" => IntentKind::Dialog,
            "AMAZON.HelpIntent" => IntentKind::Help,
            "AMAZON.StopIntent" => IntentKind::Stop,
            "AMAZON.CancelIntent" => IntentKind::Cancel,
            other => IntentKind::Other(other.to_string()),
        }
    }
}

/// What goes back to the voice platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub version: String,
    pub session_attributes: Map<String, Value>,
    pub response: SpeechResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<OutputSpeech>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    pub should_end_session: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OutputSpeech {
    PlainText { text: String },
    #[serde(rename = "SSML")]
    Ssml { ssml: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

impl ResponseEnvelope {
    fn new(attributes: Map<String, Value>, response: SpeechResponse) -> Self {
        Self {
            version: "1.0".to_string(),
            session_attributes: attributes,
            response,
        }
    }

    /// Speak and end the session.
    pub fn tell(attributes: Map<String, Value>, speech: OutputSpeech) -> Self {
        Self::new(attributes, SpeechResponse {
            output_speech: Some(speech),
            reprompt: None,
            should_end_session: true,
        })
    }

    /// Speak and keep listening.
    pub fn ask(attributes: Map<String, Value>, speech: OutputSpeech, reprompt: OutputSpeech) -> Self {
        Self::new(attributes, SpeechResponse {
            output_speech: Some(speech),
            reprompt: Some(Reprompt { output_speech: reprompt }),
            should_end_session: false,
        })
    }

    pub fn empty() -> Self {
        Self::new(Map::new(), SpeechResponse {
            output_speech: None,
            reprompt: None,
            should_end_session: true,
        })
    }

    /// Text of the main output speech, whichever form it takes.
    pub fn speech_text(&self) -> Option<&str> {
        match self.response.output_speech.as_ref()? {
            OutputSpeech::PlainText { text } => Some(text),
            OutputSpeech::Ssml { ssml } => Some(ssml),
        }
    }
}

fn plain(text: impl Into<String>) -> OutputSpeech {
    OutputSpeech::PlainText { text: text.into() }
}

/// Request handler: one feed source, one token parser, one clock.
pub struct Skill<F: FeedSource> {
    config: Config,
    feed: F,
    parser: Box<dyn DateTokenParser + Send + Sync>,
    clock: Box<dyn Clock>,
}

impl<F: FeedSource> Skill<F> {
    pub fn new(
        config: Config,
        feed: F,
        parser: Box<dyn DateTokenParser + Send + Sync>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self { config, feed, parser, clock }
    }

    pub async fn handle(&self, envelope: RequestEnvelope) -> Result<ResponseEnvelope, SkillError> {
        let session = envelope.session;

        if let Some(expected) = &self.config.app_id {
            if session.application.application_id != *expected {
                warn!("Rejecting application id {}", session.application.application_id);
                return Err(SkillError::InvalidApplicationId(session.application.application_id));
            }
        }

        if session.new {
            info!("Session started: sessionId={}", session.session_id);
        }

        match envelope.request {
            Request::LaunchRequest(req) => {
                info!("Launch: requestId={}, sessionId={}", req.request_id, session.session_id);
                Ok(ResponseEnvelope::ask(
                    session.attributes,
                    OutputSpeech::Ssml { ssml: speech::welcome_ssml() },
                    plain(speech::welcome_reprompt()),
                ))
            }
            Request::IntentRequest(req) => {
                info!(
                    "Intent {}: requestId={}, sessionId={}",
                    req.intent.name, req.request_id, session.session_id
                );
                self.handle_intent(&req.intent, session.attributes).await
            }
            Request::SessionEndedRequest(req) => {
                info!(
                    "Session ended: requestId={}, sessionId={}, reason={}",
                    req.request_id,
                    session.session_id,
                    req.reason.as_deref().unwrap_or("none")
                );
                Ok(ResponseEnvelope::empty())
            }
            Request::Unknown => Err(SkillError::UnknownRequest),
        }
    }

    async fn handle_intent(
        &self,
        intent: &Intent,
        mut attributes: Map<String, Value>,
    ) -> Result<ResponseEnvelope, SkillError> {
        match IntentKind::from(intent.name.as_str()) {
            IntentKind::Oneshot => Ok(self.report(None, attributes).await),
            IntentKind::Dialog => match intent.slot_value("Date") {
                Some(raw) => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
                    Ok(date) => {
                        attributes.insert("date".to_string(), Value::String(date.to_string()));
                        Ok(self.report(Some(date), attributes).await)
                    }
                    Err(_) => {
                        warn!("Could not understand date slot: {}", raw);
                        Ok(ResponseEnvelope::ask(
                            attributes,
                            plain(speech::date_not_understood()),
                            plain(speech::date_not_understood_reprompt()),
                        ))
                    }
                },
                None => Ok(ResponseEnvelope::ask(
                    attributes,
                    plain(speech::WHICH_DATE),
                    plain(speech::WHICH_DATE),
                )),
            },
            IntentKind::Help => Ok(ResponseEnvelope::ask(
                attributes,
                plain(speech::help()),
                plain(speech::WHICH_DATE),
            )),
            IntentKind::Stop | IntentKind::Cancel => {
                Ok(ResponseEnvelope::tell(attributes, plain(speech::GOODBYE)))
            }
            IntentKind::Other(name) => Err(SkillError::UnknownIntent(name)),
        }
    }

    /// Fetch the feed, select, and turn the result into a spoken answer.
    pub async fn report(&self, target: Option<NaiveDate>, attributes: Map<String, Value>) -> ResponseEnvelope {
        ResponseEnvelope::tell(attributes, plain(self.answer(target).await))
    }

    pub async fn answer(&self, target: Option<NaiveDate>) -> String {
        let doc = match self.feed.fetch().await {
            Ok(doc) => doc,
            Err(e) => {
                error!("Communications error: {}", e);
                return speech::COMMS_FAILURE.to_string();
            }
        };

        let posts = select_posts(&doc, target, self.clock.today(), self.parser.as_ref());
        if posts.is_empty() {
            speech::closed(&self.config.speech.closed_message, target)
        } else {
            posts.join(" ")
        }
    }
}
