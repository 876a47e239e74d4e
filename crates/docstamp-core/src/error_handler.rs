use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::{AppError, Severity};
use crate::ports::FeedbackPort;

const EN_MESSAGES: &str = include_str!("../resources/en.json");
const DEFAULT_MESSAGE_KEY: &str = "errors.default";

/// Flat `section.key -> message` view of a nested JSON message catalog.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    messages: HashMap<String, String>,
}

impl MessageCatalog {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let root: Value = serde_json::from_str(raw)?;
        let mut messages = HashMap::new();
        flatten_into(&mut messages, String::new(), &root);
        Ok(Self { messages })
    }

    pub fn english() -> Self {
        Self::from_json(EN_MESSAGES).unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    /// Falls back to the default error message, then to the key itself.
    pub fn translate(&self, key: &str) -> String {
        self.get(key)
            .or_else(|| self.get(DEFAULT_MESSAGE_KEY))
            .unwrap_or(key)
            .to_owned()
    }
}

fn flatten_into(out: &mut HashMap<String, String>, prefix: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten_into(out, key, v);
            }
        }
        Value::String(s) => {
            out.insert(prefix, s.clone());
        }
        _ => {}
    }
}

#[derive(Clone)]
pub struct ErrorHandler {
    feedback: Arc<dyn FeedbackPort>,
    catalog: Arc<MessageCatalog>,
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler").finish_non_exhaustive()
    }
}

impl ErrorHandler {
    pub fn new(feedback: Arc<dyn FeedbackPort>) -> Self {
        Self::with_catalog(feedback, MessageCatalog::english())
    }

    pub fn with_catalog(feedback: Arc<dyn FeedbackPort>, catalog: MessageCatalog) -> Self {
        Self {
            feedback,
            catalog: Arc::new(catalog),
        }
    }

    /// Shows the localized message for `error`, then logs it.
    pub fn process(&self, error: &AppError) {
        self.process_with_message(error, None);
    }

    pub fn process_with_message(&self, error: &AppError, message: Option<&str>) {
        let text = match message {
            Some(m) => m.to_owned(),
            None => self.message_for(error),
        };
        tracing::warn!(message = %text, "user notified");
        self.feedback.notify_error(&text);
        self.process_without_feedback(error);
    }

    pub fn process_without_feedback(&self, error: &AppError) {
        tracing::error!(error = %error, "error processed");
    }

    /// Routes by the error's own severity tag.
    pub fn report(&self, error: &AppError) {
        match error.severity() {
            Severity::Silent => self.process_without_feedback(error),
            Severity::Visible => self.process(error),
        }
    }

    pub fn message_for(&self, error: &AppError) -> String {
        self.catalog.translate(&error.message_key())
    }

    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }
}
