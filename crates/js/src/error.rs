//! Host runtime error types

use elemental_html::HtmlError;
use thiserror::Error;

/// Host runtime error
#[derive(Debug, Error)]
pub enum HostError {
    #[error("JavaScript error: {message}")]
    Runtime {
        message: String,
        stack: Option<String>,
    },

    #[error("QuickJS error: {0}")]
    QuickJs(String),

    #[error("Markup error: {0}")]
    Markup(#[from] HtmlError),
}

impl HostError {
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
            stack: Some(stack.into()),
        }
    }
}

impl From<rquickjs::Error> for HostError {
    fn from(err: rquickjs::Error) -> Self {
        Self::QuickJs(err.to_string())
    }
}
