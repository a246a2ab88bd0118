//! Error types for form-driven operations.
//!
//! There are only two interesting failure modes: the website returned an
//! error status, or the page no longer carries the form we expected. Both
//! abort the operation immediately; nothing in this crate retries.

use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A GET or POST came back with an error-indicating status.
    #[error("{method} {url} returned {status}")]
    RequestFailed {
        method: &'static str,
        url: String,
        status: StatusCode,
    },

    /// No form on the fetched page satisfied the selection predicate.
    ///
    /// This is distinct from [`Error::RequestFailed`] so callers can tell
    /// "the page changed shape" apart from "the server rejected us".
    #[error("no form matching {selector} at {url}")]
    FormNotFound { url: String, selector: String },

    /// The caller-supplied one-time-code function failed.
    #[error("one-time code generation failed")]
    OneTimeCode(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("invalid URL")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Status of the failed request, if this is a [`Error::RequestFailed`].
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
