use thiserror::Error;

use crate::notice::Severity;
use crate::passage::PassageId;

#[derive(Error, Debug)]
pub enum SinalizaError {
    #[error("Passage service unreachable: {0}")]
    NetworkUnavailable(String),

    #[error("Passage service timed out: {0}")]
    Timeout(String),

    #[error("Passage service error: {status} {text}")]
    Service { status: u16, text: String },

    #[error("Malformed service response: {0}")]
    MalformedResponse(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Search superseded by a newer request")]
    Superseded,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Rejections raised before any remote call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field '{0}' is empty")]
    MissingField(&'static str),

    #[error("'{0}' is not a well-formed URL")]
    InvalidVideoUrl(String),

    #[error("no passage loaded")]
    NoPassageLoaded,

    #[error("passage {0} has already been translated")]
    AlreadyTranslated(PassageId),

    #[error("'{0}' is not a valid site URL")]
    InvalidSiteUrl(String),

    #[error("a submission is already in progress")]
    SubmissionInProgress,
}

impl SinalizaError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Validation(_) => Severity::Warning,
            Self::Superseded => Severity::Info,
            _ => Severity::Error,
        }
    }

    /// Message shown to the interpreter, one per failure kind.
    pub fn user_message(&self) -> String {
        match self {
            Self::NetworkUnavailable(_) => {
                "Could not connect to the server. Check that the passage service is running.".to_string()
            }
            Self::Timeout(_) => "The server took too long to respond. Try again.".to_string(),
            Self::Service { status, text } => format!("Server error: {} {}", status, text),
            Self::MalformedResponse(_) => "The service returned an unexpected data format.".to_string(),
            Self::Validation(ValidationError::MissingField(_)) => {
                "Please fill in all required fields.".to_string()
            }
            Self::Validation(ValidationError::NoPassageLoaded) => {
                "No passage available for registration.".to_string()
            }
            Self::Validation(ValidationError::InvalidSiteUrl(_)) => "Please enter a valid URL.".to_string(),
            Self::Validation(ValidationError::SubmissionInProgress) => {
                "Wait for the current submission to finish.".to_string()
            }
            Self::Validation(other) => format!("Invalid input: {}", other),
            Self::Superseded => "A newer search replaced this one.".to_string(),
            Self::Config(_) => self.to_string(),
        }
    }

    /// Classify a failure to get any HTTP response at all.
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_builder() {
            Self::Config(format!("Invalid service request: {}", e))
        } else {
            Self::NetworkUnavailable(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, SinalizaError>;
