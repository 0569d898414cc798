use crate::error::FetchError;

/// The classified result of one fetch.
///
/// Built only by the response classifiers and catalog lookups; a screen
/// stores it unchanged inside [`crate::ViewState::Resolved`].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Success(T),
    Empty { reason: String },
    Error(FetchError),
}

impl<T> FetchOutcome<T> {
    pub fn empty(reason: impl Into<String>) -> Self {
        FetchOutcome::Empty {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FetchOutcome::Error(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            FetchOutcome::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchOutcome::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Text for the empty/error card, `None` on success.
    pub fn message(&self) -> Option<&str> {
        match self {
            FetchOutcome::Success(_) => None,
            FetchOutcome::Empty { reason } => Some(reason),
            FetchOutcome::Error(err) => Some(err.message()),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Success(value) => FetchOutcome::Success(f(value)),
            FetchOutcome::Empty { reason } => FetchOutcome::Empty { reason },
            FetchOutcome::Error(err) => FetchOutcome::Error(err),
        }
    }
}

impl<T> From<FetchError> for FetchOutcome<T> {
    fn from(err: FetchError) -> Self {
        FetchOutcome::Error(err)
    }
}
