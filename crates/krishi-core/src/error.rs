use thiserror::Error;

/// Everything that can go wrong between a user action and a displayable result.
///
/// Every variant carries a message that is already fit to show to the user.
/// Screens convert these into [`crate::FetchOutcome::Error`]; they are never
/// propagated past the screen boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Missing or placeholder API key, unusable endpoint.
    #[error("{0}")]
    Configuration(String),

    /// Transport failure or a non-success status from the provider.
    #[error("{0}")]
    Network(String),

    /// The provider answered, but not in the shape we expect.
    #[error("{0}")]
    Shape(String),

    /// Input rejected before a request could be built.
    #[error("{0}")]
    Validation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Network,
    Shape,
    Validation,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Configuration(_) => ErrorKind::Configuration,
            FetchError::Network(_) => ErrorKind::Network,
            FetchError::Shape(_) => ErrorKind::Shape,
            FetchError::Validation(_) => ErrorKind::Validation,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FetchError::Configuration(m)
            | FetchError::Network(m)
            | FetchError::Shape(m)
            | FetchError::Validation(m) => m,
        }
    }

    /// Keep the kind, replace the user-facing text.
    pub fn with_message(&self, message: impl Into<String>) -> Self {
        let message = message.into();
        match self.kind() {
            ErrorKind::Configuration => FetchError::Configuration(message),
            ErrorKind::Network => FetchError::Network(message),
            ErrorKind::Shape => FetchError::Shape(message),
            ErrorKind::Validation => FetchError::Validation(message),
        }
    }
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Network => "network",
            ErrorKind::Shape => "shape",
            ErrorKind::Validation => "validation",
        }
    }
}
