/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
#[derive(Debug)]
pub enum Error {
    ManifestError(String),
    RouteError { line: usize, message: String },
    InvalidImplicitParameter {
        operation: String,
        parameter: String,
        message: String,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::ManifestError(msg) => write!(f, "invalid annotation manifest: {}", msg),
            Error::RouteError { line, message } => {
                write!(f, "invalid route at line {}: {}", line, message)
            }
            Error::InvalidImplicitParameter {
                operation,
                parameter,
                message,
            } => write!(
                f,
                "implicit parameter '{}' of operation '{}' cannot be described: {}",
                parameter, operation, message
            ),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::ManifestError(err.to_string())
    }
}
