use thiserror::Error;

/// Main error type for container lifecycle operations
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid container name '{name}': {reason}")]
    InvalidContainerName { name: String, reason: String },

    #[error("{operation} failed: {}", describe_service_failure(.status, .code, .message))]
    ServiceError {
        operation: String,
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    #[error("No deleted version found for container '{name}'")]
    DeletedVersionNotFound { name: String },

    #[error("Azure API error: {0}")]
    AzureApiError(String),

    #[error("Request signing error: {0}")]
    SigningError(String),

    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::DeError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl LifecycleError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_container_name<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Self::InvalidContainerName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn service<O: Into<String>, M: Into<String>>(
        operation: O,
        status: Option<u16>,
        code: Option<String>,
        message: M,
    ) -> Self {
        Self::ServiceError {
            operation: operation.into(),
            status,
            code,
            message: message.into(),
        }
    }

    pub fn deleted_version_not_found<S: Into<String>>(name: S) -> Self {
        Self::DeletedVersionNotFound { name: name.into() }
    }

    pub fn azure_api<S: Into<String>>(msg: S) -> Self {
        Self::AzureApiError(msg.into())
    }

    pub fn signing<S: Into<String>>(msg: S) -> Self {
        Self::SigningError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Service error code, if this error came back from the storage service
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::ServiceError { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

fn describe_service_failure(status: &Option<u16>, code: &Option<String>, message: &str) -> String {
    match (status, code) {
        (Some(status), Some(code)) => format!("HTTP {status} ({code}) {message}"),
        (Some(status), None) => format!("HTTP {status} {message}"),
        (None, Some(code)) => format!("{code} {message}"),
        (None, None) => message.to_string(),
    }
    .trim_end()
    .to_string()
}

/// Result type alias for container lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Convert Azure Core errors, keeping the HTTP status and service error code when present
impl From<azure_core::Error> for LifecycleError {
    fn from(error: azure_core::Error) -> Self {
        match error.as_http_error() {
            Some(http_error) => Self::ServiceError {
                operation: "Azure request".to_string(),
                status: Some(u16::from(http_error.status())),
                code: http_error.error_code().map(str::to_string),
                message: error.to_string(),
            },
            None => Self::AzureApiError(error.to_string()),
        }
    }
}
