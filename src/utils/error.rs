use thiserror::Error;

#[derive(Error, Debug)]
pub enum EpgError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("Playlist not found: {path}")]
    PlaylistNotFound { path: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Feed error: {message}")]
    FeedError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Network,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EpgError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::PlaylistNotFound { .. } => ErrorCategory::Input,
            Self::HttpError(_) | Self::FeedError { .. } => ErrorCategory::Network,
            Self::XmlError(_) | Self::ProcessingError { .. } => {
                ErrorCategory::Data
            }
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input | ErrorCategory::Data => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::PlaylistNotFound { path } => format!(
                "Check that '{}' exists or point M3U_FILE / --playlist at the playlist",
                path
            ),
            Self::HttpError(_) => {
                "Check network connectivity and the endpoint URL, then run again".to_string()
            }
            Self::FeedError { .. } => {
                "Verify EPG_FEED_URL serves a valid XMLTV document (plain or gzip)".to_string()
            }
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => {
                "Review the CLI flags, environment variables and config file".to_string()
            }
            Self::IoError(_) => {
                "Check file permissions and free disk space for the output path".to_string()
            }
            Self::XmlError(_) | Self::ProcessingError { .. } => {
                "Run with --verbose to see which record could not be processed".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::PlaylistNotFound { path } => format!("Playlist file '{}' was not found", path),
            Self::HttpError(e) if e.is_timeout() => "The remote server timed out".to_string(),
            Self::HttpError(_) => "Could not reach the remote server".to_string(),
            Self::FeedError { message } => format!("The remote guide feed is unusable: {}", message),
            Self::IoError(e) => format!("File operation failed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EpgError>;
