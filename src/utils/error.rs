use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    TemplateError(#[from] tera::Error),

    #[error("Template '{name}' is not registered in the resolver")]
    TemplateNotFound { name: String },

    #[error("No rendering strategy selected a renderer")]
    NoRenderer,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Cannot assemble route '{route}': {reason}")]
    RouteAssemblyError { route: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Rendering,
    Input,
    System,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::ConfigError { .. }
            | AppError::ConfigValidationError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::MissingConfigError { .. } => ErrorCategory::Configuration,
            AppError::TemplateError(_)
            | AppError::TemplateNotFound { .. }
            | AppError::NoRenderer
            | AppError::SerializationError(_) => ErrorCategory::Rendering,
            AppError::InvalidInput { .. } | AppError::RouteAssemblyError { .. } => {
                ErrorCategory::Input
            }
            AppError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Rendering => format!("The page could not be rendered: {}", self),
            ErrorCategory::Input => format!("Invalid input: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
