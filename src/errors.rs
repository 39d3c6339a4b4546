use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to parse list data: {0}")]
    ParseError(String),

    #[error("Malformed template: {0}")]
    TemplateError(String),

    #[error("Failed to access SharePoint API: {0}")]
    ApiError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Failed to send email: {0}")]
    MailError(String),

    #[error("Failed to access file: {0}")]
    IoError(String),
}

impl From<reqwest::Error> for DigestError {
    fn from(error: reqwest::Error) -> Self {
        DigestError::HttpError(error.to_string())
    }
}

impl From<anyhow::Error> for DigestError {
    fn from(error: anyhow::Error) -> Self {
        DigestError::ApiError(error.to_string())
    }
}

impl From<std::io::Error> for DigestError {
    fn from(error: std::io::Error) -> Self {
        DigestError::IoError(error.to_string())
    }
}

impl From<url::ParseError> for DigestError {
    fn from(error: url::ParseError) -> Self {
        DigestError::ConfigError(format!("invalid URL: {error}"))
    }
}

impl From<lettre::error::Error> for DigestError {
    fn from(error: lettre::error::Error) -> Self {
        DigestError::MailError(format!("message build: {error}"))
    }
}

impl From<lettre::address::AddressError> for DigestError {
    fn from(error: lettre::address::AddressError) -> Self {
        DigestError::MailError(format!("invalid address: {error}"))
    }
}

impl From<lettre::transport::smtp::Error> for DigestError {
    fn from(error: lettre::transport::smtp::Error) -> Self {
        DigestError::MailError(format!("SMTP: {error}"))
    }
}
