use miette::Diagnostic;
use thiserror::Error;

use crate::access::AccessError;

#[derive(Debug, Error, Diagnostic)]
pub enum AppError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(course_access::app::io))]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    #[diagnostic(
        code(course_access::app::config),
        help("Check config.toml and any COURSE_ACCESS__* environment variables")
    )]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(course_access::app::serde))]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Access(#[from] AccessError),
}
