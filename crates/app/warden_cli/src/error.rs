use thiserror::Error;
use warden_core::auth::AuthError;
use warden_core::auth::jwt::DecodeError;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("IO::{:?}: {}", .0, .0)]
    Io(#[from] std::io::Error),

    #[error("Json::{}", .0)]
    Json(#[from] serde_json::Error),

    #[error("FlexiLogger::{:?}: {}", .0, .0)]
    FlexiLogger(#[from] flexi_logger::FlexiLoggerError),

    #[error("Auth::{}", .0)]
    Auth(#[from] AuthError),

    #[error("token rejected: {}", .0)]
    Token(#[from] DecodeError),
}
