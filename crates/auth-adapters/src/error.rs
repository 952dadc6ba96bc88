use domains::DomainError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no credentials supplied")]
    MissingCredentials,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("unknown role `{0}`")]
    UnknownRole(String),
}

impl From<AuthError> for DomainError {
    fn from(err: AuthError) -> Self {
        DomainError::Unauthorized(err.to_string())
    }
}
