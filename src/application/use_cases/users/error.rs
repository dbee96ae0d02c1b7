use std::fmt;

use crate::application::ports::score_gateway::ScoreGatewayError;
use crate::application::ports::user_repository::UserStoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Manager,
    Title,
    Role,
    Page,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::User => "user",
            Entity::Manager => "manager",
            Entity::Title => "title",
            Entity::Role => "role",
            Entity::Page => "page",
        })
    }
}

/// Why an authentication attempt was refused. Kept for logs only: every
/// variant renders the same message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFailure {
    UnknownEmail,
    PasswordMismatch,
    AccountFrozen,
}

impl CredentialFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialFailure::UnknownEmail => "unknown_email",
            CredentialFailure::PasswordMismatch => "password_mismatch",
            CredentialFailure::AccountFrozen => "account_frozen",
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum UserDirectoryError {
    #[error("{entity} {key} not found")]
    NotFound { entity: Entity, key: String },
    #[error("user with email {0} already exists")]
    Conflict(String),
    #[error("invalid credentials")]
    InvalidCredentials(CredentialFailure),
    #[error("user store failure")]
    Storage(#[source] anyhow::Error),
    #[error("password hashing failed")]
    Credential(#[source] anyhow::Error),
    #[error(transparent)]
    Score(#[from] ScoreGatewayError),
}

impl UserDirectoryError {
    pub fn not_found(entity: Entity, key: impl fmt::Display) -> Self {
        UserDirectoryError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

impl From<UserStoreError> for UserDirectoryError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::EmailTaken(email) => UserDirectoryError::Conflict(email),
            UserStoreError::Backend(e) => UserDirectoryError::Storage(e),
        }
    }
}

pub(crate) fn storage(err: anyhow::Error) -> UserDirectoryError {
    UserDirectoryError::Storage(err)
}
