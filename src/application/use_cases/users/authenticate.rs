use crate::application::ports::user_repository::UserRepository;
use crate::application::services::credentials;
use crate::application::use_cases::users::error::{CredentialFailure, UserDirectoryError, storage};
use crate::domain::users::user::User;

pub struct Authenticate<'a, U: UserRepository + ?Sized> {
    pub users: &'a U,
}

impl<'a, U: UserRepository + ?Sized> Authenticate<'a, U> {
    /// Unknown email, wrong password and frozen account all produce the same
    /// `InvalidCredentials` error after the same argon2 work; only the
    /// payload and the log line differ.
    pub async fn execute(&self, email: &str, password: &str) -> Result<User, UserDirectoryError> {
        let Some(credential) = self
            .users
            .find_credential_by_email(email)
            .await
            .map_err(storage)?
        else {
            credentials::verify_against_placeholder(password);
            return Err(refuse(None, CredentialFailure::UnknownEmail));
        };

        let matches = credentials::verify_password(password, &credential.password_hash)
            .map_err(UserDirectoryError::Credential)?;
        if !matches {
            return Err(refuse(
                Some(&credential.user),
                CredentialFailure::PasswordMismatch,
            ));
        }
        if credential.user.frozen {
            return Err(refuse(
                Some(&credential.user),
                CredentialFailure::AccountFrozen,
            ));
        }
        Ok(credential.user)
    }
}

fn refuse(user: Option<&User>, failure: CredentialFailure) -> UserDirectoryError {
    match user {
        Some(user) => tracing::info!(
            user_id = %user.id,
            reason = failure.as_str(),
            "authentication_refused"
        ),
        None => tracing::info!(reason = failure.as_str(), "authentication_refused"),
    }
    UserDirectoryError::InvalidCredentials(failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::credentials::verifications;
    use crate::application::test_support::Fixture;

    #[tokio::test]
    async fn correct_password_returns_user() {
        let fx = Fixture::new();
        let bob = fx.seed_user("bob@example.com", "Bob", "Stone").await;

        let user = Authenticate { users: &fx.users }
            .execute("bob@example.com", "password")
            .await
            .unwrap();
        assert_eq!(user, bob);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let fx = Fixture::new();
        fx.seed_user("bob@example.com", "Bob", "Stone").await;
        let uc = Authenticate { users: &fx.users };

        let wrong_password = uc
            .execute("bob@example.com", "guess")
            .await
            .unwrap_err();
        let unknown_email = uc
            .execute("nobody@example.com", "password")
            .await
            .unwrap_err();

        assert!(matches!(
            wrong_password,
            UserDirectoryError::InvalidCredentials(CredentialFailure::PasswordMismatch)
        ));
        assert!(matches!(
            unknown_email,
            UserDirectoryError::InvalidCredentials(CredentialFailure::UnknownEmail)
        ));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn unknown_email_runs_the_same_verification_as_wrong_password() {
        let fx = Fixture::new();
        fx.seed_user("bob@example.com", "Bob", "Stone").await;
        let uc = Authenticate { users: &fx.users };

        let before = verifications();
        uc.execute("nobody@example.com", "password")
            .await
            .unwrap_err();
        let after_unknown = verifications();
        uc.execute("bob@example.com", "guess").await.unwrap_err();
        let after_mismatch = verifications();

        assert_eq!(after_unknown - before, 1);
        assert_eq!(after_mismatch - after_unknown, 1);
    }

    #[tokio::test]
    async fn frozen_account_is_refused_like_a_wrong_password() {
        use crate::application::use_cases::users::freeze::SetFrozen;

        let fx = Fixture::new();
        fx.seed_user("bob@example.com", "Bob", "Stone").await;
        SetFrozen { users: &fx.users }
            .freeze("bob@example.com")
            .await
            .unwrap();
        let uc = Authenticate { users: &fx.users };

        let frozen = uc
            .execute("bob@example.com", "password")
            .await
            .unwrap_err();
        let mismatch = uc.execute("bob@example.com", "guess").await.unwrap_err();

        assert!(matches!(
            frozen,
            UserDirectoryError::InvalidCredentials(CredentialFailure::AccountFrozen)
        ));
        assert_eq!(frozen.to_string(), mismatch.to_string());
    }
}
