//! Password login over any [`UserRepository`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{LoginService, UserPersistenceError, UserRepository};
use crate::domain::{Error, LoginCredentials, UserId};

fn map_user_persistence_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
    }
}

/// Checks credentials against stored salted digests.
#[derive(Clone)]
pub struct PasswordLoginService<R> {
    users: Arc<R>,
}

impl<R> PasswordLoginService<R> {
    pub fn new(users: Arc<R>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl<R> LoginService for PasswordLoginService<R>
where
    R: UserRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let account = self
            .users
            .find_by_username(credentials.username())
            .await
            .map_err(map_user_persistence_error)?;
        match account {
            Some(account) if account.password_digest.verify(credentials) => {
                Ok(account.user.id())
            }
            _ => {
                debug!(username = %credentials.username(), "login rejected");
                Err(Error::unauthorized("invalid credentials"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for password login.
    use super::*;
    use crate::domain::ports::{MockUserRepository, UserAccount};
    use crate::domain::{DisplayName, ErrorCode, PasswordDigest, User, Username};
    use rstest::rstest;

    fn account(username: &str, password: &str) -> UserAccount {
        let username = Username::new(username).expect("valid username");
        UserAccount {
            password_digest: PasswordDigest::derive(&username, password),
            user: User::new(
                UserId::random(),
                username,
                DisplayName::new("Test user").expect("valid display name"),
            ),
        }
    }

    #[rstest]
    #[case("s3cret", true)]
    #[case("wrong", false)]
    #[tokio::test]
    async fn checks_password_digest(#[case] password: &str, #[case] should_succeed: bool) {
        let stored = account("convenor", "s3cret");
        let expected = stored.user.id();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_username()
            .return_once(move |_| Ok(Some(stored)));
        let service = PasswordLoginService::new(Arc::new(users));
        let creds = LoginCredentials::try_from_parts("convenor", password).expect("creds");

        match service.authenticate(&creds).await {
            Ok(id) => {
                assert!(should_succeed);
                assert_eq!(id, expected);
            }
            Err(err) => {
                assert!(!should_succeed);
                assert_eq!(err.code(), ErrorCode::Unauthorized);
            }
        }
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_user_is_unauthorized() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().return_once(|_| Ok(None));
        let service = PasswordLoginService::new(Arc::new(users));
        let creds = LoginCredentials::try_from_parts("nobody", "pw").expect("creds");
        let err = service.authenticate(&creds).await.expect_err("unknown");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    #[tokio::test]
    async fn repository_outage_is_unavailable() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_username()
            .return_once(|_| Err(UserPersistenceError::connection("down")));
        let service = PasswordLoginService::new(Arc::new(users));
        let creds = LoginCredentials::try_from_parts("tutor", "pw").expect("creds");
        let err = service.authenticate(&creds).await.expect_err("outage");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
