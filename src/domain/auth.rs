use crate::domain::auth::driven_ports::PasswordScheme;
use crate::domain::user::TodoUser;
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;

/// Read view of a persisted identity used during credential verification. Implemented
/// by the user entity so [verify_credentials] stays decoupled from how users are stored.
pub trait StoredCredential {
    fn username(&self) -> &str;
    fn password_hash(&self) -> &str;
}

impl StoredCredential for TodoUser {
    fn username(&self) -> &str {
        &self.username
    }

    fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

pub mod driven_ports {
    /// One-way password hashing scheme. Implementations are expected to use a
    /// deliberately slow, salted algorithm.
    pub trait PasswordScheme: Sync {
        fn hash_password(&self, plain_password: &str) -> Result<String, anyhow::Error>;
        fn verify_password(
            &self,
            plain_password: &str,
            stored_hash: &str,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::domain;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum AuthError {
        /// Covers both "no such user" and "wrong password" so authentication failures
        /// can't be used to enumerate usernames.
        #[error("the presented credentials were invalid")]
        InvalidCredentials,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait AuthPort {
        async fn authenticate(
            &self,
            username: &str,
            password: &str,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl domain::user::driven_ports::UserReader,
            pw_scheme: &impl PasswordScheme,
        ) -> Result<TodoUser, AuthError>;
    }
}

/// Compares a presented plaintext password against any stored credential.
pub fn verify_credentials(
    presented_password: &str,
    stored: &impl StoredCredential,
    pw_scheme: &impl PasswordScheme,
) -> Result<bool, anyhow::Error> {
    pw_scheme
        .verify_password(presented_password, stored.password_hash())
        .context("verifying a presented password")
}

pub struct AuthService {}

impl driving_ports::AuthPort for AuthService {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl crate::domain::user::driven_ports::UserReader,
        pw_scheme: &impl PasswordScheme,
    ) -> Result<TodoUser, driving_ports::AuthError> {
        let maybe_user = u_reader
            .by_username(username, &mut *ext_cxn)
            .await
            .context("looking up a user during authentication")?;
        let Some(user) = maybe_user else {
            return Err(driving_ports::AuthError::InvalidCredentials);
        };

        let password_matches = verify_credentials(password, &user, pw_scheme)?;
        if password_matches {
            Ok(user)
        } else {
            Err(driving_ports::AuthError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::driving_ports::{AuthError, AuthPort};
    use super::test_util::*;
    use super::*;
    use crate::domain;
    use crate::domain::user::CreateUser;
    use crate::domain::user::test_util::InMemoryUserPersistence;
    use crate::external_connections;
    use speculoos::prelude::*;
    use std::sync::RwLock;

    #[tokio::test]
    async fn accepts_the_registered_password() {
        let user_persist = RwLock::new(InMemoryUserPersistence::new_with_users(&[CreateUser {
            username: "alice".to_owned(),
            password: "pass1234".to_owned(),
        }]));
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

        let auth_result = AuthService {}
            .authenticate(
                "alice",
                "pass1234",
                &mut ext_cxn,
                &user_persist,
                &FakePasswordScheme,
            )
            .await;
        assert_that!(auth_result)
            .is_ok()
            .matches(|user| user.username == "alice");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let user_persist = RwLock::new(InMemoryUserPersistence::new_with_users(&[CreateUser {
            username: "alice".to_owned(),
            password: "pass1234".to_owned(),
        }]));
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
        let service = AuthService {};

        let bad_password_result = service
            .authenticate(
                "alice",
                "wrong-password",
                &mut ext_cxn,
                &user_persist,
                &FakePasswordScheme,
            )
            .await;
        let unknown_user_result = service
            .authenticate(
                "mallory",
                "pass1234",
                &mut ext_cxn,
                &user_persist,
                &FakePasswordScheme,
            )
            .await;

        let Err(AuthError::InvalidCredentials) = bad_password_result else {
            panic!("Expected a credential failure for a bad password: {bad_password_result:#?}");
        };
        let Err(AuthError::InvalidCredentials) = unknown_user_result else {
            panic!("Expected a credential failure for an unknown user: {unknown_user_result:#?}");
        };
    }

    #[tokio::test]
    async fn propagates_port_error() {
        let mut user_persist_raw = InMemoryUserPersistence::new();
        user_persist_raw.connectivity = domain::test_util::Connectivity::Disconnected;
        let user_persist = RwLock::new(user_persist_raw);
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

        let auth_result = AuthService {}
            .authenticate(
                "alice",
                "pass1234",
                &mut ext_cxn,
                &user_persist,
                &FakePasswordScheme,
            )
            .await;
        assert_that!(auth_result)
            .is_err()
            .matches(|err| matches!(err, AuthError::PortError(_)));
    }
}
