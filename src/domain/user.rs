use crate::domain::auth::driven_ports::PasswordScheme;
use crate::domain::user::driven_ports::{HashedCredentials, InsertUserError};
use crate::domain::user::driving_ports::{CreateUserError, UserLookupError};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use thiserror::Error;

#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TodoUser {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
}

/// Registration input carrying the plaintext password. The plaintext only lives long
/// enough to be hashed and must never be persisted or logged.
#[cfg_attr(test, derive(Clone))]
pub struct CreateUser {
    pub username: String,
    pub password: String,
}

pub mod driven_ports {
    use super::*;

    /// Credentials ready for persistence, password already hashed.
    pub struct HashedCredentials<'creds> {
        pub username: &'creds str,
        pub password_hash: String,
    }

    #[derive(Debug, Error)]
    pub enum InsertUserError {
        /// The storage-level uniqueness constraint rejected the insert. This is the
        /// authoritative guard behind the service's pre-insert existence check.
        #[error("a user with the requested username already exists")]
        UsernameTaken,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    pub trait UserReader {
        async fn by_username(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<TodoUser>, anyhow::Error>;
    }

    pub trait UserWriter {
        async fn insert_user(
            &self,
            credentials: &HashedCredentials<'_>,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, InsertUserError>;
    }

    pub trait DetectUser {
        async fn user_exists(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;

        async fn username_exists(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    #[derive(Debug, Error)]
    pub enum CreateUserError {
        #[error("a user with the requested username already exists")]
        UsernameTaken,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    #[derive(Debug, Error)]
    pub enum UserLookupError {
        #[error("no user matched the given username")]
        NotFound,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait UserPort {
        async fn register(
            &self,
            new_user: &CreateUser,
            ext_cxn: &mut impl ExternalConnectivity,
            u_writer: &impl driven_ports::UserWriter,
            u_detect: &impl driven_ports::DetectUser,
            pw_scheme: &impl PasswordScheme,
        ) -> Result<TodoUser, CreateUserError>;

        async fn user_by_username(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
        ) -> Result<TodoUser, UserLookupError>;

        async fn username_exists(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
            u_detect: &impl driven_ports::DetectUser,
        ) -> Result<bool, anyhow::Error>;
    }
}

#[derive(Debug, Error)]
pub(super) enum UserExistsErr {
    #[error("user with ID {0} does not exist")]
    UserDoesNotExist(i32),

    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}

pub(super) async fn verify_user_exists(
    id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    user_detect: &impl driven_ports::DetectUser,
) -> Result<(), UserExistsErr> {
    let does_user_exist = user_detect.user_exists(id, &mut *ext_cxn).await?;

    if does_user_exist {
        Ok(())
    } else {
        Err(UserExistsErr::UserDoesNotExist(id))
    }
}

pub struct UserService {}

impl driving_ports::UserPort for UserService {
    async fn register(
        &self,
        new_user: &CreateUser,
        ext_cxn: &mut impl ExternalConnectivity,
        u_writer: &impl driven_ports::UserWriter,
        u_detect: &impl driven_ports::DetectUser,
        pw_scheme: &impl PasswordScheme,
    ) -> Result<TodoUser, CreateUserError> {
        let username_taken = u_detect
            .username_exists(&new_user.username, &mut *ext_cxn)
            .await
            .context("checking username availability during registration")?;
        if username_taken {
            return Err(CreateUserError::UsernameTaken);
        }

        let password_hash = pw_scheme
            .hash_password(&new_user.password)
            .context("hashing a new user's password")?;
        let credentials = HashedCredentials {
            username: &new_user.username,
            password_hash,
        };

        // The existence check above races with concurrent registrations of the same
        // username; the store's uniqueness constraint remains the final word.
        let new_id = match u_writer.insert_user(&credentials, &mut *ext_cxn).await {
            Ok(id) => id,
            Err(InsertUserError::UsernameTaken) => return Err(CreateUserError::UsernameTaken),
            Err(InsertUserError::PortError(err)) => {
                return Err(CreateUserError::from(err.context("inserting a new user")));
            }
        };

        Ok(TodoUser {
            id: new_id,
            username: new_user.username.clone(),
            password_hash: credentials.password_hash,
        })
    }

    async fn user_by_username(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
    ) -> Result<TodoUser, UserLookupError> {
        let maybe_user = u_reader
            .by_username(username, &mut *ext_cxn)
            .await
            .context("fetching a user by username")?;

        maybe_user.ok_or(UserLookupError::NotFound)
    }

    async fn username_exists(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        u_detect: &impl driven_ports::DetectUser,
    ) -> Result<bool, anyhow::Error> {
        u_detect
            .username_exists(username, &mut *ext_cxn)
            .await
            .context("checking whether a username is taken")
    }
}


#[cfg(test)]
mod user_service_tests {
    use super::driving_ports::UserPort;
    use super::*;
    use crate::domain::auth::test_util::{FakePasswordScheme, fake_hash};
    use crate::domain::test_util::Connectivity;
    use crate::external_connections;
    use speculoos::prelude::*;
    use std::sync::RwLock;

    #[tokio::test]
    async fn register_stores_a_hash_rather_than_the_plaintext() {
        let user_persist = test_util::InMemoryUserPersistence::new_locked();
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
        let new_user = CreateUser {
            username: "alice".to_owned(),
            password: "pass1234".to_owned(),
        };

        let register_result = UserService {}
            .register(
                &new_user,
                &mut ext_cxn,
                &user_persist,
                &user_persist,
                &FakePasswordScheme,
            )
            .await;
        let registered_user = match register_result {
            Ok(user) => user,
            Err(error) => panic!("Registration should have succeeded but failed: {error}"),
        };

        assert_eq!(1, registered_user.id);
        assert_eq!("alice", registered_user.username);
        assert_eq!(fake_hash("pass1234"), registered_user.password_hash);

        let locked_persist = user_persist.read().expect("user persist rw lock poisoned");
        assert!(
            locked_persist
                .created_users
                .iter()
                .all(|user| user.password_hash != "pass1234")
        );
        assert_eq!(
            fake_hash("pass1234"),
            locked_persist.created_users[0].password_hash
        );
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let user_persist = RwLock::new(test_util::InMemoryUserPersistence::new_with_users(&[
            CreateUser {
                username: "alice".to_owned(),
                password: "pass1234".to_owned(),
            },
        ]));
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
        let new_user = CreateUser {
            username: "alice".to_owned(),
            password: "other-password".to_owned(),
        };

        let register_result = UserService {}
            .register(
                &new_user,
                &mut ext_cxn,
                &user_persist,
                &user_persist,
                &FakePasswordScheme,
            )
            .await;
        assert_that!(register_result)
            .is_err()
            .matches(|err| matches!(err, CreateUserError::UsernameTaken));
    }

    #[tokio::test]
    async fn register_surfaces_conflict_from_the_store_when_the_precheck_races() {
        // Simulates losing the check-then-insert race: the existence probe reports the
        // username as free, but the store's uniqueness constraint still rejects it.
        let mut user_persist_raw = test_util::InMemoryUserPersistence::new_with_users(&[
            CreateUser {
                username: "alice".to_owned(),
                password: "pass1234".to_owned(),
            },
        ]);
        user_persist_raw.report_username_free = true;
        let user_persist = RwLock::new(user_persist_raw);
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
        let new_user = CreateUser {
            username: "alice".to_owned(),
            password: "other-password".to_owned(),
        };

        let register_result = UserService {}
            .register(
                &new_user,
                &mut ext_cxn,
                &user_persist,
                &user_persist,
                &FakePasswordScheme,
            )
            .await;
        assert_that!(register_result)
            .is_err()
            .matches(|err| matches!(err, CreateUserError::UsernameTaken));
    }

    #[tokio::test]
    async fn register_propagates_port_error() {
        let mut user_persist_raw = test_util::InMemoryUserPersistence::new();
        user_persist_raw.connectivity = Connectivity::Disconnected;
        let user_persist = RwLock::new(user_persist_raw);
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

        let register_result = UserService {}
            .register(
                &test_util::user_create_default(),
                &mut ext_cxn,
                &user_persist,
                &user_persist,
                &FakePasswordScheme,
            )
            .await;
        assert_that!(register_result)
            .is_err()
            .matches(|err| matches!(err, CreateUserError::PortError(_)));
    }

    #[tokio::test]
    async fn user_by_username_finds_registered_user() {
        let user_persist = RwLock::new(test_util::InMemoryUserPersistence::new_with_users(&[
            CreateUser {
                username: "alice".to_owned(),
                password: "pass1234".to_owned(),
            },
        ]));
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

        let lookup_result = UserService {}
            .user_by_username("alice", &mut ext_cxn, &user_persist)
            .await;
        assert_that!(lookup_result).is_ok().matches(|user| {
            matches!(user, TodoUser {
                id: 1,
                username,
                ..
            } if username == "alice")
        });
    }

    #[tokio::test]
    async fn user_by_username_reports_missing_user() {
        let user_persist = test_util::InMemoryUserPersistence::new_locked();
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

        let lookup_result = UserService {}
            .user_by_username("alice", &mut ext_cxn, &user_persist)
            .await;
        assert_that!(lookup_result)
            .is_err()
            .matches(|err| matches!(err, UserLookupError::NotFound));
    }

    #[tokio::test]
    async fn username_exists_reflects_store_contents() {
        let user_persist = RwLock::new(test_util::InMemoryUserPersistence::new_with_users(&[
            CreateUser {
                username: "alice".to_owned(),
                password: "pass1234".to_owned(),
            },
        ]));
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
        let service = UserService {};

        let alice_exists = service
            .username_exists("alice", &mut ext_cxn, &user_persist)
            .await;
        let bob_exists = service
            .username_exists("bob", &mut ext_cxn, &user_persist)
            .await;

        assert_that!(alice_exists).is_ok_containing(true);
        assert_that!(bob_exists).is_ok_containing(false);
    }
}
