use super::Count;
use crate::domain;
use crate::domain::user::driven_ports::{HashedCredentials, InsertUserError};
use crate::domain::user::TodoUser;
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use sqlx::FromRow;

pub struct DbDetectUser;

impl domain::user::driven_ports::DetectUser for DbDetectUser {
    async fn user_exists(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut connection = ext_cxn
            .database_cxn()
            .await
            .context("acquiring connection to detect a user by ID")?;

        let user_with_id_count =
            sqlx::query_as::<_, Count>("SELECT count(*) FROM todo_user tu WHERE tu.id = $1")
                .bind(user_id)
                .fetch_one(connection.borrow_connection())
                .await
                .context("Detecting user with ID")?;

        Ok(user_with_id_count.count() > 0)
    }

    async fn username_exists(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut connection = ext_cxn
            .database_cxn()
            .await
            .context("acquiring connection to detect a username")?;

        let user_with_name_count =
            sqlx::query_as::<_, Count>("SELECT count(*) FROM todo_user tu WHERE tu.username = $1")
                .bind(username)
                .fetch_one(connection.borrow_connection())
                .await
                .context("Detecting user via username")?;

        Ok(user_with_name_count.count() > 0)
    }
}

pub struct DbReadUsers;

#[derive(FromRow)]
struct TodoUserRow {
    id: i32,
    username: String,
    password_hash: String,
}

impl From<TodoUserRow> for TodoUser {
    fn from(value: TodoUserRow) -> Self {
        TodoUser {
            id: value.id,
            username: value.username,
            password_hash: value.password_hash,
        }
    }
}

impl domain::user::driven_ports::UserReader for DbReadUsers {
    async fn by_username(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<TodoUser>, Error> {
        let mut cxn_handle = ext_cxn
            .database_cxn()
            .await
            .context("acquiring connection to read a user")?;

        let user = sqlx::query_as::<_, TodoUserRow>(
            "SELECT tu.id, tu.username, tu.password_hash FROM todo_user tu WHERE tu.username = $1",
        )
        .bind(username)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching a user by username")?;

        Ok(user.map(TodoUser::from))
    }
}

pub struct DbWriteUsers;

impl domain::user::driven_ports::UserWriter for DbWriteUsers {
    async fn insert_user(
        &self,
        credentials: &HashedCredentials<'_>,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, InsertUserError> {
        let mut cxn_handle = ext_cxn
            .database_cxn()
            .await
            .context("acquiring connection to insert a user")?;

        let insert_result = sqlx::query_as::<_, super::NewId>(
            "INSERT INTO todo_user(username, password_hash) VALUES ($1, $2) RETURNING todo_user.id",
        )
        .bind(credentials.username)
        .bind(&credentials.password_hash)
        .fetch_one(cxn_handle.borrow_connection())
        .await;

        let new_user = match insert_result {
            Ok(new_id) => new_id,
            Err(insert_error) if super::is_unique_violation(&insert_error) => {
                return Err(InsertUserError::UsernameTaken);
            }
            Err(insert_error) => {
                return Err(InsertUserError::PortError(
                    Error::from(insert_error).context("Inserting new user"),
                ));
            }
        };

        Ok(new_user.id)
    }
}
