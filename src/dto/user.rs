use crate::domain;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// DTO for a registered user. The password hash never leaves the server.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct TodoUser {
    #[schema(example = 4)]
    pub id: i32,
    #[schema(example = "alice")]
    pub username: String,
}

impl From<domain::user::TodoUser> for TodoUser {
    fn from(value: domain::user::TodoUser) -> Self {
        TodoUser {
            id: value.id,
            username: value.username,
        }
    }
}

/// DTO for registering a new user via the API
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct NewUser {
    #[validate(length(min = 1, max = 30))]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(length(min = 4))]
    #[schema(example = "hunter22")]
    pub password: String,
}

impl From<NewUser> for domain::user::CreateUser {
    fn from(value: NewUser) -> Self {
        domain::user::CreateUser {
            username: value.username,
            password: value.password,
        }
    }
}

/// DTO for a login attempt. Not validated beyond deserialization so that
/// malformed credentials still produce the standard 401.
#[derive(Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct LoginRequest {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "hunter22")]
    pub password: String,
}

/// DTO reporting whether a username is still free to register.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct UsernameAvailability {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = true)]
    pub available: bool,
}

/// Query parameters for the username availability check.
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct AvailabilityQuery {
    #[validate(length(min = 1, max = 30))]
    pub username: String,
}
