use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{
    ConflictResponse, GenericErrorResponse, Json, ValidationErrorResponse,
};
use crate::{domain, dto, persistence, AppState, SharedData};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;
use validator::Validate;

/// Defines the OpenAPI documentation for user registration endpoints
#[derive(OpenApi)]
#[openapi(paths(register_user, check_username_availability))]
pub struct UsersApi;

/// Constant used to group user endpoints in OpenAPI documentation
pub const USERS_API_GROUP: &str = "Users";

/// Builds a router for all the user routes
pub fn user_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/users",
            post(
                |State(app_data): AppState, Json(new_user): Json<dto::user::NewUser>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    register_user(new_user, &mut ext_cxn, &user_service).await
                },
            ),
        )
        .route(
            "/users/availability",
            get(
                |State(app_data): AppState,
                 Query(params): Query<dto::user::AvailabilityQuery>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    check_username_availability(params, &mut ext_cxn, &user_service).await
                },
            ),
        )
}

/// Registers a new user account.
#[utoipa::path(
    post,
    path = "/users",
    tag = USERS_API_GROUP,
    request_body = dto::user::NewUser,
    responses(
        (status = 201, description = "User successfully registered", body = dto::user::TodoUser),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 409, response = dto::err_resps::BasicError409),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn register_user(
    new_user: dto::user::NewUser,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl domain::user::driving_ports::UserPort,
) -> Result<(StatusCode, Json<dto::user::TodoUser>), ErrorResponse> {
    info!("Attempt to register user {}", new_user.username);
    new_user.validate().map_err(ValidationErrorResponse::from)?;

    let user_writer = persistence::db_user_driven_ports::DbWriteUsers;
    let user_detector = persistence::db_user_driven_ports::DbDetectUser;
    let password_scheme = persistence::argon2_hash::Argon2PasswordScheme;

    let user_to_create = domain::user::CreateUser::from(new_user);
    let registration_result = user_service
        .register(
            &user_to_create,
            &mut *ext_cxn,
            &user_writer,
            &user_detector,
            &password_scheme,
        )
        .await;

    match registration_result {
        Ok(created_user) => Ok((StatusCode::CREATED, Json(created_user.into()))),
        Err(domain::user::driving_ports::CreateUserError::UsernameTaken) => {
            info!("Rejected registration, username taken");
            Err(ConflictResponse {
                error_code: "username_taken",
                error_description: "A user with that username already exists.",
            }
            .into())
        }
        Err(domain::user::driving_ports::CreateUserError::PortError(port_error)) => {
            error!("User registration failure: {port_error}");
            Err(GenericErrorResponse(port_error).into())
        }
    }
}

/// Reports whether a username is still free to register.
#[utoipa::path(
    get,
    path = "/users/availability",
    tag = USERS_API_GROUP,
    params(
        ("username" = String, Query, description = "The username to check"),
    ),
    responses(
        (status = 200, description = "Availability determined", body = dto::user::UsernameAvailability),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn check_username_availability(
    params: dto::user::AvailabilityQuery,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl domain::user::driving_ports::UserPort,
) -> Result<Json<dto::user::UsernameAvailability>, ErrorResponse> {
    info!("Availability check for username {}", params.username);
    params.validate().map_err(ValidationErrorResponse::from)?;

    let user_detector = persistence::db_user_driven_ports::DbDetectUser;
    let username_taken = user_service
        .username_exists(&params.username, &mut *ext_cxn, &user_detector)
        .await
        .map_err(|port_error| {
            error!("Availability check failure: {port_error}");
            GenericErrorResponse(port_error)
        })?;

    Ok(Json(dto::user::UsernameAvailability {
        username: params.username,
        available: !username_taken,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_util::{deserialize_body, ErrorResponseBody};
    use crate::domain::user::driving_ports::CreateUserError;
    use crate::domain::user::test_util::MockUserService;
    use crate::{domain, external_connections};
    use anyhow::anyhow;
    use axum::response::IntoResponse;
    use speculoos::prelude::*;
    use std::sync::Mutex;

    mod register_user {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let mut user_service_raw = MockUserService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            user_service_raw.register_result.set_returned_result(Ok(
                domain::user::TodoUser {
                    id: 1,
                    username: "alice".to_owned(),
                    password_hash: "hashed$hunter22".to_owned(),
                },
            ));
            let user_service = Mutex::new(user_service_raw);

            let register_response = register_user(
                dto::user::NewUser {
                    username: "alice".to_owned(),
                    password: "hunter22".to_owned(),
                },
                &mut ext_cxn,
                &user_service,
            )
            .await;
            let (status, Json(created_user)) = match register_response {
                Ok(success) => success,
                Err(_) => panic!("Did not get a successful registration response"),
            };

            assert_eq!(StatusCode::CREATED, status);
            assert_eq!(
                dto::user::TodoUser {
                    id: 1,
                    username: "alice".to_owned(),
                },
                created_user
            );

            let locked_user_service = user_service.lock().expect("user service mutex poisoned");
            assert!(matches!(locked_user_service.register_result.calls(), [
                domain::user::CreateUser { username, password }
            ] if username == "alice" && password == "hunter22"));
        }

        #[tokio::test]
        async fn returns_409_when_username_taken() {
            let mut user_service_raw = MockUserService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            user_service_raw
                .register_result
                .set_returned_result(Err(CreateUserError::UsernameTaken));
            let user_service = Mutex::new(user_service_raw);

            let register_response = register_user(
                dto::user::NewUser {
                    username: "alice".to_owned(),
                    password: "hunter22".to_owned(),
                },
                &mut ext_cxn,
                &user_service,
            )
            .await;
            let real_response = register_response.into_response();

            assert_eq!(StatusCode::CONFLICT, real_response.status());
            let body: ErrorResponseBody = deserialize_body(real_response.into_body()).await;
            assert_eq!("username_taken", body.error_code);
        }

        #[tokio::test]
        async fn returns_400_on_bad_input() {
            let user_service = MockUserService::new_locked();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let register_response = register_user(
                dto::user::NewUser {
                    username: "alice".to_owned(),
                    password: "abc".to_owned(),
                },
                &mut ext_cxn,
                &user_service,
            )
            .await;
            let real_response = register_response.into_response();

            assert_eq!(StatusCode::BAD_REQUEST, real_response.status());
            let body: ErrorResponseBody = deserialize_body(real_response.into_body()).await;
            assert_eq!("invalid_input", body.error_code);

            let locked_user_service = user_service.lock().expect("user service mutex poisoned");
            assert_that!(locked_user_service.register_result.calls().to_vec()).is_empty();
        }

        #[tokio::test]
        async fn returns_500_on_port_error() {
            let mut user_service_raw = MockUserService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            user_service_raw
                .register_result
                .set_returned_result(Err(CreateUserError::PortError(anyhow!(
                    "the database is on fire"
                ))));
            let user_service = Mutex::new(user_service_raw);

            let register_response = register_user(
                dto::user::NewUser {
                    username: "alice".to_owned(),
                    password: "hunter22".to_owned(),
                },
                &mut ext_cxn,
                &user_service,
            )
            .await;
            let real_response = register_response.into_response();

            assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, real_response.status());
            let body: ErrorResponseBody = deserialize_body(real_response.into_body()).await;
            assert_eq!("internal_error", body.error_code);
        }
    }

    mod check_username_availability {
        use super::*;

        #[tokio::test]
        async fn reports_taken_username_as_unavailable() {
            let mut user_service_raw = MockUserService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            user_service_raw
                .username_exists_result
                .set_returned_anyhow(Ok(true));
            let user_service = Mutex::new(user_service_raw);

            let availability_response = check_username_availability(
                dto::user::AvailabilityQuery {
                    username: "alice".to_owned(),
                },
                &mut ext_cxn,
                &user_service,
            )
            .await;
            let Ok(Json(availability)) = availability_response else {
                panic!("Did not get a successful response");
            };

            assert_eq!("alice", availability.username);
            assert!(!availability.available);
        }

        #[tokio::test]
        async fn reports_unknown_username_as_available() {
            let mut user_service_raw = MockUserService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            user_service_raw
                .username_exists_result
                .set_returned_anyhow(Ok(false));
            let user_service = Mutex::new(user_service_raw);

            let availability_response = check_username_availability(
                dto::user::AvailabilityQuery {
                    username: "brand-new".to_owned(),
                },
                &mut ext_cxn,
                &user_service,
            )
            .await;
            let Ok(Json(availability)) = availability_response else {
                panic!("Did not get a successful response");
            };

            assert!(availability.available);
        }
    }
}
