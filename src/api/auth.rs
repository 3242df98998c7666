use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{GenericErrorResponse, Json, UnauthorizedResponse};
use crate::{domain, dto, persistence, AppState, SharedData};
use axum::extract::State;
use axum::response::ErrorResponse;
use axum::routing::post;
use axum::Router;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;

/// Defines the OpenAPI documentation for authentication endpoints
#[derive(OpenApi)]
#[openapi(paths(login))]
pub struct AuthApi;

/// Constant used to group authentication endpoints in OpenAPI documentation
pub const AUTH_API_GROUP: &str = "Authentication";

/// Builds a router for the authentication routes
pub fn auth_routes() -> Router<Arc<SharedData>> {
    Router::new().route(
        "/auth/login",
        post(
            |State(app_data): AppState, Json(credentials): Json<dto::user::LoginRequest>| async move {
                let mut ext_cxn = app_data.ext_cxn.clone();
                let auth_service = domain::auth::AuthService {};

                login(credentials, &mut ext_cxn, &auth_service).await
            },
        ),
    )
}

/// Verifies a username/password pair and returns the matching user. The response
/// is the same 401 whether the username is unknown or the password is wrong.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = AUTH_API_GROUP,
    request_body = dto::user::LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = dto::user::TodoUser),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn login(
    credentials: dto::user::LoginRequest,
    ext_cxn: &mut impl ExternalConnectivity,
    auth_service: &impl domain::auth::driving_ports::AuthPort,
) -> Result<Json<dto::user::TodoUser>, ErrorResponse> {
    info!("Login attempt for {}", credentials.username);

    let user_reader = persistence::db_user_driven_ports::DbReadUsers;
    let password_scheme = persistence::argon2_hash::Argon2PasswordScheme;

    let auth_result = auth_service
        .authenticate(
            &credentials.username,
            &credentials.password,
            &mut *ext_cxn,
            &user_reader,
            &password_scheme,
        )
        .await;

    match auth_result {
        Ok(authenticated_user) => Ok(Json(authenticated_user.into())),
        Err(domain::auth::driving_ports::AuthError::InvalidCredentials) => {
            info!("Rejected credentials for {}", credentials.username);
            Err(UnauthorizedResponse.into())
        }
        Err(domain::auth::driving_ports::AuthError::PortError(port_error)) => {
            error!("Login failure: {port_error}");
            Err(GenericErrorResponse(port_error).into())
        }
    }
}
