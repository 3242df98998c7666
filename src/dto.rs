pub mod task;
pub mod user;

use utoipa::OpenApi;

/// Reusable OpenAPI error response definitions referenced by endpoint docs.
pub mod err_resps {
    use serde::Serialize;
    use utoipa::ToResponse;

    #[derive(Serialize, ToResponse)]
    #[response(description = "Submitted data was invalid (400)")]
    pub struct BasicError400 {
        error_code: String,
        error_description: String,
    }

    #[derive(Serialize, ToResponse)]
    #[response(description = "The presented credentials were invalid (401)")]
    pub struct BasicError401 {
        error_code: String,
        error_description: String,
    }

    #[derive(Serialize, ToResponse)]
    #[response(description = "The requested entity could not be found (404)")]
    pub struct BasicError404 {
        error_code: String,
        error_description: String,
    }

    #[derive(Serialize, ToResponse)]
    #[response(description = "The request conflicted with existing state (409)")]
    pub struct BasicError409 {
        error_code: String,
        error_description: String,
    }

    #[derive(Serialize, ToResponse)]
    #[response(description = "Something unexpected went wrong inside the server (500)")]
    pub struct BasicError500 {
        error_code: String,
        error_description: String,
    }
}

/// Collects the OpenAPI schemas for every DTO in this module tree.
#[derive(OpenApi)]
#[openapi(components(
    schemas(
        user::TodoUser,
        user::NewUser,
        user::LoginRequest,
        user::UsernameAvailability,
        task::TodoTask,
        task::NewTask,
        task::UpdateTask,
        task::TaskPriority,
        task::TaskStats,
    ),
    responses(
        err_resps::BasicError400,
        err_resps::BasicError401,
        err_resps::BasicError404,
        err_resps::BasicError409,
        err_resps::BasicError500,
        crate::routing_utils::BasicErrorResponse,
    )
))]
pub struct OpenApiSchemas;
