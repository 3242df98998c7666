use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{
    GenericErrorResponse, Json, NotFoundResponse, ValidationErrorResponse,
};
use crate::{domain, dto, persistence, AppState, SharedData};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;
use validator::Validate;

/// Defines the OpenAPI documentation for task endpoints
#[derive(OpenApi)]
#[openapi(paths(
    list_tasks,
    create_task,
    task_stats,
    get_task,
    update_task,
    delete_task,
    toggle_task
))]
pub struct TasksApi;

/// Constant used to group task endpoints in OpenAPI documentation
pub const TASKS_API_GROUP: &str = "Tasks";

/// Builds a router for all the user-owned task routes
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/users/:user_id/tasks",
            get(
                |State(app_data): AppState,
                 Path(user_id): Path<i32>,
                 Query(filter): Query<dto::task::TaskListFilter>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    list_tasks(user_id, filter, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/users/:user_id/tasks",
            post(
                |State(app_data): AppState,
                 Path(user_id): Path<i32>,
                 Json(new_task): Json<dto::task::NewTask>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    create_task(user_id, new_task, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/users/:user_id/tasks/stats",
            get(
                |State(app_data): AppState, Path(user_id): Path<i32>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    task_stats(user_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/users/:user_id/tasks/:task_id",
            get(
                |State(app_data): AppState, Path(path): Path<TaskPath>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    get_task(path, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/users/:user_id/tasks/:task_id",
            put(
                |State(app_data): AppState,
                 Path(path): Path<TaskPath>,
                 Json(update): Json<dto::task::UpdateTask>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    update_task(path, update, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/users/:user_id/tasks/:task_id",
            delete(
                |State(app_data): AppState, Path(path): Path<TaskPath>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    delete_task(path, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/users/:user_id/tasks/:task_id/toggle",
            post(
                |State(app_data): AppState, Path(path): Path<TaskPath>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    toggle_task(path, &mut ext_cxn, &task_service).await
                },
            ),
        )
}

/// Identifies a task nested under its owner in the URL.
#[derive(Deserialize)]
struct TaskPath {
    user_id: i32,
    task_id: i32,
}

/// Maps domain task failures onto API responses. Missing tasks and tasks owned by
/// someone else both become 404 so task IDs can't be probed across users.
fn task_error_response(error: domain::todo::driving_ports::TaskError) -> ErrorResponse {
    use domain::todo::driving_ports::TaskError;

    match error {
        TaskError::UserDoesNotExist | TaskError::NoMatchingTask | TaskError::NotTaskOwner => {
            NotFoundResponse.into()
        }
        TaskError::PortError(port_error) => {
            error!("Task operation failure: {port_error}");
            GenericErrorResponse(port_error).into()
        }
    }
}

/// Lists a user's tasks, newest first. At most one filter is applied, checked in
/// the order completed, priority, category.
#[utoipa::path(
    get,
    path = "/users/{user_id}/tasks",
    tag = TASKS_API_GROUP,
    params(
        ("user_id" = i32, Path, description = "The user owning the tasks"),
        ("completed" = Option<bool>, Query, description = "Only tasks with this completion state"),
        ("priority" = Option<dto::task::TaskPriority>, Query, description = "Only tasks with this priority"),
        ("category" = Option<String>, Query, description = "Only tasks in this category (exact match)"),
    ),
    responses(
        (status = 200, description = "The user's tasks", body = Vec<dto::task::TodoTask>),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn list_tasks(
    user_id: i32,
    filter: dto::task::TaskListFilter,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<Json<Vec<dto::task::TodoTask>>, ErrorResponse> {
    info!("Listing tasks for user {user_id}");
    let task_reader = persistence::db_todo_driven_ports::DbTaskReader;
    let user_detector = persistence::db_user_driven_ports::DbDetectUser;

    let list_result = if let Some(completed) = filter.completed {
        task_service
            .tasks_by_completion(user_id, completed, &mut *ext_cxn, &task_reader)
            .await
    } else if let Some(priority) = filter.priority {
        task_service
            .tasks_by_priority(user_id, priority.into(), &mut *ext_cxn, &task_reader)
            .await
    } else if let Some(ref category) = filter.category {
        task_service
            .tasks_by_category(user_id, category, &mut *ext_cxn, &task_reader)
            .await
    } else {
        task_service
            .tasks_for_user(user_id, &mut *ext_cxn, &user_detector, &task_reader)
            .await
    };

    let tasks = list_result.map_err(task_error_response)?;
    Ok(Json(
        tasks.into_iter().map(dto::task::TodoTask::from).collect(),
    ))
}

/// Creates a new pending task owned by the user.
#[utoipa::path(
    post,
    path = "/users/{user_id}/tasks",
    tag = TASKS_API_GROUP,
    params(("user_id" = i32, Path, description = "The user who will own the task")),
    request_body = dto::task::NewTask,
    responses(
        (status = 201, description = "Task created", body = dto::task::TodoTask),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn create_task(
    user_id: i32,
    new_task: dto::task::NewTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<(StatusCode, Json<dto::task::TodoTask>), ErrorResponse> {
    info!("Adding task for user {user_id}");
    new_task.validate().map_err(ValidationErrorResponse::from)?;

    let user_detector = persistence::db_user_driven_ports::DbDetectUser;
    let task_writer = persistence::db_todo_driven_ports::DbTaskWriter;

    let task_to_create = domain::todo::NewTask::from(new_task);
    let created_task = task_service
        .create_task_for_user(
            user_id,
            &task_to_create,
            &mut *ext_cxn,
            &user_detector,
            &task_writer,
        )
        .await
        .map_err(task_error_response)?;

    Ok((StatusCode::CREATED, Json(created_task.into())))
}

/// Summarizes how many of the user's tasks are done and how many remain.
#[utoipa::path(
    get,
    path = "/users/{user_id}/tasks/stats",
    tag = TASKS_API_GROUP,
    params(("user_id" = i32, Path, description = "The user owning the tasks")),
    responses(
        (status = 200, description = "Task completion counts", body = dto::task::TaskStats),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn task_stats(
    user_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<Json<dto::task::TaskStats>, ErrorResponse> {
    info!("Task stats for user {user_id}");
    let task_reader = persistence::db_todo_driven_ports::DbTaskReader;

    let completed = task_service
        .completed_count(user_id, &mut *ext_cxn, &task_reader)
        .await
        .map_err(task_error_response)?;
    let pending = task_service
        .pending_count(user_id, &mut *ext_cxn, &task_reader)
        .await
        .map_err(task_error_response)?;

    Ok(Json(dto::task::TaskStats { completed, pending }))
}

/// Fetches one of the user's tasks by ID.
#[utoipa::path(
    get,
    path = "/users/{user_id}/tasks/{task_id}",
    tag = TASKS_API_GROUP,
    params(
        ("user_id" = i32, Path, description = "The user owning the task"),
        ("task_id" = i32, Path, description = "The task to fetch"),
    ),
    responses(
        (status = 200, description = "The requested task", body = dto::task::TodoTask),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn get_task(
    path: TaskPath,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<Json<dto::task::TodoTask>, ErrorResponse> {
    info!("Get task {} for user {}", path.task_id, path.user_id);
    let task_reader = persistence::db_todo_driven_ports::DbTaskReader;

    let task = task_service
        .task_for_user(path.user_id, path.task_id, &mut *ext_cxn, &task_reader)
        .await
        .map_err(task_error_response)?;

    Ok(Json(task.into()))
}

/// Replaces a task's editable content. Completion state and creation date
/// are left untouched.
#[utoipa::path(
    put,
    path = "/users/{user_id}/tasks/{task_id}",
    tag = TASKS_API_GROUP,
    params(
        ("user_id" = i32, Path, description = "The user owning the task"),
        ("task_id" = i32, Path, description = "The task to update"),
    ),
    request_body = dto::task::UpdateTask,
    responses(
        (status = 200, description = "The updated task", body = dto::task::TodoTask),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn update_task(
    path: TaskPath,
    update: dto::task::UpdateTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<Json<dto::task::TodoTask>, ErrorResponse> {
    info!("Updating task {} for user {}", path.task_id, path.user_id);
    update.validate().map_err(ValidationErrorResponse::from)?;

    let task_reader = persistence::db_todo_driven_ports::DbTaskReader;
    let task_writer = persistence::db_todo_driven_ports::DbTaskWriter;

    let task_update = domain::todo::UpdateTask::from(update);
    let updated_task = task_service
        .update_task(
            path.user_id,
            path.task_id,
            &task_update,
            &mut *ext_cxn,
            &task_reader,
            &task_writer,
        )
        .await
        .map_err(task_error_response)?;

    Ok(Json(updated_task.into()))
}

/// Deletes one of the user's tasks.
#[utoipa::path(
    delete,
    path = "/users/{user_id}/tasks/{task_id}",
    tag = TASKS_API_GROUP,
    params(
        ("user_id" = i32, Path, description = "The user owning the task"),
        ("task_id" = i32, Path, description = "The task to delete"),
    ),
    responses(
        (status = 200, description = "Task deleted"),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn delete_task(
    path: TaskPath,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting task {} for user {}", path.task_id, path.user_id);
    let task_reader = persistence::db_todo_driven_ports::DbTaskReader;
    let task_writer = persistence::db_todo_driven_ports::DbTaskWriter;

    task_service
        .delete_task(
            path.user_id,
            path.task_id,
            &mut *ext_cxn,
            &task_reader,
            &task_writer,
        )
        .await
        .map_err(task_error_response)?;

    Ok(StatusCode::OK)
}

/// Flips a task between pending and completed.
#[utoipa::path(
    post,
    path = "/users/{user_id}/tasks/{task_id}/toggle",
    tag = TASKS_API_GROUP,
    params(
        ("user_id" = i32, Path, description = "The user owning the task"),
        ("task_id" = i32, Path, description = "The task to toggle"),
    ),
    responses(
        (status = 200, description = "The task with its new completion state", body = dto::task::TodoTask),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn toggle_task(
    path: TaskPath,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<Json<dto::task::TodoTask>, ErrorResponse> {
    info!(
        "Toggling completion of task {} for user {}",
        path.task_id, path.user_id
    );
    let task_reader = persistence::db_todo_driven_ports::DbTaskReader;
    let task_writer = persistence::db_todo_driven_ports::DbTaskWriter;

    let toggled_task = task_service
        .toggle_completion(
            path.user_id,
            path.task_id,
            &mut *ext_cxn,
            &task_reader,
            &task_writer,
        )
        .await
        .map_err(task_error_response)?;

    Ok(Json(toggled_task.into()))
}
