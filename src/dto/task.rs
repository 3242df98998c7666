use crate::domain;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Priority labels as they appear on the wire.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskPriority {
    #[default]
    Low,
    Medium,
    High,
}

impl From<TaskPriority> for domain::todo::Priority {
    fn from(value: TaskPriority) -> Self {
        match value {
            TaskPriority::Low => domain::todo::Priority::Low,
            TaskPriority::Medium => domain::todo::Priority::Medium,
            TaskPriority::High => domain::todo::Priority::High,
        }
    }
}

impl From<domain::todo::Priority> for TaskPriority {
    fn from(value: domain::todo::Priority) -> Self {
        match value {
            domain::todo::Priority::Low => TaskPriority::Low,
            domain::todo::Priority::Medium => TaskPriority::Medium,
            domain::todo::Priority::High => TaskPriority::High,
        }
    }
}

/// DTO for creating a new task via the API. Priority defaults to LOW when omitted.
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct NewTask {
    #[validate(length(min = 1))]
    #[schema(example = "Buy groceries")]
    pub title: String,
    #[schema(example = "Milk, eggs, bread")]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    #[schema(example = "errand")]
    pub category: String,
    #[serde(default)]
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
}

impl From<NewTask> for domain::todo::NewTask {
    fn from(value: NewTask) -> Self {
        domain::todo::NewTask {
            title: value.title,
            description: value.description,
            category: value.category,
            priority: value.priority.into(),
            due_date: value.due_date,
        }
    }
}

/// DTO for replacing a task's editable content. Completion state and creation
/// date are not editable through this payload.
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateTask {
    #[validate(length(min = 1))]
    #[schema(example = "Buy groceries")]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    #[schema(example = "errand")]
    pub category: String,
    #[serde(default)]
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
}

impl From<UpdateTask> for domain::todo::UpdateTask {
    fn from(value: UpdateTask) -> Self {
        domain::todo::UpdateTask {
            title: value.title,
            description: value.description,
            category: value.category,
            priority: value.priority.into(),
            due_date: value.due_date,
        }
    }
}

/// DTO for a returned task on the API
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct TodoTask {
    #[schema(example = 10)]
    pub id: i32,
    #[schema(example = 4)]
    pub owner_user_id: i32,
    #[schema(example = "Buy groceries")]
    pub title: String,
    #[schema(example = "Milk, eggs, bread")]
    pub description: Option<String>,
    #[schema(example = "errand")]
    pub category: String,
    pub priority: TaskPriority,
    #[schema(example = false)]
    pub completed: bool,
    pub created_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
}

impl From<domain::todo::TodoTask> for TodoTask {
    fn from(value: domain::todo::TodoTask) -> Self {
        TodoTask {
            id: value.id,
            owner_user_id: value.owner_user_id,
            title: value.title,
            description: value.description,
            category: value.category,
            priority: value.priority.into(),
            completed: value.completed,
            created_date: value.created_date,
            due_date: value.due_date,
        }
    }
}

/// Optional filters on the task list endpoint. At most one is honored,
/// checked in this order: completed, priority, category.
#[derive(Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct TaskListFilter {
    pub completed: Option<bool>,
    pub priority: Option<TaskPriority>,
    pub category: Option<String>,
}

/// DTO summarizing how many of a user's tasks are done.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct TaskStats {
    #[schema(example = 3)]
    pub completed: i64,
    #[schema(example = 7)]
    pub pending: i64,
}
