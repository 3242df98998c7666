use crate::domain;
use crate::domain::todo::driven_ports::{TaskReader, TaskWriter};
use crate::domain::todo::driving_ports::TaskError;
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{Local, NaiveDate};
use derive_more::Display;
use std::str::FromStr;
use thiserror::Error;
use tracing::error;

/// How urgent a task is. Persisted as its uppercase label.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq)]
pub enum Priority {
    #[default]
    #[display("LOW")]
    Low,
    #[display("MEDIUM")]
    Medium,
    #[display("HIGH")]
    High,
}

#[derive(Debug, Error)]
#[error("unrecognized priority label: {0}")]
pub struct UnknownPriority(pub String);

impl FromStr for Priority {
    type Err = UnknownPriority;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            other => Err(UnknownPriority(other.to_owned())),
        }
    }
}

/// A to-do item. `owner_user_id` and `created_date` are stamped at creation and never
/// change afterwards; `completed` only changes through
/// [driving_ports::TaskPort::toggle_completion].
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TodoTask {
    pub id: i32,
    pub owner_user_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub priority: Priority,
    pub completed: bool,
    pub created_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
}

/// Client-controlled fields of a new task. Owner, creation date, and completion state
/// are deliberately not representable here.
#[cfg_attr(test, derive(Clone, Debug, PartialEq, Eq))]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

/// The exact set of fields an edit may overwrite.
#[cfg_attr(test, derive(Clone, Debug, PartialEq, Eq))]
pub struct UpdateTask {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

pub mod driven_ports {
    use super::*;

    pub trait TaskReader {
        /// Fetches a task by ID without owner scoping so the service can tell
        /// "absent" apart from "owned by someone else".
        async fn task_by_id(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<TodoTask>, anyhow::Error>;

        /// All of a user's tasks, newest creation date first, ties in insertion order.
        async fn tasks_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TodoTask>, anyhow::Error>;

        async fn tasks_by_completion(
            &self,
            user_id: i32,
            completed: bool,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TodoTask>, anyhow::Error>;

        async fn tasks_by_priority(
            &self,
            user_id: i32,
            priority: Priority,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TodoTask>, anyhow::Error>;

        async fn tasks_by_category(
            &self,
            user_id: i32,
            category: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TodoTask>, anyhow::Error>;

        async fn count_by_completion(
            &self,
            user_id: i32,
            completed: bool,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i64, anyhow::Error>;
    }

    pub trait TaskWriter {
        async fn create_task_for_user(
            &self,
            user_id: i32,
            new_task: &NewTask,
            created_date: NaiveDate,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, anyhow::Error>;

        async fn update_task(
            &self,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        async fn set_completion(
            &self,
            task_id: i32,
            completed: bool,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        async fn delete_task(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    #[derive(Debug, Error)]
    pub enum TaskError {
        #[error("The specified user did not exist.")]
        UserDoesNotExist,
        #[error("No task with the given ID exists.")]
        NoMatchingTask,
        #[error("The task belongs to a different user.")]
        NotTaskOwner,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    impl From<domain::user::UserExistsErr> for TaskError {
        fn from(value: domain::user::UserExistsErr) -> Self {
            match value {
                domain::user::UserExistsErr::UserDoesNotExist(user_id) => {
                    error!("User {} didn't exist when accessing tasks.", user_id);
                    TaskError::UserDoesNotExist
                }
                domain::user::UserExistsErr::PortError(err) => {
                    TaskError::from(err.context("accessing a user's tasks"))
                }
            }
        }
    }


    pub trait TaskPort {
        async fn create_task_for_user(
            &self,
            owner_user_id: i32,
            task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            u_detect: &impl domain::user::driven_ports::DetectUser,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<TodoTask, TaskError>;

        async fn task_for_user(
            &self,
            owner_user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<TodoTask, TaskError>;

        async fn update_task(
            &self,
            owner_user_id: i32,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<TodoTask, TaskError>;

        async fn delete_task(
            &self,
            owner_user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;

        async fn toggle_completion(
            &self,
            owner_user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<TodoTask, TaskError>;

        async fn tasks_for_user(
            &self,
            owner_user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            u_detect: &impl domain::user::driven_ports::DetectUser,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<TodoTask>, TaskError>;

        async fn tasks_by_completion(
            &self,
            owner_user_id: i32,
            completed: bool,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<TodoTask>, TaskError>;

        async fn tasks_by_priority(
            &self,
            owner_user_id: i32,
            priority: Priority,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<TodoTask>, TaskError>;

        async fn tasks_by_category(
            &self,
            owner_user_id: i32,
            category: &str,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<TodoTask>, TaskError>;

        async fn completed_count(
            &self,
            owner_user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<i64, TaskError>;

        async fn pending_count(
            &self,
            owner_user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<i64, TaskError>;
    }
}

pub struct TaskService {}

/// Loads a task and enforces ownership. Existence is checked before ownership, so a
/// probe for another user's task surfaces [TaskError::NotTaskOwner] internally even
/// though the API layer presents both failures identically.
async fn owned_task_by_id(
    owner_user_id: i32,
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_read: &impl TaskReader,
) -> Result<TodoTask, TaskError> {
    let maybe_task = task_read.task_by_id(task_id, &mut *ext_cxn).await?;
    let Some(task) = maybe_task else {
        return Err(TaskError::NoMatchingTask);
    };

    if task.owner_user_id != owner_user_id {
        return Err(TaskError::NotTaskOwner);
    }

    Ok(task)
}

impl driving_ports::TaskPort for TaskService {
    async fn create_task_for_user(
        &self,
        owner_user_id: i32,
        task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        u_detect: &impl domain::user::driven_ports::DetectUser,
        task_write: &impl TaskWriter,
    ) -> Result<TodoTask, TaskError> {
        domain::user::verify_user_exists(owner_user_id, &mut *ext_cxn, u_detect).await?;

        let created_date = Local::now().date_naive();
        let created_task_id = task_write
            .create_task_for_user(owner_user_id, task, created_date, &mut *ext_cxn)
            .await?;

        Ok(TodoTask {
            id: created_task_id,
            owner_user_id,
            title: task.title.clone(),
            description: task.description.clone(),
            category: task.category.clone(),
            priority: task.priority,
            completed: false,
            created_date,
            due_date: task.due_date,
        })
    }

    async fn task_for_user(
        &self,
        owner_user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<TodoTask, TaskError> {
        owned_task_by_id(owner_user_id, task_id, &mut *ext_cxn, task_read).await
    }

    async fn update_task(
        &self,
        owner_user_id: i32,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
        task_write: &impl TaskWriter,
    ) -> Result<TodoTask, TaskError> {
        let task = owned_task_by_id(owner_user_id, task_id, &mut *ext_cxn, task_read).await?;
        task_write
            .update_task(task.id, update, &mut *ext_cxn)
            .await
            .context("updating a task")?;

        // id, owner, created date, and completion state are untouched by edits
        Ok(TodoTask {
            title: update.title.clone(),
            description: update.description.clone(),
            category: update.category.clone(),
            priority: update.priority,
            due_date: update.due_date,
            ..task
        })
    }

    async fn delete_task(
        &self,
        owner_user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
        task_write: &impl TaskWriter,
    ) -> Result<(), TaskError> {
        let task = owned_task_by_id(owner_user_id, task_id, &mut *ext_cxn, task_read).await?;
        task_write
            .delete_task(task.id, &mut *ext_cxn)
            .await
            .context("deleting a task")?;

        Ok(())
    }

    async fn toggle_completion(
        &self,
        owner_user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
        task_write: &impl TaskWriter,
    ) -> Result<TodoTask, TaskError> {
        let task = owned_task_by_id(owner_user_id, task_id, &mut *ext_cxn, task_read).await?;
        let flipped = !task.completed;
        task_write
            .set_completion(task.id, flipped, &mut *ext_cxn)
            .await
            .context("toggling a task's completion state")?;

        Ok(TodoTask {
            completed: flipped,
            ..task
        })
    }

    async fn tasks_for_user(
        &self,
        owner_user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        u_detect: &impl domain::user::driven_ports::DetectUser,
        task_read: &impl TaskReader,
    ) -> Result<Vec<TodoTask>, TaskError> {
        domain::user::verify_user_exists(owner_user_id, &mut *ext_cxn, u_detect).await?;
        let tasks = task_read
            .tasks_for_user(owner_user_id, &mut *ext_cxn)
            .await?;

        Ok(tasks)
    }

    async fn tasks_by_completion(
        &self,
        owner_user_id: i32,
        completed: bool,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<Vec<TodoTask>, TaskError> {
        let tasks = task_read
            .tasks_by_completion(owner_user_id, completed, &mut *ext_cxn)
            .await?;

        Ok(tasks)
    }

    async fn tasks_by_priority(
        &self,
        owner_user_id: i32,
        priority: Priority,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<Vec<TodoTask>, TaskError> {
        let tasks = task_read
            .tasks_by_priority(owner_user_id, priority, &mut *ext_cxn)
            .await?;

        Ok(tasks)
    }

    async fn tasks_by_category(
        &self,
        owner_user_id: i32,
        category: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<Vec<TodoTask>, TaskError> {
        let tasks = task_read
            .tasks_by_category(owner_user_id, category, &mut *ext_cxn)
            .await?;

        Ok(tasks)
    }

    async fn completed_count(
        &self,
        owner_user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<i64, TaskError> {
        let count = task_read
            .count_by_completion(owner_user_id, true, &mut *ext_cxn)
            .await?;

        Ok(count)
    }

    async fn pending_count(
        &self,
        owner_user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<i64, TaskError> {
        let count = task_read
            .count_by_completion(owner_user_id, false, &mut *ext_cxn)
            .await?;

        Ok(count)
    }
}
