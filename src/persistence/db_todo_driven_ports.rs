use crate::domain;
use crate::domain::todo::{NewTask, Priority, TodoTask, UpdateTask};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::NaiveDate;
use sqlx::FromRow;

pub struct DbTaskReader;

#[derive(FromRow)]
struct TodoItemRow {
    id: i32,
    user_id: i32,
    title: String,
    description: Option<String>,
    category: String,
    priority: String,
    completed: bool,
    created_date: NaiveDate,
    due_date: Option<NaiveDate>,
}

impl TryFrom<TodoItemRow> for TodoTask {
    type Error = anyhow::Error;

    fn try_from(value: TodoItemRow) -> Result<Self, Self::Error> {
        let priority: Priority = value
            .priority
            .parse()
            .context("reading a task's priority from the database")?;

        Ok(TodoTask {
            id: value.id,
            owner_user_id: value.user_id,
            title: value.title,
            description: value.description,
            category: value.category,
            priority,
            completed: value.completed,
            created_date: value.created_date,
            due_date: value.due_date,
        })
    }
}

const TASK_COLUMNS: &str =
    "ti.id, ti.user_id, ti.title, ti.description, ti.category, ti.priority, \
     ti.completed, ti.created_date, ti.due_date";

fn rows_into_tasks(rows: Vec<TodoItemRow>) -> Result<Vec<TodoTask>, Error> {
    rows.into_iter().map(TodoTask::try_from).collect()
}

impl domain::todo::driven_ports::TaskReader for DbTaskReader {
    async fn task_by_id(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<TodoTask>, Error> {
        let mut cxn = ext_cxn
            .database_cxn()
            .await
            .context("acquiring connection to fetch a task")?;

        let todo_item = sqlx::query_as::<_, TodoItemRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM todo_item ti WHERE ti.id = $1"
        ))
        .bind(task_id)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("trying to fetch a todo item by ID")?;

        todo_item.map(TodoTask::try_from).transpose()
    }

    async fn tasks_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<TodoTask>, Error> {
        let mut cxn = ext_cxn
            .database_cxn()
            .await
            .context("acquiring connection to list tasks")?;

        let rows = sqlx::query_as::<_, TodoItemRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM todo_item ti WHERE ti.user_id = $1 \
             ORDER BY ti.created_date DESC, ti.id ASC"
        ))
        .bind(user_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch todo items for a user")?;

        rows_into_tasks(rows)
    }

    async fn tasks_by_completion(
        &self,
        user_id: i32,
        completed: bool,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<TodoTask>, Error> {
        let mut cxn = ext_cxn
            .database_cxn()
            .await
            .context("acquiring connection to filter tasks")?;

        let rows = sqlx::query_as::<_, TodoItemRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM todo_item ti \
             WHERE ti.user_id = $1 AND ti.completed = $2 \
             ORDER BY ti.created_date DESC, ti.id ASC"
        ))
        .bind(user_id)
        .bind(completed)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch todo items by completion state")?;

        rows_into_tasks(rows)
    }

    async fn tasks_by_priority(
        &self,
        user_id: i32,
        priority: Priority,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<TodoTask>, Error> {
        let mut cxn = ext_cxn
            .database_cxn()
            .await
            .context("acquiring connection to filter tasks")?;

        let rows = sqlx::query_as::<_, TodoItemRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM todo_item ti \
             WHERE ti.user_id = $1 AND ti.priority = $2 \
             ORDER BY ti.created_date DESC, ti.id ASC"
        ))
        .bind(user_id)
        .bind(priority.to_string())
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch todo items by priority")?;

        rows_into_tasks(rows)
    }

    async fn tasks_by_category(
        &self,
        user_id: i32,
        category: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<TodoTask>, Error> {
        let mut cxn = ext_cxn
            .database_cxn()
            .await
            .context("acquiring connection to filter tasks")?;

        let rows = sqlx::query_as::<_, TodoItemRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM todo_item ti \
             WHERE ti.user_id = $1 AND ti.category = $2 \
             ORDER BY ti.created_date DESC, ti.id ASC"
        ))
        .bind(user_id)
        .bind(category)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch todo items by category")?;

        rows_into_tasks(rows)
    }

    async fn count_by_completion(
        &self,
        user_id: i32,
        completed: bool,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i64, Error> {
        let mut cxn = ext_cxn
            .database_cxn()
            .await
            .context("acquiring connection to count tasks")?;

        let task_count = sqlx::query_as::<_, super::Count>(
            "SELECT count(*) FROM todo_item ti WHERE ti.user_id = $1 AND ti.completed = $2",
        )
        .bind(user_id)
        .bind(completed)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to count todo items by completion state")?;

        Ok(task_count.count())
    }
}

pub struct DbTaskWriter;

impl domain::todo::driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task_for_user(
        &self,
        user_id: i32,
        new_task: &NewTask,
        created_date: NaiveDate,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, Error> {
        let mut cxn = ext_cxn
            .database_cxn()
            .await
            .context("acquiring connection to insert a task")?;

        let new_id = sqlx::query_as::<_, super::NewId>(
            "INSERT INTO todo_item(user_id, title, description, category, priority, completed, created_date, due_date) \
             VALUES ($1, $2, $3, $4, $5, FALSE, $6, $7) RETURNING todo_item.id",
        )
        .bind(user_id)
        .bind(&new_task.title)
        .bind(&new_task.description)
        .bind(&new_task.category)
        .bind(new_task.priority.to_string())
        .bind(created_date)
        .bind(new_task.due_date)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to insert a new task into the database")?;

        Ok(new_id.id)
    }

    async fn update_task(
        &self,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn
            .database_cxn()
            .await
            .context("acquiring connection to update a task")?;

        sqlx::query(
            "UPDATE todo_item SET title = $1, description = $2, category = $3, priority = $4, due_date = $5 \
             WHERE id = $6",
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.category)
        .bind(update.priority.to_string())
        .bind(update.due_date)
        .bind(task_id)
        .execute(cxn.borrow_connection())
        .await
        .context("trying to update a task in the database")?;

        Ok(())
    }

    async fn set_completion(
        &self,
        task_id: i32,
        completed: bool,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn
            .database_cxn()
            .await
            .context("acquiring connection to set a task's completion state")?;

        sqlx::query("UPDATE todo_item SET completed = $1 WHERE id = $2")
            .bind(completed)
            .bind(task_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to update a task's completion state")?;

        Ok(())
    }

    async fn delete_task(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn
            .database_cxn()
            .await
            .context("acquiring connection to delete a task")?;

        sqlx::query("DELETE FROM todo_item WHERE id = $1")
            .bind(task_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a task from the database")?;

        Ok(())
    }
}
