use async_trait::async_trait;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{CalendarDate, CompletionResult, NewTaskData, Task, UpdateTaskData};
use crate::recurrence::{self, RepeatRule};

/// Data access layer for scheduled tasks.
#[async_trait]
pub trait TaskRepository {
    async fn add_task(&self, data: NewTaskData) -> Result<Task, CoreError>;
    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError>;
    /// Upcoming-first listing, bounded by `limit`.
    async fn list_tasks(&self, limit: i64) -> Result<Vec<Task>, CoreError>;
    /// Substring search over title and comment.
    async fn find_tasks_by_text(&self, search: &str, limit: i64) -> Result<Vec<Task>, CoreError>;
    async fn find_tasks_by_date(
        &self,
        date: CalendarDate,
        limit: i64,
    ) -> Result<Vec<Task>, CoreError>;
    /// Full-record update; `NotFound` when the id does not exist.
    async fn update_task(&self, data: UpdateTaskData) -> Result<Task, CoreError>;
    /// Moves a task to a new date, leaving every other field untouched.
    async fn reschedule_task(&self, id: Uuid, date: CalendarDate) -> Result<(), CoreError>;
    async fn delete_task(&self, id: Uuid) -> Result<(), CoreError>;
    /// Completes a task: one-shot tasks are deleted, recurring tasks advance
    /// to their next occurrence after `today`.
    async fn complete_task(
        &self,
        id: Uuid,
        today: CalendarDate,
    ) -> Result<CompletionResult, CoreError>;
}

/// SQLite implementation of the repository pattern.
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl TaskRepository for SqliteRepository {
    async fn add_task(&self, data: NewTaskData) -> Result<Task, CoreError> {
        let task = Task {
            id: Uuid::now_v7(),
            date: data.date,
            title: data.title,
            comment: data.comment,
            repeat: data.repeat,
        };

        sqlx::query(
            r#"INSERT INTO tasks (id, date, title, comment, repeat)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(task.id)
        .bind(task.date)
        .bind(&task.title)
        .bind(&task.comment)
        .bind(&task.repeat)
        .execute(&self.pool)
        .await?;

        Ok(task)
    }

    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError> {
        let task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn list_tasks(&self, limit: i64) -> Result<Vec<Task>, CoreError> {
        let tasks = sqlx::query_as(
            r#"SELECT * FROM tasks
            ORDER BY date ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn find_tasks_by_text(&self, search: &str, limit: i64) -> Result<Vec<Task>, CoreError> {
        let pattern = format!("%{search}%");
        let tasks = sqlx::query_as(
            r#"SELECT * FROM tasks
            WHERE title LIKE $1 OR comment LIKE $1
            ORDER BY date ASC
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn find_tasks_by_date(
        &self,
        date: CalendarDate,
        limit: i64,
    ) -> Result<Vec<Task>, CoreError> {
        let tasks = sqlx::query_as(
            r#"SELECT * FROM tasks
            WHERE date = $1
            ORDER BY date ASC
            LIMIT $2
            "#,
        )
        .bind(date)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn update_task(&self, data: UpdateTaskData) -> Result<Task, CoreError> {
        let result = sqlx::query(
            r#"UPDATE tasks
            SET date = $1, title = $2, comment = $3, repeat = $4
            WHERE id = $5
            "#,
        )
        .bind(data.date)
        .bind(&data.title)
        .bind(&data.comment)
        .bind(&data.repeat)
        .bind(data.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(data.id.to_string()));
        }

        Ok(Task {
            id: data.id,
            date: data.date,
            title: data.title,
            comment: data.comment,
            repeat: data.repeat,
        })
    }

    async fn reschedule_task(&self, id: Uuid, date: CalendarDate) -> Result<(), CoreError> {
        let result = sqlx::query("UPDATE tasks SET date = $1 WHERE id = $2")
            .bind(date)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn complete_task(
        &self,
        id: Uuid,
        today: CalendarDate,
    ) -> Result<CompletionResult, CoreError> {
        let task = self
            .find_task_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        if task.repeat.trim().is_empty() {
            self.delete_task(id).await?;
            return Ok(CompletionResult::Finished(task));
        }

        let rule: RepeatRule = task.repeat.parse()?;
        let next = recurrence::next_occurrence(today, task.date, &rule)?;
        self.reschedule_task(id, next).await?;

        Ok(CompletionResult::Rescheduled(Task { date: next, ..task }))
    }
}
