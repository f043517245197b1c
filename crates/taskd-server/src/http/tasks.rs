//! Task CRUD and completion handlers.
//!
//! Every date-bearing request goes through the recurrence engine's
//! normalizer before persistence; handlers read the clock exactly once and
//! pass the resulting day down, so the storage and engine layers stay
//! clock-free.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use taskd_core::models::{CalendarDate, CompletionResult, NewTaskData, Task, UpdateTaskData};
use taskd_core::recurrence;
use taskd_core::repository::TaskRepository;

use crate::app::AppState;
use crate::error::ApiError;

/// Upper bound on list/search responses.
const LIST_LIMIT: i64 = 50;

/// Date search strings use the human form `DD.MM.YYYY`.
const SEARCH_DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Deserialize)]
pub struct TaskInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub repeat: String,
}

#[derive(Deserialize)]
pub struct IdQuery {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Serialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
}

fn require_id(id: Option<String>) -> Result<Uuid, ApiError> {
    let id = id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("id not specified".to_string()))?;
    Uuid::parse_str(&id).map_err(|_| ApiError::BadRequest("invalid task id".to_string()))
}

fn require_title(title: &str) -> Result<(), ApiError> {
    if title.is_empty() {
        return Err(ApiError::BadRequest("the title is empty".to_string()));
    }
    Ok(())
}

/// POST /api/task
pub async fn add_task(
    State(state): State<Arc<AppState>>,
    Json(input): Json<TaskInput>,
) -> Result<Json<Value>, ApiError> {
    require_title(&input.title)?;

    let date = recurrence::normalize_date(&input.date, &input.repeat, CalendarDate::today())
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let task = state
        .repo
        .add_task(NewTaskData {
            date,
            title: input.title,
            comment: input.comment,
            repeat: input.repeat,
        })
        .await?;

    info!(id = %task.id, title = %task.title, "task created");
    Ok(Json(json!({ "id": task.id })))
}

/// GET /api/task?id=task_id
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> Result<Json<Task>, ApiError> {
    let id = require_id(query.id)?;

    let task = state
        .repo
        .find_task_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("task not found".to_string()))?;

    Ok(Json(task))
}

/// PUT /api/task
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Json(input): Json<TaskInput>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id(input.id)?;
    require_title(&input.title)?;

    let date = recurrence::normalize_date(&input.date, &input.repeat, CalendarDate::today())
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    state
        .repo
        .update_task(UpdateTaskData {
            id,
            date,
            title: input.title,
            comment: input.comment,
            repeat: input.repeat,
        })
        .await?;

    info!(%id, "task updated");
    Ok(Json(json!({})))
}

/// GET /api/tasks?search=query
///
/// A search string in `DD.MM.YYYY` form filters by date; anything else
/// filters title and comment by substring.
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<TaskList>, ApiError> {
    let search = query.search.unwrap_or_default();

    let tasks = if search.is_empty() {
        state.repo.list_tasks(LIST_LIMIT).await?
    } else if let Ok(date) = NaiveDate::parse_from_str(&search, SEARCH_DATE_FORMAT) {
        debug!(%search, "searching tasks by date");
        state
            .repo
            .find_tasks_by_date(CalendarDate::from(date), LIST_LIMIT)
            .await?
    } else {
        debug!(%search, "searching tasks by text");
        state.repo.find_tasks_by_text(&search, LIST_LIMIT).await?
    };

    Ok(Json(TaskList { tasks }))
}

/// POST /api/task/done?id=task_id
///
/// One-shot tasks are deleted; recurring tasks move to their next
/// occurrence.
pub async fn complete_task(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id(query.id)?;

    let result = state.repo.complete_task(id, CalendarDate::today()).await?;
    match &result {
        CompletionResult::Finished(task) => {
            info!(%id, title = %task.title, "one-shot task completed and removed");
        }
        CompletionResult::Rescheduled(task) => {
            info!(%id, next = %task.date, "recurring task completed and rescheduled");
        }
    }

    Ok(Json(json!({})))
}

/// DELETE /api/task?id=task_id
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id(query.id)?;

    state.repo.delete_task(id).await?;
    info!(%id, "task deleted");
    Ok(Json(json!({})))
}
