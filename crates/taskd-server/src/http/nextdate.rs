//! Direct recurrence query — GET /api/nextdate
//!
//! Public endpoint for previewing the engine: takes `now`, `date`, and
//! `repeat` as query parameters and returns the computed next date as plain
//! text. `now` defaults to the current day when omitted, which is the only
//! clock read on this path.

use axum::extract::Query;
use serde::Deserialize;
use tracing::debug;

use taskd_core::models::CalendarDate;
use taskd_core::recurrence;

use crate::error::ApiError;

#[derive(Deserialize)]
pub struct NextDateQuery {
    #[serde(default)]
    pub now: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub repeat: Option<String>,
}

/// GET /api/nextdate?now=YYYYMMDD&date=YYYYMMDD&repeat=rule
pub async fn next_date(Query(query): Query<NextDateQuery>) -> Result<String, ApiError> {
    let (Some(date), Some(repeat)) = (query.date, query.repeat) else {
        return Err(ApiError::BadRequest(
            "date and repeat are required".to_string(),
        ));
    };

    let after = match query.now.as_deref() {
        Some(now) if !now.is_empty() => now
            .parse::<CalendarDate>()
            .map_err(|_| ApiError::BadRequest("invalid now format".to_string()))?,
        _ => CalendarDate::today(),
    };

    let next = recurrence::next_date(after, &date, &repeat)
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    debug!(%date, %repeat, %next, "next date calculated");
    Ok(next.to_string())
}
