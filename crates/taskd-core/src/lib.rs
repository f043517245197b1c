//! # Taskd Core Library
//!
//! Storage layer and date-recurrence engine for the taskd personal
//! scheduler.
//!
//! ## Features
//!
//! - **Repetition Rules**: a compact textual grammar (`d 7`, `w 1,3,5`,
//!   `m -1 2,8`, `y`) parsed once into a typed [`recurrence::RepeatRule`]
//! - **Next-Occurrence Calculation**: deterministic, clock-free advancement
//!   of a task date past a caller-supplied reference date
//! - **Calendar Dates**: day-granularity [`models::CalendarDate`] values with
//!   a fixed `YYYYMMDD` canonical form on the wire and in SQLite
//! - **SQLite Storage**: task CRUD behind a repository trait, built on sqlx
//!
//! ## Core Modules
//!
//! - [`db`]: database connection and migration management
//! - [`models`]: core data structures and transfer objects
//! - [`recurrence`]: rule parsing and next-occurrence calculation
//! - [`repository`]: data access layer with the Repository pattern
//! - [`error`]: error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use taskd_core::{
//!     db,
//!     models::{CalendarDate, NewTaskData},
//!     repository::{SqliteRepository, TaskRepository},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), taskd_core::error::CoreError> {
//!     let pool = db::establish_connection("taskd.db").await?;
//!     let repo = SqliteRepository::new(pool);
//!
//!     let today = CalendarDate::today();
//!     let task = repo
//!         .add_task(NewTaskData {
//!             date: today,
//!             title: "Water the plants".to_string(),
//!             comment: String::new(),
//!             repeat: "d 3".to_string(),
//!         })
//!         .await?;
//!     println!("Created task: {}", task.title);
//!
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod models;
pub mod recurrence;
pub mod repository;
