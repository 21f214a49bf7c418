//! Arlo client engine: HTTP client, poller, IO thread and sheet export.
mod client;
mod engine;
mod export;
mod poll;
pub mod sheets;
mod types;

pub use client::{ApiSettings, ArloClient, AuditApi, RequestBody, RequestOptions};
pub use engine::{EngineHandle, EngineSettings};
pub use export::{ensure_output_dir, sheet_file_name, write_atomic, write_sheet, ExportError};
pub use poll::{poll_until, spawn_poll, PollHandle, PollSettings};
pub use types::{ApiError, EngineEvent, PollError, RequestError};
