pub mod error;
pub mod journal;
pub mod users;

use crate::db::JournalRepo;
use journal_core::clock::Clock;
use std::sync::Arc;

pub use error::{AppError, ErrorResponse};
pub use journal::journal_routes;
pub use users::user_routes;

/// Shared state for every handler
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<JournalRepo>,
    /// Source of "today" for default entry dates and streaks
    pub clock: Arc<dyn Clock>,
    pub session_expiry_days: i64,
}
