use super::users::MessageResponse;
use super::{AppError, AppState};
use crate::auth::RequireAuth;
use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use journal_core::date::{ISO_FORMAT, parse_iso};
use journal_core::entry::{EntryId, EntryPatch, Field, JournalEntry};
use journal_core::streak::{StreakSummary, summarize};
use journal_core::validate::{
    EntryCandidate, ValidationRules, Violation, validate_entry, validate_patch,
};
use serde::Deserialize;
use tracing::{debug, info};

/// Body of create and update calls.
///
/// Every field is optional at the wire level so missing or malformed values
/// come back as field violations rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct EntryRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Query params for search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// Create journal routes
pub fn journal_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_entries).post(create_entry))
        .route("/search", get(search_entries))
        .route("/streak", get(get_streak))
        .route(
            "/{id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .with_state(state)
}

/// GET /api/journal
async fn list_entries(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<JournalEntry>>, AppError> {
    Ok(Json(state.repo.list_entries(auth.user.id)?))
}

/// GET /api/journal/search?query=
async fn search_entries(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<JournalEntry>>, AppError> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("Search query is required".to_string()))?;

    Ok(Json(state.repo.search_entries(auth.user.id, query)?))
}

/// GET /api/journal/streak
async fn get_streak(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<StreakSummary>, AppError> {
    let dates = state.repo.entry_dates(auth.user.id)?;
    let today = state.clock.today();
    let summary = summarize(&dates, today);
    debug!(
        "Streak for user {}: {} day(s) as of {}",
        auth.user.id, summary.current_streak, today
    );
    Ok(Json(summary))
}

/// GET /api/journal/{id}
async fn get_entry(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<EntryId>,
) -> Result<Json<JournalEntry>, AppError> {
    state
        .repo
        .get_entry(auth.user.id, id)?
        .map(Json)
        .ok_or_else(AppError::entry_not_found)
}

/// POST /api/journal
async fn create_entry(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(body): Json<EntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let title = body.title.unwrap_or_default();
    let content = body.content.unwrap_or_default();
    let date = body
        .date
        .unwrap_or_else(|| state.clock.today().format(ISO_FORMAT).to_string());

    let report = validate_entry(
        &EntryCandidate {
            title: &title,
            content: &content,
            date: Some(&date),
        },
        &ValidationRules::default(),
    );
    if !report.valid {
        return Err(report.into());
    }
    let date = parse_iso(date.trim())
        .ok_or_else(|| AppError::BadRequest(format!("Invalid date '{date}'")))?;

    let entry = state
        .repo
        .create_entry(auth.user.id, title.trim(), &content, date)?;
    info!("User {} created entry {}", auth.user.id, entry.id);

    Ok((StatusCode::CREATED, Json(entry)))
}

/// PUT /api/journal/{id}
async fn update_entry(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<EntryId>,
    Json(body): Json<EntryRequest>,
) -> Result<Json<JournalEntry>, AppError> {
    let mut patch = EntryPatch {
        title: body.title.map(|t| t.trim().to_string()),
        content: body.content,
        date: None,
    };

    let mut report = validate_patch(&patch, &ValidationRules::default());
    if let Some(raw) = body.date {
        match parse_iso(raw.trim()) {
            Some(date) => patch.date = Some(date),
            None => {
                report
                    .violations
                    .insert(Field::Date, Violation::InvalidDate { value: raw });
                report.valid = false;
            }
        }
    }
    if !report.valid {
        return Err(report.into());
    }

    let entry = state
        .repo
        .update_entry(auth.user.id, id, &patch)?
        .ok_or_else(AppError::entry_not_found)?;
    debug!("User {} updated entry {}", auth.user.id, id);

    Ok(Json(entry))
}

/// DELETE /api/journal/{id}
async fn delete_entry(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<EntryId>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.repo.delete_entry(auth.user.id, id)? {
        return Err(AppError::entry_not_found());
    }
    info!("User {} deleted entry {}", auth.user.id, id);
    Ok(Json(MessageResponse {
        message: "Entry removed".to_string(),
    }))
}
