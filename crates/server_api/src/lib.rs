use chrono::NaiveDate;
use shared::{
    error::{ApiError, ErrorCode},
    grouping::group_by_exercise,
    protocol::{DashboardQuery, DashboardView, WorkoutRow},
};
use storage::{Storage, WorkoutRowSource};
use tracing::{debug, error};

pub mod session;
pub mod view;

pub use session::{mint_session_token, verify_session_token, AuthSession, SessionConfig};
pub use view::{dashboard_path, format_display_date, render_text};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub session: SessionConfig,
}

impl ApiContext {
    pub fn resolve_session(&self, bearer_token: Option<&str>) -> Option<AuthSession> {
        verify_session_token(&self.session, bearer_token?)
    }
}

pub fn require_session(session: Option<&AuthSession>) -> Result<&AuthSession, ApiError> {
    session.ok_or_else(|| {
        debug!("rejecting request without an authenticated session");
        ApiError::unauthorized()
    })
}

/// Loads the flat set rows for the session's user on `date`.
///
/// The session is checked before the row source is touched.
pub async fn fetch_workout_rows<S>(
    source: &S,
    session: Option<&AuthSession>,
    date: NaiveDate,
) -> Result<Vec<WorkoutRow>, ApiError>
where
    S: WorkoutRowSource + ?Sized,
{
    let session = require_session(session)?;
    source
        .workout_rows_for_date(session.user_id(), date)
        .await
        .map_err(internal)
}

/// The requested calendar day, or `today` when the query names none.
pub fn resolve_date(query: &DashboardQuery, today: NaiveDate) -> Result<NaiveDate, ApiError> {
    let Some(raw) = query.date.as_deref() else {
        return Ok(today);
    };
    view::parse_date_param(raw).ok_or_else(|| {
        ApiError::new(
            ErrorCode::Validation,
            format!("date '{raw}' is not in YYYY-MM-DD form"),
        )
    })
}

/// Fetches and groups one day's workouts. A missing `date` means `today`.
pub async fn dashboard<S>(
    source: &S,
    session: Option<&AuthSession>,
    query: &DashboardQuery,
    today: NaiveDate,
) -> Result<DashboardView, ApiError>
where
    S: WorkoutRowSource + ?Sized,
{
    let session = require_session(session)?;
    let date = resolve_date(query, today)?;

    let rows = fetch_workout_rows(source, Some(session), date).await?;
    debug!(user_id = %session.user_id(), %date, rows = rows.len(), "loaded workout rows");

    Ok(DashboardView {
        date,
        formatted_date: format_display_date(date),
        exercises: group_by_exercise(&rows),
    })
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = ?err, "workout store failure");
    ApiError::new(ErrorCode::Internal, err.to_string())
}
