use axum::Json;
use axum::extract::{Query, State};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::AppState;
use crate::api::error::ApiError;
use crate::mock::MockDocument;
use crate::output::summary_json;
use crate::pipeline::{FetchOutcome, fetch_daily_table, parse_column_list};
use crate::summary::summarize;

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub device_id: String,
    /// `YYYY-MM-DD`; today (local) when absent.
    pub date: Option<String>,
    /// Comma separated SEMS column names.
    pub columns: Option<String>,
}

impl DayQuery {
    fn date(&self) -> Result<NaiveDate, ApiError> {
        match self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .map_err(|_| ApiError::InvalidInput(format!("invalid date '{d}', expected YYYY-MM-DD"))),
            None => Ok(Local::now().date_naive()),
        }
    }
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "SEMS daily summary API is running" }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Summary of the mock document; `{}` when it is missing or empty.
pub async fn status(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let path = state.mock_path.clone();
    let doc = tokio::task::spawn_blocking(move || MockDocument::load(path))
        .await
        .map_err(anyhow::Error::from)??;

    let table = doc.into_table();
    Ok(Json(summary_json(summarize(&table).as_ref())))
}

async fn fetch(state: &AppState, query: &DayQuery) -> Result<FetchOutcome, ApiError> {
    let date = query.date()?;
    let device_id = query.device_id.trim();
    if device_id.is_empty() {
        return Err(ApiError::InvalidInput("device_id must not be empty".into()));
    }
    let credentials = state.credentials.as_ref().ok_or(ApiError::NotConfigured)?;
    let columns = parse_column_list(query.columns.as_deref());

    let outcome = fetch_daily_table(state.sems.as_ref(), credentials, device_id, date, &columns).await?;
    Ok(outcome)
}

/// Live daily summary for one inverter.
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Value>, ApiError> {
    let outcome = fetch(&state, &query).await?;
    Ok(Json(summary_json(outcome.summary().as_ref())))
}

/// Aligned table plus per-column diagnostics, for charts.
pub async fn table(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<FetchOutcome>, ApiError> {
    Ok(Json(fetch(&state, &query).await?))
}
