use crate::aggregate::{checklist_rows, heatmap, per_habit_day_state};
use crate::calendar::{
    CHECKLIST_DAYS, HEATMAP_DAYS, HEATMAP_WEEKS, last_n_days, last_n_days_as_weeks, parse_day,
};
use crate::errors::{AppError, LedgerError};
use crate::ledger::CheckLedger;
use crate::models::{
    Check, CheckHabitRequest, ChecklistQuery, ChecklistResponse, CreateHabitRequest, Habit,
    HabitChecksQuery, HabitsAndChecks, HeatmapResponse, OwnerQuery,
};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
};

/// Longest rolling window the checklist endpoint will build.
const MAX_CHECKLIST_DAYS: usize = 366;

pub async fn list_habits(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Json<Vec<Habit>> {
    let data = state.data.lock().await;
    Json(data.list_habits(&query.user_id))
}

pub async fn create_habit(
    State(state): State<AppState>,
    Json(payload): Json<CreateHabitRequest>,
) -> Result<Json<Option<Habit>>, AppError> {
    let habit = state
        .create_habit(&payload.user_id, &payload.habit_name)
        .await?;
    Ok(Json(habit))
}

pub async fn check_habit(
    State(state): State<AppState>,
    Json(payload): Json<CheckHabitRequest>,
) -> Result<Json<Option<Check>>, AppError> {
    let day = parse_day(&payload.date)
        .ok_or_else(|| LedgerError::InvalidDay(payload.date.clone()))?;
    let check = state
        .upsert_check(&payload.user_id, &payload.habit_id, day, payload.done)
        .await?;
    Ok(Json(check))
}

pub async fn list_habit_checks(
    State(state): State<AppState>,
    Query(query): Query<HabitChecksQuery>,
) -> Json<Vec<Check>> {
    let data = state.data.lock().await;
    Json(data.checks_for_habit(&query.habit_id))
}

pub async fn habits_and_checks(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<HabitsAndChecks>, AppError> {
    let read = state.list_habits_and_checks(&query.user_id).await?;
    Ok(Json(read))
}

pub async fn checklist(
    State(state): State<AppState>,
    Query(query): Query<ChecklistQuery>,
) -> Result<Json<ChecklistResponse>, AppError> {
    let days = query.days.unwrap_or(CHECKLIST_DAYS);
    if days == 0 || days > MAX_CHECKLIST_DAYS {
        return Err(AppError::bad_request(format!(
            "days must be between 1 and {MAX_CHECKLIST_DAYS}"
        )));
    }

    let window = last_n_days(days);
    let read = state.list_habits_and_checks(&query.user_id).await?;
    let day_state = per_habit_day_state(&read.habits, &read.checks, &window);
    let rows = checklist_rows(&read.habits, &day_state, &window);
    Ok(Json(ChecklistResponse { days: window, rows }))
}

pub async fn get_heatmap(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<HeatmapResponse>, AppError> {
    let weeks = last_n_days_as_weeks(HEATMAP_DAYS, HEATMAP_WEEKS);
    let read = state.list_habits_and_checks(&query.user_id).await?;
    Ok(Json(HeatmapResponse {
        weeks: heatmap(&read.checks, &weeks),
    }))
}
