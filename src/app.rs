use crate::handlers;
use crate::state::AppState;
use axum::{Router, routing::get};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/habits",
            get(handlers::list_habits).post(handlers::create_habit),
        )
        .route(
            "/api/checks",
            get(handlers::list_habit_checks).post(handlers::check_habit),
        )
        .route("/api/habits-and-checks", get(handlers::habits_and_checks))
        .route("/api/checklist", get(handlers::checklist))
        .route("/api/heatmap", get(handlers::get_heatmap))
        .with_state(state)
}
