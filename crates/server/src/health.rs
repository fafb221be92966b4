use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    pub model_bound: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: &'static str,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// The service is healthy whenever it can answer; an unbound model degrades
/// chat but is reported rather than failed.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let response = HealthResponse {
        status: "ok",
        model: if state.model_bound { "bound" } else { "unbound" },
        checked_at: Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, Json(response))
}

#[cfg(test)]
mod tests {
    use axum::extract::State;

    use super::{health, HealthState};

    #[tokio::test]
    async fn health_reports_model_binding() {
        let (status, body) = health(State(HealthState { model_bound: false })).await;
        assert_eq!(status.as_u16(), 200);
        assert_eq!(body.model, "unbound");

        let (_, body) = health(State(HealthState { model_bound: true })).await;
        assert_eq!(body.model, "bound");
    }
}
