use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::types::{AppState, CycleResponse};

/// Query params for the cycle endpoint
#[derive(Debug, Default, Deserialize)]
pub struct CycleQueryParams {
    /// "json" for a structured response, plain text otherwise
    pub format: Option<String>,
}

/// Routes exposed by the agent service
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(run_cycle))
        .route("/cycle", post(run_cycle))
        .route("/state", get(get_state))
        .route("/health", get(health))
        .with_state(state)
}

/// POST /cycle - Run one decision cycle
///
/// Always answers 200: cycle problems are reported in the body. An
/// unreadable query string falls back to the text format.
pub async fn run_cycle(
    State(state): State<Arc<AppState>>,
    params: Result<Query<CycleQueryParams>, QueryRejection>,
) -> Response {
    let format = match params {
        Ok(Query(params)) => params.format,
        Err(e) => {
            debug!("Ignoring query string: {}", e);
            None
        }
    };

    let report = {
        let mut agent = state.agent.lock().await;
        agent.run_cycle().await
    };

    match format.as_deref() {
        Some("json") => (StatusCode::OK, Json(CycleResponse::from(report))).into_response(),
        _ => (StatusCode::OK, report.summary()).into_response(),
    }
}

/// GET /state - Current persisted memory
pub async fn get_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let agent = state.agent.lock().await;
    Json(agent.current_state())
}

/// GET /health - Liveness probe
pub async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, AgentConfig, SUMMARY_HEADER};
    use crate::broker::ScriptedBroker;
    use crate::store::MemoryStateStore;

    fn app_state(broker: ScriptedBroker) -> Arc<AppState> {
        let agent = Agent::seeded(
            AgentConfig::default(),
            Box::new(MemoryStateStore::new()),
            Box::new(broker),
            7,
        )
        .unwrap();
        Arc::new(AppState::new(agent))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_cycle_returns_text_summary() {
        let state = app_state(
            ScriptedBroker::new()
                .with_price(23_200.0)
                .with_fill("ORD_9", 110.0, 5_500.0),
        );

        let response =
            run_cycle(State(state.clone()), Ok(Query(CycleQueryParams::default()))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.starts_with(SUMMARY_HEADER));
        assert!(body.contains("OPEN: Trade 1 placed (BUY_CE)."));
        assert!(body.ends_with("FINAL CAPITAL: ₹4500.00"));
    }

    #[tokio::test]
    async fn test_failed_cycle_is_still_ok() {
        // No price scripted and connect fails
        let state = app_state(ScriptedBroker::new().failing_connect());

        let response = run_cycle(State(state), Ok(Query(CycleQueryParams::default()))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("ERROR: Price fetch failed."));
    }

    #[tokio::test]
    async fn test_cycle_json_format() {
        let state = app_state(ScriptedBroker::new().with_price(22_000.0).with_rejection("margin"));

        let response = run_cycle(
            State(state),
            Ok(Query(CycleQueryParams {
                format: Some("json".to_string()),
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["finalCapital"], 10_000.0);
        assert_eq!(json["saveFailed"], false);
        assert_eq!(json["state"]["strategy_version"], 1.0);
    }

    #[tokio::test]
    async fn test_unreadable_query_falls_back_to_text() {
        let state = app_state(ScriptedBroker::new().with_price(22_000.0).with_rejection("margin"));

        let uri: axum::http::Uri = "/cycle?format=json&format=text".parse().unwrap();
        let params = Query::<CycleQueryParams>::try_from_uri(&uri);
        assert!(params.is_err());

        let response = run_cycle(State(state), params).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.starts_with(SUMMARY_HEADER));
    }

    #[tokio::test]
    async fn test_state_reflects_last_cycle() {
        let state = app_state(
            ScriptedBroker::new()
                .with_price(22_500.0)
                .with_fill("ORD_3", 150.0, 7_500.0),
        );

        run_cycle(State(state.clone()), Ok(Query(CycleQueryParams::default()))).await;

        let response = get_state(State(state)).await.into_response();
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["trade_id_counter"], 1);
        assert_eq!(json["positions"][0]["type"], "BUY_PE");
        assert_eq!(json["capital"], 2_500.0);
    }
}
