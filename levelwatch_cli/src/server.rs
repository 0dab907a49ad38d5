//! HTTP surface for `levelwatch serve`: liveness, health, the parsed class
//! listing, and two token-guarded on-demand endpoints.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;
use levelwatch_lib::{Health, Monitor, Notifier, SmtpNotifier};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

type AppState = Arc<Monitor>;

#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    token: String,
}

pub fn build_router(monitor: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/test", get(test))
        .route("/health", get(health))
        .route("/classes", get(classes))
        .route("/level4", get(classes))
        .route("/smtp-test", get(smtp_test))
        .route("/scrape-and-email", get(scrape_and_email))
        .layer(TraceLayer::new_for_http())
        .with_state(monitor)
}

fn user_agent(headers: &HeaderMap) -> &str {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// On-demand endpoints are open only when a non-empty token is configured
/// and the caller supplies it.
fn is_allowed(monitor: &Monitor, query: &TokenQuery) -> bool {
    matches!(&monitor.config().test_token, Some(token) if *token == query.token)
}

async fn root() -> &'static str {
    "levelwatch is alive!"
}

async fn test(headers: HeaderMap) -> &'static str {
    tracing::info!("/test HIT UA='{}'", user_agent(&headers));
    "levelwatch test endpoint is alive!"
}

async fn health(State(monitor): State<AppState>, headers: HeaderMap) -> (StatusCode, String) {
    let health = monitor
        .state()
        .health(Local::now(), monitor.config().stale_after);
    tracing::info!("/health HIT UA='{}' {:?}", user_agent(&headers), health);

    match health {
        Health::Healthy { age } => (
            StatusCode::OK,
            format!("Healthy: last success {:.1} minutes ago", age.as_secs_f64() / 60.0),
        ),
        Health::Stale { age: Some(age) } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Stale: {:.1} minutes since last success", age.as_secs_f64() / 60.0),
        ),
        Health::Stale { age: None } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Stale: no successful check yet".to_string(),
        ),
    }
}

async fn classes(State(monitor): State<AppState>) -> Response {
    match monitor.fetch_classes(Local::now().date_naive()).await {
        Ok(classes) => Json(json!({
            "level": monitor.config().target_level,
            "count": classes.len(),
            "classes": classes,
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!("/classes ERROR: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn smtp_test(
    State(monitor): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> (StatusCode, String) {
    if !is_allowed(&monitor, &query) {
        return (StatusCode::FORBIDDEN, "Forbidden".to_string());
    }
    let config = monitor.config();
    let notifier = SmtpNotifier::new(config.smtp.clone(), config.recipients.clone());
    let body = format!(
        "Hello from levelwatch at {}.\nThis verifies SMTP config.",
        Local::now().to_rfc3339()
    );
    match notifier.send("SMTP Test", &body).await {
        Ok(()) => (StatusCode::OK, "OK: sent".to_string()),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("ERROR: {}", e)),
    }
}

async fn scrape_and_email(
    State(monitor): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> (StatusCode, String) {
    if !is_allowed(&monitor, &query) {
        return (StatusCode::FORBIDDEN, "Forbidden".to_string());
    }
    let report = monitor.run_check_once().await;

    let now = Local::now();
    let age = monitor
        .state()
        .since_last_success(now)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|| "never".to_string());
    let subject = format!("levelwatch manual test @ {}", now.format("%Y-%m-%d %H:%M:%S"));
    let body = format!(
        "On-demand scrape result:\n\n{}\n\nSummary:\n{}\n\nHealth age (sec): {}\nURL checked: {}\n",
        report.result_text,
        report.details,
        age,
        monitor.config().url
    );

    match monitor.alerter().send_plain(&subject, &body).await {
        Ok(()) => (
            StatusCode::OK,
            format!("OK: sent via {}\n\n{}\n", monitor.alerter().channel(), report.result_text),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("ERROR: {}\n\n{}\n", e, report.result_text),
        ),
    }
}
