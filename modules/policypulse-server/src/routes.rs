use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use policypulse_ingest::orchestrator::IngestionReport;

use crate::AppState;

#[derive(Deserialize)]
pub struct IngestParams {
    // Kept as a string so a bad value gets our envelope, not an
    // extractor rejection.
    days_back: Option<String>,
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// Run the daily ingestion. Invoked by the cron scheduler; guarded by
/// CRON_SECRET when one is configured.
pub async fn trigger_ingestion(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IngestParams>,
    headers: HeaderMap,
) -> Response {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if !authorized(auth, state.cron_secret.as_deref()) {
        return api_error(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Invalid or missing authorization.",
        );
    }

    let days_back = match parse_days_back(params.days_back.as_deref()) {
        Ok(d) => d,
        Err(message) => return api_error(StatusCode::BAD_REQUEST, "VALIDATION", &message),
    };

    info!(days_back, "Ingestion triggered");
    match state.orchestrator.run(days_back).await {
        Ok(report) => api_success(report_data(&report)),
        Err(e) => {
            error!(error = %e, "Ingestion run failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INGESTION_FAILED",
                &e.to_string(),
            )
        }
    }
}

/// Open when no secret is configured (local development); otherwise
/// the header must match `Bearer <secret>` exactly.
fn authorized(header: Option<&str>, secret: Option<&str>) -> bool {
    match (secret, header) {
        (None, _) => true,
        (Some(secret), Some(header)) => header == format!("Bearer {secret}"),
        (Some(_), None) => false,
    }
}

fn parse_days_back(raw: Option<&str>) -> Result<i64, String> {
    let Some(raw) = raw else {
        return Ok(1);
    };
    match raw.parse::<i64>() {
        Ok(d) if d >= 1 => Ok(d),
        _ => Err("days_back must be a positive integer".to_string()),
    }
}

fn report_data(report: &IngestionReport) -> serde_json::Value {
    json!({
        "federal_register": {
            "found": report.federal_register_found,
            "new": report.federal_register_new,
        },
        "ap_news": {
            "found": report.ap_news_found,
            "new": report.ap_news_new,
        },
        "digest_generated": report.digest_generated,
        "errors": report.errors,
    })
}

fn api_success(data: serde_json::Value) -> Response {
    (StatusCode::OK, Json(json!({ "success": true, "data": data }))).into_response()
}

fn api_error(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "success": false, "error": { "code": code, "message": message } })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_when_no_secret_is_configured() {
        assert!(authorized(None, None));
        assert!(authorized(Some("Bearer anything"), None));
    }

    #[test]
    fn requires_exact_bearer_match() {
        assert!(authorized(Some("Bearer s3cret"), Some("s3cret")));
        assert!(!authorized(Some("Bearer wrong"), Some("s3cret")));
        assert!(!authorized(Some("Basic s3cret"), Some("s3cret")));
        assert!(!authorized(Some("s3cret"), Some("s3cret")));
        assert!(!authorized(None, Some("s3cret")));
    }

    #[test]
    fn days_back_defaults_to_one() {
        assert_eq!(parse_days_back(None), Ok(1));
    }

    #[test]
    fn days_back_accepts_positive_integers() {
        assert_eq!(parse_days_back(Some("7")), Ok(7));
    }

    #[test]
    fn days_back_rejects_junk_and_non_positive() {
        assert!(parse_days_back(Some("abc")).is_err());
        assert!(parse_days_back(Some("0")).is_err());
        assert!(parse_days_back(Some("-3")).is_err());
        assert!(parse_days_back(Some("1.5")).is_err());
    }

    #[test]
    fn report_data_shape() {
        let report = IngestionReport {
            federal_register_found: 3,
            federal_register_new: 2,
            ap_news_found: 5,
            ap_news_new: 1,
            digest_generated: true,
            errors: vec!["one".to_string()],
        };
        let data = report_data(&report);
        assert_eq!(data["federal_register"]["found"], 3);
        assert_eq!(data["federal_register"]["new"], 2);
        assert_eq!(data["ap_news"]["found"], 5);
        assert_eq!(data["ap_news"]["new"], 1);
        assert_eq!(data["digest_generated"], true);
        assert_eq!(data["errors"][0], "one");
    }
}
