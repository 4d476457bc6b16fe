use crate::infra::AppState;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use survey_tally::surveys::{
    survey_router, ReceiptPublisher, SubmitterId, SurveyService, SurveyStore,
};

pub(crate) fn with_survey_routes<S, P>(service: Arc<SurveyService<S, P>>) -> axum::Router
where
    S: SurveyStore + 'static,
    P: ReceiptPublisher + 'static,
{
    survey_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/submitters/:submitter_id/rating",
            axum::routing::get(submitter_rating_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn submitter_rating_endpoint(
    Extension(state): Extension<AppState>,
    Path(submitter_id): Path<String>,
) -> Response {
    let submitter_id = SubmitterId(submitter_id);
    match state.receipts.latest(&submitter_id) {
        Some(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        None => {
            let payload = json!({
                "submitter_id": submitter_id,
                "error": "no submissions recorded for submitter",
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryReceiptLog;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicBool;
    use survey_tally::surveys::{InMemorySurveyStore, QuestionId, SurveyId};
    use tower::ServiceExt;

    type TestService = SurveyService<InMemorySurveyStore, InMemoryReceiptLog>;

    fn app(ready: bool) -> (axum::Router, Arc<TestService>) {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let receipts = Arc::new(InMemoryReceiptLog::default());
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(handle),
            receipts: receipts.clone(),
        };
        let service = Arc::new(SurveyService::new(
            Arc::new(InMemorySurveyStore::new()),
            receipts,
        ));
        let router = with_survey_routes(service.clone()).layer(Extension(state));
        (router, service)
    }

    async fn get(router: axum::Router, uri: &str) -> Response {
        router
            .oneshot(Request::get(uri).body(Body::empty()).expect("request builds"))
            .await
            .expect("router responds")
    }

    #[tokio::test]
    async fn readiness_tracks_the_flag() {
        let (router, _) = app(false);
        assert_eq!(get(router, "/ready").await.status(), StatusCode::SERVICE_UNAVAILABLE);

        let (router, _) = app(true);
        assert_eq!(get(router.clone(), "/ready").await.status(), StatusCode::OK);
        assert_eq!(get(router, "/health").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn submitter_rating_reads_the_receipt_log() {
        let (router, service) = app(true);
        service
            .create_survey(
                SurveyId(1),
                BTreeMap::from([(QuestionId(1), "Q1".to_string())]),
                BTreeMap::from([(QuestionId(1), 3)]),
            )
            .expect("survey created");
        service
            .submit_survey(
                SurveyId(1),
                SubmitterId::new("alice"),
                BTreeMap::from([(QuestionId(1), 4)]),
            )
            .expect("submission");

        let found = get(router.clone(), "/api/v1/submitters/alice/rating").await;
        assert_eq!(found.status(), StatusCode::OK);
        let body = axum::body::to_bytes(found.into_body(), 1024)
            .await
            .expect("read body");
        let value: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
        assert_eq!(value["rating"], 12);
        assert_eq!(value["survey_id"], 1);

        let missing = get(router, "/api/v1/submitters/bob/rating").await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
