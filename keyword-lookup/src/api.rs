use crate::config::Listener as ListenerConfig;
use crate::lookup::{KeywordLookup, LookupError};
use crate::types::{KeywordLookupResult, KeywordMetrics};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};

pub const KEYWORDS_ROUTE: &str = "/api/naver-keywords";

const KEYWORD_REQUIRED_MESSAGE: &str = "키워드가 필요합니다.";
const LOOKUP_FAILED_MESSAGE: &str = "키워드 데이터를 가져오는데 실패했습니다.";
const LOOKUP_FAILED_DETAILS: &str = "keyword data is temporarily unavailable";

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Routes for the keyword endpoint. Any `OPTIONS` request is answered by the CORS layer
/// with an empty 200. A panic while handling a request becomes the generic 500 response.
pub fn router(lookup: KeywordLookup) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route(KEYWORDS_ROUTE, get(get_keywords).post(post_keywords))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .with_state(lookup)
}

/// Serves the keyword API until `shutdown` resolves. `ready` is set once the listener is
/// bound.
pub async fn serve<F>(
    listener: &ListenerConfig,
    lookup: KeywordLookup,
    ready: Arc<AtomicBool>,
    shutdown: F,
) -> Result<(), ApiError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(lookup);
    let addr = format!("{}:{}", listener.host, listener.port);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "keyword API listening");
    ready.store(true, Ordering::Relaxed);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    ready.store(false, Ordering::Relaxed);
    Ok(())
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeywordListResponse {
    pub keyword_list: Vec<KeywordMetrics>,
}

impl From<KeywordLookupResult> for KeywordListResponse {
    fn from(result: KeywordLookupResult) -> Self {
        KeywordListResponse {
            keyword_list: result.into_keyword_list(),
        }
    }
}

impl IntoResponse for KeywordListResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Serialize)]
struct ApiErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'static str>,
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            LookupError::InvalidArgument => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse {
                    error: KEYWORD_REQUIRED_MESSAGE,
                    details: None,
                },
            ),
            LookupError::Exhausted => return lookup_failed_response(),
        };

        (status, Json(body)).into_response()
    }
}

fn lookup_failed_response() -> Response {
    let body = ApiErrorResponse {
        error: LOOKUP_FAILED_MESSAGE,
        details: Some(LOOKUP_FAILED_DETAILS),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = message, "keyword request handler panicked");

    lookup_failed_response()
}

#[derive(Deserialize, Debug, Default)]
struct Params {
    keyword: Option<String>,
}

async fn get_keywords(
    State(lookup): State<KeywordLookup>,
    Query(params): Query<Params>,
) -> Result<KeywordListResponse, LookupError> {
    let keyword = params.keyword.unwrap_or_default();
    lookup.lookup(&keyword).await.map(|result| result.into())
}

// A body that is not a JSON object with a keyword is treated like a missing keyword.
async fn post_keywords(
    State(lookup): State<KeywordLookup>,
    body: Bytes,
) -> Result<KeywordListResponse, LookupError> {
    let params: Params = serde_json::from_slice(&body).unwrap_or_default();
    let keyword = params.keyword.unwrap_or_default();
    lookup.lookup(&keyword).await.map(|result| result.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SyntheticKeywordGenerator;
    use crate::testutils::{CallLog, MockTier, panicking_tier, row};
    use crate::types::Source;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn lookup_with_fallbacks(log: &CallLog) -> KeywordLookup {
        KeywordLookup::new(vec![
            MockTier::failing(Source::Primary, log),
            MockTier::failing(Source::Secondary, log),
            Arc::new(SyntheticKeywordGenerator::new()),
        ])
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Response) {
        let response = app.oneshot(request).await.unwrap();
        (response.status(), response)
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_get_keywords() {
        let log = CallLog::default();
        let lookup = KeywordLookup::new(vec![MockTier::succeeding(
            Source::Primary,
            vec![row("seo", 1000), row("seo agency", 200)],
            &log,
        )]);

        let (status, response) = send(router(lookup), get("/api/naver-keywords?keyword=seo")).await;
        assert_eq!(status, StatusCode::OK);

        let body: KeywordListResponse = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(body.keyword_list.len(), 2);
        assert_eq!(body.keyword_list[0].keyword, "seo");
        assert_eq!(body.keyword_list[0].monthly_desktop_searches, 350);
        assert_eq!(body.keyword_list[1].keyword, "seo agency");
        assert!(body.keyword_list.iter().all(|r| r.source == Source::Primary));
    }

    #[tokio::test]
    async fn test_full_fallthrough_is_200() {
        let log = CallLog::default();
        let app = router(lookup_with_fallbacks(&log));

        let (status, response) = send(app, get("/api/naver-keywords?keyword=seo")).await;
        assert_eq!(status, StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["keywordList"][0]["keyword"], "seo");
        assert_eq!(body["keywordList"][0]["source"], "SYNTHETIC");
        assert_eq!(body["keywordList"].as_array().unwrap().len(), 6);
        assert_eq!(log.calls(), vec![Source::Primary, Source::Secondary]);
    }

    #[tokio::test]
    async fn test_missing_or_blank_keyword() {
        for uri in [
            "/api/naver-keywords",
            "/api/naver-keywords?keyword=",
            "/api/naver-keywords?keyword=%20%20",
        ] {
            let log = CallLog::default();
            let app = router(lookup_with_fallbacks(&log));

            let (status, response) = send(app, get(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(json_body(response).await, json!({"error": "키워드가 필요합니다."}));
            // Rejected before any tier is attempted
            assert!(log.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn test_exhausted_is_500_without_upstream_details() {
        let log = CallLog::default();
        let lookup = KeywordLookup::new(vec![MockTier::failing(Source::Primary, &log)]);

        let (status, response) = send(router(lookup), get("/api/naver-keywords?keyword=seo")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert!(body["error"].is_string());
        assert!(!body.to_string().contains("mock upstream failure"));
    }

    #[tokio::test]
    async fn test_panicking_tier_is_500() {
        let lookup = KeywordLookup::new(vec![
            panicking_tier(),
            Arc::new(SyntheticKeywordGenerator::new()),
        ]);

        let request = Request::builder()
            .uri("/api/naver-keywords?keyword=seo")
            .header("Origin", "https://agency.example")
            .body(Body::empty())
            .unwrap();

        let (status, response) = send(router(lookup), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");

        let body = json_body(response).await;
        assert_eq!(body["error"], LOOKUP_FAILED_MESSAGE);
        assert_eq!(body["details"], LOOKUP_FAILED_DETAILS);
        let text = body.to_string();
        assert!(!text.contains("tier defect"));
        assert!(!text.contains("abc123"));
    }

    #[tokio::test]
    async fn test_post_keywords() {
        let log = CallLog::default();
        let app = router(lookup_with_fallbacks(&log));

        let request = Request::builder()
            .method(Method::POST)
            .uri(KEYWORDS_ROUTE)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"keyword": "강남맛집"}).to_string()))
            .unwrap();

        let (status, response) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["keywordList"][0]["keyword"], "강남맛집");
        assert_eq!(body["keywordList"][0]["competitionLevel"], "HIGH");
    }

    #[tokio::test]
    async fn test_post_without_keyword() {
        let log = CallLog::default();
        let app = router(lookup_with_fallbacks(&log));

        let request = Request::builder()
            .method(Method::POST)
            .uri(KEYWORDS_ROUTE)
            .body(Body::from("not json"))
            .unwrap();

        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn test_preflight() {
        let log = CallLog::default();
        let app = router(lookup_with_fallbacks(&log));

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(KEYWORDS_ROUTE)
            .header("Origin", "https://agency.example")
            .header("Access-Control-Request-Method", "GET")
            .body(Body::empty())
            .unwrap();

        let (status, response) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        let methods = headers["access-control-allow-methods"].to_str().unwrap();
        assert!(
            methods.contains("GET") && methods.contains("POST") && methods.contains("OPTIONS")
        );
        assert_eq!(
            headers["access-control-allow-headers"].to_str().unwrap().to_lowercase(),
            "content-type"
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cors_headers_on_get() {
        let log = CallLog::default();
        let app = router(lookup_with_fallbacks(&log));

        let request = Request::builder()
            .uri("/api/naver-keywords?keyword=seo")
            .header("Origin", "https://agency.example")
            .body(Body::empty())
            .unwrap();

        let (_, response) = send(app, request).await;
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
