use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use patent_hub::config::Config;
use patent_hub::AppState;
use patent_hub::models::job::{LoadPolicy, RecordSet};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

const JOBS: &str = r#"[
    {"id": "PH001", "title": "特許技術者（機械・電気）", "company": "ABC特許事務所",
     "category": "特許技術者", "location": "東京都港区", "experience": "3-5年",
     "salaryMin": 5000, "salaryMax": 8000, "date": "2025-07-01"},
    {"id": "PH002", "title": "弁理士", "company": "XYZ国際特許事務所",
     "category": "弁理士", "location": "大阪府大阪市", "experience": "5年以上",
     "salaryMin": 6000, "salaryMax": 12000, "date": "2025-06-28"},
    {"id": "PH003", "title": "特許事務スタッフ", "company": "DEF特許事務所",
     "category": "特許事務", "location": "リモート可", "experience": "未経験可",
     "salaryMin": 3500, "salaryMax": 4500, "date": "2025-06-30"},
    {"id": "PH004", "title": "Patent Analyst", "company": "Global IP",
     "category": "調査", "location": "fully remote", "experience": "未経験可",
     "salaryMin": 4000, "salaryMax": 6000, "date": "2025-07-03"}
]"#;

fn test_config() -> Config {
    Config {
        server_address: "127.0.0.1:0".to_string(),
        jobs_path: PathBuf::from("jobs.json"),
        record_policy: LoadPolicy::Strict,
        public_base_url: "https://patent-hub.example".to_string(),
        public_rps: 1000,
        news_feed_url: None,
        news_refresh_interval: Duration::from_secs(600),
        news_cache_path: None,
        preferences_path: None,
        search_debounce: Duration::from_millis(500),
        salary_debounce: Duration::from_millis(800),
        page_size: 2,
    }
}

fn app_state() -> AppState {
    let config = test_config();
    let report = RecordSet::from_json_str(JOBS, config.record_policy).expect("load jobs");
    AppState::new(&config, Arc::new(report.records)).expect("build app state")
}

fn app_with_rps(rps: u32) -> Router {
    patent_hub::build_router(app_state(), rps)
}

fn app() -> Router {
    app_with_rps(1000)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<JsonValue>) -> (StatusCode, JsonValue) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn item_ids(body: &JsonValue) -> Vec<String> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_reports_loaded_jobs() {
    let (status, body) = send(&app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["jobs"], 4);
    assert_eq!(body["news_demo_mode"], true);
}

#[tokio::test]
async fn lists_newest_first_with_configured_page_size() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/jobs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item_ids(&body), vec!["PH004", "PH001"]);
    assert_eq!(body["total"], 4);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["has_next"], true);
    assert_eq!(body["sort"], "newest");

    let (_, body) = send(&app, "GET", "/api/jobs?page=2", None).await;
    assert_eq!(item_ids(&body), vec!["PH003", "PH002"]);
    assert_eq!(body["has_prev"], true);
    assert_eq!(body["has_next"], false);
}

#[tokio::test]
async fn filters_and_sorts_from_the_query_string() {
    let app = app();
    let (status, body) = send(
        &app,
        "GET",
        "/api/jobs?location=remote-ok&sort=salary-desc&per_page=10",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item_ids(&body), vec!["PH004", "PH003"]);

    let (_, body) = send(&app, "GET", "/api/jobs?salary_min=500&per_page=10", None).await;
    assert_eq!(item_ids(&body), vec!["PH001", "PH002"]);

    let (_, body) = send(&app, "GET", "/api/jobs?search=PATENT", None).await;
    assert_eq!(item_ids(&body), vec!["PH004"]);
}

#[tokio::test]
async fn rejects_bad_query_values() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/jobs?sort=oldest", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("oldest"));

    let (status, _) = send(&app, "GET", "/api/jobs?salary_max=lots", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn job_detail_and_missing_job() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/jobs/PH002", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "弁理士");
    assert_eq!(body["salary_max"], 12000);
    assert_eq!(body["posted_date"], "2025-06-28");

    let (status, body) = send(&app, "GET", "/api/jobs/PH999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Job not found: PH999");
}

#[tokio::test]
async fn share_payloads() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/jobs/PH001/share", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "特許技術者（機械・電気） - ABC特許事務所 | Patent Hub");
    assert_eq!(body["text"], "年収500-800万円、東京都港区勤務の求人情報");
    assert_eq!(body["url"], "https://patent-hub.example/jobs/PH001");

    let (status, body) = send(&app, "GET", "/api/companies/Global%20IP/share", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Global IP - 企業情報 | Patent Hub");
    assert_eq!(body["text"], "Global IPの求人情報（1件）をチェック！");
    assert_eq!(body["url"], "https://patent-hub.example/companies/Global%20IP");

    let (status, _) = send(&app, "GET", "/api/companies/Nobody/share", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn quick_apply() {
    let app = app();
    let payload = json!({
        "name": "山田太郎",
        "email": "taro@example.com",
        "motivation": "特許実務の経験を活かしたい"
    });
    let (status, body) = send(&app, "POST", "/api/jobs/PH001/apply", Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["job_id"], "PH001");
    assert_eq!(
        body["message"],
        "応募を受け付けました。企業からの連絡をお待ちください。"
    );

    let (status, _) = send(&app, "POST", "/api/jobs/PH999/apply", Some(payload)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let invalid = json!({"name": "   ", "email": "not-an-email", "motivation": "x"});
    let (status, body) = send(&app, "POST", "/api/jobs/PH001/apply", Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn preference_toggle_round_trip() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/preferences/favorite-job/PH001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["marked"], false);

    let (status, body) =
        send(&app, "POST", "/api/preferences/favorite-job/PH001/toggle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["marked"], true);
    assert_eq!(body["message"], "お気に入りに追加しました");

    let (_, body) = send(&app, "POST", "/api/preferences/follow-company/ABC/toggle", None).await;
    assert_eq!(body["message"], "求人通知を有効にしました");

    let (_, body) = send(&app, "GET", "/api/preferences/favorite-job", None).await;
    assert_eq!(body["ids"], json!(["PH001"]));

    let (_, body) = send(&app, "POST", "/api/preferences/favorite-job/PH001/toggle", None).await;
    assert_eq!(body["marked"], false);
    assert_eq!(body["message"], "お気に入りから削除しました");

    let (status, _) = send(&app, "GET", "/api/preferences/wishlist", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn news_endpoints_in_demo_mode() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/news", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["latest"], json!([]));

    let (status, body) = send(&app, "POST", "/api/news/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 5);
    assert!(body["last_update"].is_string());

    let (_, body) = send(&app, "GET", "/api/news", None).await;
    assert_eq!(body["latest"].as_array().unwrap().len(), 3);

    let (_, body) = send(&app, "GET", "/api/news/category/%E5%95%86%E6%A8%99", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", "/api/news/stats", None).await;
    assert_eq!(body["total_articles"], 5);
    assert_eq!(body["source_breakdown"]["WIPO"], 2);

    let (_, body) = send(&app, "GET", "/api/news/search?q=wipo", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn public_api_is_rate_limited() {
    let app = app_with_rps(1);
    let (status, _) = send(&app, "GET", "/api/jobs", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, "GET", "/api/jobs", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "rate_limit_exceeded");

    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn accepted_applications_are_kept_per_job() {
    let state = app_state();
    let app = patent_hub::build_router(state.clone(), 1000);
    let payload = json!({
        "name": "  佐藤花子 ",
        "email": "hanako@example.com",
        "motivation": "商標実務に携わりたい"
    });
    let (status, body) = send(&app, "POST", "/api/jobs/PH002/apply", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);

    let stored = state.application_service.for_job("PH002").unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "佐藤花子");
    assert_eq!(stored[0].company, "XYZ国際特許事務所");
    assert_eq!(stored[0].id.to_string(), body["id"].as_str().unwrap());
    assert!(state.application_service.for_job("PH001").unwrap().is_empty());
}

#[tokio::test]
async fn huge_page_number_is_an_empty_page() {
    let (status, body) = send(&app(), "GET", "/api/jobs?page=9223372036854775807", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["total"], 4);
    assert_eq!(body["has_next"], false);
    assert_eq!(body["has_prev"], true);
}
