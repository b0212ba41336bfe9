//! HTTP API 集成测试
//!
//! 通过 actix 测试服务驱动完整路由：认证、创建、列表、跳转、密码校验、启停与限流。

use std::sync::Arc;
use std::sync::Once;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::App;
use serde_json::{Value, json};
use tempfile::TempDir;

use guardlink::api::jwt::get_jwt_service;
use guardlink::api::services::{
    AppStartTime, AppState, ErrorCode, PasswordPage, configure, verify_rate_limit,
};
use guardlink::config::{RateLimitConfig, init_config};
use guardlink::services::{LinkService, LinkSettings};
use guardlink::storage::SeaOrmStorage;
use guardlink::utils::generate_random_code;

// =============================================================================
// 测试环境初始化
// =============================================================================

static INIT: Once = Once::new();

const PEER: &str = "127.0.0.1:40000";

fn init_static_config() {
    INIT.call_once(|| {
        init_config();
    });
}

async fn create_state(rate_limit: Option<RateLimitConfig>) -> (AppState, TempDir) {
    init_static_config();

    let temp_dir = TempDir::new().expect("创建临时目录失败");
    let db_path = temp_dir.path().join("api_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite")
            .await
            .expect("创建存储失败"),
    );
    let settings = LinkSettings {
        alias_length: 6,
        max_alias_attempts: 8,
        base_url: "http://short.test".to_string(),
        alias_generator: generate_random_code,
    };

    let verify_rate_limit = match rate_limit {
        Some(config) => verify_rate_limit(&config).expect("限流配置无效"),
        None => None,
    };

    let state = AppState {
        link_service: Arc::new(LinkService::with_settings(storage.clone(), settings)),
        storage,
        password_page: PasswordPage::embedded().expect("内置页面缺失"),
        verify_rate_limit,
        start_time: AppStartTime::now(),
    };
    (state, temp_dir)
}

fn bearer(user_id: &str) -> (&'static str, String) {
    let token = get_jwt_service()
        .generate_access_token(user_id)
        .expect("签发 token 失败");
    ("Authorization", format!("Bearer {}", token))
}

fn shorten(user_id: &str, body: Value) -> TestRequest {
    TestRequest::post()
        .uri("/api/shorten")
        .insert_header(bearer(user_id))
        .set_json(body)
}

fn verify(short_url: &str, password: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/verify-password")
        .peer_addr(PEER.parse().unwrap())
        .set_json(json!({ "shortUrl": short_url, "password": password }))
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(App::new().configure(|cfg| configure(cfg, &$state))).await
    };
}

// =============================================================================
// 认证
// =============================================================================

#[actix_rt::test]
async fn test_protected_routes_require_token() {
    let (state, _temp) = create_state(None).await;
    let app = init_app!(state);

    let requests = [
        TestRequest::post()
            .uri("/api/shorten")
            .set_json(json!({ "originalUrl": "https://example.com" })),
        TestRequest::get().uri("/api/urls"),
        TestRequest::put().uri("/api/toggle/some-id"),
        TestRequest::put().uri("/api/reset-attempts/some-id"),
    ];

    for req in requests {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::TokenInvalid as i32);
    }
}

#[actix_rt::test]
async fn test_garbage_token_is_rejected() {
    let (state, _temp) = create_state(None).await;
    let app = init_app!(state);

    let req = TestRequest::get()
        .uri("/api/urls")
        .insert_header(("Authorization", "Bearer not.a.jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// 创建与列表
// =============================================================================

#[actix_rt::test]
async fn test_shorten_and_list() {
    let (state, _temp) = create_state(None).await;
    let app = init_app!(state);

    let resp = test::call_service(
        &app,
        shorten(
            "alice",
            json!({ "originalUrl": "https://example.com", "password": "secret" }),
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["originalUrl"], "https://example.com");
    assert_eq!(created["isPasswordProtected"], true);
    assert!(
        created["shortUrl"]
            .as_str()
            .unwrap()
            .starts_with("http://short.test/")
    );
    assert!(created["id"].is_string());
    assert!(created.get("passwordHash").is_none());
    assert!(created.get("passwordAttempts").is_none());

    let req = TestRequest::get()
        .uri("/api/urls")
        .insert_header(bearer("alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let links: Value = test::read_body_json(resp).await;
    let links = links.as_array().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["id"], created["id"]);
    assert_eq!(links[0]["clicks"], 0);
    assert_eq!(links[0]["passwordAttempts"], 0);
    assert!(links[0].get("passwordHash").is_none());

    // 其他用户看不到
    let req = TestRequest::get()
        .uri("/api/urls")
        .insert_header(bearer("bob"))
        .to_request();
    let links: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(links, json!([]));
}

#[actix_rt::test]
async fn test_shorten_validation_errors() {
    let (state, _temp) = create_state(None).await;
    let app = init_app!(state);

    let resp = test::call_service(&app, shorten("alice", json!({})).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], ErrorCode::BadRequest as i32);

    let req = TestRequest::post()
        .uri("/api/shorten")
        .insert_header(bearer("alice"))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// 跳转与密码校验
// =============================================================================

macro_rules! create_link {
    ($app:expr, $password:expr) => {{
        let mut body = json!({ "originalUrl": "https://example.com/landing" });
        let password: Option<&str> = $password;
        if let Some(password) = password {
            body["password"] = json!(password);
        }
        let created: Value =
            test::call_and_read_body_json(&$app, shorten("alice", body).to_request()).await;
        created
    }};
}

fn alias_of(created: &Value) -> String {
    created["shortUrl"]
        .as_str()
        .and_then(|url| url.rsplit('/').next())
        .unwrap()
        .to_string()
}

#[actix_rt::test]
async fn test_unprotected_redirect() {
    let (state, _temp) = create_state(None).await;
    let app = init_app!(state);

    let created = create_link!(app, None);
    let alias = alias_of(&created);

    let req = TestRequest::get().uri(&format!("/{}", alias)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get("Location").unwrap(),
        "https://example.com/landing"
    );

    let link = state.storage.get_by_alias(&alias).await.unwrap().unwrap();
    assert_eq!(link.clicks, 1);
}

#[actix_rt::test]
async fn test_redirect_encodes_control_characters() {
    let (state, _temp) = create_state(None).await;
    let app = init_app!(state);

    let body = json!({ "originalUrl": "https://example.com/a\nb c\u{e9}" });
    let created: Value =
        test::call_and_read_body_json(&app, shorten("alice", body).to_request()).await;
    assert_eq!(created["originalUrl"], "https://example.com/a\nb c\u{e9}");
    let alias = alias_of(&created);

    let req = TestRequest::get().uri(&format!("/{}", alias)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get("Location").unwrap(),
        "https://example.com/a%0Ab%20c%C3%A9"
    );

    let link = state.storage.get_by_alias(&alias).await.unwrap().unwrap();
    assert_eq!(link.clicks, 1);
}

#[actix_rt::test]
async fn test_protected_link_serves_prompt_then_verifies() {
    let (state, _temp) = create_state(None).await;
    let app = init_app!(state);

    let created = create_link!(app, Some("secret"));
    let alias = alias_of(&created);

    let req = TestRequest::get().uri(&format!("/{}", alias)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers().get("Content-Type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
    let html = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&html).contains("/api/verify-password"));

    let resp = test::call_service(&app, verify(&alias, "secret").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["originalUrl"], "https://example.com/landing");

    // 完整短链接同样可用
    let short_url = created["shortUrl"].as_str().unwrap();
    let resp = test::call_service(&app, verify(short_url, "secret").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let link = state.storage.get_by_alias(&alias).await.unwrap().unwrap();
    assert_eq!(link.clicks, 2);
}

#[actix_rt::test]
async fn test_wrong_password_reports_attempts_then_locks() {
    let (state, _temp) = create_state(None).await;
    let app = init_app!(state);

    let created = create_link!(app, Some("secret"));
    let alias = alias_of(&created);

    for attempt in 1..=5 {
        let resp = test::call_service(&app, verify(&alias, "wrong").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["attempts"], attempt);
        assert_eq!(body["disabled"], attempt == 5);
        assert_eq!(body["code"], ErrorCode::LinkInvalidPassword as i32);
        assert!(!body.to_string().contains("argon2"));
    }

    let resp = test::call_service(&app, verify(&alias, "secret").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = TestRequest::get().uri(&format!("/{}", alias)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn test_verify_password_error_statuses() {
    let (state, _temp) = create_state(None).await;
    let app = init_app!(state);

    let open = create_link!(app, None);

    let resp = test::call_service(&app, verify("", "pw").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/api/verify-password")
        .peer_addr(PEER.parse().unwrap())
        .set_json(json!({ "shortUrl": "abc" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(&app, verify("missing1", "pw").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(&app, verify(&alias_of(&open), "pw").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_unknown_alias_is_not_found() {
    let (state, _temp) = create_state(None).await;
    let app = init_app!(state);

    let resp = test::call_service(&app, TestRequest::get().uri("/nothere").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], ErrorCode::LinkNotFound as i32);
}

// =============================================================================
// 所有者操作
// =============================================================================

#[actix_rt::test]
async fn test_toggle_and_reset_attempts() {
    let (state, _temp) = create_state(None).await;
    let app = init_app!(state);

    let created = create_link!(app, Some("secret"));
    let id = created["id"].as_str().unwrap();
    let alias = alias_of(&created);

    test::call_service(&app, verify(&alias, "wrong").to_request()).await;

    let req = TestRequest::put()
        .uri(&format!("/api/reset-attempts/{}", id))
        .insert_header(bearer("alice"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["passwordAttempts"], 0);
    assert!(body["message"].is_string());

    let req = TestRequest::put()
        .uri(&format!("/api/toggle/{}", id))
        .insert_header(bearer("alice"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["isActive"], false);

    let req = TestRequest::get().uri(&format!("/{}", alias)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = TestRequest::put()
        .uri(&format!("/api/toggle/{}", id))
        .insert_header(bearer("alice"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["isActive"], true);
    assert_eq!(body["passwordAttempts"], 0);
}

#[actix_rt::test]
async fn test_non_owner_gets_not_found() {
    let (state, _temp) = create_state(None).await;
    let app = init_app!(state);

    let created = create_link!(app, None);
    let id = created["id"].as_str().unwrap();

    for path in ["toggle", "reset-attempts"] {
        let req = TestRequest::put()
            .uri(&format!("/api/{}/{}", path, id))
            .insert_header(bearer("bob"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    let link = state
        .storage
        .get_by_alias(&alias_of(&created))
        .await
        .unwrap()
        .unwrap();
    assert!(link.is_active);
}

// =============================================================================
// 限流与健康检查
// =============================================================================

#[actix_rt::test]
async fn test_verify_password_is_rate_limited() {
    let config = RateLimitConfig {
        enabled: true,
        verify_seconds_per_request: 60,
        verify_burst: 2,
        trusted_proxies: Vec::new(),
    };
    let (state, _temp) = create_state(Some(config)).await;
    let app = init_app!(state);

    for _ in 0..2 {
        let resp = test::call_service(&app, verify("missing1", "pw").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    let resp = test::call_service(&app, verify("missing1", "pw").to_request()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    // 跳转接口不受影响
    let resp = test::call_service(&app, TestRequest::get().uri("/missing1").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_health_endpoints() {
    let (state, _temp) = create_state(None).await;
    let app = init_app!(state);

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"]["backend"], "sqlite");

    let resp = test::call_service(&app, TestRequest::get().uri("/health/ready").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, TestRequest::get().uri("/health/live").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}
