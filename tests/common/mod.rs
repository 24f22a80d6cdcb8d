#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use classifieds::{
    ServerConfig,
    auth::{Identity, SecureCookies},
    create_app,
    db::{Database, NewUser},
    jwt::JwtConfig,
    password::hash_password,
    rate_limit::RateLimitConfig,
};
use std::path::PathBuf;

pub const TEST_SECRET: &[u8] = b"test-jwt-secret-for-integration-tests";
pub const TEST_PASSWORD: &str = "hunter22pass";

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub jwt: JwtConfig,
    pub upload_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

pub struct TestOptions {
    pub secure_cookies: SecureCookies,
    pub trust_proxy: bool,
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            secure_cookies: SecureCookies::Auto,
            trust_proxy: false,
            rate_limit: None,
        }
    }
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(TestOptions::default()).await
}

pub async fn create_test_app_with(options: TestOptions) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let upload_dir =
        std::env::temp_dir().join(format!("classifieds-uploads-{}", uuid::Uuid::new_v4()));
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: TEST_SECRET.to_vec(),
        secure_cookies: options.secure_cookies,
        trust_proxy: options.trust_proxy,
        upload_dir: upload_dir.clone(),
        rate_limit: options.rate_limit,
    };
    TestApp {
        app: create_app(&config),
        db,
        jwt: JwtConfig::new(TEST_SECRET),
        upload_dir,
    }
}

/// Insert a user with `TEST_PASSWORD` and return its identity.
pub async fn create_user(db: &Database, username: &str, is_admin: bool) -> Identity {
    let password_hash = hash_password(TEST_PASSWORD).expect("Failed to hash password");
    let email = format!("{}@example.com", username);
    db.users()
        .create(&NewUser {
            username,
            email: &email,
            password_hash: &password_hash,
            avatar: None,
        })
        .await
        .expect("Failed to create user");
    if is_admin {
        assert!(db.users().grant_admin(username).await.unwrap());
    }
    db.users()
        .get_by_username(username)
        .await
        .unwrap()
        .expect("User not found")
        .identity()
}

/// Cookie header carrying a freshly issued session token for `identity`.
pub fn session_cookie(jwt: &JwtConfig, identity: &Identity) -> String {
    let issued = jwt.issue(identity).expect("Failed to issue token");
    format!("jwt={}", issued.token)
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(String::from)
        .collect()
}

/// Session token from the response's Set-Cookie headers, if a non-empty one was bound.
pub fn session_token(response: &Response<Body>) -> Option<String> {
    set_cookies(response).iter().find_map(|cookie| {
        let value = cookie.strip_prefix("jwt=")?;
        let token = value.split(';').next()?;
        (!token.is_empty()).then(|| token.to_string())
    })
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
