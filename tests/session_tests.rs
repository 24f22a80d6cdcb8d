mod common;

use axum::http::{StatusCode, header};
use classifieds::auth::SecureCookies;
use classifieds::jwt::{JwtConfig, SESSION_DURATION_SECS, SessionClaims};
use common::*;
use jsonwebtoken::{EncodingKey, Header};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[tokio::test]
async fn test_protected_route_without_cookie() {
    let t = create_test_app().await;

    let response = t.app.clone().oneshot(get("/api/ads", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    let json = body_json(response).await;
    assert_eq!(json["error"], "Authorization required");
}

#[tokio::test]
async fn test_protected_route_with_garbage_cookie() {
    let t = create_test_app().await;

    let response = t
        .app
        .clone()
        .oneshot(get("/api/ads", Some("jwt=not-a-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid or expired authorization");
}

#[tokio::test]
async fn test_expired_cookie_is_not_renewed() {
    let t = create_test_app().await;
    let ana = create_user(&t.db, "ana", false).await;

    let claims = SessionClaims {
        data: ana,
        iat: now() - SESSION_DURATION_SECS - 60,
        exp: now() - 60,
    };
    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .unwrap();

    let response = t
        .app
        .clone()
        .oneshot(get("/api/ads", Some(&format!("jwt={}", token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_token(&response).is_none());
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid or expired authorization");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_rejected() {
    let t = create_test_app().await;
    let ana = create_user(&t.db, "ana", false).await;
    let forged = JwtConfig::new(b"another-secret-of-sufficient-length!!");

    let response = t
        .app
        .clone()
        .oneshot(get("/api/ads", Some(&session_cookie(&forged, &ana))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_tampered_payload_rejected() {
    let t = create_test_app().await;
    let ana = create_user(&t.db, "ana", false).await;
    let token = t.jwt.issue(&ana).unwrap().token;

    // Swap in the payload of an admin token, keeping ana's signature
    let mut admin = ana.clone();
    admin.is_admin = true;
    let admin_token = t.jwt.issue(&admin).unwrap().token;
    let parts: Vec<&str> = token.split('.').collect();
    let admin_parts: Vec<&str> = admin_token.split('.').collect();
    let tampered = format!("{}.{}.{}", parts[0], admin_parts[1], parts[2]);

    let response = t
        .app
        .clone()
        .oneshot(get("/api/ads", Some(&format!("jwt={}", tampered))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_session_is_renewed() {
    let t = create_test_app().await;
    let ana = create_user(&t.db, "ana", false).await;
    let issued = t.jwt.issue(&ana).unwrap();

    let response = t
        .app
        .clone()
        .oneshot(get("/api/ads", Some(&format!("jwt={}", issued.token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].contains("HttpOnly"));
    assert!(cookies[0].contains("SameSite=Lax"));
    assert!(cookies[0].contains("Path=/"));
    assert!(cookies[0].contains(&format!("Max-Age={}", SESSION_DURATION_SECS)));
    assert!(!cookies[0].contains("Secure"));

    let renewed = session_token(&response).expect("Expected renewed token");
    let claims = t.jwt.decode_claims(&renewed).unwrap();
    assert_eq!(claims.data, ana);
    assert!(claims.exp >= issued.expires_at);

    let json = body_json(response).await;
    assert_eq!(json["user"]["username"], "ana");
}

#[tokio::test]
async fn test_renewed_token_authenticates() {
    let t = create_test_app().await;
    let ana = create_user(&t.db, "ana", false).await;

    let response = t
        .app
        .clone()
        .oneshot(get("/api/ads", Some(&session_cookie(&t.jwt, &ana))))
        .await
        .unwrap();
    let renewed = session_token(&response).unwrap();

    let response = t
        .app
        .clone()
        .oneshot(get("/api/ads", Some(&format!("jwt={}", renewed))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_best_effort_without_cookie() {
    let t = create_test_app().await;

    let response = t
        .app
        .clone()
        .oneshot(get("/api/auth/user", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    let json = body_json(response).await;
    assert_eq!(json["success"], "OK");
    assert!(json["user"].is_null());
}

#[tokio::test]
async fn test_best_effort_with_invalid_cookie() {
    let t = create_test_app().await;

    let response = t
        .app
        .clone()
        .oneshot(get("/api/auth/user", Some("jwt=abc.def.ghi")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    let json = body_json(response).await;
    assert!(json["user"].is_null());
}

#[tokio::test]
async fn test_best_effort_with_valid_cookie() {
    let t = create_test_app().await;
    let ana = create_user(&t.db, "ana", false).await;

    let response = t
        .app
        .clone()
        .oneshot(get("/api/auth/user", Some(&session_cookie(&t.jwt, &ana))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_token(&response).is_some());
    let json = body_json(response).await;
    assert_eq!(json["user"]["id"], ana.id);
    assert_eq!(json["user"]["username"], "ana");
    assert_eq!(json["user"]["is_admin"], false);
    assert!(json["user"]["avatar"].is_null());
}

#[tokio::test]
async fn test_index_identifies_visitor() {
    let t = create_test_app().await;
    let ana = create_user(&t.db, "ana", false).await;

    let response = t.app.clone().oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["page"]["title"], "Classifieds");
    assert!(json["user"].is_null());

    let response = t
        .app
        .clone()
        .oneshot(get("/", Some(&session_cookie(&t.jwt, &ana))))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["user"]["username"], "ana");
}

#[tokio::test]
async fn test_login_page_redirects_signed_in_user() {
    let t = create_test_app().await;
    let ana = create_user(&t.db, "ana", false).await;

    for page in ["/auth/login", "/auth/signup"] {
        let response = t
            .app
            .clone()
            .oneshot(get(page, Some(&session_cookie(&t.jwt, &ana))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert!(set_cookies(&response).is_empty());
    }
}

#[tokio::test]
async fn test_login_page_admits_anonymous() {
    let t = create_test_app().await;

    let response = t
        .app
        .clone()
        .oneshot(get("/auth/login", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["page"]["title"], "Sign in");

    // An unusable cookie counts as anonymous
    let response = t
        .app
        .clone()
        .oneshot(get("/auth/signup", Some("jwt=garbage")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_signup_rejected_for_signed_in_user() {
    let t = create_test_app().await;
    let ana = create_user(&t.db, "ana", false).await;

    let response = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signup",
            Some(&session_cookie(&t.jwt, &ana)),
            serde_json::json!({
                "email": "bob@example.com",
                "username": "bob",
                "password": TEST_PASSWORD,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(set_cookies(&response).is_empty());
    let json = body_json(response).await;
    assert_eq!(json["error"], "Already authenticated");

    // The handler never ran
    assert!(t.db.users().get_by_username("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn test_identity_comes_from_token_not_database() {
    let t = create_test_app().await;
    let ana = create_user(&t.db, "ana", false).await;
    let cookie = session_cookie(&t.jwt, &ana);

    assert!(t.db.users().grant_admin("ana").await.unwrap());

    let response = t
        .app
        .clone()
        .oneshot(get("/api/auth/user", Some(&cookie)))
        .await
        .unwrap();
    let renewed = session_token(&response).unwrap();
    let json = body_json(response).await;
    assert_eq!(json["user"]["is_admin"], false);

    // Renewal re-signs the same snapshot
    let claims = t.jwt.decode_claims(&renewed).unwrap();
    assert!(!claims.data.is_admin);
}

#[tokio::test]
async fn test_secure_cookies_always() {
    let t = create_test_app_with(TestOptions {
        secure_cookies: SecureCookies::Always,
        ..Default::default()
    })
    .await;
    let ana = create_user(&t.db, "ana", false).await;

    let response = t
        .app
        .clone()
        .oneshot(get("/api/ads", Some(&session_cookie(&t.jwt, &ana))))
        .await
        .unwrap();

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].ends_with("; Secure"));
}

#[tokio::test]
async fn test_forwarded_proto_requires_trust_proxy() {
    let ana_request = |cookie: &str| {
        let mut request = get("/api/ads", Some(cookie));
        request
            .headers_mut()
            .insert("x-forwarded-proto", "https".parse().unwrap());
        request
    };

    let trusted = create_test_app_with(TestOptions {
        trust_proxy: true,
        ..Default::default()
    })
    .await;
    let ana = create_user(&trusted.db, "ana", false).await;
    let response = trusted
        .app
        .clone()
        .oneshot(ana_request(&session_cookie(&trusted.jwt, &ana)))
        .await
        .unwrap();
    assert!(set_cookies(&response)[0].contains("; Secure"));

    let untrusted = create_test_app().await;
    let ana = create_user(&untrusted.db, "ana", false).await;
    let response = untrusted
        .app
        .clone()
        .oneshot(ana_request(&session_cookie(&untrusted.jwt, &ana)))
        .await
        .unwrap();
    assert!(!set_cookies(&response)[0].contains("Secure"));
}

#[tokio::test]
async fn test_unknown_route_returns_not_found() {
    let t = create_test_app().await;

    let response = t
        .app
        .clone()
        .oneshot(get("/no/such/page", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Page not found: /no/such/page");
}
