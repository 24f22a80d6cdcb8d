//! Page metadata for the front-end views.
//!
//! The index identifies the visitor when possible; the login and signup pages
//! send signed-in visitors back to the index.

use axum::{Json, Router, routing::get};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{Anonymous, Identity, MaybeAuth, RedirectHome, ServerSettings};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

#[derive(Clone)]
pub struct PagesState {
    pub jwt: Arc<JwtConfig>,
    pub settings: Arc<ServerSettings>,
}

impl_has_auth_backend!(PagesState);

pub fn router(state: PagesState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/auth/login", get(login_page))
        .route("/auth/signup", get(signup_page))
        .with_state(state)
}

#[derive(Serialize)]
struct Page {
    title: &'static str,
    description: &'static str,
    keywords: &'static str,
}

#[derive(Serialize)]
struct PageResponse {
    page: Page,
}

#[derive(Serialize)]
struct IndexResponse {
    page: Page,
    user: Option<Identity>,
}

const INDEX_PAGE: Page = Page {
    title: "Classifieds",
    description: "Your place to post ads",
    keywords: "site, web, ads",
};

const LOGIN_PAGE: Page = Page {
    title: "Sign in",
    description: "Sign in with your username and password",
    keywords: "username, password",
};

const SIGNUP_PAGE: Page = Page {
    title: "Sign up",
    description: "Register with an e-mail, username and password",
    keywords: "email, username, password",
};

async fn index(MaybeAuth(user): MaybeAuth) -> Json<IndexResponse> {
    Json(IndexResponse {
        page: INDEX_PAGE,
        user,
    })
}

async fn login_page(_anonymous: Anonymous<RedirectHome>) -> Json<PageResponse> {
    Json(PageResponse {
        page: LOGIN_PAGE,
    })
}

async fn signup_page(_anonymous: Anonymous<RedirectHome>) -> Json<PageResponse> {
    Json(PageResponse {
        page: SIGNUP_PAGE,
    })
}
