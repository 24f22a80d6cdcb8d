//! Ads API.
//!
//! All endpoints require an authenticated session. Only the author of an ad
//! or an admin may change or delete it.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ResultExt};
use crate::auth::{Auth, Identity, ServerSettings};
use crate::db::{AdListing, Database};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::validation::{validate_ad_text, validate_contact};

/// State for ads endpoints.
#[derive(Clone)]
pub struct AdsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub settings: Arc<ServerSettings>,
}

impl_has_auth_backend!(AdsState);

pub fn router(state: AdsState) -> Router {
    Router::new()
        .route("/", get(list_ads).put(update_ad))
        .route("/create", post(create_ad))
        .route("/{id}", delete(delete_ad))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Serialize)]
struct ListAdsResponse {
    success: &'static str,
    user: Identity,
    rows: Vec<AdListing>,
}

#[derive(Deserialize)]
struct CreateAdRequest {
    text: String,
    contact: String,
}

#[derive(Serialize)]
struct CreateAdResponse {
    success: &'static str,
    id: i64,
}

#[derive(Deserialize)]
struct UpdateAdRequest {
    id: i64,
    text: String,
    contact: String,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: &'static str,
}

// --- Helpers ---

fn validate_ad(text: &str, contact: &str) -> Result<(), ApiError> {
    validate_ad_text(text).map_err(ApiError::bad_request)?;
    validate_contact(contact).map_err(ApiError::bad_request)
}

fn invalid_id(id: i64) -> ApiError {
    ApiError::bad_request(format!("Invalid ad identifier: {}", id))
}

// --- Handlers ---

async fn list_ads(
    State(state): State<AdsState>,
    Auth(user): Auth,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.ads().list().await.db_err("Failed to list ads")?;

    Ok(Json(ListAdsResponse {
        success: "Ads retrieved",
        user,
        rows,
    }))
}

async fn create_ad(
    State(state): State<AdsState>,
    Auth(user): Auth,
    Json(payload): Json<CreateAdRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = payload.text.trim();
    let contact = payload.contact.trim();
    validate_ad(text, contact)?;

    let id = state
        .db
        .ads()
        .create(user.id, text, contact)
        .await
        .db_err("Failed to create ad")?;

    info!(user_id = user.id, ad_id = id, "Ad created");
    Ok((
        StatusCode::CREATED,
        Json(CreateAdResponse {
            success: "Ad created successfully",
            id,
        }),
    ))
}

async fn update_ad(
    State(state): State<AdsState>,
    Auth(user): Auth,
    Json(payload): Json<UpdateAdRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = payload.text.trim();
    let contact = payload.contact.trim();
    validate_ad(text, contact)?;

    let ad = state
        .db
        .ads()
        .get(payload.id)
        .await
        .db_err("Failed to get ad")?
        .ok_or_else(|| invalid_id(payload.id))?;

    if !user.can_modify(ad.user_id) {
        return Err(ApiError::forbidden("You can only modify your own ads"));
    }

    if ad.text == text && ad.contact == contact {
        return Err(ApiError::bad_request("The ad has not changed"));
    }

    let updated = state
        .db
        .ads()
        .update(ad.id, text, contact)
        .await
        .db_err("Failed to update ad")?;
    if !updated {
        return Err(invalid_id(payload.id));
    }

    Ok(Json(SuccessResponse {
        success: "Ad updated successfully",
    }))
}

async fn delete_ad(
    State(state): State<AdsState>,
    Auth(user): Auth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let ad = state
        .db
        .ads()
        .get(id)
        .await
        .db_err("Failed to get ad")?
        .ok_or_else(|| invalid_id(id))?;

    if !user.can_modify(ad.user_id) {
        return Err(ApiError::forbidden("You can only delete your own ads"));
    }

    let deleted = state
        .db
        .ads()
        .delete(id)
        .await
        .db_err("Failed to delete ad")?;
    if !deleted {
        return Err(invalid_id(id));
    }

    info!(user_id = user.id, ad_id = id, "Ad deleted");
    Ok(Json(SuccessResponse {
        success: "Ad deleted successfully",
    }))
}
