//! HTTP request handlers for the shortlink API
//!
//! Handlers only translate between HTTP and the allocator/store; every failure is a
//! [`LinkError`] rendered by its `IntoResponse` impl.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use chrono::{Duration, Utc};
use tokio::time::Instant;

use crate::error::LinkError;
use crate::model::{is_valid_code, InfoParams, ShortenRequest, ShortlinkInfo, ShortlinkResponse};
use crate::state::AppState;

/// Creates a new short link
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/very/long/url",
///   "expiration_in_minutes": 0
/// }
/// ```
///
/// # Response
///
/// - **201 Created** - `{"shortlink": "aZ3k9Q"}`
/// - **400 Bad Request** - empty or unredirectable url, negative expiration
/// - **500 / 503** - allocation exhausted, storage failure or timeout
pub async fn create_shortlink(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<impl IntoResponse, LinkError> {
    let expires_at = match payload.expiration_in_minutes {
        0 => None,
        minutes if minutes < 0 => {
            return Err(LinkError::InvalidInput(
                "expiration_in_minutes must not be negative".to_string(),
            ))
        }
        minutes => {
            let lifetime = Duration::try_minutes(minutes).ok_or_else(|| {
                LinkError::InvalidInput("expiration_in_minutes is too large".to_string())
            })?;
            let expires_at = Utc::now().checked_add_signed(lifetime).ok_or_else(|| {
                LinkError::InvalidInput("expiration_in_minutes is too large".to_string())
            })?;
            Some(expires_at)
        }
    };

    let deadline = Instant::now() + state.allocation_timeout;
    let link = state
        .allocator
        .allocate(&payload.url, expires_at, deadline)
        .await?;

    tracing::info!(code = %link.code, url = %link.target_url, "short link created");

    Ok((
        StatusCode::CREATED,
        Json(ShortlinkResponse {
            shortlink: link.code,
        }),
    ))
}

/// Returns metadata for a short link without counting a visit
///
/// `GET /api/info?shortlink=aZ3k9Q`
pub async fn get_shortlink_info(
    State(state): State<AppState>,
    Query(params): Query<InfoParams>,
) -> Result<Json<ShortlinkInfo>, LinkError> {
    let code = params
        .shortlink
        .filter(|code| !code.is_empty())
        .ok_or_else(|| LinkError::InvalidInput("shortlink is required".to_string()))?;

    if !is_valid_code(&code) {
        return Err(LinkError::InvalidInput(format!(
            "`{code}` is not a valid shortlink"
        )));
    }

    let link = state.store.get(&code).await?;
    Ok(Json(link.into()))
}

/// Redirects a short code to its target URL, counting the visit
///
/// # Response
///
/// - **307 Temporary Redirect** - to the target URL
/// - **404 Not Found** - unknown, expired or malformed code
///
/// 307 keeps browsers from caching the redirect, so every visit reaches the counter.
pub async fn redirect(
    Path(shortlink): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, LinkError> {
    if !is_valid_code(&shortlink) {
        return Err(LinkError::NotFound(shortlink));
    }

    let target_url = state.store.resolve(&shortlink).await?;
    Ok(Redirect::temporary(&target_url))
}
