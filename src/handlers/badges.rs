use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::badge::{Badge, BadgeTrigger, EarnedBadge};
use crate::services::achievements::{check_and_award_badges, get_user_badges};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CheckBadgesRequest {
    #[serde(default)]
    pub trigger: BadgeTrigger,
}

#[derive(Debug, Serialize)]
pub struct CheckBadgesResponse {
    pub trigger: BadgeTrigger,
    pub awarded: Vec<Badge>,
}

pub async fn list_catalog(State(state): State<AppState>) -> AppResult<Json<Vec<Badge>>> {
    let badges = state.store.badge_catalog().await?;
    Ok(Json(badges))
}

pub async fn list_my_badges(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<EarnedBadge>>> {
    let badges = get_user_badges(state.store.as_ref(), auth_user.id).await?;
    Ok(Json(badges))
}

/// Called by the client after a log is created, a like is given or a follower is gained.
/// Never fails: evaluation errors are logged and reported as "nothing awarded".
pub async fn check_my_badges(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    body: Option<Json<CheckBadgesRequest>>,
) -> Json<CheckBadgesResponse> {
    let trigger = body.map(|Json(b)| b.trigger).unwrap_or_default();
    let today = state.clock.today();

    let awarded = check_and_award_badges(state.store.as_ref(), today, auth_user.id, trigger).await;

    Json(CheckBadgesResponse { trigger, awarded })
}
