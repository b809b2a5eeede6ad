use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::recap::{RecapSlideSet, ShareCard, Slide, SlideKind, YearRecapData, SLIDE_COUNT};
use crate::services::recap::{
    build_slide_sequence, get_full_year_recap, share_card, RecapOutcome, SlideCursor,
};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RecapPath {
    #[validate(range(min = 1900, max = 2200, message = "year must be between 1900 and 2200"))]
    pub year: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SlidePath {
    #[validate(range(min = 1900, max = 2200, message = "year must be between 1900 and 2200"))]
    pub year: i32,
    pub index: usize,
}

#[derive(Debug, Serialize)]
pub struct SlideResponse {
    pub index: usize,
    pub total: usize,
    pub kind: SlideKind,
    pub has_prev: bool,
    pub has_next: bool,
    pub slide: Slide,
}

async fn load_recap(state: &AppState, user_id: Uuid, year: i32) -> AppResult<YearRecapData> {
    match get_full_year_recap(state.store.as_ref(), user_id, year).await {
        RecapOutcome::Ready(data) => Ok(data),
        RecapOutcome::NoData => Err(AppError::NotFound(format!(
            "No recap available for {year}"
        ))),
        RecapOutcome::Unavailable => Err(AppError::Unavailable(
            "Recap data is temporarily unavailable".into(),
        )),
    }
}

pub async fn get_recap(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(path): Path<RecapPath>,
) -> AppResult<Json<YearRecapData>> {
    path.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let data = load_recap(&state, auth_user.id, path.year).await?;
    Ok(Json(data))
}

pub async fn get_recap_slides(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(path): Path<RecapPath>,
) -> AppResult<Json<RecapSlideSet>> {
    path.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let data = load_recap(&state, auth_user.id, path.year).await?;
    Ok(Json(build_slide_sequence(&data, path.year)))
}

/// Single slide by position. Out-of-range indexes land on the last slide.
pub async fn get_recap_slide(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(path): Path<SlidePath>,
) -> AppResult<Json<SlideResponse>> {
    path.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let data = load_recap(&state, auth_user.id, path.year).await?;
    let set = build_slide_sequence(&data, path.year);
    let cursor = SlideCursor::at(path.index);

    let slide = set
        .slides
        .into_iter()
        .nth(cursor.index())
        .ok_or_else(|| AppError::NotFound("Slide not found".into()))?;

    Ok(Json(SlideResponse {
        index: cursor.index(),
        total: SLIDE_COUNT,
        kind: cursor.kind(),
        has_prev: cursor.has_prev(),
        has_next: cursor.has_next(),
        slide,
    }))
}

pub async fn get_recap_share(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(path): Path<RecapPath>,
) -> AppResult<Json<ShareCard>> {
    path.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let data = load_recap(&state, auth_user.id, path.year).await?;
    Ok(Json(share_card(&data.stats, path.year)))
}
