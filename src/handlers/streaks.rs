use axum::{extract::State, Extension, Json};

use crate::auth::middleware::AuthUser;
use crate::models::streak::StreakData;
use crate::services::streak::get_user_streak;
use crate::AppState;

pub async fn get_my_streak(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Json<StreakData> {
    let today = state.clock.today();
    Json(get_user_streak(state.store.as_ref(), today, auth_user.id).await)
}
