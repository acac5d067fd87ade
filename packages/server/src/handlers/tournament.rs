use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::AppError;
use crate::models::tournament::TournamentListResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/tournaments",
    tag = "Tournaments",
    operation_id = "listTournaments",
    summary = "List active tournaments",
    description = "Returns active tournaments ordered by `sort_order`, then `id`.",
    responses(
        (status = 200, description = "Active tournaments", body = TournamentListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_tournaments(
    State(state): State<AppState>,
) -> Result<Json<TournamentListResponse>, AppError> {
    let tournaments = state.repo.active_tournaments().await?;
    Ok(Json(tournaments.into()))
}
