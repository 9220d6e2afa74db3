use crate::db::Db;
use crate::error::AppError;
use crate::models::leaderboard::*;
use crate::services::leaderboard as service;
use crate::validation;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;
use tracing::warn;

pub async fn get_top_players(
    db: web::types::State<Arc<Db>>,
    query: web::types::Query<LeaderboardQuery>,
) -> Result<HttpResponse, AppError> {
    let limit = validation::clamp_leaderboard_limit(query.limit);
    let board = top_or_empty(service::get_top_players(&db, limit));
    Ok(HttpResponse::Ok().json(&board))
}

/// The board degrades to an empty list when the store fails.
fn top_or_empty(result: Result<Vec<LeaderboardEntry>, AppError>) -> LeaderboardResponse {
    let entries = result.unwrap_or_else(|e| {
        warn!("Error fetching leaderboard: {}", e);
        Vec::new()
    });
    LeaderboardResponse { entries }
}

pub async fn get_player_standing(
    db: web::types::State<Arc<Db>>,
    path: web::types::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let standing = service::get_player_standing(&db, user_id.trim())?;
    Ok(HttpResponse::Ok().json(&StandingResponse {
        found: standing.is_some(),
        standing,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_store_failure_yields_empty_board() {
        let failed = Err(AppError::Store(StoreError::corrupt("leaderboard:global", "bad score")));
        let board = top_or_empty(failed);
        assert!(board.entries.is_empty());
        assert_eq!(
            serde_json::to_value(&board).unwrap(),
            serde_json::json!({ "entries": [] })
        );
    }

    #[test]
    fn test_entries_pass_through() {
        let entry = LeaderboardEntry {
            rank: 1,
            username: "Hero".into(),
            user_id: "u1".into(),
            avatar_url: String::new(),
            total_points: 540,
        };
        let board = top_or_empty(Ok(vec![entry]));
        assert_eq!(board.entries.len(), 1);
        assert_eq!(board.entries[0].total_points, 540);
    }
}
