use crate::config::GameConfig;
use crate::db::Db;
use crate::error::AppError;
use crate::models::score::ScoreSubmission;
use crate::services::now_millis;
use crate::services::score as service;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;

pub async fn submit_score(
    db: web::types::State<Arc<Db>>,
    game: web::types::State<Arc<GameConfig>>,
    body: web::types::Json<ScoreSubmission>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let result = service::submit_level_completion(&db, &game, &req, now_millis())?;
    Ok(HttpResponse::Ok().json(&result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::level_unlock;
    use ntex::http::StatusCode;

    #[test]
    fn test_locked_level_answers_forbidden() {
        let db = Db::open_in_memory().unwrap();
        let game = GameConfig::default();
        let now = 1_700_000_000_000;
        level_unlock::initialize_launch_time(&db, now).unwrap();

        let req = ScoreSubmission {
            user_id: "u1".into(),
            username: "Hero".into(),
            avatar_url: None,
            level_number: 5,
            allies_saved: 1,
            time_spent: 60.0,
            retry_count: 0,
        };
        let err = service::submit_level_completion(&db, &game, &req, now).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            err.body(),
            serde_json::json!({ "success": false, "error": "Level is currently locked" })
        );
    }
}
