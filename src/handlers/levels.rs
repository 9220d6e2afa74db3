use crate::config::GameConfig;
use crate::db::Db;
use crate::error::AppError;
use crate::models::levels::*;
use crate::services::level_unlock::{self as service, UnlockSchedule};
use crate::services::now_millis;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;

pub async fn initialize_launch(
    db: web::types::State<Arc<Db>>,
) -> Result<HttpResponse, AppError> {
    let launch_time = service::initialize_launch_time(&db, now_millis())?;
    Ok(HttpResponse::Ok().json(&LaunchInfo { launch_time }))
}

pub async fn get_unlock_status(
    db: web::types::State<Arc<Db>>,
    game: web::types::State<Arc<GameConfig>>,
) -> Result<HttpResponse, AppError> {
    let schedule = UnlockSchedule::from_config(&game);
    let status = service::get_unlock_status(&db, &schedule, now_millis())?;
    Ok(HttpResponse::Ok().json(&status))
}

pub async fn get_all_levels_info(
    db: web::types::State<Arc<Db>>,
    game: web::types::State<Arc<GameConfig>>,
) -> Result<HttpResponse, AppError> {
    let schedule = UnlockSchedule::from_config(&game);
    let levels = service::get_all_levels_unlock_info(&db, &schedule, now_millis())?;
    Ok(HttpResponse::Ok().json(&AllLevelsInfo { levels }))
}

pub async fn is_level_unlocked(
    db: web::types::State<Arc<Db>>,
    game: web::types::State<Arc<GameConfig>>,
    path: web::types::Path<String>,
) -> Result<HttpResponse, AppError> {
    let level_number = parse_level_number(&path.into_inner())?;

    let schedule = UnlockSchedule::from_config(&game);
    let is_unlocked = service::is_level_unlocked(&db, &schedule, level_number, now_millis())?;
    Ok(HttpResponse::Ok().json(&LevelUnlockedResponse { is_unlocked }))
}

fn parse_level_number(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid level number: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntex::http::StatusCode;

    #[test]
    fn test_level_number_from_path() {
        assert_eq!(parse_level_number("7").unwrap(), 7);
        assert_eq!(parse_level_number(" 12 ").unwrap(), 12);
        // Out-of-range numbers parse; the unlock check answers false for them.
        assert_eq!(parse_level_number("-1").unwrap(), -1);
    }

    #[test]
    fn test_non_integer_level_is_bad_request() {
        for raw in ["abc", "3.5", ""] {
            let err = parse_level_number(raw).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.body()["error"], format!("Invalid level number: {}", raw));
        }
    }
}
