use crate::config::GameConfig;
use crate::db::Db;
use crate::error::AppError;
use crate::models::leaderboard::ScoreRecord;
use crate::models::score::{ScoreSubmission, ScoreSubmissionResult};
use crate::services::leaderboard;
use crate::services::level_unlock::{self, UnlockSchedule};
use crate::validation;
use tracing::warn;

/// Validate a level completion, check the level is open, then record it.
/// Nothing is written unless every check passes.
pub fn submit_level_completion(
    db: &Db,
    game: &GameConfig,
    req: &ScoreSubmission,
    now: i64,
) -> Result<ScoreSubmissionResult, AppError> {
    let mut errors = Vec::new();

    let user_id = match validation::validate_user_id(&req.user_id) {
        Ok(id) => Some(id),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    let checked = validation::validate_completion(&req.completion(), game.total_levels);
    errors.extend(checked.errors);

    let user_id = match user_id {
        Some(id) if errors.is_empty() => id,
        _ => {
            warn!(
                "Rejected submission from {:?} for level {}: {}",
                req.user_id,
                req.level_number,
                errors.join("; ")
            );
            return Err(AppError::Validation(errors));
        }
    };

    let schedule = UnlockSchedule::from_config(game);
    if !level_unlock::is_level_unlocked(db, &schedule, req.level_number, now)? {
        warn!("{} submitted locked level {}", user_id, req.level_number);
        return Err(AppError::LevelLocked);
    }

    let username = validation::validate_player_name(&req.username);
    let record = ScoreRecord {
        user_id,
        username: &username,
        avatar_url: req.avatar_url.as_deref().unwrap_or("").trim(),
        level_number: req.level_number,
        hero_points: checked.hero_points,
        allies_saved: req.allies_saved,
        time_spent: req.time_spent,
        retry_count: req.retry_count,
    };
    let outcome = leaderboard::submit_score(db, game, &record, now)?;

    let message = if outcome.updated {
        "Score submitted successfully"
    } else {
        "Level already completed - score not updated"
    };

    Ok(ScoreSubmissionResult {
        success: true,
        hero_points: outcome.level_points,
        total_points: outcome.total_points,
        rank: outcome.rank,
        message: message.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::level_unlock::MS_PER_DAY;

    const LAUNCH: i64 = 1_700_000_000_000;

    fn submission(user_id: &str, level_number: i64, allies: i64, time: f64) -> ScoreSubmission {
        ScoreSubmission {
            user_id: user_id.to_string(),
            username: format!("  {}  ", user_id),
            avatar_url: None,
            level_number,
            allies_saved: allies,
            time_spent: time,
            retry_count: 0,
        }
    }

    fn launched_db() -> Db {
        let db = Db::open_in_memory().unwrap();
        level_unlock::initialize_launch_time(&db, LAUNCH).unwrap();
        db
    }

    #[test]
    fn test_accepted_submission() {
        let db = launched_db();
        let game = GameConfig::default();
        let result =
            submit_level_completion(&db, &game, &submission("u1", 1, 3, 60.0), LAUNCH).unwrap();
        assert!(result.success);
        assert_eq!(result.hero_points, 540);
        assert_eq!(result.total_points, 540);
        assert_eq!(result.rank, 1);
        assert_eq!(result.message, "Score submitted successfully");

        let standing = leaderboard::get_player_standing(&db, "u1").unwrap().unwrap();
        assert_eq!(standing.total_points, 540);
        assert_eq!(standing.levels_completed, 1);
    }

    #[test]
    fn test_replay_reports_not_updated() {
        let db = launched_db();
        let game = GameConfig::default();
        submit_level_completion(&db, &game, &submission("u1", 1, 3, 60.0), LAUNCH).unwrap();
        let replay =
            submit_level_completion(&db, &game, &submission("u1", 1, 1, 60.0), LAUNCH).unwrap();
        assert_eq!(replay.hero_points, 540);
        assert_eq!(replay.total_points, 540);
        assert_eq!(replay.message, "Level already completed - score not updated");
    }

    #[test]
    fn test_invalid_submission_writes_nothing() {
        let db = launched_db();
        let game = GameConfig::default();
        let mut bad = submission("", 1, 9, 1.0);
        bad.retry_count = -1;

        match submit_level_completion(&db, &game, &bad, LAUNCH) {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors.len(), 4);
                assert_eq!(errors[0], "userId is required");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(leaderboard::get_top_players(&db, 10).unwrap().is_empty());
    }

    #[test]
    fn test_locked_level_rejected() {
        let db = launched_db();
        let game = GameConfig::default();

        let locked = submit_level_completion(&db, &game, &submission("u1", 2, 1, 60.0), LAUNCH);
        assert!(matches!(locked, Err(AppError::LevelLocked)));
        assert_eq!(leaderboard::get_player_rank(&db, "u1").unwrap(), 0);

        let next_day = LAUNCH + MS_PER_DAY;
        let opened = submit_level_completion(&db, &game, &submission("u1", 2, 1, 60.0), next_day);
        assert!(opened.is_ok());
    }

    #[test]
    fn test_username_is_sanitized() {
        let db = launched_db();
        let game = GameConfig::default();
        submit_level_completion(&db, &game, &submission("u1", 0, 0, 30.0), LAUNCH).unwrap();
        let top = leaderboard::get_top_players(&db, 1).unwrap();
        assert_eq!(top[0].username, "u1");
    }
}
