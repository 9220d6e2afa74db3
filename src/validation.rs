//! Server-side checks for everything a client sends us. Hero points are
//! always recomputed here from the raw completion stats; the client's own
//! number is never trusted.

use crate::models::score::{LevelBounds, LevelCompletion, ScoreValidation};

const MAX_PLAYER_NAME_LEN: usize = 32;
const MAX_USER_ID_LEN: usize = 64;
const MAX_REASONABLE_TIME: f64 = 3600.0; // one hour per level

pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 50;
const MAX_LEADERBOARD_LIMIT: i64 = 100;

const DEFAULT_BOUNDS: LevelBounds = LevelBounds {
    max_allies: 50,
    min_time: 10,
};

const LEVEL_BOUNDS: &[(i64, LevelBounds)] = &[
    (0, LevelBounds { max_allies: 0, min_time: 5 }), // tutorial
    (1, LevelBounds { max_allies: 3, min_time: 10 }),
    (2, LevelBounds { max_allies: 3, min_time: 10 }),
    (3, LevelBounds { max_allies: 4, min_time: 15 }),
    (4, LevelBounds { max_allies: 4, min_time: 15 }),
    (5, LevelBounds { max_allies: 5, min_time: 20 }),
];

pub fn bounds_for_level(level_number: i64) -> LevelBounds {
    LEVEL_BOUNDS
        .iter()
        .find(|(level, _)| *level == level_number)
        .map(|(_, bounds)| *bounds)
        .unwrap_or(DEFAULT_BOUNDS)
}

/// `(allies * 100) + max(0, 300 - seconds) - (retries * 5)`, never below zero.
pub fn calculate_hero_points(data: &LevelCompletion) -> i64 {
    let allies_points = data.allies_saved as f64 * 100.0;
    let time_points = (300.0 - data.time_spent).max(0.0);
    let retry_penalty = data.retry_count as f64 * 5.0;

    ((allies_points + time_points - retry_penalty).round() as i64).max(0)
}

pub fn validate_completion(data: &LevelCompletion, total_levels: i64) -> ScoreValidation {
    let mut errors = Vec::new();

    if data.level_number < 0 || data.level_number >= total_levels {
        errors.push(format!("Invalid level number: {}", data.level_number));
    }

    let bounds = bounds_for_level(data.level_number);

    if data.allies_saved < 0 || data.allies_saved > bounds.max_allies {
        errors.push(format!(
            "Invalid allies count: {} (Max: {})",
            data.allies_saved, bounds.max_allies
        ));
    }

    if !data.time_spent.is_finite() {
        errors.push("Invalid time: must be a finite number".to_string());
    } else if data.time_spent < 0.0 {
        errors.push("Invalid time: cannot be negative".to_string());
    } else if data.time_spent < bounds.min_time as f64 {
        errors.push(format!(
            "Completion too fast: {}s (Min: {}s)",
            data.time_spent, bounds.min_time
        ));
    } else if data.time_spent > MAX_REASONABLE_TIME {
        errors.push(format!(
            "Completion too slow: {}s (Max: {}s)",
            data.time_spent, MAX_REASONABLE_TIME
        ));
    }

    if data.retry_count < 0 {
        errors.push("Invalid retry count".to_string());
    }

    if !errors.is_empty() {
        return ScoreValidation {
            is_valid: false,
            hero_points: 0,
            errors,
        };
    }

    ScoreValidation {
        is_valid: true,
        hero_points: calculate_hero_points(data),
        errors,
    }
}

pub fn validate_user_id(user_id: &str) -> Result<&str, String> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        Err("userId is required".to_string())
    } else if trimmed.len() > MAX_USER_ID_LEN {
        Err(format!("userId is too long (Max: {})", MAX_USER_ID_LEN))
    } else {
        Ok(trimmed)
    }
}

pub fn validate_player_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        "Anonymous".to_string()
    } else {
        trimmed.chars().take(MAX_PLAYER_NAME_LEN).collect()
    }
}

pub fn clamp_leaderboard_limit(limit: Option<i64>) -> u64 {
    limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .clamp(1, MAX_LEADERBOARD_LIMIT) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(level: i64, allies: i64, time: f64, retries: i64) -> LevelCompletion {
        LevelCompletion {
            level_number: level,
            allies_saved: allies,
            time_spent: time,
            retry_count: retries,
        }
    }

    #[test]
    fn test_valid_completion_scores_formula() {
        let result = validate_completion(&completion(5, 3, 20.0, 0), 32);
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.hero_points, 580);
    }

    #[test]
    fn test_too_many_allies_mentions_max() {
        let result = validate_completion(&completion(5, 6, 20.0, 0), 32);
        assert!(!result.is_valid);
        assert_eq!(result.hero_points, 0);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("Max: 5"));
    }

    #[test]
    fn test_collects_every_violation() {
        let result = validate_completion(&completion(40, -1, 2.0, -3), 32);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 4);
        assert!(result.errors[0].starts_with("Invalid level number"));
        assert!(result.errors.iter().any(|e| e.starts_with("Completion too fast")));
        assert!(result.errors.iter().any(|e| e == "Invalid retry count"));
    }

    #[test]
    fn test_time_bounds() {
        assert!(validate_completion(&completion(7, 0, 10.0, 0), 32).is_valid);
        assert!(!validate_completion(&completion(7, 0, 9.5, 0), 32).is_valid);
        assert!(!validate_completion(&completion(7, 0, -1.0, 0), 32).is_valid);
        assert!(!validate_completion(&completion(7, 0, f64::NAN, 0), 32).is_valid);
        assert!(validate_completion(&completion(7, 0, 3600.0, 0), 32).is_valid);
        assert!(!validate_completion(&completion(7, 0, 3600.5, 0), 32).is_valid);
    }

    #[test]
    fn test_non_finite_time_has_its_own_message() {
        for time in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = validate_completion(&completion(7, 0, time, 0), 32);
            assert_eq!(result.errors, vec!["Invalid time: must be a finite number".to_string()]);
        }
        let negative = validate_completion(&completion(7, 0, -1.0, 0), 32);
        assert_eq!(negative.errors, vec!["Invalid time: cannot be negative".to_string()]);
    }

    #[test]
    fn test_tutorial_allows_no_allies() {
        assert!(validate_completion(&completion(0, 0, 5.0, 0), 32).is_valid);
        assert!(!validate_completion(&completion(0, 1, 5.0, 0), 32).is_valid);
    }

    #[test]
    fn test_unlisted_level_uses_defaults() {
        assert_eq!(bounds_for_level(17), DEFAULT_BOUNDS);
        assert!(validate_completion(&completion(17, 50, 10.0, 0), 32).is_valid);
        assert!(!validate_completion(&completion(17, 51, 10.0, 0), 32).is_valid);
    }

    #[test]
    fn test_hero_points_penalties() {
        // Slow clear: no time bonus.
        assert_eq!(calculate_hero_points(&completion(3, 2, 400.0, 0)), 200);
        // Retries cost 5 each.
        assert_eq!(calculate_hero_points(&completion(3, 2, 400.0, 4)), 180);
        // Fractional seconds round.
        assert_eq!(calculate_hero_points(&completion(3, 0, 299.4, 0)), 1);
        // Never negative.
        assert_eq!(calculate_hero_points(&completion(3, 0, 400.0, 10)), 0);
    }

    #[test]
    fn test_player_name_sanitized() {
        assert_eq!(validate_player_name("  hero  "), "hero");
        assert_eq!(validate_player_name("   "), "Anonymous");
        assert_eq!(validate_player_name(&"x".repeat(50)).len(), 32);
    }

    #[test]
    fn test_user_id_required() {
        assert_eq!(validate_user_id(" t2_abc "), Ok("t2_abc"));
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id(&"u".repeat(65)).is_err());
    }

    #[test]
    fn test_leaderboard_limit_clamped() {
        assert_eq!(clamp_leaderboard_limit(None), 50);
        assert_eq!(clamp_leaderboard_limit(Some(0)), 1);
        assert_eq!(clamp_leaderboard_limit(Some(500)), 100);
        assert_eq!(clamp_leaderboard_limit(Some(3)), 3);
    }
}
