use serde::{Deserialize, Serialize};

/// A level-completion claim sent by the client after finishing a level.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub level_number: i64,
    pub allies_saved: i64,
    /// Seconds.
    pub time_spent: f64,
    pub retry_count: i64,
}

impl ScoreSubmission {
    pub fn completion(&self) -> LevelCompletion {
        LevelCompletion {
            level_number: self.level_number,
            allies_saved: self.allies_saved,
            time_spent: self.time_spent,
            retry_count: self.retry_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelCompletion {
    pub level_number: i64,
    pub allies_saved: i64,
    pub time_spent: f64,
    pub retry_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreValidation {
    pub is_valid: bool,
    pub hero_points: i64,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelBounds {
    pub max_allies: i64,
    pub min_time: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmissionResult {
    pub success: bool,
    pub hero_points: i64,
    pub total_points: i64,
    pub rank: u64,
    pub message: String,
}
