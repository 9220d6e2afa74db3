use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStats {
    pub user_id: String,
    pub username: String,
    pub avatar_url: String,
    pub total_points: i64,
    pub levels_completed: i64,
    pub last_played: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelScore {
    pub level_number: i64,
    pub hero_points: i64,
    pub allies_saved: i64,
    pub time_spent: f64,
    pub retry_count: i64,
    pub completed_at: i64,
}

/// Everything `submit_score` needs besides the store.
#[derive(Debug, Clone)]
pub struct ScoreRecord<'a> {
    pub user_id: &'a str,
    pub username: &'a str,
    pub avatar_url: &'a str,
    pub level_number: i64,
    pub hero_points: i64,
    pub allies_saved: i64,
    pub time_spent: f64,
    pub retry_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub total_points: i64,
    pub rank: u64,
    /// Points now on record for the submitted level.
    pub level_points: i64,
    /// False when the submission left the stored record untouched.
    pub updated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u64,
    pub username: String,
    pub user_id: String,
    pub avatar_url: String,
    pub total_points: i64,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStanding {
    pub rank: u64,
    pub total_points: i64,
    pub levels_completed: i64,
}

#[derive(Debug, Serialize)]
pub struct StandingResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standing: Option<PlayerStanding>,
}
