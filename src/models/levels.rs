use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockStatus {
    pub unlocked_levels: i64,
    /// None once every level is unlocked.
    pub next_unlock_time: Option<i64>,
    pub total_levels: i64,
    pub days_elapsed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUnlockInfo {
    pub level_number: i64,
    pub is_unlocked: bool,
    pub unlock_time: Option<i64>,
    pub time_until_unlock: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AllLevelsInfo {
    pub levels: Vec<LevelUnlockInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUnlockedResponse {
    pub is_unlocked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchInfo {
    pub launch_time: i64,
}
