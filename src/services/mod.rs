pub mod leaderboard;
pub mod level_unlock;
pub mod score;

/// Wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
