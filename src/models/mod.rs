pub mod leaderboard;
pub mod levels;
pub mod score;
