use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// What happens when a player completes a level they already have a record for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResubmissionPolicy {
    /// A strictly better score replaces the old record.
    KeepBest,
    /// The first completion is permanent.
    FirstOnly,
}

impl FromStr for ResubmissionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep-best" => Ok(ResubmissionPolicy::KeepBest),
            "first-only" => Ok(ResubmissionPolicy::FirstOnly),
            other => Err(format!("expected keep-best or first-only, got {}", other)),
        }
    }
}

/// How a player's total is maintained after a level record changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulation {
    /// Apply the delta of the changed level to the stored total.
    Incremental,
    /// Sum every completed level record again.
    Recompute,
}

impl FromStr for Accumulation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incremental" => Ok(Accumulation::Incremental),
            "recompute" => Ok(Accumulation::Recompute),
            other => Err(format!("expected incremental or recompute, got {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub total_levels: i64,
    pub initially_unlocked: i64,
    pub resubmission: ResubmissionPolicy,
    pub accumulation: Accumulation,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            total_levels: 32,
            initially_unlocked: 2,
            resubmission: ResubmissionPolicy::KeepBest,
            accumulation: Accumulation::Incremental,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub store_timeout: Duration,
    pub game: GameConfig,
}

fn parse_var<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    match env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = GameConfig::default();
        let total_levels: i64 = parse_var("TOTAL_LEVELS", defaults.total_levels)?;
        if total_levels < 1 {
            return Err(ConfigError::Invalid {
                var: "TOTAL_LEVELS",
                value: total_levels.to_string(),
                reason: "must be at least 1".into(),
            });
        }
        let initially_unlocked: i64 =
            parse_var("INITIALLY_UNLOCKED", defaults.initially_unlocked)?;
        if initially_unlocked < 1 || initially_unlocked > total_levels {
            return Err(ConfigError::Invalid {
                var: "INITIALLY_UNLOCKED",
                value: initially_unlocked.to_string(),
                reason: format!("must be between 1 and {}", total_levels),
            });
        }

        Ok(ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("PORT", 3001)?,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "north-hero.db".into()),
            store_timeout: Duration::from_millis(parse_var("STORE_TIMEOUT_MS", 5000)?),
            game: GameConfig {
                total_levels,
                initially_unlocked,
                resubmission: parse_var("SCORE_RESUBMISSION", defaults.resubmission)?,
                accumulation: parse_var("SCORE_ACCUMULATION", defaults.accumulation)?,
            },
        })
    }
}
