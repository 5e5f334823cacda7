use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use habits_api::analytics::LongestStreakScope;
use habits_api::password::PasswordHashing;

// argon2 crate defaults (OWASP baseline)
const DEFAULT_ARGON2_M_COST: u32 = 19 * 1024;
const DEFAULT_ARGON2_T_COST: u32 = 2;
const DEFAULT_ARGON2_P_COST: u32 = 1;

/// Server settings read from `HABITS_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub streak_scope: LongestStreakScope,
    pub seed_demo: bool,
    pub argon2_m_cost: u32,
    pub argon2_t_cost: u32,
    pub argon2_p_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HABITS_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parsed(&lookup, "HABITS_PORT", 8000)?;
        let db_path = lookup("HABITS_DB_PATH")
            .unwrap_or_else(|| "habits.db".into())
            .into();
        let streak_scope = match lookup("HABITS_LONGEST_STREAK_SCOPE") {
            Some(raw) => raw.parse().context("HABITS_LONGEST_STREAK_SCOPE")?,
            None => LongestStreakScope::default(),
        };
        let seed_demo = match lookup("HABITS_SEED_DEMO") {
            Some(raw) => parse_flag(&raw).context("HABITS_SEED_DEMO")?,
            None => false,
        };

        Ok(Self {
            host,
            port,
            db_path,
            streak_scope,
            seed_demo,
            argon2_m_cost: parsed(&lookup, "HABITS_ARGON2_M_COST", DEFAULT_ARGON2_M_COST)?,
            argon2_t_cost: parsed(&lookup, "HABITS_ARGON2_T_COST", DEFAULT_ARGON2_T_COST)?,
            argon2_p_cost: parsed(&lookup, "HABITS_ARGON2_P_COST", DEFAULT_ARGON2_P_COST)?,
        })
    }

    pub fn password_hashing(&self) -> Result<PasswordHashing> {
        PasswordHashing::with_costs(self.argon2_m_cost, self.argon2_t_cost, self.argon2_p_cost)
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{}: invalid value '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(anyhow!("expected a boolean, got '{}'", other)),
    }
}
