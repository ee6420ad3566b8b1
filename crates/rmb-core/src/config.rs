use std::{env, fs, path::Path};

use crate::{errors::Error, Result};

/// Typed configuration for the bot.
///
/// The Telegram token and the Mongo connection string are required; anything
/// missing is a startup error, never a per-request one.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_token: String,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub dashboard_url: String,
    pub password_length: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_token = env_str("TELEGRAM_TOKEN").and_then(non_empty).ok_or_else(|| {
            Error::Config("TELEGRAM_TOKEN environment variable is required".to_string())
        })?;
        let mongo_uri = env_str("MONGO_URI").and_then(non_empty).ok_or_else(|| {
            Error::Config("MONGO_URI environment variable is required".to_string())
        })?;

        let mongo_database = env_str("MONGO_DATABASE")
            .and_then(non_empty)
            .unwrap_or_else(|| "RecapMaker".to_string());
        let dashboard_url = env_str("DASHBOARD_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| "http://localhost:7860".to_string());
        let password_length = env_usize("PASSWORD_LENGTH")
            .unwrap_or(crate::credentials::DEFAULT_PASSWORD_LENGTH);

        Ok(Self {
            telegram_token,
            mongo_uri,
            mongo_database,
            dashboard_url,
            password_length,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}
