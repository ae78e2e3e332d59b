use std::collections::BTreeMap;

use crate::credential::ApiCredential;

const PORT_VAR: &str = "PORT";
const ORIGINS_VAR: &str = "ALLOWED_ORIGINS";
const MODE_VAR: &str = "APP_ENV";

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_ORIGIN: &str = "http://localhost:5173";

/// Startup settings: the upstream credential, listen port, CORS allow-list,
/// and deployment mode. Read once from a `.env` file merged with the process
/// environment; file values win so a local `.env` can pin a deployment
/// without touching the shell.
#[derive(Clone, Debug)]
pub struct Settings {
    pub credential: Option<ApiCredential>,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub development: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credential: None,
            port: DEFAULT_PORT,
            allowed_origins: vec![DEFAULT_ORIGIN.to_string()],
            development: false,
        }
    }
}

impl Settings {
    /// Reads `./.env` if present; without one the process environment alone
    /// supplies the values.
    pub fn load() -> Self {
        let contents = std::fs::read_to_string(".env").unwrap_or_default();
        Self::from_dotenv(&contents)
    }

    pub fn from_dotenv(contents: &str) -> Self {
        let file: BTreeMap<String, String> = contents.lines().filter_map(parse_line).collect();
        let lookup = |key: &str| {
            file.get(key).cloned().or_else(|| {
                std::env::var(key)
                    .ok()
                    .filter(|value| !value.trim().is_empty())
            })
        };

        Self {
            credential: lookup(ApiCredential::ENV_VAR).map(ApiCredential::new),
            port: lookup(PORT_VAR)
                .and_then(|port| port.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            allowed_origins: lookup(ORIGINS_VAR)
                .map(|raw| split_origins(&raw))
                .filter(|origins| !origins.is_empty())
                .unwrap_or_else(|| vec![DEFAULT_ORIGIN.to_string()]),
            development: lookup(MODE_VAR).is_some_and(|mode| mode.trim() == "development"),
        }
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_line(raw: &str) -> Option<(String, String)> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let (key, value) = (key.trim(), unquote(value.trim()));
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
