use log::debug;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::standings::Standings;
use crate::{ClubConfig, MatchRow};

pub type SourceResult<T> = Result<T, SourceError>;

#[derive(Debug)]
pub enum SourceError {
    Network(reqwest::Error, String),
    Http(StatusCode, String),
    Parsing(reqwest::Error, String),
    Io(std::io::Error, PathBuf),
    Json(serde_json::Error, String),
    NotFound(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            SourceError::Http(status, url) => write!(f, "HTTP {status} for {url}"),
            SourceError::Parsing(e, url) => write!(f, "Could not read body of {url}: {e}"),
            SourceError::Io(e, path) => write!(f, "Could not read {}: {e}", path.display()),
            SourceError::Json(e, origin) => write!(f, "Invalid JSON in {origin}: {e}"),
            SourceError::NotFound(what) => write!(f, "Not found: {what}"),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Network(e, _) | SourceError::Parsing(e, _) => Some(e),
            SourceError::Io(e, _) => Some(e),
            SourceError::Json(e, _) => Some(e),
            SourceError::Http(..) | SourceError::NotFound(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Locations: a local file or an http(s) URL
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Path(PathBuf),
    Url(String),
}

impl Location {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Location::Url(raw.to_string())
        } else {
            Location::Path(PathBuf::from(raw))
        }
    }

    /// Resolve `name` next to this location (same directory or URL base).
    /// Absolute paths and full URLs are returned unchanged.
    pub fn sibling(&self, name: &str) -> Location {
        match Location::parse(name) {
            url @ Location::Url(_) => url,
            Location::Path(path) if path.is_absolute() => Location::Path(path),
            Location::Path(path) => match self {
                Location::Path(base) => {
                    let dir = base.parent().unwrap_or_else(|| Path::new(""));
                    Location::Path(dir.join(path))
                }
                Location::Url(base) => match Url::parse(base).and_then(|b| b.join(name)) {
                    Ok(url) => Location::Url(url.to_string()),
                    Err(e) => {
                        debug!("could not resolve {name} against {base}: {e}");
                        Location::Path(path)
                    }
                },
            },
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Path(path) => write!(f, "{}", path.display()),
            Location::Url(url) => f.write_str(url),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Loads the club config, fixture rows and standings from files or URLs.
#[derive(Debug, Clone)]
pub struct VolleySource {
    client: Client,
    timeout: Duration,
}

impl Default for VolleySource {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("rmvolley/0.1 (terminal club dashboard)")
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl VolleySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn fetch_config(&self, location: &Location) -> SourceResult<ClubConfig> {
        let body = self.read(location).await?;
        parse_config_json(&body).map_err(|e| SourceError::Json(e, location.to_string()))
    }

    pub async fn fetch_rows(&self, location: &Location) -> SourceResult<Vec<MatchRow>> {
        let body = self.read(location).await?;
        let rows =
            parse_rows_json(&body).map_err(|e| SourceError::Json(e, location.to_string()))?;
        debug!("loaded {} rows from {location}", rows.len());
        Ok(rows)
    }

    pub async fn fetch_standings(&self, location: &Location) -> SourceResult<Standings> {
        let body = self.read(location).await?;
        parse_standings_json(&body).map_err(|e| SourceError::Json(e, location.to_string()))
    }

    async fn read(&self, location: &Location) -> SourceResult<String> {
        match location {
            Location::Path(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SourceError::NotFound(path.display().to_string())
                } else {
                    SourceError::Io(e, path.clone())
                }
            }),
            Location::Url(url) => self.get_text(url).await,
        }
    }

    async fn get_text(&self, url: &str) -> SourceResult<String> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SourceError::Network(e, url.to_owned()))?;

        match response.status() {
            status if status.is_success() => response
                .text()
                .await
                .map_err(|e| SourceError::Parsing(e, url.to_owned())),
            StatusCode::NOT_FOUND => Err(SourceError::NotFound(url.to_owned())),
            status => Err(SourceError::Http(status, url.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Pure parsers
// ---------------------------------------------------------------------------

pub fn parse_rows_json(body: &str) -> Result<Vec<MatchRow>, serde_json::Error> {
    parse_or_default(body)
}

pub fn parse_config_json(body: &str) -> Result<ClubConfig, serde_json::Error> {
    parse_or_default(body)
}

pub fn parse_standings_json(body: &str) -> Result<Standings, serde_json::Error> {
    parse_or_default(body)
}

/// An empty body or a bare `null` reads as the empty value.
fn parse_or_default<T: Default + DeserializeOwned>(body: &str) -> Result<T, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str::<Option<T>>(body).map(Option::unwrap_or_default)
}

// ---------------------------------------------------------------------------
// Lenient cell readers for spreadsheet exports
// ---------------------------------------------------------------------------

/// Read a cell as text: strings as-is, numbers and booleans rendered, anything
/// else (null, arrays, objects) as "".
pub fn lenient_cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => render_number(&n),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Read a cell as a non-negative count: numbers and numeric strings, else 0.
pub fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let count = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
        }
        _ => None,
    };
    Ok(count.map(|c| c.min(u64::from(u32::MAX)) as u32).unwrap_or(0))
}

/// Integral floats ("45721.0") print without the fraction, so serial dates stay parseable.
fn render_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}
