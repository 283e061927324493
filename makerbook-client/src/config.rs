use crate::error::ClientError;
use crate::loading::LoadingTimings;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub ai_timeout: Duration,
    pub ai_detail_timeout: Duration,
    pub loading: LoadingTimings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            ai_timeout: Duration::from_secs(10),
            ai_detail_timeout: Duration::from_secs(30),
            loading: LoadingTimings::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Reads `MAKERBOOK_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("MAKERBOOK_API_URL").unwrap_or(defaults.base_url);
        let request_timeout = secs(&lookup, "MAKERBOOK_TIMEOUT_SECS")?
            .unwrap_or(defaults.request_timeout);
        let ai_timeout =
            secs(&lookup, "MAKERBOOK_AI_TIMEOUT_SECS")?.unwrap_or(defaults.ai_timeout);
        let ai_detail_timeout = secs(&lookup, "MAKERBOOK_AI_DETAIL_TIMEOUT_SECS")?
            .unwrap_or(defaults.ai_detail_timeout);
        let delay = millis(&lookup, "MAKERBOOK_LOADING_DELAY_MS")?
            .unwrap_or(defaults.loading.delay);
        let min_visible = millis(&lookup, "MAKERBOOK_LOADING_MIN_VISIBLE_MS")?
            .unwrap_or(defaults.loading.min_visible);

        Ok(Self {
            base_url,
            request_timeout,
            connect_timeout: defaults.connect_timeout,
            ai_timeout,
            ai_detail_timeout,
            loading: LoadingTimings { delay, min_visible },
        })
    }
}

fn parse<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ClientError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ClientError::Config(format!("{} must be a number, got '{}'", key, raw))),
        None => Ok(None),
    }
}

fn secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>, ClientError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parse::<F, u64>(lookup, key)?.map(Duration::from_secs))
}

fn millis<F>(lookup: &F, key: &str) -> Result<Option<Duration>, ClientError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parse::<F, u64>(lookup, key)?.map(Duration::from_millis))
}
