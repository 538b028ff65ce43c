//! Endpoints and credentials for the built-in services.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Base URLs and request parameters of the built-in services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// NYTimes most-popular API base.
    pub nytimes_base: String,
    /// Periods (days) to pick from for most-viewed articles.
    pub nytimes_periods: Vec<u32>,
    /// CatFacts API base.
    pub catfacts_base: String,
    /// WeatherStack API base.
    pub weather_base: String,
    /// Cities to pick from for current weather.
    pub weather_cities: Vec<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            nytimes_base: "https://api.nytimes.com/svc/mostpopular/v2".into(),
            // 7 and 30 are valid too, but the responses get very large
            nytimes_periods: vec![1],
            catfacts_base: "https://catfact.ninja".into(),
            weather_base: "http://api.weatherstack.com".into(),
            weather_cities: ["Tokyo", "Paris", "London", "Shanghai"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Environment variable holding the NYTimes API key.
pub const NYTIMES_API_KEY: &str = "NYTIMES_API_KEY";
/// Environment variable holding the WeatherStack access key.
pub const WEATHERSTACK_API_KEY: &str = "WEATHERSTACK_API_KEY";

/// API keys, read from the environment (and `.env`).
#[derive(Clone, Default)]
pub struct Credentials {
    /// NYTimes API key.
    pub nytimes_api_key: Option<String>,
    /// WeatherStack access key.
    pub weatherstack_api_key: Option<String>,
}

impl Credentials {
    /// Read keys from the process environment, loading `.env` first if present.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            nytimes_api_key: dotenvy::var(NYTIMES_API_KEY).ok().filter(|k| !k.is_empty()),
            weatherstack_api_key: dotenvy::var(WEATHERSTACK_API_KEY)
                .ok()
                .filter(|k| !k.is_empty()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("nytimes_api_key", &self.nytimes_api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "weatherstack_api_key",
                &self.weatherstack_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
