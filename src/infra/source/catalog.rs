//! Catalog of the built-in services.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::seq::IndexedRandom;

use crate::config::{Credentials, EndpointConfig, NYTIMES_API_KEY, WEATHERSTACK_API_KEY};
use crate::core::ConfigError;

use super::http::{Endpoint, HttpSource};

/// Services this poller knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// NYTimes most-viewed articles.
    NyTimes,
    /// A random cat fact.
    CatFacts,
    /// WeatherStack current weather for a random city.
    Weather,
}

impl ServiceKind {
    /// Every service, in display order.
    pub const ALL: [Self; 3] = [Self::NyTimes, Self::CatFacts, Self::Weather];

    /// Service name as used on the command line, in logs, and as the job key.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NyTimes => "NYTimes",
            Self::CatFacts => "CatFacts",
            Self::Weather => "Weather",
        }
    }

    /// Environment variable holding this service's key, if it needs one.
    #[must_use]
    pub const fn credential_var(self) -> Option<&'static str> {
        match self {
            Self::NyTimes => Some(NYTIMES_API_KEY),
            Self::CatFacts => None,
            Self::Weather => Some(WEATHERSTACK_API_KEY),
        }
    }

    /// Comma-separated list of every service name.
    #[must_use]
    pub fn catalog() -> String {
        Self::ALL.map(Self::name).join(",")
    }

    /// Build the HTTP source for this service.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingCredential` if the service's key is not set
    /// - `ConfigError::Invalid` if a pick list is empty or the client cannot be built
    pub fn build_source(
        self,
        endpoints: &EndpointConfig,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<HttpSource, ConfigError> {
        match self {
            Self::NyTimes => {
                let key = self.require(credentials.nytimes_api_key.as_ref())?;
                let base = endpoints.nytimes_base.trim_end_matches('/').to_owned();
                let periods = non_empty(endpoints.nytimes_periods.clone(), "nytimes_periods")?;
                HttpSource::new(self.name(), timeout, move || {
                    let period = periods.choose(&mut rand::rng()).copied().unwrap_or(1);
                    Endpoint::new(format!("{base}/viewed/{period}.json")).with_query("api-key", &key)
                })
            }
            Self::CatFacts => {
                let url = format!("{}/fact", endpoints.catfacts_base.trim_end_matches('/'));
                HttpSource::new(self.name(), timeout, move || Endpoint::new(url.clone()))
            }
            Self::Weather => {
                let key = self.require(credentials.weatherstack_api_key.as_ref())?;
                let url = format!("{}/current", endpoints.weather_base.trim_end_matches('/'));
                let cities = non_empty(endpoints.weather_cities.clone(), "weather_cities")?;
                HttpSource::new(self.name(), timeout, move || {
                    let city = cities.choose(&mut rand::rng()).cloned().unwrap_or_default();
                    Endpoint::new(url.clone())
                        .with_query("access_key", &key)
                        .with_query("query", city)
                })
            }
        }
    }

    fn require(self, key: Option<&String>) -> Result<String, ConfigError> {
        key.cloned().ok_or_else(|| ConfigError::MissingCredential {
            service: self.name().to_owned(),
            var: self.credential_var().unwrap_or_default().to_owned(),
        })
    }
}

fn non_empty<T>(items: Vec<T>, field: &str) -> Result<Vec<T>, ConfigError> {
    if items.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must not be empty")));
    }
    Ok(items)
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ServiceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ConfigError::UnknownService(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Source;

    fn creds() -> Credentials {
        Credentials {
            nytimes_api_key: Some("nyt-key".into()),
            weatherstack_api_key: Some("ws-key".into()),
        }
    }

    #[test]
    fn test_names_round_trip() {
        for kind in ServiceKind::ALL {
            assert_eq!(kind.name().parse::<ServiceKind>().unwrap(), kind);
        }
        assert!(matches!(
            "nytimes".parse::<ServiceKind>(),
            Err(ConfigError::UnknownService(_))
        ));
        assert_eq!(ServiceKind::catalog(), "NYTimes,CatFacts,Weather");
    }

    #[test]
    fn test_nytimes_endpoint() {
        let source = ServiceKind::NyTimes
            .build_source(&EndpointConfig::default(), &creds(), Duration::from_secs(5))
            .unwrap();
        let endpoint = source.next_endpoint();
        assert_eq!(source.service_name(), "NYTimes");
        assert_eq!(
            endpoint.url,
            "https://api.nytimes.com/svc/mostpopular/v2/viewed/1.json"
        );
        assert_eq!(
            endpoint.query,
            vec![("api-key".to_string(), "nyt-key".to_string())]
        );
    }

    #[test]
    fn test_weather_picks_configured_city() {
        let endpoints = EndpointConfig {
            weather_cities: vec!["Oslo".into()],
            ..EndpointConfig::default()
        };
        let source = ServiceKind::Weather
            .build_source(&endpoints, &creds(), Duration::from_secs(5))
            .unwrap();
        let endpoint = source.next_endpoint();
        assert_eq!(endpoint.url, "http://api.weatherstack.com/current");
        assert!(endpoint
            .query
            .contains(&("query".to_string(), "Oslo".to_string())));
    }

    #[test]
    fn test_catfacts_needs_no_key() {
        let source = ServiceKind::CatFacts
            .build_source(
                &EndpointConfig::default(),
                &Credentials::default(),
                Duration::from_secs(5),
            )
            .unwrap();
        assert_eq!(source.next_endpoint().url, "https://catfact.ninja/fact");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = ServiceKind::Weather
            .build_source(
                &EndpointConfig::default(),
                &Credentials::default(),
                Duration::from_secs(5),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingCredential { ref var, .. } if var == WEATHERSTACK_API_KEY
        ));
    }

    #[test]
    fn test_empty_city_list_rejected() {
        let endpoints = EndpointConfig {
            weather_cities: Vec::new(),
            ..EndpointConfig::default()
        };
        assert!(ServiceKind::Weather
            .build_source(&endpoints, &creds(), Duration::from_secs(5))
            .is_err());
    }
}
