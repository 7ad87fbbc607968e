use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;
use chrono_tz::Tz;

use crate::models::{City, CityList, CityListError};
use crate::services::rotation::{RotationPolicy, UnknownCityPolicy};

/// Cities used when `CITIES` is not set
const DEFAULT_CITIES: &[(&str, f64, f64)] = &[
    ("New York City", 40.7128, -74.0060),
    ("Los Angeles", 34.0522, -118.2437),
    ("Chicago", 41.8781, -87.6298),
    ("Houston", 29.7604, -95.3698),
    ("Phoenix", 33.4484, -112.0740),
    ("Philadelphia", 39.9526, -75.1652),
    ("San Antonio", 29.4241, -98.4936),
    ("San Diego", 32.7157, -117.1611),
    ("Dallas", 32.7767, -96.7970),
    ("San Jose", 37.3382, -121.8863),
];

const DEFAULT_RESET_INTERVAL_HOURS: u32 = 10;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub rotation: RotationConfig,
    pub weather: WeatherConfig,
    pub posting: PostingConfig,
    pub state: StateConfig,
    /// Timezone used for the times shown in posts
    pub timezone: Tz,
    /// Image attached to every post
    pub image_path: String,
}

/// City rotation configuration
#[derive(Debug, Clone)]
pub struct RotationConfig {
    pub cities: CityList,
    pub reset_interval_hours: u32,
    pub unknown_city_policy: UnknownCityPolicy,
}

/// Weather API configuration
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub timeout: Duration,
}

/// How updates are published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostMode {
    /// Log the update instead of publishing it
    #[default]
    DryRun,
    Twitter,
    Webhook,
}

/// Posting configuration
#[derive(Debug, Clone)]
pub struct PostingConfig {
    pub mode: PostMode,
    pub twitter: TwitterConfig,
    pub webhook: WebhookConfig,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TwitterConfig {
    /// OAuth 2.0 user-context access token
    pub access_token: Option<String>,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: Option<String>,
    /// HMAC-SHA256 signing secret
    pub secret: Option<String>,
}

/// Where the rotation state lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateBackend {
    #[default]
    File,
    Postgres,
}

/// Rotation state storage configuration
#[derive(Debug, Clone)]
pub struct StateConfig {
    pub backend: StateBackend,
    pub file_path: String,
    /// Present when `backend` is `Postgres`
    pub database: Option<DatabaseConfig>,
}

/// Database connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let timezone_name =
            env::var("BOT_TIMEZONE").unwrap_or_else(|_| "America/New_York".to_string());
        let timezone = timezone_name
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(timezone_name))?;

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            rotation: RotationConfig::from_env()?,
            weather: WeatherConfig::from_env(),
            posting: PostingConfig::from_env()?,
            state: StateConfig::from_env()?,
            timezone,
            image_path: env::var("IMAGE_PATH")
                .unwrap_or_else(|_| "its_going_to_rain.png".to_string()),
        })
    }
}

impl RotationConfig {
    /// Load rotation configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let cities = match env::var("CITIES") {
            Ok(raw) => parse_cities(&raw)?,
            Err(_) => default_cities(),
        };

        let unknown_city_policy = match env::var("UNKNOWN_CITY_POLICY") {
            Ok(raw) => raw.parse()?,
            Err(_) => UnknownCityPolicy::default(),
        };

        let reset_interval_hours = env::var("RESET_INTERVAL_HOURS")
            .unwrap_or_else(|_| DEFAULT_RESET_INTERVAL_HOURS.to_string())
            .parse()
            .unwrap_or(DEFAULT_RESET_INTERVAL_HOURS);
        // A zero interval resets every cycle and the rotation never advances
        if reset_interval_hours == 0 {
            return Err(ConfigError::InvalidResetInterval);
        }

        Ok(Self {
            cities,
            reset_interval_hours,
            unknown_city_policy,
        })
    }

    pub fn policy(&self) -> RotationPolicy {
        RotationPolicy::new(TimeDelta::hours(i64::from(self.reset_interval_hours)))
            .with_unknown_city(self.unknown_city_policy)
    }
}

impl WeatherConfig {
    /// Load weather API configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("WEATHER_API_KEY").ok().filter(|k| !k.is_empty()),
            api_url: env::var("WEATHER_API_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org".to_string()),
            timeout: Duration::from_secs(
                env::var("WEATHER_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            ),
        }
    }
}

impl PostingConfig {
    /// Load posting configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let legacy_twitter = env::var("POST_TO_TWITTER_ENABLED")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        let mode = match env::var("POST_MODE") {
            Ok(raw) => raw.parse()?,
            Err(_) if legacy_twitter => PostMode::Twitter,
            Err(_) => PostMode::DryRun,
        };

        Ok(Self {
            mode,
            twitter: TwitterConfig {
                access_token: env::var("TWITTER_ACCESS_TOKEN").ok().filter(|t| !t.is_empty()),
                api_url: env::var("TWITTER_API_URL")
                    .unwrap_or_else(|_| "https://api.x.com".to_string()),
            },
            webhook: WebhookConfig {
                url: env::var("WEBHOOK_URL").ok().filter(|u| !u.is_empty()),
                secret: env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),
            },
            timeout: Duration::from_secs(
                env::var("POST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            ),
        })
    }
}

impl StateConfig {
    /// Load state storage configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match env::var("STATE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => StateBackend::default(),
        };

        let database = match backend {
            StateBackend::Postgres => Some(DatabaseConfig::from_env()?),
            StateBackend::File => None,
        };

        Ok(Self {
            backend,
            file_path: env::var("STATE_FILE").unwrap_or_else(|_| "city_tweet_log.json".to_string()),
            database,
        })
    }
}

impl DatabaseConfig {
    /// Load database configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        Ok(Self {
            url,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap_or(2),
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            acquire_timeout: Duration::from_secs(
                env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            ),
            idle_timeout: Duration::from_secs(
                env::var("DATABASE_IDLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()
                    .unwrap_or(600),
            ),
            max_lifetime: Duration::from_secs(
                env::var("DATABASE_MAX_LIFETIME_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()
                    .unwrap_or(1800),
            ),
        })
    }
}

impl FromStr for PostMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dry_run" | "dry-run" | "test" => Ok(Self::DryRun),
            "twitter" | "x" => Ok(Self::Twitter),
            "webhook" => Ok(Self::Webhook),
            other => Err(ConfigError::InvalidPostMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for PostMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostMode::DryRun => write!(f, "TEST MODE"),
            PostMode::Twitter => write!(f, "LIVE MODE (twitter)"),
            PostMode::Webhook => write!(f, "LIVE MODE (webhook)"),
        }
    }
}

impl FromStr for StateBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(ConfigError::InvalidStateBackend(other.to_string())),
        }
    }
}

/// Parses `Name[:lat:lon]` entries separated by `;`.
///
/// `New York City:40.7128:-74.0060;Chicago` yields one city with coordinates
/// and one looked up by name.
pub fn parse_cities(raw: &str) -> Result<CityList, ConfigError> {
    let mut cities = Vec::new();

    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
        let city = match parts.as_slice() {
            [name] => City::named(*name),
            [name, lat, lon] => {
                let lat: f64 = lat
                    .parse()
                    .map_err(|_| ConfigError::InvalidCityEntry(entry.to_string()))?;
                let lon: f64 = lon
                    .parse()
                    .map_err(|_| ConfigError::InvalidCityEntry(entry.to_string()))?;
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(ConfigError::InvalidCityEntry(entry.to_string()));
                }
                City::with_coordinates(*name, lat, lon)
            }
            _ => return Err(ConfigError::InvalidCityEntry(entry.to_string())),
        };
        cities.push(city);
    }

    CityList::new(cities).map_err(ConfigError::InvalidCities)
}

/// The built-in rotation: the ten most populous US cities
pub fn default_cities() -> CityList {
    let cities = DEFAULT_CITIES
        .iter()
        .map(|(name, lat, lon)| City::with_coordinates(*name, *lat, *lon))
        .collect();

    match CityList::new(cities) {
        Ok(list) => list,
        // The constant above is non-empty and distinct
        Err(e) => unreachable!("built-in city list is invalid: {}", e),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidCities(CityListError),
    InvalidCityEntry(String),
    InvalidTimezone(String),
    InvalidPostMode(String),
    InvalidStateBackend(String),
    InvalidUnknownCityPolicy(String),
    InvalidResetInterval,
    MissingDatabaseUrl,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "PORT must be a valid number"),
            ConfigError::InvalidCities(e) => write!(f, "CITIES is invalid: {}", e),
            ConfigError::InvalidCityEntry(entry) => {
                write!(
                    f,
                    "CITIES entry '{}' must be 'Name' or 'Name:lat:lon'",
                    entry
                )
            }
            ConfigError::InvalidTimezone(tz) => {
                write!(f, "BOT_TIMEZONE '{}' is not a known IANA timezone", tz)
            }
            ConfigError::InvalidPostMode(mode) => {
                write!(
                    f,
                    "POST_MODE '{}' must be one of dry_run, twitter, webhook",
                    mode
                )
            }
            ConfigError::InvalidStateBackend(backend) => {
                write!(f, "STATE_BACKEND '{}' must be file or postgres", backend)
            }
            ConfigError::InvalidUnknownCityPolicy(policy) => {
                write!(
                    f,
                    "UNKNOWN_CITY_POLICY '{}' must be restart_position or restart_epoch",
                    policy
                )
            }
            ConfigError::InvalidResetInterval => {
                write!(f, "RESET_INTERVAL_HOURS must be at least 1")
            }
            ConfigError::MissingDatabaseUrl => {
                write!(
                    f,
                    "DATABASE_URL environment variable is required when STATE_BACKEND=postgres"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
