use serde::{Deserialize, Serialize};

/// OpenWeatherMap 5-day / 3-hour forecast response.
///
/// Every field defaults when absent so partially populated responses still
/// produce a readable post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
}

impl Forecast {
    /// Conditions right now (the first 3-hour slot)
    pub fn current(&self) -> Option<&ForecastEntry> {
        self.list.first()
    }

    /// Up to `count` slots following the current one
    pub fn upcoming(&self, count: usize) -> &[ForecastEntry] {
        let end = self.list.len().min(count + 1);
        if end <= 1 {
            return &[];
        }
        &self.list[1..end]
    }
}

/// A single 3-hour forecast slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Unix timestamp (UTC) of the slot
    #[serde(default)]
    pub dt: i64,
    #[serde(default)]
    pub main: MainConditions,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub clouds: Clouds,
    /// Metres
    #[serde(default)]
    pub visibility: Option<f64>,
    /// Probability of precipitation, 0.0 - 1.0
    #[serde(default)]
    pub pop: f64,
    #[serde(default)]
    pub rain: Option<Precipitation>,
}

impl ForecastEntry {
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    /// Weather condition code, 800 (clear sky) when missing
    pub fn condition_id(&self) -> i64 {
        self.condition().map(|c| c.id).unwrap_or(CLEAR_SKY_ID)
    }

    pub fn description(&self) -> &str {
        self.condition()
            .map(|c| c.description.as_str())
            .filter(|d| !d.is_empty())
            .unwrap_or("N/A")
    }

    /// Rain volume over the 3-hour slot in mm
    pub fn rain_volume(&self) -> f64 {
        self.rain.as_ref().map(|r| r.three_hours).unwrap_or(0.0)
    }

    pub fn visibility_km(&self) -> f64 {
        self.visibility.unwrap_or(DEFAULT_VISIBILITY_M) / 1000.0
    }
}

const CLEAR_SKY_ID: i64 = 800;
const DEFAULT_VISIBILITY_M: f64 = 10_000.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MainConditions {
    #[serde(default)]
    pub temp: f64,
    #[serde(default)]
    pub feels_like: f64,
    #[serde(default)]
    pub humidity: i64,
    /// hPa
    #[serde(default)]
    pub pressure: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default = "default_condition_id")]
    pub id: i64,
    #[serde(default)]
    pub description: String,
}

fn default_condition_id() -> i64 {
    CLEAR_SKY_ID
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// m/s
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub deg: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    #[serde(default)]
    pub all: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Precipitation {
    #[serde(rename = "3h", default)]
    pub three_hours: f64,
}
