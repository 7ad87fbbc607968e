use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted rotation pointer and reset epoch.
///
/// A single logical record, overwritten in place after every successful post.
/// The serialized field names match the JSON state file layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationState {
    /// City of the most recent successful post, `None` on first run or after a reset
    #[serde(default)]
    pub last_posted_city: Option<String>,
    /// When the rotation was last reset
    #[serde(default, rename = "last_clear_time_utc")]
    pub last_clear_time: Option<DateTime<Utc>>,
}

impl RotationState {
    pub fn new(last_posted_city: impl Into<String>, last_clear_time: DateTime<Utc>) -> Self {
        Self {
            last_posted_city: Some(last_posted_city.into()),
            last_clear_time: Some(last_clear_time),
        }
    }
}

/// Latitude/longitude pair used to query the weather API precisely
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A city in the rotation
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub name: String,
    pub coordinates: Option<Coordinates>,
}

impl City {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            coordinates: None,
        }
    }

    pub fn with_coordinates(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            coordinates: Some(Coordinates { lat, lon }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CityListError {
    #[error("city list must contain at least one city")]
    Empty,

    #[error("city '{0}' appears more than once")]
    Duplicate(String),

    #[error("city names must not be blank")]
    BlankName,
}

/// Ordered, non-empty list of distinct cities. Defines the rotation order.
#[derive(Debug, Clone, PartialEq)]
pub struct CityList {
    cities: Vec<City>,
}

impl CityList {
    pub fn new(cities: Vec<City>) -> Result<Self, CityListError> {
        if cities.is_empty() {
            return Err(CityListError::Empty);
        }

        let mut seen = HashSet::with_capacity(cities.len());
        for city in &cities {
            if city.name.trim().is_empty() {
                return Err(CityListError::BlankName);
            }
            if !seen.insert(city.name.as_str()) {
                return Err(CityListError::Duplicate(city.name.clone()));
            }
        }

        Ok(Self { cities })
    }

    /// Builds a list of cities without coordinates
    pub fn from_names<I, S>(names: I) -> Result<Self, CityListError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(City::named).collect())
    }

    /// Head of the rotation
    pub fn first(&self) -> &City {
        // Non-empty is enforced by the constructor
        &self.cities[0]
    }

    pub fn get(&self, index: usize) -> Option<&City> {
        self.cities.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.cities.iter().position(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &City> {
        self.cities.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.cities.iter().map(|c| c.name.as_str()).collect()
    }
}

impl fmt::Display for CityList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join(", "))
    }
}
