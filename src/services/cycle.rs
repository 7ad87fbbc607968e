//! One end-to-end cycle: select city → fetch → compose → post → persist.
//!
//! A cycle either completes fully or leaves the stored state untouched, so a
//! failed city is retried on the next trigger. Concurrent cycles are not
//! coordinated; the last successful write wins.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::config::{Config, PostMode};
use crate::models::{CityList, OutgoingPost, RotationState};
use crate::services::compose;
use crate::services::media::load_media;
use crate::services::posting::Poster;
use crate::services::rotation::{select_next, ResetCause, RotationPolicy};
use crate::services::weather::{WeatherError, WeatherSource};
use crate::store::{ReadOutcome, StateStore};

/// Static settings of the cycle
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub cities: CityList,
    pub policy: RotationPolicy,
    pub timezone: Tz,
    pub image_path: PathBuf,
}

impl CycleSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cities: config.rotation.cities.clone(),
            policy: config.rotation.policy(),
            timezone: config.timezone,
            image_path: PathBuf::from(&config.image_path),
        }
    }
}

/// Summary of a completed cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub city: String,
    pub reset: Option<ResetCause>,
    pub post_id: Option<String>,
    /// Whether the new rotation state reached storage
    pub persisted: bool,
    pub text: String,
}

/// Why a cycle did not complete
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("Could not retrieve weather for {city}: {source}")]
    Weather {
        city: String,
        #[source]
        source: WeatherError,
    },

    #[error("Post for {city} failed: {reason}")]
    Post {
        city: String,
        reason: String,
        http_status: Option<u16>,
    },
}

impl CycleError {
    /// City the failed cycle was about
    pub fn city(&self) -> &str {
        match self {
            CycleError::Weather { city, .. } | CycleError::Post { city, .. } => city,
        }
    }
}

/// Runs cycles against injected collaborators
pub struct CycleRunner {
    settings: CycleSettings,
    weather: Arc<dyn WeatherSource>,
    poster: Arc<dyn Poster>,
    store: Arc<dyn StateStore>,
}

impl CycleRunner {
    pub fn new(
        settings: CycleSettings,
        weather: Arc<dyn WeatherSource>,
        poster: Arc<dyn Poster>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            settings,
            weather,
            poster,
            store,
        }
    }

    pub fn mode(&self) -> PostMode {
        self.poster.mode()
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    /// Stored rotation state, as the next cycle would see it
    pub async fn current_state(&self) -> ReadOutcome {
        self.store.read().await
    }

    /// Runs one cycle now
    pub async fn run(&self) -> Result<CycleReport, CycleError> {
        self.run_at(Utc::now()).await
    }

    /// Runs one cycle as if the current time were `now`
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<CycleReport, CycleError> {
        let state: RotationState = self.store.read().await.into_state();
        let selection = select_next(&state, &self.settings.cities, now, &self.settings.policy);
        let city = selection.city.name.clone();

        if let Some(cause) = selection.reset {
            log::info!("Restarting city cycle at {} ({})", city, cause);
        }
        log::info!("--- Running weather post job for {} ---", city);

        let forecast = match self.weather.forecast(&selection.city).await {
            Ok(forecast) => forecast,
            Err(source) => {
                log::warn!("Could not retrieve weather for {}. Aborting.", city);
                return Err(CycleError::Weather { city, source });
            }
        };

        let local_now = now.with_timezone(&self.settings.timezone);
        let content = compose::compose(&city, &forecast, &local_now);
        let post = OutgoingPost {
            city: city.clone(),
            text: content.text(),
            alt_text: content.alt_text,
            media: load_media(&self.settings.image_path).await,
        };

        let result = self.poster.publish(&post).await;
        if !result.success {
            log::warn!(
                "Post task for {} did not complete successfully. State not updated for this city.",
                city
            );
            return Err(CycleError::Post {
                city,
                reason: result
                    .error_message
                    .unwrap_or_else(|| "unknown error".to_string()),
                http_status: result.http_status,
            });
        }

        let persisted = self.store.write(&selection.next_state).await.is_persisted();
        if persisted {
            log::info!("Post task for {} completed successfully and state updated.", city);
        } else {
            log::warn!(
                "Post task for {} completed but state was not saved; {} will be selected again.",
                city,
                city
            );
        }

        Ok(CycleReport {
            city,
            reset: selection.reset,
            post_id: result.post_id,
            persisted,
            text: post.text,
        })
    }
}
