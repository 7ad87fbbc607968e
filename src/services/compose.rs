//! Post formatting: text lines, hashtags and image alt text.
//!
//! All functions are pure. Times are passed in already converted to the
//! bot's display timezone.

use chrono::{DateTime, Datelike, Weekday};
use chrono_tz::Tz;

use crate::models::{Forecast, ForecastEntry};

/// Maximum post length in characters
pub const MAX_POST_CHARS: usize = 280;

/// Maximum image alt text length in characters
pub const MAX_ALT_TEXT_CHARS: usize = 1000;

/// Number of 3-hour slots looked at for rain (12 hours)
const LOOKAHEAD_SLOTS: usize = 4;

/// Rain chance (percent) from which the rain line is shown
const RAIN_MESSAGE_THRESHOLD: u32 = 20;

/// Minimum rain chance reported for a slot with measured rain volume
const MIN_CHANCE_WITH_VOLUME: u32 = 25;

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

const MISSING_DATA_LINE: &str = "Could not generate weather report: Data missing.";

/// Composed update for one city
#[derive(Debug, Clone, PartialEq)]
pub struct PostContent {
    pub lines: Vec<String>,
    pub hashtags: Vec<String>,
    pub alt_text: String,
}

impl PostContent {
    /// Final post text, dropping trailing hashtags until it fits
    pub fn text(&self) -> String {
        fit_post_text(&self.lines, &self.hashtags, MAX_POST_CHARS)
    }
}

/// Current conditions distilled from the first forecast slot
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temp: i64,
    pub feels_like: i64,
    pub humidity: i64,
    pub pressure: i64,
    pub wind_speed_kph: i64,
    pub wind_deg: f64,
    pub sky: String,
    pub visibility_km: f64,
    pub clouds: i64,
}

impl CurrentConditions {
    pub fn from_entry(entry: &ForecastEntry) -> Self {
        Self {
            temp: round(entry.main.temp),
            feels_like: round(entry.main.feels_like),
            humidity: entry.main.humidity,
            pressure: entry.main.pressure,
            wind_speed_kph: round(entry.wind.speed * 3.6),
            wind_deg: entry.wind.deg,
            sky: capitalize(entry.description()),
            visibility_km: entry.visibility_km(),
            clouds: entry.clouds.all,
        }
    }
}

/// Composes the post for `city_name` at local time `now`
pub fn compose(city_name: &str, forecast: &Forecast, now: &DateTime<Tz>) -> PostContent {
    let Some(current) = forecast.current().map(CurrentConditions::from_entry) else {
        log::error!("No forecast entries for {}, composing placeholder post", city_name);
        return PostContent {
            lines: vec![MISSING_DATA_LINE.to_string()],
            hashtags: hashtags(city_name, forecast, now),
            alt_text: format!("Weather data for {} is not available.", city_name),
        };
    };

    let upcoming = forecast.upcoming(LOOKAHEAD_SLOTS);

    PostContent {
        lines: post_lines(city_name, &current, rain_chance(forecast), now),
        hashtags: hashtags(city_name, forecast, now),
        alt_text: alt_text(city_name, &current, upcoming, now),
    }
}

/// The visible lines of the post
pub fn post_lines(
    city_name: &str,
    current: &CurrentConditions,
    rain_chance: u32,
    now: &DateTime<Tz>,
) -> Vec<String> {
    let rain_line = if rain_chance >= RAIN_MESSAGE_THRESHOLD {
        format!("☔ Chance of rain: {}%", rain_chance)
    } else {
        "☔ No significant rain expected soon.".to_string()
    };

    vec![
        format!(
            "Hello, {}!👋, {} weather as of {}:",
            city_name,
            now.format("%A"),
            now.format("%I:%M %p")
        ),
        format!("☁️ Sky: {}", current.sky),
        format!(
            "🌡️ Temp: {}°C (feels: {}°C)",
            current.temp, current.feels_like
        ),
        format!("💧 Humidity: {}%", current.humidity),
        format!(
            "💨 Wind: {} km/h from the {}",
            current.wind_speed_kph,
            deg_to_compass(current.wind_deg)
        ),
        rain_line,
        "Have a great day! 😊".to_string(),
    ]
}

/// Highest rain chance (percent) over the next 12 hours
pub fn rain_chance(forecast: &Forecast) -> u32 {
    forecast
        .upcoming(LOOKAHEAD_SLOTS)
        .iter()
        .map(|entry| {
            let chance = percent(entry.pop);
            if entry.rain_volume() > 0.0 {
                chance.max(MIN_CHANCE_WITH_VOLUME)
            } else {
                chance
            }
        })
        .max()
        .unwrap_or(0)
}

/// Whether rain is likely in the next 12 hours
pub fn rain_imminent(forecast: &Forecast) -> bool {
    forecast.upcoming(LOOKAHEAD_SLOTS).iter().any(|entry| {
        (200..600).contains(&entry.condition_id()) || entry.pop > 0.2 || entry.rain_volume() > 0.0
    })
}

/// Ordered, de-duplicated hashtags for the post
pub fn hashtags(city_name: &str, forecast: &Forecast, now: &DateTime<Tz>) -> Vec<String> {
    let city_tag: String = city_name
        .split_whitespace()
        .filter(|word| word.chars().all(char::is_alphanumeric))
        .collect();

    let mut tags = Vec::new();
    if !city_tag.is_empty() {
        tags.push(format!("#{}", city_tag));
    }
    tags.push("#weatherupdate".to_string());
    tags.push("#USWeather".to_string());

    if matches!(now.weekday(), Weekday::Fri | Weekday::Sat | Weekday::Sun) {
        tags.push("#WeekendWeather".to_string());
    }
    if rain_imminent(forecast) {
        tags.push("#RainyWeather".to_string());
    }

    let mut seen = std::collections::HashSet::new();
    tags.retain(|tag| seen.insert(tag.to_lowercase()));
    tags
}

/// Image description: current conditions then the next 12 hours
pub fn alt_text(
    city_name: &str,
    current: &CurrentConditions,
    upcoming: &[ForecastEntry],
    now: &DateTime<Tz>,
) -> String {
    let mut text = format!(
        "Current weather in {} at {}:\n",
        city_name,
        now.format("%I:%M %p")
    );
    text.push_str(&format!(
        "It's about {}°C, but feels like {}°C with {} skies. Humidity is {}%, \
         pressure {} hPa. Wind is {} km/h from the {}. Visibility around {:.0} km, \
         and cloudiness is {}%. \n\n",
        current.temp,
        current.feels_like,
        current.sky.to_lowercase(),
        current.humidity,
        current.pressure,
        current.wind_speed_kph,
        deg_to_compass(current.wind_deg),
        current.visibility_km,
        current.clouds
    ));
    text.push_str("-------------------><-----------------------\n\n");
    text.push_str("Here's what to expect for the next 12 hours:\n");

    if upcoming.is_empty() {
        text.push_str("Hourly forecast data is not available.");
    }

    let tz = now.timezone();
    for entry in upcoming {
        let Some(at) = DateTime::from_timestamp(entry.dt, 0) else {
            continue;
        };
        let local = at.with_timezone(&tz);

        let pop = percent(entry.pop);
        let mut rain_info = String::new();
        if pop > 0 {
            rain_info = format!("Chance of rain: {}%.", pop);
            if entry.rain_volume() > 0.0 {
                rain_info.push_str(&format!(" ({:.1}mm expected).", entry.rain_volume()));
            }
        }

        text.push_str(&format!(
            "By {}: Expect {} around {}°C. {}\n",
            local.format("%I %p"),
            capitalize(entry.description()),
            round(entry.main.temp),
            rain_info
        ));
    }

    truncate_with_ellipsis(text, MAX_ALT_TEXT_CHARS)
}

/// Joins lines and hashtags, removing hashtags from the end while over `max_chars`
pub fn fit_post_text(lines: &[String], hashtags: &[String], max_chars: usize) -> String {
    let body = lines.join("\n");
    let mut tags: Vec<&str> = hashtags.iter().map(String::as_str).collect();

    let full = join_body_and_tags(&body, &tags);
    if full.chars().count() <= max_chars {
        return full;
    }

    log::warn!(
        "Post content ({} chars) exceeds {} char limit. Adjusting hashtags.",
        full.chars().count(),
        max_chars
    );
    while !tags.is_empty() && join_body_and_tags(&body, &tags).chars().count() > max_chars {
        tags.pop();
    }

    let text = join_body_and_tags(&body, &tags);
    log::warn!("Adjusted post length: {} chars.", text.chars().count());
    text
}

fn join_body_and_tags(body: &str, tags: &[&str]) -> String {
    if tags.is_empty() {
        body.to_string()
    } else {
        format!("{}\n{}", body, tags.join(" "))
    }
}

/// Converts wind degrees to a 16-point compass direction
pub fn deg_to_compass(deg: f64) -> &'static str {
    let ix = ((deg + 11.25) / 22.5) as i64;
    COMPASS_POINTS[ix.rem_euclid(16) as usize]
}

/// Uppercases the first character and lowercases the rest
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn truncate_with_ellipsis(text: String, max_chars: usize) -> String {
    let len = text.chars().count();
    if len <= max_chars {
        return text;
    }
    log::warn!("Alt text exceeded {} characters ({}). Truncating.", max_chars, len);
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}

/// Rounds half to even, like Python's `round()`
fn round(value: f64) -> i64 {
    value.round_ties_even() as i64
}

fn percent(probability: f64) -> u32 {
    (probability * 100.0) as u32
}
