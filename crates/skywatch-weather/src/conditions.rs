//! Display model for the current-conditions view.
//!
//! The upstream payload is opaque to the cache layer; this is the one place
//! that reads it, filling every missing field with a placeholder so the view
//! always has something to show.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{UnitSystem, WeatherPayload};

const DEFAULT_CONDITION: &str = "Clear";
const DEFAULT_ICON: &str = "01d";
const DEFAULT_TEMP: f64 = 20.0;
const DEFAULT_HUMIDITY: u8 = 50;
const UNAVAILABLE_DESCRIPTION: &str = "Weather data unavailable";
const SERVICE_DOWN_DESCRIPTION: &str = "Weather service temporarily unavailable";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSummary {
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readings {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
}

impl Default for Readings {
    fn default() -> Self {
        Self {
            temp: DEFAULT_TEMP,
            feels_like: DEFAULT_TEMP,
            humidity: DEFAULT_HUMIDITY,
        }
    }
}

/// What the view renders: a safe subset of the provider payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub weather: Vec<ConditionSummary>,
    pub main: Readings,
    pub name: String,
    /// Observation time, unix seconds
    pub dt: i64,
}

impl CurrentConditions {
    /// Pull the displayed fields out of a provider payload.
    ///
    /// `weather` and `main` are taken whole when present and well-formed,
    /// otherwise replaced by placeholders; `name` falls back to
    /// `default_name` and `dt` to the current time.
    pub fn from_payload(payload: &WeatherPayload, default_name: &str) -> Self {
        let weather = payload
            .get("weather")
            .and_then(|w| serde_json::from_value::<Vec<ConditionSummary>>(w.clone()).ok())
            .filter(|w| !w.is_empty())
            .unwrap_or_else(|| vec![placeholder_condition(UNAVAILABLE_DESCRIPTION)]);

        let main = payload
            .get("main")
            .map(readings_from)
            .unwrap_or_default();

        let name = payload
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .unwrap_or(default_name)
            .to_string();

        let dt = payload
            .get("dt")
            .and_then(Value::as_i64)
            .filter(|dt| *dt != 0)
            .unwrap_or_else(|| Utc::now().timestamp());

        Self {
            weather,
            main,
            name,
            dt,
        }
    }

    /// Substitute shown when no weather could be fetched at all.
    pub fn placeholder(name: &str) -> Self {
        Self {
            weather: vec![placeholder_condition(SERVICE_DOWN_DESCRIPTION)],
            main: Readings::default(),
            name: name.to_string(),
            dt: Utc::now().timestamp(),
        }
    }

    pub fn primary_condition(&self) -> Option<&ConditionSummary> {
        self.weather.first()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.dt, 0).unwrap_or_else(Utc::now)
    }

    /// Plain-text rendering of the view.
    pub fn render(&self, units: UnitSystem) -> String {
        let suffix = units.temperature_suffix();
        let (description, icon) = match self.primary_condition() {
            Some(c) => (c.description.as_str(), c.icon.as_str()),
            None => (DEFAULT_CONDITION, DEFAULT_ICON),
        };

        format!(
            "{name}\n{temp:.1}{suffix}  {icon}\n{desc}. Feels like {feels:.1}{suffix}.\nHumidity {humidity}%\nupdated at {updated}",
            name = self.name,
            temp = self.main.temp,
            feels = self.main.feels_like,
            humidity = self.main.humidity,
            icon = icon_url(icon),
            desc = capitalize_first_letter(description),
            updated = self.updated_at().format("%B %-d, %Y, %-I:%M %p UTC"),
        )
    }
}

fn placeholder_condition(description: &str) -> ConditionSummary {
    ConditionSummary {
        main: DEFAULT_CONDITION.to_string(),
        description: description.to_string(),
        icon: DEFAULT_ICON.to_string(),
    }
}

fn readings_from(main: &Value) -> Readings {
    let field = |name: &str| main.get(name).and_then(Value::as_f64);
    Readings {
        temp: field("temp").unwrap_or(DEFAULT_TEMP),
        feels_like: field("feels_like").unwrap_or(DEFAULT_TEMP),
        humidity: main
            .get("humidity")
            .and_then(Value::as_u64)
            .and_then(|h| u8::try_from(h).ok())
            .unwrap_or(DEFAULT_HUMIDITY),
    }
}

/// URL of the provider's icon image for an icon code such as `"04n"`.
pub fn icon_url(icon_code: &str) -> String {
    format!("http://openweathermap.org/img/wn/{}@2x.png", icon_code)
}

pub fn capitalize_first_letter(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
