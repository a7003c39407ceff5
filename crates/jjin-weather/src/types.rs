use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use jjin_core::TemperatureUnit;
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// A validated geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting values outside [-90, 90] x [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, WeatherError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Cache identity for this point: both halves rounded to `precision` decimals,
    /// so GPS jitter below that resolution maps to the same row.
    pub fn cache_key(&self, precision: u32) -> String {
        let factor = 10f64.powi(precision as i32);
        // Adding 0.0 folds -0.0 into 0.0 so both sides of the equator/meridian agree.
        let lat = (self.latitude * factor).round() / factor + 0.0;
        let lon = (self.longitude * factor).round() / factor + 0.0;
        format!(
            "{:.prec$},{:.prec$}",
            lat,
            lon,
            prec = precision as usize
        )
    }

    /// Fallback display label when no place name is known.
    pub fn label(&self) -> String {
        format!("{:.2}, {:.2}", self.latitude, self.longitude)
    }
}

/// Unit system requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Value of the provider's `units` query parameter
    pub fn as_query(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    /// Inverse of [`Units::as_query`].
    pub fn from_query(value: &str) -> Option<Self> {
        match value {
            "metric" => Some(Units::Metric),
            "imperial" => Some(Units::Imperial),
            _ => None,
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    /// Convert a temperature expressed in `self` into `target`.
    pub fn convert_temperature(&self, value: f64, target: Units) -> f64 {
        match (self, target) {
            (Units::Metric, Units::Imperial) => value * 9.0 / 5.0 + 32.0,
            (Units::Imperial, Units::Metric) => (value - 32.0) * 5.0 / 9.0,
            _ => value,
        }
    }

    /// Convert a wind speed (m/s for metric, mph for imperial) into `target`.
    pub fn convert_speed(&self, value: f64, target: Units) -> f64 {
        const MPS_PER_MPH: f64 = 0.44704;
        match (self, target) {
            (Units::Metric, Units::Imperial) => value / MPS_PER_MPH,
            (Units::Imperial, Units::Metric) => value * MPS_PER_MPH,
            _ => value,
        }
    }
}

impl From<TemperatureUnit> for Units {
    fn from(unit: TemperatureUnit) -> Self {
        match unit {
            TemperatureUnit::Fahrenheit => Units::Imperial,
            TemperatureUnit::Celsius | TemperatureUnit::Auto => Units::Metric,
        }
    }
}

/// Weather condition categories mapped from OpenWeather condition ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert an OpenWeather condition id to a WeatherCondition
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_condition_id(id: i32) -> Self {
        match id {
            200..=299 => Self::Thunderstorm,
            300..=399 => Self::Drizzle,
            500 | 501 | 520 | 521 => Self::Rain,
            502..=504 | 522 | 531 => Self::HeavyRain,
            511 => Self::Sleet, // Freezing rain
            611..=616 => Self::Sleet,
            600..=699 => Self::Snow,
            700..=799 => Self::Fog,
            800 => Self::Clear,
            801 | 802 => Self::PartlyCloudy,
            803 | 804 => Self::Cloudy,
            _ => Self::Clear, // Unknown ids default to clear
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }

    /// Icon name, suffixed for night where the artwork differs
    pub fn icon_name(&self, is_night: bool) -> &'static str {
        match (self, is_night) {
            (Self::Clear, false) => "clear_sky_day",
            (Self::Clear, true) => "clear_sky_night",
            (Self::PartlyCloudy, false) => "few_clouds_day",
            (Self::PartlyCloudy, true) => "few_clouds_night",
            (Self::Cloudy, _) => "broken_clouds",
            (Self::Fog, _) => "mist",
            (Self::Drizzle, _) => "shower_rain",
            (Self::Rain, _) | (Self::HeavyRain, _) => "rain",
            (Self::Snow, _) | (Self::Sleet, _) => "snow",
            (Self::Thunderstorm, _) => "thunderstorm",
        }
    }
}

/// The eight named lunar phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    /// Map the provider's 0..=1 cycle fraction (0 and 1 are new moon,
    /// 0.25 first quarter, 0.5 full, 0.75 last quarter).
    pub fn from_fraction(fraction: f64) -> Self {
        let f = fraction.rem_euclid(1.0);
        if f < 0.03 || f > 0.97 {
            Self::NewMoon
        } else if f < 0.22 {
            Self::WaxingCrescent
        } else if f <= 0.28 {
            Self::FirstQuarter
        } else if f < 0.47 {
            Self::WaxingGibbous
        } else if f <= 0.53 {
            Self::FullMoon
        } else if f < 0.72 {
            Self::WaningGibbous
        } else if f <= 0.78 {
            Self::LastQuarter
        } else {
            Self::WaningCrescent
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::NewMoon => "New Moon",
            Self::WaxingCrescent => "Waxing Crescent",
            Self::FirstQuarter => "First Quarter",
            Self::WaxingGibbous => "Waxing Gibbous",
            Self::FullMoon => "Full Moon",
            Self::WaningGibbous => "Waning Gibbous",
            Self::LastQuarter => "Last Quarter",
            Self::WaningCrescent => "Waning Crescent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
}

/// Local sunrise and sunset for one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunCycle {
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
}

impl SunCycle {
    /// True when `now` falls outside [sunrise, sunset).
    pub fn is_night(&self, now: NaiveTime) -> bool {
        now < self.sunrise || now >= self.sunset
    }
}

/// Current conditions. Times are local to the forecast location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub observed_at: NaiveDateTime,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub condition: WeatherCondition,
    pub description: String,
    pub icon_code: String,
    pub sun_cycle: SunCycle,
}

/// Hourly forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: NaiveDateTime,
    /// Hour of day, 0..=23
    pub hour: u32,
    pub temperature: f64,
    pub feels_like: f64,
    pub condition: WeatherCondition,
    pub icon_code: String,
}

/// Daily forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temperature_range: TemperatureRange,
    pub condition: WeatherCondition,
    pub icon_code: String,
    pub summary: String,
    pub sun_cycle: SunCycle,
    pub moon_phase: MoonPhase,
}

/// Whether a forecast came straight from the provider or from the cache
/// after the provider failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Freshness {
    #[default]
    Fresh,
    Stale { fetched_at: DateTime<Utc> },
}

/// Normalized forecast for one place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityWeather {
    pub city_name: String,
    pub coordinate: Coordinate,
    pub units: Units,
    pub current: CurrentWeather,
    /// Ascending by time, never empty
    pub hourly: Vec<HourlyForecast>,
    /// Ascending by date, never empty
    pub daily: Vec<DailyForecast>,
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub freshness: Freshness,
}

impl CityWeather {
    pub fn is_stale(&self) -> bool {
        matches!(self.freshness, Freshness::Stale { .. })
    }

    /// Today's entry (the first daily forecast).
    pub fn today(&self) -> Option<&DailyForecast> {
        self.daily.first()
    }

    /// Sunrise of the first day after today, or today's if none is known.
    pub fn next_sunrise(&self) -> NaiveTime {
        let today = self.current.observed_at.date();
        self.daily
            .iter()
            .find(|d| d.date > today)
            .map(|d| d.sun_cycle.sunrise)
            .unwrap_or(self.current.sun_cycle.sunrise)
    }

    /// One-line summary handed to the outfit recommender.
    pub fn summary(&self) -> String {
        self.today()
            .map(|d| d.summary.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.current.description.clone())
    }

    /// Whole-degree temperatures of the first `hours` hourly entries.
    pub fn hourly_temperatures(&self, hours: usize) -> Vec<i32> {
        self.hourly
            .iter()
            .take(hours)
            .map(|h| h.temperature as i32)
            .collect()
    }

    /// Hours of day matching `hourly_temperatures`.
    pub fn hourly_hours(&self, hours: usize) -> Vec<u32> {
        self.hourly.iter().take(hours).map(|h| h.hour).collect()
    }

    /// Re-express every temperature and speed in `target` units.
    pub fn converted_to(mut self, target: Units) -> Self {
        let from = self.units;
        if from == target {
            return self;
        }

        let t = |v: f64| from.convert_temperature(v, target);
        self.current.temperature = t(self.current.temperature);
        self.current.feels_like = t(self.current.feels_like);
        self.current.wind_speed = from.convert_speed(self.current.wind_speed, target);
        for hour in &mut self.hourly {
            hour.temperature = t(hour.temperature);
            hour.feels_like = t(hour.feels_like);
        }
        for day in &mut self.daily {
            day.temperature_range = TemperatureRange {
                min: t(day.temperature_range.min),
                max: t(day.temperature_range.max),
            };
        }
        self.units = target;
        self
    }
}

/// A forward-geocoding match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub coordinate: Coordinate,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_coordinate_rejects_out_of_range() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(matches!(
            Coordinate::new(90.1, 0.0),
            Err(WeatherError::InvalidCoordinate { .. })
        ));
        assert!(Coordinate::new(0.0, -180.5).is_err());
    }

    #[test]
    fn test_cache_key_absorbs_jitter() {
        let a = Coordinate::new(37.49791, 127.02761).unwrap();
        let b = Coordinate::new(37.50204, 127.02649).unwrap();
        assert_eq!(a.cache_key(2), "37.50,127.03");
        assert_eq!(a.cache_key(2), b.cache_key(2));
    }

    #[test]
    fn test_cache_key_has_no_negative_zero() {
        let c = Coordinate::new(-0.001, -0.004).unwrap();
        assert_eq!(c.cache_key(2), "0.00,0.00");
    }

    #[test]
    fn test_condition_id_mapping() {
        assert_eq!(WeatherCondition::from_condition_id(211), WeatherCondition::Thunderstorm);
        assert_eq!(WeatherCondition::from_condition_id(301), WeatherCondition::Drizzle);
        assert_eq!(WeatherCondition::from_condition_id(500), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_condition_id(502), WeatherCondition::HeavyRain);
        assert_eq!(WeatherCondition::from_condition_id(511), WeatherCondition::Sleet);
        assert_eq!(WeatherCondition::from_condition_id(612), WeatherCondition::Sleet);
        assert_eq!(WeatherCondition::from_condition_id(601), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_condition_id(741), WeatherCondition::Fog);
        assert_eq!(WeatherCondition::from_condition_id(800), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_condition_id(802), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_condition_id(804), WeatherCondition::Cloudy);
    }

    #[test]
    fn test_unknown_condition_defaults_to_clear() {
        assert_eq!(WeatherCondition::from_condition_id(999), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_condition_id(-1), WeatherCondition::Clear);
    }

    #[test]
    fn test_icon_name_depends_on_night() {
        assert_eq!(WeatherCondition::Clear.icon_name(false), "clear_sky_day");
        assert_eq!(WeatherCondition::Clear.icon_name(true), "clear_sky_night");
        assert_eq!(WeatherCondition::Rain.icon_name(true), "rain");
    }

    #[test]
    fn test_moon_phase_anchors() {
        assert_eq!(MoonPhase::from_fraction(0.0), MoonPhase::NewMoon);
        assert_eq!(MoonPhase::from_fraction(1.0), MoonPhase::NewMoon);
        assert_eq!(MoonPhase::from_fraction(0.1), MoonPhase::WaxingCrescent);
        assert_eq!(MoonPhase::from_fraction(0.25), MoonPhase::FirstQuarter);
        assert_eq!(MoonPhase::from_fraction(0.4), MoonPhase::WaxingGibbous);
        assert_eq!(MoonPhase::from_fraction(0.5), MoonPhase::FullMoon);
        assert_eq!(MoonPhase::from_fraction(0.6), MoonPhase::WaningGibbous);
        assert_eq!(MoonPhase::from_fraction(0.75), MoonPhase::LastQuarter);
        assert_eq!(MoonPhase::from_fraction(0.9), MoonPhase::WaningCrescent);
    }

    #[test]
    fn test_sun_cycle_night_is_half_open() {
        let cycle = SunCycle {
            sunrise: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            sunset: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        };
        assert!(cycle.is_night(NaiveTime::from_hms_opt(5, 59, 59).unwrap()));
        assert!(!cycle.is_night(NaiveTime::from_hms_opt(6, 0, 0).unwrap()));
        assert!(!cycle.is_night(NaiveTime::from_hms_opt(18, 59, 59).unwrap()));
        assert!(cycle.is_night(NaiveTime::from_hms_opt(19, 0, 0).unwrap()));
    }

    #[test]
    fn test_units_conversion() {
        assert_eq!(Units::Metric.convert_temperature(100.0, Units::Imperial), 212.0);
        assert_eq!(Units::Imperial.convert_temperature(32.0, Units::Metric), 0.0);
        assert_eq!(Units::Metric.convert_temperature(21.5, Units::Metric), 21.5);
        let mph = Units::Metric.convert_speed(0.44704, Units::Imperial);
        assert!((mph - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_units_from_preference() {
        assert_eq!(Units::from(TemperatureUnit::Auto), Units::Metric);
        assert_eq!(Units::from(TemperatureUnit::Celsius), Units::Metric);
        assert_eq!(Units::from(TemperatureUnit::Fahrenheit), Units::Imperial);
    }
}
