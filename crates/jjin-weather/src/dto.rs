//! OpenWeather One Call wire format and its mapping into domain types.
//!
//! Fields the app consumes are listed on each struct; everything else in the
//! payload (pressure, uvi, clouds, visibility, pop, moonrise/moonset, the
//! timezone name, alerts) is ignored on deserialize. The response's own
//! `lat`/`lon` are dropped in favor of the requested coordinate so the cache
//! key stays stable.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use jjin_core::NetworkError;
use serde::Deserialize;

use crate::types::{
    CityWeather, Coordinate, CurrentWeather, DailyForecast, Freshness, HourlyForecast, MoonPhase,
    SunCycle, TemperatureRange, Units, WeatherCondition,
};

/// Top-level One Call response.
#[derive(Debug, Clone, Deserialize)]
pub struct OneCallDto {
    /// Seconds east of UTC for the forecast location
    pub timezone_offset: i64,
    pub current: CurrentDto,
    #[serde(default)]
    pub hourly: Vec<HourlyDto>,
    #[serde(default)]
    pub daily: Vec<DailyDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionDto {
    pub id: i32,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentDto {
    pub dt: i64,
    pub sunrise: i64,
    pub sunset: i64,
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    #[serde(default)]
    pub weather: Vec<ConditionDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HourlyDto {
    pub dt: i64,
    pub temp: f64,
    pub feels_like: f64,
    #[serde(default)]
    pub weather: Vec<ConditionDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyTempDto {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyDto {
    pub dt: i64,
    pub sunrise: i64,
    pub sunset: i64,
    pub moon_phase: f64,
    #[serde(default)]
    pub summary: Option<String>,
    pub temp: DailyTempDto,
    #[serde(default)]
    pub weather: Vec<ConditionDto>,
}

impl OneCallDto {
    /// Normalize the payload into a `CityWeather`.
    ///
    /// Hourly and daily series are sorted ascending; a payload with either
    /// series empty is rejected as an invalid response.
    pub fn into_city_weather(
        self,
        city_name: String,
        coordinate: Coordinate,
        units: Units,
        fetched_at: DateTime<Utc>,
    ) -> Result<CityWeather, NetworkError> {
        let offset = self.timezone_offset;

        if self.hourly.is_empty() {
            return Err(NetworkError::InvalidResponse(
                "forecast has no hourly entries".to_string(),
            ));
        }
        if self.daily.is_empty() {
            return Err(NetworkError::InvalidResponse(
                "forecast has no daily entries".to_string(),
            ));
        }

        let current = map_current(self.current, offset)?;

        let mut hourly = self
            .hourly
            .into_iter()
            .map(|h| map_hourly(h, offset))
            .collect::<Result<Vec<_>, _>>()?;
        hourly.sort_by_key(|h| h.time);

        let mut daily = self
            .daily
            .into_iter()
            .map(|d| map_daily(d, offset))
            .collect::<Result<Vec<_>, _>>()?;
        daily.sort_by_key(|d| d.date);

        Ok(CityWeather {
            city_name,
            coordinate,
            units,
            current,
            hourly,
            daily,
            fetched_at,
            freshness: Freshness::Fresh,
        })
    }
}

fn local_time(unix: i64, offset: i64) -> Result<NaiveDateTime, NetworkError> {
    unix.checked_add(offset)
        .and_then(|local| DateTime::<Utc>::from_timestamp(local, 0))
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| NetworkError::InvalidResponse(format!("timestamp out of range: {}", unix)))
}

/// First condition entry, or clear skies when the provider sent none.
fn primary_condition(weather: &[ConditionDto]) -> (WeatherCondition, String, String) {
    match weather.first() {
        Some(c) => (
            WeatherCondition::from_condition_id(c.id),
            c.description.clone(),
            c.icon.clone(),
        ),
        None => (
            WeatherCondition::Clear,
            WeatherCondition::Clear.description().to_string(),
            "01d".to_string(),
        ),
    }
}

fn sun_cycle(sunrise: i64, sunset: i64, offset: i64) -> Result<SunCycle, NetworkError> {
    Ok(SunCycle {
        sunrise: local_time(sunrise, offset)?.time(),
        sunset: local_time(sunset, offset)?.time(),
    })
}

fn map_current(dto: CurrentDto, offset: i64) -> Result<CurrentWeather, NetworkError> {
    let (condition, description, icon_code) = primary_condition(&dto.weather);
    Ok(CurrentWeather {
        observed_at: local_time(dto.dt, offset)?,
        temperature: dto.temp,
        feels_like: dto.feels_like,
        humidity: dto.humidity,
        wind_speed: dto.wind_speed,
        condition,
        description,
        icon_code,
        sun_cycle: sun_cycle(dto.sunrise, dto.sunset, offset)?,
    })
}

fn map_hourly(dto: HourlyDto, offset: i64) -> Result<HourlyForecast, NetworkError> {
    let time = local_time(dto.dt, offset)?;
    let (condition, _, icon_code) = primary_condition(&dto.weather);
    Ok(HourlyForecast {
        time,
        hour: time.hour(),
        temperature: dto.temp,
        feels_like: dto.feels_like,
        condition,
        icon_code,
    })
}

fn map_daily(dto: DailyDto, offset: i64) -> Result<DailyForecast, NetworkError> {
    let (min, max) = (dto.temp.min, dto.temp.max);
    if min.is_nan() || max.is_nan() || min > max {
        return Err(NetworkError::InvalidResponse(format!(
            "daily range reversed at {}: min {} > max {}",
            dto.dt, min, max
        )));
    }

    let (condition, description, icon_code) = primary_condition(&dto.weather);
    Ok(DailyForecast {
        date: local_time(dto.dt, offset)?.date(),
        temperature_range: TemperatureRange { min, max },
        condition,
        icon_code,
        summary: dto.summary.filter(|s| !s.is_empty()).unwrap_or(description),
        sun_cycle: sun_cycle(dto.sunrise, dto.sunset, offset)?,
        moon_phase: MoonPhase::from_fraction(dto.moon_phase),
    })
}
