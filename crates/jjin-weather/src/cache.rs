//! SQLite-backed store for forecasts, the last tracked position and small
//! app preferences.

use std::path::Path;

use chrono::{DateTime, Utc};
use jjin_core::{DatabaseError, RusqliteErrorExt};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::types::{CityWeather, Coordinate, Units};

const FIRST_LAUNCH_KEY: &str = "first_launch_completed";

/// A forecast row read back from the cache.
#[derive(Debug, Clone)]
pub struct CachedForecast {
    pub location_key: String,
    pub weather: CityWeather,
    /// Unit system the row was stored in.
    pub units: Units,
    pub fetched_at: DateTime<Utc>,
}

/// The last position the app resolved weather for.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedLocation {
    pub coordinate: Coordinate,
    pub city_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// SQLite cache for weather data.
pub struct WeatherCache {
    conn: Mutex<Connection>,
}

impl WeatherCache {
    /// Open (or create) the cache at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(RusqliteErrorExt::into_database_error)?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.init_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache.
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(RusqliteErrorExt::into_database_error)?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> Result<(), DatabaseError> {
        self.conn
            .lock()
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS weather_cache (
                    location_key TEXT PRIMARY KEY,
                    payload TEXT NOT NULL,
                    units TEXT NOT NULL,
                    fetched_at INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS tracked_location (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    latitude REAL NOT NULL,
                    longitude REAL NOT NULL,
                    city_name TEXT,
                    updated_at INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS preferences (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );
                "#,
            )
            .map_err(RusqliteErrorExt::into_database_error)
    }

    /// Replace the forecast stored under `location_key`.
    pub fn store_forecast(
        &self,
        location_key: &str,
        weather: &CityWeather,
    ) -> Result<(), DatabaseError> {
        let payload = serde_json::to_string(weather)
            .map_err(|e| DatabaseError::QueryFailed(format!("serialize forecast: {}", e)))?;

        self.conn
            .lock()
            .execute(
                "INSERT OR REPLACE INTO weather_cache (location_key, payload, units, fetched_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    location_key,
                    payload,
                    weather.units.as_query(),
                    weather.fetched_at.timestamp_millis()
                ],
            )
            .map_err(RusqliteErrorExt::into_database_error)?;

        tracing::debug!(location_key, "Stored forecast");
        Ok(())
    }

    /// Most recent forecast stored under `location_key`.
    pub fn get_forecast(&self, location_key: &str) -> Result<Option<CachedForecast>, DatabaseError> {
        let row = self
            .conn
            .lock()
            .query_row(
                "SELECT payload, units, fetched_at FROM weather_cache WHERE location_key = ?1",
                params![location_key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(RusqliteErrorExt::into_database_error)?;

        let Some((payload, units, fetched_ms)) = row else {
            return Ok(None);
        };

        let units = Units::from_query(&units)
            .ok_or_else(|| DatabaseError::Corruption(format!("unknown units: {}", units)))?;
        let weather: CityWeather = serde_json::from_str(&payload)
            .map_err(|e| DatabaseError::Corruption(format!("forecast payload: {}", e)))?;
        if weather.units != units {
            return Err(DatabaseError::Corruption(format!(
                "row units {} disagree with payload units {}",
                units.as_query(),
                weather.units.as_query()
            )));
        }

        Ok(Some(CachedForecast {
            location_key: location_key.to_string(),
            weather,
            units,
            fetched_at: from_millis(fetched_ms)?,
        }))
    }

    /// Remember the position (and its name, when known) weather was last resolved for.
    pub fn record_location(
        &self,
        coordinate: &Coordinate,
        city_name: Option<&str>,
    ) -> Result<(), DatabaseError> {
        self.conn
            .lock()
            .execute(
                "INSERT OR REPLACE INTO tracked_location (id, latitude, longitude, city_name, updated_at)
                 VALUES (1, ?1, ?2, ?3, ?4)",
                params![
                    coordinate.latitude(),
                    coordinate.longitude(),
                    city_name,
                    Utc::now().timestamp_millis()
                ],
            )
            .map_err(RusqliteErrorExt::into_database_error)?;
        Ok(())
    }

    pub fn last_location(&self) -> Result<Option<TrackedLocation>, DatabaseError> {
        let row = self
            .conn
            .lock()
            .query_row(
                "SELECT latitude, longitude, city_name, updated_at FROM tracked_location WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, f64>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(RusqliteErrorExt::into_database_error)?;

        let Some((latitude, longitude, city_name, updated_ms)) = row else {
            return Ok(None);
        };

        let coordinate = Coordinate::new(latitude, longitude)
            .map_err(|e| DatabaseError::Corruption(e.to_string()))?;

        Ok(Some(TrackedLocation {
            coordinate,
            city_name,
            updated_at: from_millis(updated_ms)?,
        }))
    }

    pub fn get_preference(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        self.conn
            .lock()
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(RusqliteErrorExt::into_database_error)
    }

    pub fn set_preference(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn
            .lock()
            .execute(
                "INSERT OR REPLACE INTO preferences (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(RusqliteErrorExt::into_database_error)?;
        Ok(())
    }

    /// True until onboarding has been completed once.
    pub fn is_first_launch(&self) -> Result<bool, DatabaseError> {
        Ok(self.get_preference(FIRST_LAUNCH_KEY)?.as_deref() != Some("true"))
    }

    pub fn complete_first_launch(&self) -> Result<(), DatabaseError> {
        self.set_preference(FIRST_LAUNCH_KEY, "true")
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| DatabaseError::Corruption(format!("timestamp out of range: {}", ms)))
}
