//! Device location sources.
//!
//! The app never reads a location before the user grants permission; every
//! provider here consults a shared [`LocationPermission`] first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::WeatherCache;
use crate::types::Coordinate;

#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Current device position, `None` when unavailable or not permitted.
    async fn current_location(&self) -> Option<Coordinate>;
}

/// Shared, cloneable permission flag.
#[derive(Debug, Clone, Default)]
pub struct LocationPermission(Arc<AtomicBool>);

impl LocationPermission {
    pub fn new(granted: bool) -> Self {
        Self(Arc::new(AtomicBool::new(granted)))
    }

    pub fn is_granted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn grant(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn revoke(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Location taken from configuration.
#[derive(Debug, Clone)]
pub struct ConfiguredLocationProvider {
    coordinate: Option<Coordinate>,
    permission: LocationPermission,
}

impl ConfiguredLocationProvider {
    pub fn new(coordinate: Option<Coordinate>, permission: LocationPermission) -> Self {
        Self {
            coordinate,
            permission,
        }
    }
}

#[async_trait]
impl LocationProvider for ConfiguredLocationProvider {
    async fn current_location(&self) -> Option<Coordinate> {
        if !self.permission.is_granted() {
            tracing::debug!("Location permission not granted");
            return None;
        }
        self.coordinate
    }
}

/// Wraps another provider and falls back to the last position the app
/// resolved when the live source has nothing.
pub struct TrackedLocationProvider {
    inner: Arc<dyn LocationProvider>,
    cache: Arc<WeatherCache>,
    permission: LocationPermission,
}

impl TrackedLocationProvider {
    pub fn new(
        inner: Arc<dyn LocationProvider>,
        cache: Arc<WeatherCache>,
        permission: LocationPermission,
    ) -> Self {
        Self {
            inner,
            cache,
            permission,
        }
    }
}

#[async_trait]
impl LocationProvider for TrackedLocationProvider {
    async fn current_location(&self) -> Option<Coordinate> {
        if !self.permission.is_granted() {
            return None;
        }

        if let Some(coordinate) = self.inner.current_location().await {
            if let Err(e) = self.cache.record_location(&coordinate, None) {
                tracing::warn!("Failed to record tracked location: {}", e);
            }
            return Some(coordinate);
        }

        match self.cache.last_location() {
            Ok(Some(tracked)) => {
                tracing::info!("Live location unavailable, using last tracked position");
                Some(tracked.coordinate)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read tracked location: {}", e);
                None
            }
        }
    }
}
