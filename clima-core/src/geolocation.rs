//! Device location port.
//!
//! The platform facility is behind [`DeviceLocator`]; [`Geolocation`] adds the
//! request timeout and the maximum-age position cache on top of it.

use async_trait::async_trait;
use std::{
    fmt::Debug,
    sync::{Mutex, PoisonError},
    time::Duration,
};
use tokio::time::Instant;
use tracing::debug;

use crate::{error::LocationError, model::Coordinates};

pub const POSITION_TIMEOUT: Duration = Duration::from_secs(10);
pub const POSITION_MAX_AGE: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Cached fixes younger than this are reused without asking the device.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: POSITION_TIMEOUT,
            maximum_age: POSITION_MAX_AGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub coords: Coordinates,
}

impl From<Coordinates> for Position {
    fn from(coords: Coordinates) -> Self {
        Self { coords }
    }
}

#[async_trait]
pub trait DeviceLocator: Send + Sync + Debug {
    async fn current_position(&self, options: &PositionOptions)
    -> Result<Position, LocationError>;
}

/// A device that always reports the same position.
#[derive(Debug, Clone)]
pub struct FixedLocator {
    position: Position,
}

impl FixedLocator {
    pub fn new(coords: Coordinates) -> Self {
        Self {
            position: coords.into(),
        }
    }
}

#[async_trait]
impl DeviceLocator for FixedLocator {
    async fn current_position(&self, _: &PositionOptions) -> Result<Position, LocationError> {
        Ok(self.position)
    }
}

/// A device without geolocation support.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedLocator;

#[async_trait]
impl DeviceLocator for UnsupportedLocator {
    async fn current_position(&self, _: &PositionOptions) -> Result<Position, LocationError> {
        Err(LocationError::Unsupported)
    }
}

#[derive(Debug)]
pub struct Geolocation {
    locator: Box<dyn DeviceLocator>,
    options: PositionOptions,
    last_fix: Mutex<Option<(Position, Instant)>>,
}

impl Geolocation {
    pub fn new(locator: Box<dyn DeviceLocator>) -> Self {
        Self::with_options(locator, PositionOptions::default())
    }

    pub fn with_options(locator: Box<dyn DeviceLocator>, options: PositionOptions) -> Self {
        Self {
            locator,
            options,
            last_fix: Mutex::new(None),
        }
    }

    fn cached(&self, now: Instant) -> Option<Position> {
        let last_fix = *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner);
        last_fix
            .filter(|(_, taken_at)| now.duration_since(*taken_at) <= self.options.maximum_age)
            .map(|(position, _)| position)
    }

    /// Ask the device for its position. Failed requests are never cached.
    pub async fn request_position(&self) -> Result<Position, LocationError> {
        if let Some(position) = self.cached(Instant::now()) {
            debug!(coords = %position.coords, "reusing cached device position");
            return Ok(position);
        }

        let request = self.locator.current_position(&self.options);
        let position = tokio::time::timeout(self.options.timeout, request)
            .await
            .map_err(|_| LocationError::Timeout)??;

        debug!(coords = %position.coords, "device position acquired");
        *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((position, Instant::now()));
        Ok(position)
    }
}
