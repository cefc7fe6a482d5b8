//! Geolocation capture.
//!
//! Location is optional metadata on a photo. A provider may be denied, have no
//! fix, or take too long; [`acquire_location`] folds all of those into `None`
//! so capture flows never fail because of it.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::model::Geolocation;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location unavailable: {0}")]
    Unavailable(String),
    #[error("location request timed out")]
    Timeout,
}

/// Source of the device position (GPS, OS service, a fixed value in tests).
#[async_trait(?Send)]
pub trait LocationProvider {
    async fn current_position(&self) -> Result<Geolocation, LocationError>;
}

/// Ask `provider` for a position, giving up after `timeout`. Never fails.
pub async fn acquire_location<P>(provider: &P, timeout: Duration) -> Option<Geolocation>
where
    P: LocationProvider + ?Sized,
{
    let outcome = match tokio::time::timeout(timeout, provider.current_position()).await {
        Ok(outcome) => outcome,
        Err(_) => Err(LocationError::Timeout),
    };
    match outcome {
        Ok(position) => Some(position),
        Err(e) => {
            tracing::warn!(error = %e, "continuing without geolocation");
            None
        }
    }
}

/// Provider for hosts without any location service.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait(?Send)]
impl LocationProvider for NoLocation {
    async fn current_position(&self) -> Result<Geolocation, LocationError> {
        Err(LocationError::Unavailable("no location service".to_string()))
    }
}

/// Provider that always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Geolocation);

#[async_trait(?Send)]
impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<Geolocation, LocationError> {
        Ok(self.0)
    }
}
