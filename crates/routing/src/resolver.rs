use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The exact addresses a distance was requested for. Kept on the result so
/// late responses can be matched against the current form input.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressPair {
    pub from: String,
    pub to: String,
}

impl AddressPair {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedDistance {
    pub request: AddressPair,
    pub distance_km: Decimal,
}

#[derive(Debug, Error)]
pub enum DistanceError {
    #[error("distance request failed: {0}")]
    Transport(String),
    #[error("distance service rejected the request with status {status}")]
    Status { status: u16 },
    #[error("distance service returned an unusable response: {0}")]
    BadResponse(String),
}

/// External driving-distance service. Callers must debounce address edits
/// before calling and must tolerate the call failing or never resolving;
/// pricing treats the distance as unknown until a result lands.
#[async_trait]
pub trait DistanceResolver: Send + Sync {
    async fn resolve(&self, request: &AddressPair) -> Result<ResolvedDistance, DistanceError>;
}

/// Per-leg distances for a job route. The billable total is pickup→dropoff,
/// plus depot→pickup when the job starts from base.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RouteLegs {
    pub pickup_to_dropoff: Option<Decimal>,
    pub depot_to_pickup: Option<Decimal>,
}

impl RouteLegs {
    /// `None` until every leg the job needs has resolved.
    pub fn total_km(&self, start_from_depot: bool) -> Option<Decimal> {
        let main = self.pickup_to_dropoff?;
        if start_from_depot {
            Some(main + self.depot_to_pickup?)
        } else {
            Some(main)
        }
    }
}
