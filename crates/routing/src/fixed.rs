use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::resolver::{AddressPair, DistanceError, DistanceResolver, ResolvedDistance};

/// Table-driven resolver double for tests and offline demos.
#[derive(Clone, Debug, Default)]
pub struct FixedDistanceResolver {
    routes: HashMap<AddressPair, Decimal>,
}

impl FixedDistanceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, from: &str, to: &str, distance_km: Decimal) -> Self {
        self.routes.insert(AddressPair::new(from, to), distance_km);
        self
    }
}

#[async_trait]
impl DistanceResolver for FixedDistanceResolver {
    async fn resolve(&self, request: &AddressPair) -> Result<ResolvedDistance, DistanceError> {
        match self.routes.get(request) {
            Some(distance_km) => {
                Ok(ResolvedDistance { request: request.clone(), distance_km: *distance_km })
            }
            None => Err(DistanceError::Transport(format!(
                "no fixture route from `{}` to `{}`",
                request.from, request.to
            ))),
        }
    }
}
