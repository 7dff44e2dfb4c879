pub mod fixed;
pub mod guard;
pub mod http;
pub mod resolver;

pub use fixed::FixedDistanceResolver;
pub use guard::{DistanceUpdate, EditDebouncer, PendingDistance};
pub use http::HttpDistanceResolver;
pub use resolver::{AddressPair, DistanceError, DistanceResolver, ResolvedDistance, RouteLegs};
