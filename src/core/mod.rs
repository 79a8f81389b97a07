pub mod client;
pub mod normalize;
pub mod pipeline;
pub mod retry;
pub mod sink;
pub mod version;

pub use crate::domain::model::{
    GeocodeOutcome, KeyCheck, LocatorStrategy, MatchCandidate, NormalizedAddress, ResultRecord,
};
pub use crate::domain::ports::{Geocoder, Storage};
pub use crate::utils::error::Result;
