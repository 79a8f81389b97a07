pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::storage::LocalStorage;

pub use crate::core::client::{GeocodeClient, DEFAULT_GEOCODE_HOST};
pub use crate::core::normalize::AddressNormalizer;
pub use crate::core::pipeline::{BatchPipeline, ColumnMap, RunOutcome};
pub use crate::core::retry::RetryPolicy;
pub use crate::core::sink::CsvSink;
pub use crate::core::version::{VersionCheck, VERSION_CHECK_URL};
pub use domain::model::{
    GeocodeOutcome, KeyCheck, LocatorStrategy, MatchCandidate, NormalizedAddress, ResultRecord,
};
pub use domain::ports::{Geocoder, Storage};
pub use utils::error::{GeocodeError, Result};
