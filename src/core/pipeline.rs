use crate::core::normalize::AddressNormalizer;
use crate::core::sink::CsvSink;
use crate::domain::model::{GeocodeOutcome, KeyCheck, ResultRecord};
use crate::domain::ports::Geocoder;
use crate::utils::error::{GeocodeError, Result};
use crate::utils::monitor::SystemMonitor;
use rand::Rng;
use std::path::Path;
use std::time::{Duration, Instant};

/// Consecutive no-response outcomes tolerated before the run aborts. Only
/// unanswered calls accumulate; any answered row resets the count.
const MAX_SEQUENTIAL_FAILURES: u32 = 5;

/// Throughput checkpoint interval, in rows.
const PROGRESS_INTERVAL: u64 = 1000;

/// Pause drawn uniformly before each service call, honoring the shared rate
/// limit. The legacy tool used 100-300ms.
pub const DEFAULT_RATE_LIMIT: (Duration, Duration) =
    (Duration::from_millis(15), Duration::from_millis(30));

/// Names of the input-table columns carrying id, address, and zone.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub id: String,
    pub address: String,
    pub zone: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { rows: u64 },
    /// Circuit breaker tripped mid-run; the output file holds a valid partial
    /// table for the rows completed so far.
    Aborted { rows_completed: u64 },
}

struct RunState {
    row_num: u64,
    consecutive_failures: u32,
    window_start: Instant,
}

/// Sequential streaming pipeline: one input row at a time through
/// normalize -> rate limit -> locate -> append. Intentionally no concurrency;
/// a single request is in flight at any moment.
pub struct BatchPipeline<G: Geocoder> {
    geocoder: G,
    normalizer: AddressNormalizer,
    columns: ColumnMap,
    rate_limit: (Duration, Duration),
    monitor: SystemMonitor,
}

impl<G: Geocoder> BatchPipeline<G> {
    pub fn new(geocoder: G, columns: ColumnMap) -> Self {
        Self {
            geocoder,
            normalizer: AddressNormalizer::new(),
            columns,
            rate_limit: DEFAULT_RATE_LIMIT,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn with_rate_limit(mut self, min: Duration, max: Duration) -> Self {
        self.rate_limit = (min, max);
        self
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = SystemMonitor::new(enabled);
        self
    }

    /// Geocodes the whole input table into `sink`.
    ///
    /// The API key is probed before anything is written; per-row failures are
    /// recorded as error rows and never interrupt the loop. The only mid-run
    /// exit is the consecutive-failure abort, which stops immediately without
    /// writing a row for the record that tripped it.
    pub async fn run(&self, input: &Path, sink: &CsvSink) -> Result<RunOutcome> {
        match self.geocoder.validate_api_key().await? {
            KeyCheck::NoResponse => {
                return Err(GeocodeError::ServiceUnavailable {
                    message: "geocode service failed to respond on api key check".to_string(),
                })
            }
            KeyCheck::Invalid(message) => return Err(GeocodeError::Config { message }),
            KeyCheck::Valid(message) => tracing::info!("{}", message),
        }

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(input)?;
        let headers = reader.headers()?.clone();
        let id_idx = column_index(&headers, &self.columns.id)?;
        let address_idx = column_index(&headers, &self.columns.address)?;
        let zone_idx = column_index(&headers, &self.columns.zone)?;

        sink.write_header()?;
        tracing::info!("Begin geocode");
        self.monitor.log_stats("Geocode started");

        let mut state = RunState {
            row_num: 0,
            consecutive_failures: 0,
            window_start: Instant::now(),
        };

        for record in reader.byte_records() {
            let record = record?;
            let id = String::from_utf8_lossy(record.get(id_idx).unwrap_or_default()).into_owned();

            let (raw_address, raw_zone) = match decode_text_fields(&record, address_idx, zone_idx)
            {
                Some(fields) => fields,
                None => {
                    // Malformed text encoding is recoverable per-row and does
                    // not touch the failure counter.
                    sink.append(&ResultRecord::error(
                        &id,
                        "",
                        "",
                        "Error: Unicode special character encountered",
                    ))?;
                    self.finish_row(&mut state);
                    continue;
                }
            };

            let normalized = self.normalizer.normalize(&id, raw_address, raw_zone);

            // Major format problems are caught before spending a service call.
            if !normalized.valid {
                sink.append(&ResultRecord::error(
                    &id,
                    &normalized.address,
                    &normalized.zone,
                    "Error: Address invalid or NULL fields",
                ))?;
                state.consecutive_failures = 0;
                self.finish_row(&mut state);
                continue;
            }

            self.throttle().await;

            match self.geocoder.locate(&normalized).await? {
                GeocodeOutcome::NoResponse => {
                    state.consecutive_failures += 1;
                    if state.consecutive_failures > MAX_SEQUENTIAL_FAILURES {
                        tracing::error!(
                            "Geocode service failed to respond; {} addresses completed",
                            state.row_num
                        );
                        tracing::error!("Check {} for the partial table", sink.path().display());
                        self.monitor.log_final_stats();
                        return Ok(RunOutcome::Aborted {
                            rows_completed: state.row_num,
                        });
                    }
                    tracing::info!("Address id {} failed", id);
                    sink.append(&ResultRecord::error(
                        &id,
                        &normalized.address,
                        &normalized.zone,
                        "Error: Geocode failed",
                    ))?;
                }
                GeocodeOutcome::NotFound { message } => {
                    sink.append(&ResultRecord::error(
                        &id,
                        &normalized.address,
                        &normalized.zone,
                        format!("Error: {}", message),
                    ))?;
                    state.consecutive_failures = 0;
                }
                GeocodeOutcome::Matched(candidate) => {
                    sink.append(&ResultRecord::matched(&id, &candidate))?;
                    state.consecutive_failures = 0;
                }
            }

            self.finish_row(&mut state);
        }

        self.monitor.log_final_stats();
        tracing::info!("Geocode completed; {} rows processed", state.row_num);
        Ok(RunOutcome::Completed {
            rows: state.row_num,
        })
    }

    async fn throttle(&self) {
        let wait = {
            let mut rng = rand::thread_rng();
            rng.gen_range(self.rate_limit.0..=self.rate_limit.1)
        };
        tokio::time::sleep(wait).await;
    }

    fn finish_row(&self, state: &mut RunState) {
        state.row_num += 1;
        if state.row_num % PROGRESS_INTERVAL == 0 {
            let elapsed = state.window_start.elapsed().as_secs_f64();
            tracing::info!("Rows geocoded {} | seconds {:.3}", state.row_num, elapsed);
            self.monitor.log_stats("Progress checkpoint");
            state.window_start = Instant::now();
        }
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| GeocodeError::Validation {
            message: format!("input table has no column named '{}'", name),
        })
}

fn decode_text_fields(
    record: &csv::ByteRecord,
    address_idx: usize,
    zone_idx: usize,
) -> Option<(&str, &str)> {
    let address = std::str::from_utf8(record.get(address_idx).unwrap_or_default()).ok()?;
    let zone = std::str::from_utf8(record.get(zone_idx).unwrap_or_default()).ok()?;
    Some((address, zone))
}
