use crate::core::client::DEFAULT_GEOCODE_HOST;
use crate::core::pipeline::ColumnMap;
use crate::domain::model::LocatorStrategy;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_path, validate_url, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "table-geocoder")]
#[command(about = "Geocode a table of addresses against the UGRC web API")]
pub struct CliConfig {
    /// API key for the geocode service.
    #[arg(long = "apikey")]
    pub api_key: String,

    /// Bucket (base location) holding the input table.
    #[arg(long)]
    pub input_bucket: Option<String>,

    /// Name of the CSV in the input bucket.
    #[arg(long)]
    pub input_csv: String,

    /// ID column in the input CSV.
    #[arg(long, default_value = "id")]
    pub id_field: String,

    /// Address column in the input CSV.
    #[arg(long, default_value = "address")]
    pub address_field: String,

    /// Zone column in the input CSV.
    #[arg(long, default_value = "zone")]
    pub zone_field: String,

    /// Bucket (base location) receiving the results table.
    #[arg(long)]
    pub output_bucket: Option<String>,

    /// Local working directory for staged input and results.
    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_enum, default_value = "all")]
    pub locator: LocatorStrategy,

    /// Coordinate system for returned match points (default NAD83 UTM 12N).
    #[arg(long, default_value_t = 26912)]
    pub spatial_reference: u32,

    #[arg(long, default_value = DEFAULT_GEOCODE_HOST)]
    pub service_url: String,

    /// Do not stage from the input bucket; input CSV must already be local.
    #[arg(long)]
    pub no_download: bool,

    /// Do not copy results to the output bucket.
    #[arg(long)]
    pub no_upload: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process resource usage at checkpoints")]
    pub monitor: bool,
}

impl CliConfig {
    pub fn column_map(&self) -> ColumnMap {
        ColumnMap {
            id: self.id_field.clone(),
            address: self.address_field.clone(),
            zone: self.zone_field.clone(),
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("apikey", &self.api_key)?;
        validate_non_empty_string("input_csv", &self.input_csv)?;
        validate_non_empty_string("id_field", &self.id_field)?;
        validate_non_empty_string("address_field", &self.address_field)?;
        validate_non_empty_string("zone_field", &self.zone_field)?;
        validate_url("service_url", &self.service_url)?;
        validate_path("output_path", &self.output_path)?;

        if !self.no_download {
            let bucket = self.input_bucket.as_deref().unwrap_or_default();
            validate_non_empty_string("input_bucket", bucket)?;
        }
        if !self.no_upload {
            let bucket = self.output_bucket.as_deref().unwrap_or_default();
            validate_non_empty_string("output_bucket", bucket)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Vec<&'static str> {
        vec![
            "table-geocoder",
            "--apikey",
            "agrc-explorer",
            "--input-csv",
            "addresses.csv",
            "--no-download",
            "--no-upload",
        ]
    }

    #[test]
    fn parses_minimal_local_run() {
        let config = CliConfig::parse_from(base_args());
        assert!(config.validate().is_ok());
        assert_eq!(config.spatial_reference, 26912);
        assert_eq!(config.locator, LocatorStrategy::All);
        assert_eq!(config.service_url, DEFAULT_GEOCODE_HOST);
    }

    #[test]
    fn staging_requires_buckets() {
        let mut args = base_args();
        args.retain(|a| *a != "--no-download");
        let config = CliConfig::parse_from(args);
        assert!(config.validate().is_err());
    }

    #[test]
    fn column_map_follows_field_flags() {
        let mut args = base_args();
        args.extend(["--id-field", "OBJECTID", "--address-field", "STREET"]);
        let config = CliConfig::parse_from(args);
        let columns = config.column_map();
        assert_eq!(columns.id, "OBJECTID");
        assert_eq!(columns.address, "STREET");
        assert_eq!(columns.zone, "zone");
    }

    #[test]
    fn locator_flag_selects_strategy() {
        let mut args = base_args();
        args.extend(["--locator", "road-centerlines"]);
        let config = CliConfig::parse_from(args);
        assert_eq!(config.locator, LocatorStrategy::RoadCenterlines);
        assert_eq!(config.locator.as_query_value(), "roadCenterlines");
    }
}
