/// An input row after normalization, ready to send to the geocode service.
///
/// Produced by [`crate::core::normalize::AddressNormalizer`]; normalization is
/// pure, so equal inputs always yield equal values here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAddress {
    pub id: String,
    pub address: String,
    pub zone: String,
    pub valid: bool,
}

/// Classified reply for a single geocode request.
///
/// `NoResponse` means retries were exhausted without a parseable reply; it is
/// the only variant that counts toward the pipeline's abort threshold.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    NotFound { message: String },
    Matched(MatchCandidate),
    NoResponse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub match_address: String,
    pub match_zone: String,
    pub score: f64,
    pub x: f64,
    pub y: f64,
    pub locator: String,
    /// Input address echoed back by the service.
    pub input_address: String,
    pub input_zone: String,
}

/// Result of the startup API-key probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCheck {
    Valid(String),
    /// Application-level rejection, `Error: ...` text for the operator.
    Invalid(String),
    NoResponse,
}

/// Named address-matching strategy configured on the geocode service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LocatorStrategy {
    /// Address points and road centerlines.
    #[default]
    All,
    RoadCenterlines,
    AddressPoints,
}

impl LocatorStrategy {
    pub fn as_query_value(&self) -> &'static str {
        match self {
            LocatorStrategy::All => "all",
            LocatorStrategy::RoadCenterlines => "roadCenterlines",
            LocatorStrategy::AddressPoints => "addressPoints",
        }
    }
}

/// One output row. Exactly one is appended per input row, so ids stay
/// traceable even when the lookup failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub id: String,
    pub in_address: String,
    pub in_zone: String,
    pub match_address: String,
    pub zone: String,
    pub score: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub geocoder: String,
}

impl ResultRecord {
    pub const FIELD_NAMES: [&'static str; 9] = [
        "INID",
        "INADDR",
        "INZONE",
        "MatchAddress",
        "Zone",
        "Score",
        "XCoord",
        "YCoord",
        "Geocoder",
    ];

    /// Row with an `Error: ...` message in the match-address column and no
    /// coordinate fields.
    pub fn error(id: &str, in_address: &str, in_zone: &str, message: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            in_address: in_address.to_string(),
            in_zone: in_zone.to_string(),
            match_address: message.into(),
            zone: String::new(),
            score: None,
            x: None,
            y: None,
            geocoder: String::new(),
        }
    }

    pub fn matched(id: &str, candidate: &MatchCandidate) -> Self {
        Self {
            id: id.to_string(),
            in_address: candidate.input_address.clone(),
            in_zone: candidate.input_zone.clone(),
            match_address: candidate.match_address.clone(),
            zone: candidate.match_zone.clone(),
            score: Some(candidate.score),
            x: Some(candidate.x),
            y: Some(candidate.y),
            geocoder: candidate.locator.clone(),
        }
    }

    /// Fields in output-table order; logically-empty values render as empty
    /// strings, never as a placeholder token.
    pub fn fields(&self) -> [String; 9] {
        [
            self.id.clone(),
            self.in_address.clone(),
            self.in_zone.clone(),
            self.match_address.clone(),
            self.zone.clone(),
            self.score.map(|v| v.to_string()).unwrap_or_default(),
            self.x.map(|v| v.to_string()).unwrap_or_default(),
            self.y.map(|v| v.to_string()).unwrap_or_default(),
            self.geocoder.clone(),
        ]
    }

    pub fn to_csv_line(&self) -> String {
        self.fields().join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_record_leaves_derived_fields_empty() {
        let record = ResultRecord::error("17", "100 S MAIN ST", "84101", "Error: Geocode failed");
        let fields = record.fields();
        assert_eq!(fields[0], "17");
        assert_eq!(fields[3], "Error: Geocode failed");
        for field in &fields[4..] {
            assert_eq!(field, "");
        }
    }

    #[test]
    fn csv_line_has_nine_fields() {
        let candidate = MatchCandidate {
            match_address: "270 E CENTER ST".to_string(),
            match_zone: "LINDON".to_string(),
            score: 100.0,
            x: 443800.5,
            y: 4463500.2,
            locator: "AddressPoints.PointAddress".to_string(),
            input_address: "270 E CENTER ST".to_string(),
            input_zone: "LINDON".to_string(),
        };
        let line = ResultRecord::matched("1", &candidate).to_csv_line();
        assert_eq!(line.split(',').count(), 9);
        assert!(line.starts_with("1,270 E CENTER ST,LINDON,270 E CENTER ST,LINDON,100,"));
    }

    #[test]
    fn locator_query_values() {
        assert_eq!(LocatorStrategy::All.as_query_value(), "all");
        assert_eq!(
            LocatorStrategy::RoadCenterlines.as_query_value(),
            "roadCenterlines"
        );
        assert_eq!(
            LocatorStrategy::AddressPoints.as_query_value(),
            "addressPoints"
        );
    }
}
