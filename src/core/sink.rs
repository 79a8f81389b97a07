use crate::domain::model::ResultRecord;
use crate::utils::error::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only writer for the 9-column result table.
///
/// The file is opened and closed per append, so a crash mid-run leaves a
/// valid partial table: the header plus zero or more complete rows. Rows are
/// written comma-joined without quoting, matching the format downstream
/// consumers already parse.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the column names once, with no trailing newline; the first
    /// appended row supplies its own leading newline.
    pub fn write_header(&self) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(ResultRecord::FIELD_NAMES.join(",").as_bytes())?;
        Ok(())
    }

    pub fn append(&self, record: &ResultRecord) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        write!(file, "\n{}", record.to_csv_line())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::MatchCandidate;
    use tempfile::TempDir;

    fn sample_match() -> ResultRecord {
        ResultRecord::matched(
            "42",
            &MatchCandidate {
                match_address: "100 S MAIN ST".to_string(),
                match_zone: "SALT LAKE CITY".to_string(),
                score: 92.5,
                x: 424832.1,
                y: 4513044.9,
                locator: "Centerlines.StatewideRoads".to_string(),
                input_address: "100 S MAIN".to_string(),
                input_zone: "84101".to_string(),
            },
        )
    }

    #[test]
    fn header_then_rows_layout() {
        let dir = TempDir::new().unwrap();
        let sink = CsvSink::new(dir.path().join("GeocodeResults_test.csv"));

        sink.write_header().unwrap();
        sink.append(&sample_match()).unwrap();
        sink.append(&ResultRecord::error("43", "", "", "Error: Geocode failed"))
            .unwrap();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = contents.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "INID,INADDR,INZONE,MatchAddress,Zone,Score,XCoord,YCoord,Geocoder"
        );
        assert_eq!(
            lines[1],
            "42,100 S MAIN,84101,100 S MAIN ST,SALT LAKE CITY,92.5,424832.1,4513044.9,Centerlines.StatewideRoads"
        );
        assert_eq!(lines[2], "43,,,Error: Geocode failed,,,,,");
        assert!(!contents.ends_with('\n'));
    }

    #[test]
    fn rows_round_trip_through_csv_parsing() {
        let dir = TempDir::new().unwrap();
        let sink = CsvSink::new(dir.path().join("roundtrip.csv"));
        let record = sample_match();

        sink.write_header().unwrap();
        sink.append(&record).unwrap();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        let row = contents.split('\n').nth(1).unwrap();
        let parsed: Vec<&str> = row.split(',').collect();

        let fields = record.fields();
        assert_eq!(parsed.len(), fields.len());
        for (parsed_field, original) in parsed.iter().zip(fields.iter()) {
            assert_eq!(parsed_field, original);
        }
        assert_eq!(parsed[5].parse::<f64>().unwrap(), 92.5);
    }
}
