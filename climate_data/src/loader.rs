//! Raw dataset loading
//!
//! The upstream table is wide: one row per year, one column per month plus
//! a handful of annual and seasonal summary columns. Cells are kept as text
//! here; numeric coercion happens in [`crate::clean`].

use crate::error::{ClimateError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// NASA GISTEMP v4 global land-ocean temperature index
pub const GISTEMP_URL: &str = "https://data.giss.nasa.gov/gistemp/tabledata_v4/GLB.Ts+dSST.csv";

/// Lines preceding the header row in the remote payload
const REMOTE_TITLE_LINES: usize = 1;

/// Wide-format table of raw text cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from headers and rows.
    ///
    /// Repeated header names get a numeric suffix (`Year`, `Year.1`, ...) and
    /// blank names become `Unnamed: <index>`. Rows are padded with empty
    /// cells or truncated to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers = disambiguate_headers(headers);
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Self { headers, rows }
    }

    /// Parse CSV text, ignoring the first `skip_lines` lines
    pub fn from_csv_str(text: &str, skip_lines: usize) -> Result<Self> {
        let body = skip_leading_lines(text, skip_lines);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(ClimateError::Csv("no header row found".to_string()));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(String::from).collect());
        }

        debug!(columns = headers.len(), rows = rows.len(), "parsed raw table");
        Ok(Self::new(headers, rows))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Position of the column named exactly `name`
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn skip_leading_lines(text: &str, count: usize) -> &str {
    let mut rest = text;
    for _ in 0..count {
        match rest.find('\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => return "",
        }
    }
    rest
}

fn disambiguate_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut result = Vec::with_capacity(headers.len());

    for (i, header) in headers.into_iter().enumerate() {
        let base = if header.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            header
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }

        seen.insert(name.clone());
        result.push(name);
    }

    result
}

/// Anything that can produce a [`RawTable`]
pub trait RawSource {
    /// Fetch the raw table; a failure is fatal for the caller's page
    fn fetch(&self) -> Result<RawTable>;

    /// Short human-readable description for log lines
    fn describe(&self) -> String;
}

/// The two supported dataset locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// HTTPS endpoint whose first line is a title, not a header
    Remote { url: String },
    /// CSV file on disk, header on the first line
    Local { path: PathBuf },
}

impl DataSource {
    /// The hardcoded GISTEMP endpoint
    pub fn gistemp() -> Self {
        DataSource::Remote {
            url: GISTEMP_URL.to_string(),
        }
    }

    pub fn local<P: AsRef<Path>>(path: P) -> Self {
        DataSource::Local {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RawSource for DataSource {
    fn fetch(&self) -> Result<RawTable> {
        info!(source = %self.describe(), "loading raw dataset");
        match self {
            DataSource::Remote { url } => fetch_remote(url),
            DataSource::Local { path } => read_local(path),
        }
    }

    fn describe(&self) -> String {
        match self {
            DataSource::Remote { url } => url.clone(),
            DataSource::Local { path } => path.display().to_string(),
        }
    }
}

impl RawSource for RawTable {
    fn fetch(&self) -> Result<RawTable> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory table ({} rows)", self.len())
    }
}

/// Single attempt, no retry
fn fetch_remote(url: &str) -> Result<RawTable> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("climate_data/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ClimateError::DataUnavailable(format!("cannot build HTTP client: {}", e)))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| ClimateError::DataUnavailable(format!("request to {} failed: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(ClimateError::DataUnavailable(format!(
            "{} returned HTTP {}",
            url,
            response.status()
        )));
    }

    let body = response.text().map_err(|e| {
        ClimateError::DataUnavailable(format!("cannot read response from {}: {}", url, e))
    })?;

    RawTable::from_csv_str(&body, REMOTE_TITLE_LINES)
}

fn read_local(path: &Path) -> Result<RawTable> {
    if !path.exists() {
        return Err(ClimateError::DataUnavailable(format!(
            "local file not found at {}",
            path.display()
        )));
    }

    let text = std::fs::read_to_string(path)?;
    RawTable::from_csv_str(&text, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_headers_get_suffixes() {
        let table = RawTable::new(
            vec!["Year".into(), "Jan".into(), "Year".into(), "".into(), "Year".into()],
            vec![],
        );
        assert_eq!(
            table.headers(),
            &["Year", "Jan", "Year.1", "Unnamed: 3", "Year.2"]
        );
        assert_eq!(table.column_index("Year"), Some(0));
        assert_eq!(table.column_index("Year.2"), Some(4));
        assert_eq!(table.column_index("Feb"), None);
    }

    #[test]
    fn test_rows_are_normalized_to_header_width() {
        let table = RawTable::new(
            vec!["Year".into(), "Jan".into()],
            vec![vec!["2000".into()], vec!["2001".into(), "0.1".into(), "extra".into()]],
        );
        assert_eq!(table.rows()[0], vec!["2000", ""]);
        assert_eq!(table.rows()[1], vec!["2001", "0.1"]);
    }

    #[test]
    fn test_title_line_is_skipped() {
        let text = "Land-Ocean: Global Means\nYear,Jan,Feb\n1880,-.18,-.24\n";
        let table = RawTable::from_csv_str(text, 1).unwrap();
        assert_eq!(table.headers(), &["Year", "Jan", "Feb"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0], vec!["1880", "-.18", "-.24"]);
    }

    #[test]
    fn test_missing_header_is_an_error() {
        assert!(RawTable::from_csv_str("only a title", 1).is_err());
    }

    #[test]
    fn test_missing_local_file_is_data_unavailable() {
        let source = DataSource::local("definitely/not/here.csv");
        match source.fetch() {
            Err(ClimateError::DataUnavailable(msg)) => assert!(msg.contains("not found")),
            other => panic!("expected DataUnavailable, got {:?}", other),
        }
    }
}
