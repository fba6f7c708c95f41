//! CSV reading and column mapping
//!
//! The reader is deliberately small: one record per line, commas split fields
//! outside double quotes, and a `"` only toggles the quoted state. There is no
//! escaped-quote syntax and no multi-line field.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use outreach_core::*;
use std::path::Path;
use tracing::debug;

/// Split one CSV line into trimmed fields
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

/// A parsed CSV file: header row plus data rows keyed by header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvDocument {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRecord>,
}

impl CsvDocument {
    /// Parse CSV text.
    ///
    /// Blank lines are ignored. Short rows are padded with empty values and
    /// surplus values beyond the header count are dropped.
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text
            .split('\n')
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.trim().is_empty())
            .collect();

        if lines.len() < 2 {
            return Err(ValidationError::CsvTooShort.into());
        }

        let headers = parse_csv_line(lines[0]);
        let rows = lines[1..]
            .iter()
            .map(|line| {
                let values = parse_csv_line(line);
                headers
                    .iter()
                    .enumerate()
                    .map(|(i, header)| (header.clone(), values.get(i).cloned().unwrap_or_default()))
                    .collect::<CsvRecord>()
            })
            .collect::<Vec<_>>();

        debug!("Parsed CSV with {} columns and {} rows", headers.len(), rows.len());

        Ok(Self { headers, rows })
    }

    /// Read and parse a `.csv` file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        if !is_csv {
            return Err(ValidationError::NotCsvFile {
                path: path.display().to_string(),
            }
            .into());
        }

        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Guess the target field for a header by keyword
pub fn suggest_field(header: &str) -> Option<TargetField> {
    let h = header.to_lowercase();
    let has = |needle: &str| h.contains(needle);

    if has("link") || has("url") || has("profile") {
        Some(TargetField::Link)
    } else if has("platform") || has("site") {
        Some(TargetField::Platform)
    } else if has("note") {
        Some(TargetField::Notes)
    } else if has("follow") && has("by") {
        Some(TargetField::FollowedBy)
    } else if has("follow") && has("date") {
        Some(TargetField::FollowDate)
    } else if has("dm") && has("sent") && has("date") {
        Some(TargetField::DmSentDate)
    } else if has("dm") && has("sent") {
        Some(TargetField::DmSent)
    } else {
        None
    }
}

/// Source column to target field assignments, in header order.
///
/// A header without an assignment is skipped on import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: Vec<(String, TargetField)>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a mapping from header keywords
    pub fn suggest(headers: &[String]) -> Self {
        let columns = headers
            .iter()
            .filter_map(|h| suggest_field(h).map(|field| (h.clone(), field)))
            .collect();
        Self { columns }
    }

    /// Assign `header` to `field`, or skip it with `None`
    pub fn set(&mut self, header: &str, field: Option<TargetField>) {
        match (self.columns.iter().position(|(h, _)| h == header), field) {
            (Some(i), Some(field)) => self.columns[i].1 = field,
            (Some(i), None) => {
                self.columns.remove(i);
            }
            (None, Some(field)) => self.columns.push((header.to_string(), field)),
            (None, None) => {}
        }
    }

    pub fn with(mut self, header: &str, field: TargetField) -> Self {
        self.set(header, Some(field));
        self
    }

    pub fn field_for(&self, header: &str) -> Option<TargetField> {
        self.columns.iter().find(|(h, _)| h == header).map(|(_, f)| *f)
    }

    pub fn columns_for(&self, field: TargetField) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(move |(_, f)| *f == field)
            .map(|(h, _)| h.as_str())
    }

    /// The single column mapped to the link field
    pub fn link_column(&self) -> Result<&str> {
        let links: Vec<&str> = self.columns_for(TargetField::Link).collect();
        match links.as_slice() {
            [single] => Ok(*single),
            [] => Err(ValidationError::LinkColumnNotMapped.into()),
            many => Err(ValidationError::LinkColumnAmbiguous { count: many.len() }.into()),
        }
    }

    /// Value of `field` in `row`; when several columns map to the same
    /// field the last non-empty one wins
    pub fn value<'r>(&self, row: &'r CsvRecord, field: TargetField) -> Option<&'r str> {
        self.columns_for(field)
            .filter_map(|column| row.get(column))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .last()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Boolean-like cell: "true", "1" or "yes" in any case
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Calendar date of a date-like cell; the time of day is discarded
pub fn parse_loose_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.date_naive());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_quoted_commas() {
        assert_eq!(
            parse_csv_line(r#"https://a.com/x, "Note, with comma" ,Instagram"#),
            vec!["https://a.com/x", "Note, with comma", "Instagram"]
        );
        assert_eq!(parse_csv_line("a,,b,"), vec!["a", "", "b", ""]);
    }

    #[test]
    fn test_document_pads_missing_values() {
        let text = "Link,Platform,Notes\nhttps://a.com/x\n\nhttps://b.com/y,TikTok,hi,extra\n";
        let doc = CsvDocument::parse(text).unwrap();

        assert_eq!(doc.headers, vec!["Link", "Platform", "Notes"]);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.rows[0]["Platform"], "");
        assert_eq!(doc.rows[1]["Notes"], "hi");
        assert_eq!(doc.rows[1].len(), 3);
    }

    #[test]
    fn test_document_needs_header_and_row() {
        let err = CsvDocument::parse("Link\n\n").unwrap_err();
        assert!(err.to_string().contains("header row and one data row"));
        assert!(CsvDocument::parse("").is_err());
    }

    #[test]
    fn test_windows_line_endings() {
        let doc = CsvDocument::parse("Link,Platform\r\nhttps://a.com/x,Fansly\r\n").unwrap();
        assert_eq!(doc.rows[0]["Platform"], "Fansly");
    }

    #[test]
    fn test_from_path_requires_csv_extension() {
        let dir = tempfile::tempdir().unwrap();

        let txt = dir.path().join("models.txt");
        std::fs::write(&txt, "Link\nhttps://a.com/x\n").unwrap();
        let err = CsvDocument::from_path(&txt).unwrap_err();
        assert!(err.is_validation());

        let csv = dir.path().join("models.CSV");
        let mut file = std::fs::File::create(&csv).unwrap();
        writeln!(file, "Link\nhttps://a.com/x").unwrap();
        assert_eq!(CsvDocument::from_path(&csv).unwrap().len(), 1);
    }

    #[test]
    fn test_suggested_mapping() {
        let headers: Vec<String> = [
            "Profile URL",
            "Site",
            "Notes",
            "Followed By",
            "Follow Date",
            "DM Sent",
            "DM Sent Date",
            "Age",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let mapping = ColumnMapping::suggest(&headers);

        assert_eq!(mapping.field_for("Profile URL"), Some(TargetField::Link));
        assert_eq!(mapping.field_for("Site"), Some(TargetField::Platform));
        assert_eq!(mapping.field_for("Notes"), Some(TargetField::Notes));
        assert_eq!(mapping.field_for("Followed By"), Some(TargetField::FollowedBy));
        assert_eq!(mapping.field_for("Follow Date"), Some(TargetField::FollowDate));
        assert_eq!(mapping.field_for("DM Sent"), Some(TargetField::DmSent));
        assert_eq!(mapping.field_for("DM Sent Date"), Some(TargetField::DmSentDate));
        assert_eq!(mapping.field_for("Age"), None);
        assert_eq!(mapping.link_column().unwrap(), "Profile URL");
    }

    #[test]
    fn test_link_column_must_be_unique() {
        let mapping = ColumnMapping::new().with("Name", TargetField::Notes);
        assert!(matches!(
            mapping.link_column(),
            Err(OutreachError::Validation { source: ValidationError::LinkColumnNotMapped })
        ));

        let mapping = ColumnMapping::new()
            .with("Link", TargetField::Link)
            .with("URL", TargetField::Link);
        assert!(matches!(
            mapping.link_column(),
            Err(OutreachError::Validation { source: ValidationError::LinkColumnAmbiguous { count: 2 } })
        ));
    }

    #[test]
    fn test_set_overrides_and_skips() {
        let mut mapping = ColumnMapping::suggest(&["Website".to_string(), "Handle".to_string()]);
        assert_eq!(mapping.field_for("Website"), Some(TargetField::Platform));

        mapping.set("Website", None);
        mapping.set("Handle", Some(TargetField::Link));
        assert_eq!(mapping.field_for("Website"), None);
        assert_eq!(mapping.link_column().unwrap(), "Handle");
    }

    #[test]
    fn test_flag_parsing() {
        for yes in ["true", "TRUE", "1", "Yes", " yes "] {
            assert!(parse_flag(yes), "{yes}");
        }
        for no in ["", "no", "0", "false", "y"] {
            assert!(!parse_flag(no), "{no}");
        }
    }

    #[test]
    fn test_loose_dates() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(parse_loose_date("2024-03-05"), Some(d));
        assert_eq!(parse_loose_date("2024-03-05T22:10:00Z"), Some(d));
        assert_eq!(parse_loose_date("2024-03-05 08:00:00"), Some(d));
        assert_eq!(parse_loose_date("03/05/2024"), Some(d));
        assert_eq!(parse_loose_date("March 5, 2024"), Some(d));
        assert_eq!(parse_loose_date("yesterday"), None);
        assert_eq!(parse_loose_date(""), None);
    }
}
