//! CSV and JSON export of record lists

use outreach_core::*;
use serde::Serialize;

pub const CSV_HEADERS: [&str; 9] = [
    "ID",
    "Link",
    "Platform",
    "Date Added",
    "Followed By",
    "Follow Date",
    "DM Sent",
    "DM Sent Date",
    "Notes",
];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportEnvelope<'a, T> {
    export_date: DateTime<Utc>,
    total_records: usize,
    data: &'a [T],
}

/// Active records as CSV, one row per record in the given order
pub fn export_models_csv(records: &[CandidateRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS).map_err(export_error)?;

    for record in records {
        writer
            .write_record([
                record.id.to_string(),
                record.link.clone(),
                record.platform.clone(),
                calendar_day(Some(record.date_added)),
                record.followed_by.clone().unwrap_or_default(),
                calendar_day(record.follow_date),
                if record.dm_sent { "Yes" } else { "No" }.to_string(),
                calendar_day(record.dm_sent_date),
                record.notes.clone(),
            ])
            .map_err(export_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| SystemError::Export { details: e.to_string() })?;
    String::from_utf8(bytes).map_err(|e| SystemError::Export { details: e.to_string() }.into())
}

/// Any record list wrapped as `{exportDate, totalRecords, data}`
pub fn export_json<T: Serialize>(records: &[T], exported_at: DateTime<Utc>) -> Result<String> {
    let envelope = ExportEnvelope {
        export_date: exported_at,
        total_records: records.len(),
        data: records,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Suggested download name, e.g. `models-2024-06-01.csv`
pub fn export_file_name(prefix: &str, extension: &str, exported_at: DateTime<Utc>) -> String {
    format!("{}-{}.{}", prefix, exported_at.date_naive(), extension)
}

fn calendar_day(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.date_naive().to_string()).unwrap_or_default()
}

fn export_error(e: csv::Error) -> OutreachError {
    SystemError::Export { details: e.to_string() }.into()
}
