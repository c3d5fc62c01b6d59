//! Export serializers for stored records.
//!
//! Formatting of already-validated data: JSON carries the full payload,
//! CSV/XML/Markdown carry the record fields plus a short weather
//! summary so spreadsheets stay readable.

use crate::error::{ServiceError, ServiceResult};
use std::fmt::Write as _;
use stratus_store::WeatherRecord;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Xml,
    Markdown,
}

impl ExportFormat {
    /// Parse a format name from a request path segment.
    ///
    /// # Errors
    /// `ServiceError::Export` for unsupported names.
    pub fn parse(raw: &str) -> ServiceResult<Self> {
        match raw.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "xml" => Ok(Self::Xml),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(ServiceError::export(format!("unsupported export format: {other}"))),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
            Self::Xml => "application/xml",
            Self::Markdown => "text/markdown",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Xml => "xml",
            Self::Markdown => "md",
        }
    }
}

/// Serialize records in the requested format.
///
/// # Errors
/// `ServiceError::Export` when serialization fails.
pub fn export(records: &[WeatherRecord], format: ExportFormat) -> ServiceResult<String> {
    match format {
        ExportFormat::Json => to_json(records),
        ExportFormat::Csv => Ok(to_csv(records)),
        ExportFormat::Xml => Ok(to_xml(records)),
        ExportFormat::Markdown => Ok(to_markdown(records)),
    }
}

/// Full records, including the verbatim temperature payload.
///
/// # Errors
/// `ServiceError::Export` when serialization fails.
pub fn to_json(records: &[WeatherRecord]) -> ServiceResult<String> {
    serde_json::to_string_pretty(records)
        .map_err(|e| ServiceError::export(format!("JSON export failed: {e}")))
}

/// One row per record with a condensed weather summary.
pub fn to_csv(records: &[WeatherRecord]) -> String {
    let mut out = String::from(
        "ID,Location,Start Date,End Date,Latitude,Longitude,Created At,Updated At,\
         First Temp,Days,Buckets\n",
    );

    for record in records {
        let first_temp = record
            .temperature_data
            .first_reading()
            .and_then(|reading| reading.get("temperature_2m"))
            .map_or_else(|| "N/A".to_string(), ToString::to_string);

        let row = [
            record.id.to_string(),
            record.location.clone(),
            record.start_date.to_string(),
            record.end_date.to_string(),
            record.latitude.to_string(),
            record.longitude.to_string(),
            record.created_at.to_rfc3339(),
            record.updated_at.to_rfc3339(),
            first_temp,
            record.temperature_data.day_count().to_string(),
            record.temperature_data.bucket_count().to_string(),
        ];
        let escaped: Vec<String> = row.iter().map(|field| csv_field(field)).collect();
        out.push_str(&escaped.join(","));
        out.push('\n');
    }

    out
}

/// A `<weather_records>` tree with one `<record>` element per record.
pub fn to_xml(records: &[WeatherRecord]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(out, "<weather_records total_records=\"{}\">", records.len());

    for record in records {
        let _ = writeln!(out, "  <record>");
        let _ = writeln!(out, "    <id>{}</id>", record.id);
        let _ = writeln!(out, "    <location>{}</location>", xml_escape(&record.location));
        let _ = writeln!(out, "    <start_date>{}</start_date>", record.start_date);
        let _ = writeln!(out, "    <end_date>{}</end_date>", record.end_date);
        let _ = writeln!(out, "    <latitude>{}</latitude>", record.latitude);
        let _ = writeln!(out, "    <longitude>{}</longitude>", record.longitude);
        let _ = writeln!(out, "    <created_at>{}</created_at>", record.created_at.to_rfc3339());
        let _ = writeln!(out, "    <updated_at>{}</updated_at>", record.updated_at.to_rfc3339());
        let _ = writeln!(
            out,
            "    <weather_summary days=\"{}\" buckets=\"{}\"/>",
            record.temperature_data.day_count(),
            record.temperature_data.bucket_count(),
        );
        let _ = writeln!(out, "  </record>");
    }

    out.push_str("</weather_records>\n");
    out
}

/// A summary table followed by a section per record.
pub fn to_markdown(records: &[WeatherRecord]) -> String {
    let mut out = String::from("# Weather Records\n\n");
    let _ = writeln!(out, "Total records: {}\n", records.len());
    out.push_str("| ID | Location | Start | End | Days |\n");
    out.push_str("|----|----------|-------|-----|------|\n");

    for record in records {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            record.id,
            record.location.replace('|', "\\|"),
            record.start_date,
            record.end_date,
            record.temperature_data.day_count(),
        );
    }

    for record in records {
        let _ = writeln!(out, "\n## Record {}: {}\n", record.id, record.location);
        let _ = writeln!(
            out,
            "- Coordinates: ({:.4}, {:.4})",
            record.latitude, record.longitude
        );
        let _ = writeln!(out, "- Range: {} to {}", record.start_date, record.end_date);
        let _ = writeln!(out, "- Created: {}", record.created_at.to_rfc3339());
        let _ = writeln!(out, "- Updated: {}", record.updated_at.to_rfc3339());
        let _ = writeln!(
            out,
            "- Readings: {} buckets across {} day(s)",
            record.temperature_data.bucket_count(),
            record.temperature_data.day_count(),
        );
    }

    out
}

fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
