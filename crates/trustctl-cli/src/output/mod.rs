//! Output formatting for different formats.

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tabled::{settings::Style, Table, Tabled};
use trustctl_core::CertRecord;

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed tables with colors
    #[default]
    #[value(alias = "table")]
    #[serde(alias = "table")]
    Pretty,
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// YAML output
    #[value(alias = "yml")]
    #[serde(alias = "yml")]
    Yaml,
}

/// The name `--output` accepts, as shown by `config show`.
impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_possible_value()
            .map_or(Ok(()), |value| f.write_str(value.get_name()))
    }
}

/// One certificate as a table or CSV row.
#[derive(Debug, Tabled, Serialize)]
pub struct CertRow {
    #[tabled(rename = "Subject")]
    pub subject: String,
    #[tabled(rename = "Issuer CN")]
    pub issuer: String,
    #[tabled(rename = "SHA-256")]
    pub fingerprint: String,
    #[tabled(rename = "Expires")]
    pub expires: String,
    #[tabled(skip)]
    pub source: String,
}

impl From<&CertRecord> for CertRow {
    fn from(cert: &CertRecord) -> Self {
        Self {
            subject: cert.display_name().chars().take(48).collect(),
            issuer: cert.issuer_cn.chars().take(40).collect(),
            fingerprint: cert.fingerprint.clone(),
            expires: cert.not_after.format("%Y-%m-%d").to_string(),
            source: cert.source.clone(),
        }
    }
}

/// Rows sorted by subject then fingerprint, so output is stable.
pub fn cert_rows<'a>(certs: impl IntoIterator<Item = &'a CertRecord>) -> Vec<CertRow> {
    let mut rows: Vec<CertRow> = certs.into_iter().map(CertRow::from).collect();
    rows.sort_by(|a, b| {
        a.subject
            .cmp(&b.subject)
            .then_with(|| a.fingerprint.cmp(&b.fingerprint))
    });
    rows
}

/// Rounded table of certificate rows.
pub fn cert_table(rows: &[CertRow]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Write `rows` as CSV with a header line.
pub fn write_csv<W: Write, T: Serialize>(out: W, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Print `value` as JSON or YAML. Returns false for other formats.
pub fn print_structured<T: Serialize>(format: OutputFormat, value: &T) -> Result<bool> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        OutputFormat::Pretty | OutputFormat::Csv => return Ok(false),
    }
    Ok(true)
}
