//! CSV catalog import used to seed a listing store.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{JobPostingId, ListingDocument};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read catalog export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unparseable timestamp '{value}'")]
    Timestamp { row: usize, value: String },
}

pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ListingDocument>, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Read rows into documents. Ids come from the `Id` column or the row position.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ListingDocument>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut documents = Vec::new();

        for (index, record) in csv_reader.deserialize::<CatalogRow>().enumerate() {
            let row = record?;
            let position = index + 1;
            let posted_on = match row.posted_on.as_deref() {
                Some(raw) => Some(parse_timestamp(raw).ok_or_else(|| ImportError::Timestamp {
                    row: position,
                    value: raw.to_string(),
                })?),
                None => None,
            };

            documents.push(ListingDocument {
                id: JobPostingId(row.id.unwrap_or_else(|| format!("seed-{position:04}"))),
                title: row.title,
                company: row.company,
                location: row.location,
                experience: row.experience,
                status: row.status,
                posted_on,
                description: row.description,
                salary: row.salary,
                is_remote: row.remote.as_deref().map(parse_flag),
            });
        }

        Ok(documents)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "Id", default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(rename = "Title", default, deserialize_with = "empty_string_as_none")]
    title: Option<String>,
    #[serde(rename = "Company", default, deserialize_with = "empty_string_as_none")]
    company: Option<String>,
    #[serde(rename = "Location", default, deserialize_with = "empty_string_as_none")]
    location: Option<String>,
    #[serde(
        rename = "Experience",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    experience: Option<String>,
    #[serde(rename = "Status", default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(
        rename = "Posted On",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    posted_on: Option<String>,
    #[serde(rename = "Salary", default, deserialize_with = "empty_string_as_none")]
    salary: Option<String>,
    #[serde(
        rename = "Description",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    description: Option<String>,
    #[serde(rename = "Remote", default, deserialize_with = "empty_string_as_none")]
    remote: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1" | "remote"
    )
}
