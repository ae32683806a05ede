//! Result export formats and utilities

use crate::search::error::{SearchError, SearchResult};
use crate::search::query::{SearchFilters, SearchQuery, SortField, SortDirection};
use crate::search::service::{SearchEngine, SearchResultItem};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use strum::{Display, EnumString};

/// Export format for search results
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    Csv,
    Json,
    /// Declared for API compatibility; not implemented
    Xlsx,
    /// Declared for API compatibility; not implemented
    Pdf,
}

impl ExportFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// Get MIME type for this format
    pub fn mime_type(&self) -> &str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

/// Exportable result fields, declared in column order
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ExportField {
    Id,
    Type,
    Title,
    Description,
    Content,
    Url,
    Tags,
    Author,
    Score,
    CreatedAt,
    UpdatedAt,
    Category,
    Location,
    Company,
    Level,
    Status,
    Popularity,
}

impl ExportField {
    /// Used when no fields are requested
    pub const DEFAULT: [ExportField; 7] = [
        ExportField::Id,
        ExportField::Type,
        ExportField::Title,
        ExportField::Description,
        ExportField::Url,
        ExportField::Tags,
        ExportField::Score,
    ];

    /// Added by `include_metadata`
    pub const METADATA: [ExportField; 8] = [
        ExportField::CreatedAt,
        ExportField::UpdatedAt,
        ExportField::Category,
        ExportField::Location,
        ExportField::Company,
        ExportField::Level,
        ExportField::Status,
        ExportField::Popularity,
    ];

    fn value(&self, item: &SearchResultItem) -> Value {
        let optional = |v: &Option<String>| v.clone().map_or(Value::Null, Value::String);
        match self {
            ExportField::Id => Value::String(item.id.clone()),
            ExportField::Type => Value::String(item.content_type.to_string()),
            ExportField::Title => Value::String(item.title.clone()),
            ExportField::Description => Value::String(item.description.clone()),
            ExportField::Content => Value::String(item.content.clone()),
            ExportField::Url => Value::String(item.url.clone()),
            ExportField::Tags => Value::from(item.tags.clone()),
            ExportField::Author => serde_json::to_value(&item.author).unwrap_or(Value::Null),
            ExportField::Score => Value::from(item.score as f64),
            ExportField::CreatedAt => Value::String(item.metadata.created_at.to_rfc3339()),
            ExportField::UpdatedAt => Value::String(item.metadata.updated_at.to_rfc3339()),
            ExportField::Category => optional(&item.metadata.category),
            ExportField::Location => optional(&item.metadata.location),
            ExportField::Company => optional(&item.metadata.company),
            ExportField::Level => optional(&item.metadata.level),
            ExportField::Status => optional(&item.metadata.status),
            ExportField::Popularity => Value::from(item.metadata.popularity),
        }
    }
}

/// Export request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,

    /// Requested columns; empty means [`ExportField::DEFAULT`]
    pub fields: Vec<ExportField>,

    /// Optional text query; empty exports the filtered active set
    pub query: String,

    pub filters: SearchFilters,

    /// Maximum rows exported
    pub max_results: usize,

    /// Append the metadata columns
    pub include_metadata: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            fields: Vec::new(),
            query: String::new(),
            filters: SearchFilters::default(),
            max_results: 1000,
            include_metadata: false,
        }
    }
}

impl ExportConfig {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    /// Union of requested and metadata columns, in declaration order
    pub fn columns(&self) -> Vec<ExportField> {
        let mut columns: BTreeSet<ExportField> = if self.fields.is_empty() {
            ExportField::DEFAULT.into_iter().collect()
        } else {
            self.fields.iter().copied().collect()
        };
        if self.include_metadata {
            columns.extend(ExportField::METADATA);
        }
        columns.into_iter().collect()
    }
}

/// Search result exporter
pub struct ResultExporter;

impl ResultExporter {
    /// Run the configured search across as many pages as needed and export the rows
    pub fn export(engine: &SearchEngine, config: &ExportConfig) -> SearchResult<Vec<u8>> {
        Self::check_format(config.format)?;

        const PAGE_SIZE: usize = 100;
        let mut query = SearchQuery::new(config.query.clone())
            .with_filters(config.filters.clone())
            .with_limit(PAGE_SIZE)
            .with_max_results(config.max_results.max(1));
        query.options.include_facets = false;
        query.options.include_suggestions = false;
        query.options.highlight_results = false;
        if query.is_browse() {
            query = query.with_sort(SortField::Date, SortDirection::Desc);
        }

        let mut items = Vec::new();
        loop {
            let response = engine.search(&query)?;
            items.extend(response.results);
            if !response.has_more || items.len() >= config.max_results {
                break;
            }
            query.pagination.page += 1;
        }
        items.truncate(config.max_results);

        Self::export_items(&items, config)
    }

    /// Export already-fetched items
    pub fn export_items(items: &[SearchResultItem], config: &ExportConfig) -> SearchResult<Vec<u8>> {
        let columns = config.columns();
        let rows: Vec<Map<String, Value>> = items
            .iter()
            .map(|item| {
                columns
                    .iter()
                    .map(|field| (field.to_string(), field.value(item)))
                    .collect()
            })
            .collect();

        match config.format {
            ExportFormat::Json => serde_json::to_vec_pretty(&rows).map_err(|e| {
                SearchError::ExportFailed(format!("JSON serialization failed: {}", e))
            }),
            ExportFormat::Csv => Ok(Self::to_csv(&columns, &rows).into_bytes()),
            ExportFormat::Xlsx | ExportFormat::Pdf => Err(Self::unsupported(config.format)),
        }
    }

    /// Fail fast on formats that are declared but not implemented
    pub fn check_format(format: ExportFormat) -> SearchResult<()> {
        match format {
            ExportFormat::Csv | ExportFormat::Json => Ok(()),
            ExportFormat::Xlsx | ExportFormat::Pdf => Err(Self::unsupported(format)),
        }
    }

    fn unsupported(format: ExportFormat) -> SearchError {
        SearchError::UnsupportedFormat(format!("{} export is not implemented", format))
    }

    fn to_csv(columns: &[ExportField], rows: &[Map<String, Value>]) -> String {
        let mut csv = columns
            .iter()
            .map(|field| field.to_string())
            .collect::<Vec<_>>()
            .join(",");
        csv.push('\n');

        for row in rows {
            let cells: Vec<String> = columns
                .iter()
                .map(|field| {
                    let cell = match row.get(&field.to_string()) {
                        None | Some(Value::Null) => String::new(),
                        Some(Value::String(s)) => s.clone(),
                        Some(Value::Number(n)) => n.to_string(),
                        Some(Value::Bool(b)) => b.to_string(),
                        Some(other) => other.to_string(),
                    };
                    Self::escape_csv(&cell)
                })
                .collect();
            csv.push_str(&cells.join(","));
            csv.push('\n');
        }
        csv
    }

    /// Quote cells containing separators, quotes or line breaks
    fn escape_csv(s: &str) -> String {
        if s.contains([',', '"', '\n', '\r']) {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;
    use crate::search::document::Author;
    use crate::search::service::ResultMetadata;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn item() -> SearchResultItem {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        SearchResultItem {
            id: "job-1".to_string(),
            content_type: ContentType::Jobs,
            title: "Engineer, \"Platform\"".to_string(),
            description: "Build things".to_string(),
            content: String::new(),
            url: "/jobs/job-1".to_string(),
            tags: vec!["rust".to_string(), "go".to_string()],
            author: Some(Author {
                id: "u1".to_string(),
                name: "Ana".to_string(),
                avatar: None,
            }),
            metadata: ResultMetadata {
                created_at: at,
                updated_at: at,
                category: None,
                location: Some("Madrid".to_string()),
                company: None,
                level: None,
                status: None,
                popularity: 4,
            },
            score: 2.5,
            highlights: Vec::new(),
        }
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::from_str("PDF").unwrap(), ExportFormat::Pdf);
        assert_eq!(ExportFormat::Csv.mime_type(), "text/csv");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(ResultExporter::escape_csv("plain"), "plain");
        assert_eq!(ResultExporter::escape_csv("test\"quote"), "\"test\"\"quote\"");
        assert_eq!(ResultExporter::escape_csv("a,b"), "\"a,b\"");
    }

    #[test]
    fn test_csv_header_and_cells() {
        let config = ExportConfig {
            fields: vec![ExportField::Tags, ExportField::Id, ExportField::Title],
            ..ExportConfig::new(ExportFormat::Csv)
        };
        let csv = String::from_utf8(ResultExporter::export_items(&[item()], &config).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "id,title,tags");
        assert_eq!(
            lines[1],
            r#"job-1,"Engineer, ""Platform""","[""rust"",""go""]""#
        );
    }

    #[test]
    fn test_json_export_with_metadata() {
        let config = ExportConfig {
            include_metadata: true,
            ..ExportConfig::new(ExportFormat::Json)
        };
        let bytes = ResultExporter::export_items(&[item()], &config).unwrap();
        let rows: Vec<Map<String, Value>> = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["location"], "Madrid");
        assert_eq!(rows[0]["popularity"], 4);
        assert_eq!(rows[0]["type"], "jobs");
        assert!(rows[0]["category"].is_null());
    }

    #[test]
    fn test_unsupported_formats() {
        for format in [ExportFormat::Xlsx, ExportFormat::Pdf] {
            let result = ResultExporter::export_items(&[item()], &ExportConfig::new(format));
            assert!(matches!(result, Err(SearchError::UnsupportedFormat(_))));
        }
    }
}
