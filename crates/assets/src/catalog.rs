//! Product catalog: the router sheet parsed into records.
//! 產品目錄：由路由器清單表格解析出的資料列。
//!
//! Primary source is the sheet's CSV export; a JSON file acts as the
//! fallback when the sheet is missing or malformed. An empty catalog is an
//! error on both paths.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::fetch::{FetchError, Fetcher};

/// Relative path of the primary catalog source.
pub const CATALOG_CSV_PATH: &str = "datasheet/router_list.csv";

/// Relative path of the fallback catalog source.
pub const CATALOG_JSON_PATH: &str = "router-list.json";

/// One product row. Only `Model` is required; the remaining columns feed
/// path derivation and ticket routing when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "APLM_ID", default)]
    pub aplm_id: Option<String>,
    #[serde(rename = "FW_Path", default)]
    pub fw_path: Option<String>,
    #[serde(rename = "Redmine_Project", default)]
    pub redmine_project: Option<String>,
}

impl ProductRecord {
    fn sanitize(mut self) -> Self {
        self.model = self.model.trim().to_string();
        self.aplm_id = normalize(self.aplm_id);
        self.fw_path = normalize(self.fw_path);
        self.redmine_project = normalize(self.redmine_project);
        self
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Which source produced the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Sheet,
    JsonFallback,
}

impl CatalogSource {
    pub fn describe(self) -> &'static str {
        match self {
            CatalogSource::Sheet => "router sheet",
            CatalogSource::JsonFallback => "JSON fallback",
        }
    }
}

/// Loaded catalog plus the source it came from.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub records: Vec<ProductRecord>,
    pub source: CatalogSource,
}

impl Catalog {
    pub fn find(&self, model: &str) -> Option<&ProductRecord> {
        self.records.iter().find(|record| record.model == model)
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.model.as_str())
    }
}

/// Loads the catalog through the sheet → JSON fallback chain.
/// 依「表格 → JSON 備援」順序載入產品目錄。
pub fn load_catalog(fetcher: &dyn Fetcher) -> Result<Catalog, CatalogError> {
    match load_from_sheet(fetcher) {
        Ok(records) => {
            info!(count = records.len(), "catalog loaded from router sheet");
            return Ok(Catalog {
                records,
                source: CatalogSource::Sheet,
            });
        }
        Err(sheet_error) => {
            warn!(%sheet_error, "router sheet unavailable, trying JSON fallback");
            match load_from_json(fetcher) {
                Ok(records) => {
                    info!(count = records.len(), "catalog loaded from JSON fallback");
                    Ok(Catalog {
                        records,
                        source: CatalogSource::JsonFallback,
                    })
                }
                Err(json_error) => Err(CatalogError::AllSourcesFailed {
                    sheet_error: Box::new(sheet_error),
                    json_error: Box::new(json_error),
                }),
            }
        }
    }
}

fn load_from_sheet(fetcher: &dyn Fetcher) -> Result<Vec<ProductRecord>, CatalogError> {
    let bytes = fetcher.fetch_bytes(CATALOG_CSV_PATH)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());

    let mut records = Vec::new();
    for row in reader.deserialize::<ProductRecord>() {
        let record = row
            .map_err(|source| CatalogError::Csv {
                path: CATALOG_CSV_PATH,
                source,
            })?
            .sanitize();
        // Rows without a model are sheet noise, not data.
        if record.model.is_empty() {
            continue;
        }
        records.push(record);
    }
    ensure_non_empty(records, CATALOG_CSV_PATH)
}

fn load_from_json(fetcher: &dyn Fetcher) -> Result<Vec<ProductRecord>, CatalogError> {
    let text = fetcher.fetch_text(CATALOG_JSON_PATH)?;
    let records: Vec<ProductRecord> =
        serde_json::from_str(&text).map_err(|source| CatalogError::Json {
            path: CATALOG_JSON_PATH,
            source,
        })?;
    let records: Vec<ProductRecord> = records
        .into_iter()
        .map(ProductRecord::sanitize)
        .filter(|record| !record.model.is_empty())
        .collect();
    ensure_non_empty(records, CATALOG_JSON_PATH)
}

fn ensure_non_empty(
    records: Vec<ProductRecord>,
    path: &'static str,
) -> Result<Vec<ProductRecord>, CatalogError> {
    if records.is_empty() {
        return Err(CatalogError::EmptySource { path });
    }
    Ok(records)
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to parse {path}")]
    Csv {
        path: &'static str,
        #[source]
        source: csv::Error,
    },
    #[error("failed to parse {path}")]
    Json {
        path: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} contains no products")]
    EmptySource { path: &'static str },
    #[error("all catalog sources failed (sheet: {sheet_error}; fallback: {json_error})")]
    AllSourcesFailed {
        sheet_error: Box<CatalogError>,
        json_error: Box<CatalogError>,
    },
}
