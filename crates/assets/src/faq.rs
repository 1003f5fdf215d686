//! Multi-language FAQ table consumed by the user-manual panel.
//! 使用手冊面板使用的多語 FAQ 表。

use serde::Deserialize;
use thiserror::Error;

use crate::fetch::{FetchError, Fetcher};

/// Relative path of the FAQ table.
pub const FAQ_CSV_PATH: &str = "datasheet/faq.csv";

/// One FAQ row. Entries with an empty category or without text in either
/// language are dropped during load.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FaqEntry {
    pub category: String,
    #[serde(rename = "question_en")]
    pub english: String,
    #[serde(rename = "question_zh")]
    pub chinese: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl FaqEntry {
    /// Entry text for a language code (`en`/`zh`), empty when untranslated.
    pub fn text_for(&self, lang: &str) -> &str {
        match lang {
            "zh" => &self.chinese,
            _ => &self.english,
        }
    }
}

/// Loads and filters the FAQ table.
pub fn load_faq(fetcher: &dyn Fetcher) -> Result<Vec<FaqEntry>, FaqError> {
    let bytes = fetcher.fetch_bytes(FAQ_CSV_PATH)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());

    let mut entries = Vec::new();
    for row in reader.deserialize::<FaqEntry>() {
        let mut entry = row.map_err(|source| FaqError::Csv { source })?;
        if entry.category.is_empty() || (entry.english.is_empty() && entry.chinese.is_empty()) {
            continue;
        }
        entry.url = entry.url.filter(|url| !url.is_empty());
        entries.push(entry);
    }
    if entries.is_empty() {
        return Err(FaqError::Empty);
    }
    Ok(entries)
}

#[derive(Debug, Error)]
pub enum FaqError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to parse the FAQ table")]
    Csv {
        #[source]
        source: csv::Error,
    },
    #[error("the FAQ table contains no usable entries")]
    Empty,
}
