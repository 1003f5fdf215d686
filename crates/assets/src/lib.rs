//! Static-asset access for the workbench: the fetch seam plus the tabular
//! data files the feature panels consume.
//! 工作台的靜態資源存取：抓取介面與各功能面板使用的表格資料。

pub mod catalog;
pub mod faq;
pub mod fetch;
pub mod templates;

pub use catalog::{
    load_catalog, Catalog, CatalogError, CatalogSource, ProductRecord, CATALOG_CSV_PATH,
};
pub use faq::{load_faq, FaqEntry, FaqError, FAQ_CSV_PATH};
pub use fetch::{DiskFetcher, FetchError, Fetcher, MemoryFetcher};
pub use templates::{load_email_templates, EmailTemplate, TemplateSource, EMAIL_TEMPLATES_PATH};
