use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use fwrelease_assets::{load_catalog, load_faq, DiskFetcher};
use fwrelease_modules::report::{generate_report, report_to_csv, ReportTemplate, TEMPLATES};
use fwrelease_modules::util::Placeholder;
use fwrelease_shell::{resolve_initial_page, NavStateStore, PageId};

#[derive(Parser)]
#[command(
    name = "fwrelease-cli",
    about = "Headless utilities for the FW Release Workbench",
    version
)]
struct Cli {
    /// 靜態資源根目錄。 / Assets root directory.
    #[arg(long, global = true, value_name = "PATH", default_value = "assets")]
    assets: PathBuf,
    /// 導覽狀態目錄。 / Navigation-state directory.
    #[arg(long, global = true, value_name = "PATH", default_value = "state")]
    state_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 檢視或驗證產品目錄。 / Inspect or validate the product catalog.
    #[command(subcommand)]
    Catalog(CatalogCommand),
    /// 產生報表並匯出 CSV。 / Generate a report and export it as CSV.
    Report(ReportArgs),
    /// 匯出 FAQ 條目。 / Export FAQ entries.
    Faq(FaqArgs),
    /// 檢視或重設導覽狀態。 / Inspect or reset the navigation state.
    #[command(subcommand)]
    State(StateCommand),
}

#[derive(Subcommand)]
enum CatalogCommand {
    /// 列出目錄中的產品。 / List the products in the catalog.
    List,
    /// 驗證目錄可以載入且非空。 / Validate that the catalog loads and is non-empty.
    Validate,
}

#[derive(Args)]
struct ReportArgs {
    /// 報表範本識別碼。 / Report template id.
    #[arg(long, value_name = "ID")]
    template: String,
    /// 統計視窗天數。 / Trailing window in days.
    #[arg(long, value_name = "DAYS")]
    days: Option<u32>,
    /// 固定亂數種子以得到可重現的輸出。 / Pin the random seed for reproducible output.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// 將明細列寫入此 CSV 檔。 / Write the detail rows to this CSV file.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct FaqArgs {
    /// 條目語言（en 或 zh）。 / Entry language (en or zh).
    #[arg(long, default_value = "en")]
    lang: String,
    /// 只匯出此分類。 / Restrict the export to this category.
    #[arg(long, value_name = "CATEGORY")]
    category: Option<String>,
}

#[derive(Subcommand)]
enum StateCommand {
    /// 顯示持久化的值與解析出的啟始頁面。 / Show the stored value and the resolved page.
    Show {
        /// 模擬的啟動連結代符。 / Simulated launch-link token.
        #[arg(long, value_name = "TOKEN")]
        page: Option<String>,
    },
    /// 刪除持久化的導覽狀態。 / Delete the persisted navigation state.
    Reset,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let fetcher = DiskFetcher::new(&cli.assets);

    match cli.command {
        Commands::Catalog(CatalogCommand::List) => {
            let catalog = load_catalog(&fetcher).context("failed to load the product catalog")?;
            println!("source: {}", catalog.source.describe());
            for record in &catalog.records {
                let path = record.fw_path.as_deref().unwrap_or("-");
                let project = record.redmine_project.as_deref().unwrap_or("-");
                println!("{}\t{}\t{}", record.model, path, project);
            }
        }
        Commands::Catalog(CatalogCommand::Validate) => {
            let catalog = load_catalog(&fetcher).context("catalog validation failed")?;
            println!(
                "ok: {} product(s) from {}",
                catalog.records.len(),
                catalog.source.describe()
            );
        }
        Commands::Report(args) => {
            let template = find_template(&args.template)?;
            let days = args.days.unwrap_or(template.default_days);
            let mut placeholder = match args.seed {
                Some(seed) => Placeholder::from_seed(seed),
                None => Placeholder::from_entropy(),
            };
            let report = generate_report(
                &template,
                days,
                Local::now().date_naive(),
                &mut placeholder,
            );
            println!("{} — generated {}", template.name, report.generated_on);
            for (label, value) in &report.summary {
                println!("  {label}: {value}");
            }
            let csv = report_to_csv(&report).context("CSV serialization failed")?;
            match args.out {
                Some(path) => {
                    fs::write(&path, csv)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("detail rows written to {}", path.display());
                }
                None => print!("{csv}"),
            }
        }
        Commands::Faq(args) => {
            if args.lang != "en" && args.lang != "zh" {
                bail!("unsupported language '{}', expected en or zh", args.lang);
            }
            let entries = load_faq(&fetcher).context("failed to load the FAQ table")?;
            let mut exported = 0;
            for entry in &entries {
                if let Some(category) = &args.category {
                    if &entry.category != category {
                        continue;
                    }
                }
                let text = entry.text_for(&args.lang);
                if text.is_empty() {
                    continue;
                }
                println!("[{}] {}", entry.category, text);
                exported += 1;
            }
            if exported == 0 {
                bail!("no FAQ entries matched");
            }
        }
        Commands::State(StateCommand::Show { page }) => {
            let store = NavStateStore::in_dir(&cli.state_dir);
            let stored = store.read();
            let resolved = resolve_initial_page(page.as_deref(), stored.as_deref());
            println!("stored: {}", stored.as_deref().unwrap_or("(none)"));
            let page_id = PageId::from_index(resolved).expect("resolved index is valid");
            println!("resolved: {} ({})", resolved, page_id.title());
        }
        Commands::State(StateCommand::Reset) => {
            let store = NavStateStore::in_dir(&cli.state_dir);
            store.clear().context("failed to reset navigation state")?;
            println!("navigation state cleared");
        }
    }
    Ok(())
}

fn find_template(id: &str) -> Result<ReportTemplate> {
    TEMPLATES
        .iter()
        .copied()
        .find(|template| template.id == id)
        .with_context(|| {
            let known: Vec<&str> = TEMPLATES.iter().map(|template| template.id).collect();
            format!("unknown template '{id}', expected one of: {}", known.join(", "))
        })
}
