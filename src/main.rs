use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fiber_index::config;
use fiber_index::indexer::CorpusIndexer;
use fiber_index::search::{DocumentStore, QueryHit, SharedStore};

/// Keyword search over an indexed document corpus / 文档语料关键词搜索
#[derive(Debug, Parser)]
#[command(
    name = "fiber-index",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")")
)]
struct Cli {
    /// Config file (default: ./config.json) / 配置文件
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Index a corpus directory into the index file / 索引语料目录
    Index {
        /// Corpus directory (default: indexer.corpus_dir)
        dir: Option<PathBuf>,
    },
    /// Run one query / 执行查询
    Query {
        text: String,
        /// Number of results (default: search.default_top_n)
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive search loop; the index is saved on exit / 交互式搜索
    Shell,
    /// Show index statistics / 索引统计
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fiber_index=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration / 加载配置
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    config::init_config(&config_path)?;
    let app_config = config::config();
    let index_path = app_config.get_index_path();
    let default_top_n = app_config.search.default_top_n;

    let mut store = DocumentStore::new().with_snippet_length(app_config.search.snippet_length);

    match cli.command {
        Command::Index { dir } => {
            let corpus_dir = dir.unwrap_or_else(|| app_config.get_corpus_dir());
            let indexer = CorpusIndexer::new(&app_config.indexer);
            let summary = indexer.index_into_file(&mut store, &corpus_dir, &index_path)?;
            println!(
                "Indexed {} new entries from {} files ({} failed, {} duplicates skipped)",
                summary.entries_added,
                summary.files_processed,
                summary.files_failed,
                summary.duplicates_skipped
            );
            println!("Index saved to {}", index_path.display());
        }
        Command::Query { text, top_n, json } => {
            store.load_or_create(&index_path)?;
            if store.is_empty() {
                eprintln!("The index is empty, run `fiber-index index` first.");
                return Ok(());
            }

            let hits = store.query(&text, top_n.unwrap_or(default_top_n));
            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                print_hits(&text, &hits);
            }
        }
        Command::Shell => {
            let shared = SharedStore::new(store);
            if index_path.exists() {
                println!("Loading {}...", index_path.display());
                shared.reload_in_background(&index_path).await??;
            }
            if shared.is_empty() {
                println!("The index is empty, run `fiber-index index` to populate it.");
            }

            tokio::task::spawn_blocking(move || run_shell(&shared, &index_path, default_top_n))
                .await??;
        }
        Command::Stats => {
            store.load_or_create(&index_path)?;
            let stats = store.stats();
            println!("Index file: {}", index_path.display());
            println!("Entries:    {}", stats.entry_count);
            println!("Tokens:     {}", stats.token_count);
            println!("Postings:   {}", stats.posting_count);
        }
    }

    Ok(())
}

/// Read-query-print loop / 交互式查询循环
fn run_shell(shared: &SharedStore, index_path: &Path, default_top_n: usize) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("\nEnter your search query (or 'quit' to exit): ");
        io::stdout().flush()?;
        let Some(query) = lines.next().transpose()? else {
            break;
        };
        let query = query.trim().to_string();
        if query.eq_ignore_ascii_case("quit") {
            break;
        }

        print!("Enter the number of top results to display: ");
        io::stdout().flush()?;
        let top_n = match lines.next().transpose()? {
            Some(answer) => parse_top_n(&answer).unwrap_or_else(|| {
                println!("Invalid input. Using default value of {}.", default_top_n);
                default_top_n
            }),
            None => default_top_n,
        };

        print_hits(&query, &shared.query(&query, top_n));
    }

    if let Some(parent) = index_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    shared.save(index_path)?;
    Ok(())
}

/// Result count typed at the prompt; zero or negative means no results / 解析结果数
fn parse_top_n(answer: &str) -> Option<usize> {
    let n: i64 = answer.trim().parse().ok()?;
    Some(usize::try_from(n).unwrap_or(0))
}

fn print_hits(query: &str, hits: &[QueryHit]) {
    if hits.is_empty() {
        println!("No results found for '{}'.", query);
        return;
    }

    println!("\nTop {} results for '{}':", hits.len(), query);
    for (i, hit) in hits.iter().enumerate() {
        println!("\nResult {}:", i + 1);
        println!("Name: {}", hit.name);
        println!("Content: {}", hit.content);
        println!("Tags: {}", hit.tags);
    }
}
