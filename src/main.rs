use anyhow::Result;
use clap::Parser;
use file_search::{FileIndex, IndexEvent, SearchConfig, SearchOptions};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Index a directory tree and run a ranked search over it.
#[derive(Debug, Parser)]
#[command(name = "file-search", version)]
struct Cli {
    /// Search query
    query: String,

    /// Directory to index (defaults to the configured root)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Only return files with this extension (repeatable)
    #[arg(short = 't', long = "type")]
    file_types: Vec<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "file_search=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => SearchConfig::from_path(path)?,
        None => SearchConfig::load()?,
    };
    if let Some(root) = cli.root {
        config.root = root;
    }
    config.validate()?;

    let index = FileIndex::new(config);
    let mut events = index.subscribe();
    let progress = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                IndexEvent::Progress { current, total } => {
                    eprintln!("Indexed {}/{} files", current, total);
                }
                IndexEvent::Completed { .. } | IndexEvent::Failed { .. } => break,
                IndexEvent::Started => {}
            }
        }
    });

    eprintln!("Indexing files from {}...", index.config().root.display());
    index.build_index().await?;
    progress.await?;

    let options = if cli.file_types.is_empty() {
        SearchOptions::default()
    } else {
        SearchOptions::with_file_types(cli.file_types)
    };
    let results = index.search(&cli.query, &options);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results found!");
        return Ok(());
    }

    println!("\nSearch Results:");
    println!("---------------");
    for (i, result) in results.iter().enumerate() {
        println!("{}. File: {}", i + 1, result.filename);
        println!("   Path: {}", result.path);
        println!("   Score: {:.4} ({:?})", result.score, result.match_type);
        for snippet in result.snippets.iter().flatten() {
            println!("   > {:.120}", snippet.text.replace('\n', " "));
        }
        println!();
    }

    Ok(())
}
