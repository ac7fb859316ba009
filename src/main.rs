use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use warcforge::config;

/// Archive web pages into WARC files by driving a real browser.
#[derive(Debug, Parser)]
#[command(name = "warcforge", version, about)]
struct Cli {
    /// Path to the crawl configuration file (TOML).
    config: PathBuf,

    /// Validate the configuration and print the crawl plan without
    /// launching a browser.
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    // RUST_LOG still wins over the -v flags when set.
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = config::load(&cli.config)?;

    if cli.dry_run {
        print_plan(&config);
        return Ok(());
    }

    let summary = warcforge::crawl(config).await?;

    println!(
        "Archived {} page(s) ({} skipped, {} timed out), {} WARC record(s) written",
        summary.pages_archived,
        summary.pages_skipped,
        summary.pages_timed_out,
        summary.records_written
    );
    Ok(())
}

fn print_plan(config: &config::CrawlConfig) {
    println!("Crawl plan ({} seed(s)):", config.seeds.len());
    for seed in &config.seeds {
        println!(
            "  {} mode={:?} depth={}",
            seed.url, seed.mode, seed.depth
        );
    }
    println!(
        "Output: {} (naming: {:?}, append: {})",
        config.warc.output.display(),
        config.warc.naming,
        config.warc.append
    );
}
