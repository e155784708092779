use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{AskArgs, Cli, Command, SearchArgs};
use qadb_core::config::{Config, Settings};
use qadb_rag::RagService;
use qadb_vector::BuildOptions;

const QADB_TARGETS: &[&str] = &["qadb", "qadb_core", "qadb_embed", "qadb_vector", "qadb_llm", "qadb_rag"];

/// Filter directives for the log subscriber.
///
/// A non-blank `QADB_LOG` is used verbatim. Otherwise `-q` wins over `-v`,
/// and the chosen level applies to qadb crates only; dependencies such as
/// reqwest and tokenizers stay at `warn`.
fn log_directives(verbose: u8, quiet: bool, env_override: Option<String>) -> String {
    if let Some(directives) = env_override.filter(|d| !d.trim().is_empty()) {
        return directives;
    }
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    std::iter::once("warn".to_string())
        .chain(QADB_TARGETS.iter().map(|target| format!("{target}={level}")))
        .collect::<Vec<_>>()
        .join(",")
}

fn init_tracing(verbose: u8, quiet: bool) {
    let directives = log_directives(verbose, quiet, std::env::var("QADB_LOG").ok());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    }
    .context("loading configuration")?;
    config.settings().context("invalid configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    let settings = load_settings(&cli)?;

    match &cli.command {
        Command::Ask(args) => ask(&settings, args).await,
        Command::Search(args) => search(&settings, args),
        Command::Status => status(&settings).await,
        Command::Index => index(&settings),
    }
}

async fn ask(settings: &Settings, args: &AskArgs) -> anyhow::Result<()> {
    let service = RagService::from_settings(settings);
    let answer = service.answer(&args.question, args.k).await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        println!("{}", answer.answer);
    }
    Ok(())
}

fn search(settings: &Settings, args: &SearchArgs) -> anyhow::Result<()> {
    let service = RagService::from_settings(settings);
    let results = service
        .engine()
        .try_search(&args.question, args.k.unwrap_or(settings.index.top_k))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }
    if results.is_empty() {
        println!("No results.");
    }
    for (rank, r) in results.iter().enumerate() {
        println!("{}. [{:.4}] {}", rank + 1, r.score, r.question);
        println!("   {}", r.answer);
    }
    Ok(())
}

async fn status(settings: &Settings) -> anyhow::Result<()> {
    let service = RagService::from_settings(settings);
    service.initialize();
    println!("{}", serde_json::to_string_pretty(&service.status().await)?);
    Ok(())
}

fn index(settings: &Settings) -> anyhow::Result<()> {
    let options = BuildOptions {
        metric: settings.index.metric,
        batch_size: settings.embedding.batch_size,
        show_progress: true,
    };
    let service = RagService::from_settings_with_options(settings, options);
    let count = service
        .reload()
        .with_context(|| format!("indexing {}", settings.documents.source.display()))?;
    let dim = service.engine().encoder().map(|e| e.dim()).unwrap_or(0);
    println!("Indexed {count} documents (dim {dim}, metric {}).", settings.index.metric);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_wins_unless_blank() {
        assert_eq!(log_directives(2, true, Some("qadb_rag=trace".into())), "qadb_rag=trace");
        assert_eq!(log_directives(0, false, Some("  ".into())), log_directives(0, false, None));
    }

    #[test]
    fn quiet_beats_verbose_and_dependencies_stay_at_warn() {
        let d = log_directives(3, true, None);
        assert!(d.starts_with("warn,"));
        assert!(d.contains("qadb_rag=warn"));
        assert!(!d.contains("trace"));

        let d = log_directives(1, false, None);
        assert!(d.contains("qadb_llm=debug"));
        assert!(d.split(',').all(|part| part == "warn" || part.starts_with("qadb")));
        assert!(log_directives(5, false, None).contains("qadb_core=trace"));
    }
}
