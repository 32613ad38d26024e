use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use magicboot::config::{Config, RootResolver};
use magicboot::demo::TraceModule;
use magicboot::files::LocalFiles;
use magicboot::script::PlainParser;
use magicboot::slots::{discover_slots, SlotProvider};
use magicboot::startup::{scan_startup_folders, StartupRunner};

#[derive(Parser)]
#[command(name = "magicboot")]
#[command(about = "Bootstrap tooling for a plugin-driven scripting runtime", long_about = None)]
struct Cli {
    /// Config file path (defaults to ~/.magicboot/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List startup folders found under the configured root
    Scan,
    /// List slots registered by the built-in demo providers
    Slots,
    /// Execute startup scripts with the tracing evaluator
    Run,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    let resolver = RootResolver::new(&config);

    match cli.command {
        Some(Commands::Version) | None => {
            println!("magicboot {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Scan) => {
            let found = scan_startup_folders(&LocalFiles::new(), &resolver)?;
            if found.is_empty() {
                println!("No startup folders under {}", resolver.root().display());
            }
            for folder in found {
                println!("layer {}  {}", folder.layer, folder.path.display());
            }
        }
        Some(Commands::Slots) => {
            let providers: Vec<&dyn SlotProvider> = vec![&TraceModule];
            let report = discover_slots(&providers, &config.modules);
            for descriptor in report.registry.descriptors() {
                println!(
                    "{}  ({:?}, provider {})",
                    descriptor.name, descriptor.kind, descriptor.provider
                );
            }
            for skipped in &report.skipped {
                eprintln!("skipped {}: {}", skipped.provider, skipped.reason);
            }
        }
        Some(Commands::Run) => {
            let providers: Vec<&dyn SlotProvider> = vec![&TraceModule];
            let report = discover_slots(&providers, &config.modules);

            let runner = StartupRunner::new(
                LocalFiles::new(),
                Arc::new(PlainParser::new()),
                Arc::new(report.registry),
            );
            let summary = runner.run(&resolver).await;
            println!(
                "{} scripts executed, {} failed",
                summary.executed,
                summary.failures.len()
            );
            for failure in &summary.failures {
                eprintln!("failed {}: {}", failure.path.display(), failure.error);
            }
        }
    }

    Ok(())
}
