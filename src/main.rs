use std::error::Error;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use wiki2txt::config::BuildConfig;

#[derive(Parser)]
#[command(name = "wiki2txt", about = "Wiki markup to fixed-width plain text", version)]
struct Cli {
    /// Build configuration file (YAML). Defaults apply if absent.
    #[arg(long, global = true, default_value = "wiki2txt.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Full pipeline: discover, fetch, convert and emit the header.
    Build,
    /// Rebuild the header from cached .wiki files, no network.
    Regen {
        /// Cache directory to read. Overrides the config value.
        #[arg(long)]
        cache: Option<PathBuf>,
        /// Header path to write. Overrides the config value.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Display column width. Overrides the config value.
        #[arg(long)]
        width: Option<usize>,
    },
    /// Fetch (cache-aware) and print one page as plain text.
    Page {
        /// Page title, e.g. "How To Play".
        title: String,
        /// Display column width. Overrides the config value.
        #[arg(long)]
        width: Option<usize>,
    },
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let cfg = BuildConfig::load_or_default(&cli.config)?;

    match cli.command {
        Command::Build => wiki2txt::build_book(&cfg),
        Command::Regen {
            cache,
            output,
            width,
        } => {
            let cache = cache.unwrap_or_else(|| PathBuf::from(&cfg.cache_dir));
            let output = output.unwrap_or_else(|| PathBuf::from(&cfg.output));
            wiki2txt::regenerate_from_cache(&cache, &output, width.unwrap_or(cfg.line_width))
        }
        Command::Page { title, width } => {
            let cfg = BuildConfig {
                line_width: width.unwrap_or(cfg.line_width),
                ..cfg
            };
            let text = wiki2txt::convert_page(&cfg, &title)?;
            println!("{text}");
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
