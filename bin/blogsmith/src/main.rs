//! blogsmith CLI
//!
//! Blog static site generator with a live preview server.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use blogsmith::{cmd, server::DEFAULT_ADDR};
use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for blogsmith.
#[derive(Parser)]
#[command(name = "blogsmith", version, about = "A blog static site generator")]
struct Cli {
    /// Site source directory
    #[arg(short, long, default_value = ".", global = true)]
    src: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the site once
    Build {
        /// Output directory
        #[arg(short, long, default_value = "public")]
        dest: PathBuf,
        /// Include draft posts
        #[arg(long)]
        drafts: bool,
        /// Override the site URL (e.g., https://example.com/)
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Serve a live preview and rebuild on change
    Serve {
        /// Listen address
        #[arg(short, long, default_value = DEFAULT_ADDR)]
        addr: String,
        /// Build onto disk instead of into memory
        #[arg(short, long)]
        dest: Option<PathBuf>,
        /// Include draft posts
        #[arg(long)]
        drafts: bool,
        /// Override the site URL; defaults to the listen address
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Validate configuration and content without writing
    Check {
        /// Include draft posts
        #[arg(long)]
        drafts: bool,
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
    /// Create a new draft post
    New {
        /// Post title; the file name is derived from it
        title: String,
        /// Tag slug (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
    /// Scaffold a new site
    Init {
        /// Target directory; defaults to --src
        dir: Option<PathBuf>,
    },
    /// List draft posts
    Drafts,
    /// List the bundled code highlight schemes
    Styles,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    blogsmith::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { dest, drafts, base_url } => {
            cmd::build::run(&cli.src, &dest, drafts, base_url.as_deref())?;
        }
        Commands::Serve {
            addr,
            dest,
            drafts,
            base_url,
        } => {
            cmd::serve::run(cmd::serve::ServeArgs {
                src: &cli.src,
                dest: dest.as_deref(),
                addr: &addr,
                drafts,
                base_url: base_url.as_deref(),
            })
            .await?;
        }
        Commands::Check { drafts, strict } => {
            cmd::check::run(&cli.src, drafts, strict)?;
        }
        Commands::New { title, tags } => {
            cmd::new::run(&cli.src, &title, &tags)?;
        }
        Commands::Init { dir } => {
            cmd::init::run(dir.as_deref().unwrap_or(&cli.src))?;
        }
        Commands::Drafts => {
            cmd::drafts::run(&cli.src)?;
        }
        Commands::Styles => {
            cmd::styles::run()?;
        }
    }

    Ok(())
}
