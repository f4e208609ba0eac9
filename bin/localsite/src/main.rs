//! localsite CLI
//!
//! City landing pages, SEO files and idempotent HTML rewrites for a static
//! local-service site.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::{net::IpAddr, path::PathBuf};

use clap::Parser;
use color_eyre::eyre::Result;
use localsite::cmd::{self, rewrite::Task};
use localsite_rewrite::{SectionScope, SectionTarget};

/// Command-line interface for localsite.
#[derive(Parser)]
#[command(
    name = "localsite",
    version,
    about = "Generate and post-process a static local-service site"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "site.toml", global = true)]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Pages a section removal applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum ScopeArg {
    All,
    Home,
    #[value(alias = "city")]
    Cities,
}

impl From<ScopeArg> for SectionScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::All => Self::All,
            ScopeArg::Home => Self::Home,
            ScopeArg::Cities => Self::Cities,
        }
    }
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Generate legal pages, city pages and SEO files
    Build,
    /// Generate city landing pages
    Cities,
    /// Generate legal and support pages
    Legal,
    /// Write sitemap.xml, robots.txt and the IndexNow key file
    Seo,
    /// Inject or refresh JSON-LD structured data
    Schema,
    /// Point lead forms at the lead endpoint
    Forms,
    /// Remove a section by id or by a marker string
    StripSection {
        /// Section element id
        #[arg(long, conflicts_with = "marker", required_unless_present = "marker")]
        id: Option<String>,
        /// Text inside the section or directly before it, e.g. an HTML comment
        #[arg(long)]
        marker: Option<String>,
        /// Pages to apply to
        #[arg(long, value_enum, default_value_t = ScopeArg::All)]
        scope: ScopeArg,
    },
    /// Replace boilerplate on city pages with each city's lede
    Localize,
    /// Add verification tags and disable placeholder analytics
    Finalize,
    /// Append configured questions to the homepage FAQ
    Faq,
    /// Rebuild the FAQ on each city page
    CityFaq,
    /// Add Open Graph and Twitter tags, lazy-load images
    Social,
    /// Rebuild city pages from the homepage
    CloneCities,
    /// Run every standard rewrite in order
    RewriteAll,
    /// Serve the site and accept lead submissions
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: IpAddr,
    },
}

impl Commands {
    fn rewrite_task(&self) -> Option<Task> {
        let task = match self {
            Self::Schema => Task::Schema,
            Self::Forms => Task::Forms,
            Self::StripSection { id, marker, scope } => {
                let target = match (id, marker) {
                    (Some(id), _) => SectionTarget::Id(id.clone()),
                    (None, Some(marker)) => SectionTarget::Marker(marker.clone()),
                    (None, None) => return None,
                };
                Task::StripSection {
                    target,
                    scope: (*scope).into(),
                }
            }
            Self::Localize => Task::Localize,
            Self::Finalize => Task::Finalize,
            Self::Faq => Task::Faq,
            Self::CityFaq => Task::CityFaq,
            Self::Social => Task::Social,
            Self::CloneCities => Task::CloneCities,
            Self::RewriteAll => Task::All,
            Self::Build | Self::Cities | Self::Legal | Self::Seo | Self::Serve { .. } => {
                return None;
            }
        };
        Some(task)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    localsite::init_tracing(cli.verbose);

    if let Some(task) = cli.command.rewrite_task() {
        return cmd::rewrite::run(&cli.config, &cli.root, &task);
    }

    match cli.command {
        Commands::Build => cmd::build::run(&cli.config, &cli.root)?,
        Commands::Cities => cmd::build::cities(&cli.config, &cli.root)?,
        Commands::Legal => cmd::build::legal(&cli.config, &cli.root)?,
        Commands::Seo => cmd::build::seo(&cli.config, &cli.root)?,
        Commands::Serve { port, bind } => {
            cmd::serve::run(&cli.config, &cli.root, bind, port).await?;
        }
        _ => {}
    }

    Ok(())
}
