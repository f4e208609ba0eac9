//! Rewrite commands: idempotent HTML mutations over the built site.

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr, bail};
use localsite_core::Config;
use localsite_rewrite::{
    CityFaqRewriter, CloneRewriter, FaqRewriter, FinalizeRewriter, FormsRewriter,
    LocalizeRewriter, RewriteEngine, Rewriter, SchemaRewriter, SectionScope, SectionTarget,
    SocialRewriter, StripSection, standard_rewriters,
};

use super::{load_config, site_root};

/// Which rewrite to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Schema,
    Forms,
    StripSection {
        target: SectionTarget,
        scope: SectionScope,
    },
    Localize,
    Finalize,
    Faq,
    CityFaq,
    Social,
    CloneCities,
    All,
}

impl Task {
    fn label(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Forms => "forms",
            Self::StripSection { .. } => "strip-section",
            Self::Localize => "localize",
            Self::Finalize => "finalize",
            Self::Faq => "faq",
            Self::CityFaq => "city-faq",
            Self::Social => "social",
            Self::CloneCities => "clone-cities",
            Self::All => "rewrite-all",
        }
    }

    /// Rewriters for this task.
    pub fn rewriters(&self, config: &Config, site_root: &Path) -> Result<Vec<Box<dyn Rewriter>>> {
        let rewriter: Box<dyn Rewriter> = match self {
            Self::Schema => Box::new(SchemaRewriter::new(config.clone())),
            Self::Forms => Box::new(FormsRewriter::new(config.forms.clone())),
            Self::StripSection { target, scope } => {
                tracing::debug!(section = %target, %scope, "stripping sections");
                Box::new(StripSection::new(target.clone(), *scope))
            }
            Self::Localize => Box::new(LocalizeRewriter::new(config)),
            Self::Finalize => Box::new(FinalizeRewriter::new(config.verification.clone())?),
            Self::Faq => Box::new(FaqRewriter::new(config.faq.clone())),
            Self::CityFaq => Box::new(CityFaqRewriter::new(config)),
            Self::Social => Box::new(SocialRewriter::new(config)),
            Self::CloneCities => Box::new(
                CloneRewriter::load(config.clone(), site_root)
                    .wrap_err("Failed to read the homepage")?,
            ),
            Self::All => return Ok(standard_rewriters(config)?),
        };
        Ok(vec![rewriter])
    }
}

/// Run one rewrite task over every page under the site root.
///
/// Pages that fail are reported and skipped; the command fails afterwards
/// if any did.
pub fn run(config_path: &Path, root: &Path, task: &Task) -> Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let site_root = site_root(&config, root);
    tracing::info!(task = task.label(), root = %site_root.display(), "Starting rewrite");

    let rewriters = task.rewriters(&config, &site_root)?;
    let engine = RewriteEngine::new(&config, &site_root);
    let stats = engine
        .run(&rewriters)
        .wrap_err_with(|| format!("{} failed", task.label()))?;
    let duration = start.elapsed();

    println!();
    println!("  {}", task.label());
    println!("  Scanned:  {}", stats.scanned);
    println!("  Changed:  {}", stats.changed);
    println!("  Failed:   {}", stats.failed);
    println!("  Duration: {:.2}s", duration.as_secs_f64());
    println!();

    tracing::info!(?stats, ?duration, "Rewrite completed");

    if stats.failed > 0 {
        bail!("{} page(s) failed during {}", stats.failed, task.label());
    }
    Ok(())
}
