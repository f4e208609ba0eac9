//! Serve command: static site plus the lead endpoint.

use std::{
    net::{IpAddr, SocketAddr},
    path::Path,
};

use color_eyre::eyre::{Result, WrapErr};

use super::{load_config, site_root};
use crate::{
    lead::{API_KEY_ENV, LeadSettings, LeadState, ResendMailer},
    server,
};

/// Run the serve command.
pub async fn run(config_path: &Path, root: &Path, bind: IpAddr, port: u16) -> Result<()> {
    let config = load_config(config_path)?;
    let site_root = site_root(&config, root);

    let settings = LeadSettings::from_config(&config);
    if settings.to.is_none() || settings.from.is_none() {
        tracing::warn!("lead recipient or sender not configured, /api/lead will answer 500");
    }
    if std::env::var(API_KEY_ENV).is_err() {
        tracing::warn!(var = API_KEY_ENV, "e-mail API key not set, /api/lead will answer 500");
    }

    let mailer = ResendMailer::from_env().wrap_err("Failed to create e-mail client")?;
    let router = server::create_router(&site_root, LeadState::new(mailer, settings));
    let addr = SocketAddr::new(bind, port);

    println!();
    println!("  Serving {} at http://{addr}", site_root.display());
    println!("  Leads:   POST http://{addr}{}", server::LEAD_PATH);
    println!();

    server::serve(addr, router).await.wrap_err("Server failed")?;
    Ok(())
}
