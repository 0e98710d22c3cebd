//! Config command handler

use shiori_api::ApiClient;
use shiori_core::config::AppConfig;

use crate::cli::Context;

pub fn cmd_config(
    ctx: &mut Context,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
) -> anyhow::Result<()> {
    let changed = base_url.is_some() || timeout_secs.is_some();
    if let Some(url) = base_url {
        ApiClient::new(&url, None)?;
        ctx.config.api.base_url = url;
    }
    if let Some(secs) = timeout_secs {
        anyhow::ensure!(secs > 0, "timeout must be at least one second");
        ctx.config.api.timeout_secs = secs;
    }
    if changed {
        ctx.config.save()?;
        println!("✓ Saved {}", AppConfig::config_path().display());
    }

    println!("base_url     {}", ctx.config.api.base_url);
    println!("timeout_secs {}", ctx.config.api.timeout_secs);
    println!("log.filter   {}", ctx.config.log.filter);
    Ok(())
}
