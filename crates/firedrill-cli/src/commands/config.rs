//! `config show`.

use anyhow::Result;
use firedrill_config::ResolvedConfig;

/// Print the resolved configuration as TOML. The API key is never printed.
pub(crate) fn show(resolved: &ResolvedConfig) -> Result<()> {
    print!("{}", resolved.to_toml()?);
    Ok(())
}
