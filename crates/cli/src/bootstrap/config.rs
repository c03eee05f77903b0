use ferrous_nftset_domain::{CliOverrides, Config};

/// Load, override and validate the configuration. Runs before logging is up,
/// so failures are only reported through the returned error.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides)?;
    config.validate()?;
    Ok(config)
}
