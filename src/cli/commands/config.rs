//! `lucky-sha config` - show the merged configuration.

use super::super::ConfigArgs;
use crate::Result;
use crate::config::{Config, ConfigError, config_path, write_config};

pub(crate) fn handle(config: &Config, args: &ConfigArgs) -> Result<()> {
    if args.init {
        let path = config_path();
        if path.exists() {
            println!("config already exists at {}", path.display());
        } else {
            write_config(&path, &Config::default())?;
            println!("wrote default config to {}", path.display());
        }
        return Ok(());
    }

    let rendered = toml::to_string_pretty(config).map_err(ConfigError::from)?;
    print!("{rendered}");
    Ok(())
}
