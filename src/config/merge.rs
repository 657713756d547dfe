use std::path::PathBuf;

use super::{Config, ConfigLayer};

pub fn merge_layers(user: Option<ConfigLayer>, project: Option<ConfigLayer>) -> Config {
    let mut config = Config::default();
    if let Some(layer) = user {
        layer.apply_to(&mut config);
    }
    if let Some(layer) = project {
        layer.apply_to(&mut config);
    }
    config
}

pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply `LUCKY_SHA_*` overrides read through `lookup`.
pub fn apply_overrides_from<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let value = |key: &str| {
        lookup(key)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
    };

    if let Some(raw) = value("LUCKY_SHA_WORKERS") {
        match raw.parse::<usize>() {
            Ok(workers) if workers > 0 => config.search.workers = workers,
            Ok(_) => tracing::warn!("LUCKY_SHA_WORKERS must be at least 1, ignoring"),
            Err(err) => tracing::warn!("invalid LUCKY_SHA_WORKERS, ignoring: {err}"),
        }
    }

    if let Some(raw) = value("LUCKY_SHA_LOG_EVERY") {
        match raw.parse::<u64>() {
            Ok(every) => config.search.log_every = every,
            Err(err) => tracing::warn!("invalid LUCKY_SHA_LOG_EVERY, ignoring: {err}"),
        }
    }

    if let Some(remote) = value("LUCKY_SHA_REMOTE") {
        config.replicas.remote = Some(remote);
    }

    if let Some(branch) = value("LUCKY_SHA_BRANCH") {
        config.replicas.branch = Some(branch);
    }

    if let Some(path) = value("LUCKY_SHA_RESULT_PATH") {
        config.output.result_path = PathBuf::from(path);
    }

    if let Some(dir) = value("LUCKY_SHA_LOG_DIR") {
        config.logging.file.enabled = true;
        config.logging.file.dir = Some(PathBuf::from(dir));
    }
}
