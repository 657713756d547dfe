use std::fs;
use std::path::{Path, PathBuf};

use super::merge::{apply_env_overrides, merge_layers};
use super::{Config, ConfigError, ConfigLayer};

pub fn config_path() -> PathBuf {
    crate::paths::config_dir().join("config.toml")
}

pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join("lucky-sha.toml")
}

pub fn load_user_config() -> Result<Option<ConfigLayer>, ConfigError> {
    read_layer(&config_path())
}

pub fn load_project_config(dir: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    read_layer(&project_config_path(dir))
}

fn read_layer(path: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_owned(),
        source,
    })?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
}

/// Load defaults, user file, `./lucky-sha.toml` and environment, in that order.
pub fn load() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().ok();
    load_for_dir(cwd.as_deref())
}

pub fn load_for_dir(project_dir: Option<&Path>) -> Result<Config, ConfigError> {
    let user = load_user_config()?;
    let project = match project_dir {
        Some(dir) => load_project_config(dir)?,
        None => None,
    };
    let mut config = merge_layers(user, project);
    apply_env_overrides(&mut config);
    Ok(config)
}

pub fn write_config(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
            path: dir.to_owned(),
            source,
        })?;
    }
    let contents = toml::to_string_pretty(cfg)?;
    atomic_write(path, contents.as_bytes())
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    let write_error = |source: std::io::Error| ConfigError::Write {
        path: path.to_owned(),
        source,
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let temp = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
    fs::write(temp.path(), data).map_err(write_error)?;
    temp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::{LogFormat, LogRotation, SourceKind};

    #[test]
    fn config_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.search.workers = 8;
        cfg.search.compact_every = 1;
        cfg.replicas.source = SourceKind::Fresh;
        cfg.replicas.branch = Some("trunk".into());
        cfg.output.result_path = PathBuf::from("/tmp/out.json");
        cfg.logging.stdout_format = LogFormat::Json;
        cfg.logging.file.enabled = true;
        cfg.logging.file.rotation = LogRotation::Hourly;

        write_config(&path, &cfg).expect("write config");
        let contents = fs::read_to_string(&path).expect("read config");
        let loaded: Config = toml::from_str(&contents).expect("parse config");

        assert_eq!(loaded.search.workers, 8);
        assert_eq!(loaded.search.compact_every, 1);
        assert_eq!(loaded.replicas.source, SourceKind::Fresh);
        assert_eq!(loaded.replicas.branch.as_deref(), Some("trunk"));
        assert_eq!(loaded.output.result_path, PathBuf::from("/tmp/out.json"));
        assert!(matches!(loaded.logging.stdout_format, LogFormat::Json));
        assert!(loaded.logging.file.enabled);
        assert!(matches!(loaded.logging.file.rotation, LogRotation::Hourly));
    }

    #[test]
    fn project_layer_is_partial() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            project_config_path(dir.path()),
            "[search]\nworkers = 4\n\n[replicas]\nsource = \"in_place\"\n",
        )
        .expect("write layer");

        let layer = load_project_config(dir.path())
            .expect("parse")
            .expect("present");
        assert_eq!(layer.search.workers, Some(4));
        assert_eq!(layer.search.log_every, None);
        assert_eq!(layer.replicas.source, Some(SourceKind::InPlace));
    }

    #[test]
    fn missing_project_layer_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_project_config(dir.path()).expect("ok").is_none());
    }

    #[test]
    fn malformed_layer_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = project_config_path(dir.path());
        fs::write(&path, "[search\nworkers = ").expect("write");
        let err = load_project_config(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("lucky-sha.toml"), "{err}");
    }
}
