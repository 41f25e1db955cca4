use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use directories::BaseDirs;

use crate::report::DEFAULT_REPORT_NAME;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(&default_config_path())
    }

    /// Defaults, then the rc file at `config_path` if it exists, then
    /// environment variables.
    pub fn load_from(config_path: &Path) -> Self {
        let mut map = default_map();

        if config_path.exists() {
            if let Ok(file) = fs::File::open(config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(|l| l.ok()) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path: config_path.to_path_buf() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).filter(|v| !v.is_empty()).cloned()
    }

    /// Like [`Config::get`], for keys that always have a default. Fails only
    /// when the rc file or environment blanks the key out.
    pub fn require(&self, key: &str) -> anyhow::Result<String> {
        self.get(key).ok_or_else(|| {
            anyhow!("{} is empty; set it in {} or the environment", key, self.config_path.display())
        })
    }

    pub fn require_usize(&self, key: &str) -> anyhow::Result<usize> {
        let raw = self.require(key)?;
        raw.parse::<usize>()
            .with_context(|| format!("{}: expected a non-negative integer, got {:?}", key, raw))
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).map(PathBuf::from)
    }

    pub fn host_dir(&self) -> PathBuf {
        self.get_path("OPERAND_HOST_DIR").unwrap_or_else(default_host_dir)
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "OPERAND_HOST_DIR",
        "OPERAND_COMPUTE_CMD",
        "OPERAND_PATCH_KEY",
        "OPERAND_GUARD_ARG",
        "OPERAND_VALUE_ARG",
        "OPERAND_REPORT_NAME",
        "OPERAND_RESULT_LENGTH",
        "OPERAND_RESULTS_FILE",
        "OPERAND_MODE",
    ];

    KEYS.contains(&k)
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("footprint_operand").join(".operandrc")
}

fn default_host_dir() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.data_dir().join("footprint_operand").join("samples"))
        .unwrap_or_else(|| env::temp_dir().join("footprint_operand"))
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    m.insert("OPERAND_PATCH_KEY".into(), crate::engine::patch::DEFAULT_PATCH_KEY.into());
    m.insert("OPERAND_GUARD_ARG".into(), "hx".into());
    m.insert("OPERAND_VALUE_ARG".into(), "hx".into());
    m.insert("OPERAND_REPORT_NAME".into(), DEFAULT_REPORT_NAME.into());
    m.insert("OPERAND_RESULT_LENGTH".into(), "4".into());
    m.insert("OPERAND_MODE".into(), "operand".into());

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rc_file_overrides_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            "# local setup\nOPERAND_PATCH_KEY = BAR_SURFACE\nOPERAND_COMPUTE_CMD=./compute.sh\n",
        )
        .unwrap();
        let cfg = Config::load_from(file.path());
        if env::var("OPERAND_PATCH_KEY").is_err() {
            assert_eq!(cfg.get("OPERAND_PATCH_KEY").as_deref(), Some("BAR_SURFACE"));
        }
        if env::var("OPERAND_REPORT_NAME").is_err() {
            assert_eq!(cfg.get("OPERAND_REPORT_NAME").as_deref(), Some(DEFAULT_REPORT_NAME));
        }
    }

    #[test]
    fn every_defaulted_key_is_available() {
        let cfg = Config::load_from(Path::new("/no/such/.operandrc"));
        for key in default_map().keys() {
            if env::var(key).is_err() {
                assert!(cfg.require(key).is_ok(), "{} has no default", key);
            }
        }
        if env::var("OPERAND_GUARD_ARG").is_err() {
            assert_eq!(cfg.require("OPERAND_GUARD_ARG").unwrap(), "hx");
        }
        if env::var("OPERAND_MODE").is_err() {
            assert_eq!(cfg.require("OPERAND_MODE").unwrap(), "operand");
        }
    }

    #[test]
    fn blanked_or_malformed_values_are_errors() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "OPERAND_REPORT_NAME=\nOPERAND_RESULT_LENGTH=four\n").unwrap();
        let cfg = Config::load_from(file.path());
        if env::var("OPERAND_REPORT_NAME").is_err() {
            let err = cfg.require("OPERAND_REPORT_NAME").unwrap_err();
            assert!(err.to_string().contains("OPERAND_REPORT_NAME"));
        }
        if env::var("OPERAND_RESULT_LENGTH").is_err() {
            assert!(cfg.require_usize("OPERAND_RESULT_LENGTH").is_err());
        }
    }

    #[test]
    fn missing_rc_file_uses_defaults() {
        let cfg = Config::load_from(Path::new("/no/such/.operandrc"));
        if env::var("OPERAND_RESULT_LENGTH").is_err() {
            assert_eq!(cfg.require_usize("OPERAND_RESULT_LENGTH").unwrap(), 4);
        }
    }
}
