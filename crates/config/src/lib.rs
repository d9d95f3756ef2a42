//! Layered configuration for stitch.
//!
//! Sources, lowest precedence first:
//! 1. [`Config::default()`]
//! 2. A configuration file (TOML, YAML or JSON, chosen by extension). Without
//!    an explicit path, `config.toml` in the platform config directory is used
//!    if it exists.
//! 3. Environment variables prefixed `STITCH_`, with `__` separating nested
//!    keys (`STITCH_JOBS__CONCURRENCY=8`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "STITCH_";
const ENV_SEPARATOR: &str = "__";
const CONFIG_FILE: &str = "config.toml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory of the content store.
    pub content: PathBuf,
    /// Minify output unless told otherwise.
    pub minify: bool,
    /// Content subtrees whose changes invalidate the cache.
    pub watch: Vec<String>,
    pub cache: CacheConfig,
    pub jobs: JobsConfig,
    pub less: LessConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory backing the cache store.
    pub dir: PathBuf,
    /// Path of the cache root inside the cache store.
    pub root: PathBuf,
    /// Minimum time between two cache purges, in milliseconds.
    pub purge_interval_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Maximum number of cache rebuild jobs running at once.
    pub concurrency: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessConfig {
    /// Path to the `lessc` executable; searched for on `PATH` when unset.
    pub lessc: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content: PathBuf::from("content"),
            minify: false,
            watch: vec!["/libs".to_string(), "/apps".to_string()],
            cache: CacheConfig::default(),
            jobs: JobsConfig::default(),
            less: LessConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("cache"), root: PathBuf::from("var/stitch"), purge_interval_ms: 3000 }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

impl CacheConfig {
    pub fn purge_interval(&self) -> Duration {
        Duration::from_millis(self.purge_interval_ms)
    }
}

impl Config {
    /// `config.toml` in the platform configuration directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "stitch").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load and validate configuration from every source.
    ///
    /// An explicit `file` must exist; the default file is optional.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match file {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::Load(path.to_path_buf()));
                }
                figment = merge_file(figment, path)?;
            },
            None => {
                if let Some(path) = Self::default_path().filter(|p| p.is_file()) {
                    figment = merge_file(figment, &path)?;
                }
            },
        }
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR))
            .extract()
            .or_raise(|| ErrorKind::Invalid("could not extract configuration".to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.jobs.concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("jobs.concurrency must be at least 1".to_string()));
        }
        stitch_storage::validate_path(&self.cache.root).or_raise(|| {
            ErrorKind::Invalid(format!("cache.root is not a valid storage path: {}", self.cache.root.display()))
        })?;
        if let Some(subtree) = self.watch.iter().find(|s| stitch_storage::content_path(s.as_str()).is_none()) {
            exn::bail!(ErrorKind::Invalid(format!("watch entry is not a valid content path: {subtree}")));
        }
        Ok(())
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    tracing::debug!(path = %path.display(), "Loading configuration file");
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::Load(path.to_path_buf())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.cache.purge_interval(), Duration::from_secs(3));
        assert_eq!(config.jobs.concurrency, 4);
        assert_eq!(config.watch, ["/libs", "/apps"]);
    }

    #[test]
    fn test_file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "stitch.toml",
                r#"
                content = "/srv/content"
                minify = true

                [cache]
                root = "tmp/cache"

                [jobs]
                concurrency = 2
                "#,
            )?;
            jail.set_env("STITCH_JOBS__CONCURRENCY", "8");
            jail.set_env("STITCH_LESS__LESSC", "/opt/less/bin/lessc");
            let config = Config::load(Some(Path::new("stitch.toml"))).unwrap();
            assert_eq!(config.content, Path::new("/srv/content"));
            assert!(config.minify);
            assert_eq!(config.cache.root, Path::new("tmp/cache"));
            assert_eq!(config.cache.purge_interval_ms, 3000);
            assert_eq!(config.jobs.concurrency, 8);
            assert_eq!(config.less.lessc.as_deref(), Some(Path::new("/opt/less/bin/lessc")));
            Ok(())
        });
    }

    #[rstest]
    #[case("stitch.yaml", "jobs:\n  concurrency: 3\n")]
    #[case("stitch.json", "{\"jobs\": {\"concurrency\": 3}}")]
    fn test_other_formats(#[case] name: &str, #[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file(name, contents)?;
            let config = Config::load(Some(Path::new(name))).unwrap();
            assert_eq!(config.jobs.concurrency, 3);
            Ok(())
        });
    }

    #[rstest]
    #[case("[jobs]\nconcurrency = 0\n")]
    #[case("[cache]\nroot = \"../escape\"\n")]
    #[case("watch = [\"/\"]\n")]
    #[case("minify = \"sometimes\"\n")]
    fn test_invalid(#[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file("stitch.toml", contents)?;
            let err = Config::load(Some(Path::new("stitch.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }

    #[test]
    fn test_missing_or_unsupported_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert_eq!(*Config::load(Some(&missing)).unwrap_err(), ErrorKind::Load(missing));

        let ini = dir.path().join("stitch.ini");
        std::fs::write(&ini, "jobs=1").unwrap();
        assert_eq!(*Config::load(Some(&ini)).unwrap_err(), ErrorKind::Load(ini));
    }
}
