//! `nits.toml` configuration.
//!
//! Every field has a default, and a missing default-location file is
//! the same as an empty one. Command-line flags are applied on top in
//! `main`.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use nits_tutor::BktParams;
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "nits.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub estimator: EstimatorConfig,
    pub session: SessionConfig,
}

/// Which skill estimator to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EstimatorKind {
    /// The external `trainhmm` binary.
    #[default]
    Trainhmm,
    /// The built-in BKT fitter.
    InProcess,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EstimatorConfig {
    pub kind: EstimatorKind,
    /// Explicit `trainhmm` binary; searched for when absent.
    pub trainhmm: Option<PathBuf>,
    pub timeout_secs: u64,
    /// EM iterations for the in-process estimator.
    pub iterations: usize,
    pub params: BktParams,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig {
            kind: EstimatorKind::default(),
            trainhmm: None,
            timeout_secs: 30,
            iterations: nits_tutor::estimator::DEFAULT_ITERATIONS,
            params: BktParams::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Persisted answer history. `~/` is expanded.
    pub data_file: Option<PathBuf>,
    /// Seeds tie-breaks and sub-question picks.
    pub seed: Option<u64>,
}

impl Config {
    /// Reads `explicit`, or `~/.config/nits/nits.toml` when it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_path().filter(|p| p.is_file()) {
                Some(path) => path,
                None => return Ok(Config::default()),
            },
        };
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Config::parse(&text).map_err(|message| ConfigError::Parse {
            path: path.clone(),
            message,
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Config, String> {
        let config: Config = toml::from_str(text).map_err(|e| e.to_string())?;
        config
            .estimator
            .params
            .validate()
            .map_err(|e| e.to_string())?;
        Ok(config)
    }

    /// Where the answer history lives.
    pub fn data_path(&self) -> Option<PathBuf> {
        match &self.session.data_file {
            Some(path) => Some(expand_home(path)),
            None => nits_storage::JsonFileStore::default_path(),
        }
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("nits").join(CONFIG_FILE_NAME))
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_file_parses() {
        let config = Config::parse(
            r#"
[estimator]
kind = "in-process"
trainhmm = "/opt/bkt/trainhmm"
timeout_secs = 5
iterations = 10

[estimator.params]
p_init = 0.2
p_slip = 0.1

[session]
data_file = "/tmp/nits.json"
seed = 42
"#,
        )
        .unwrap();
        assert_eq!(config.estimator.kind, EstimatorKind::InProcess);
        assert_eq!(config.estimator.trainhmm, Some(PathBuf::from("/opt/bkt/trainhmm")));
        assert_eq!(config.estimator.timeout_secs, 5);
        assert_eq!(config.estimator.iterations, 10);
        assert_eq!(config.estimator.params.p_init, 0.2);
        assert_eq!(config.estimator.params.p_learn, 0.2);
        assert_eq!(config.estimator.params.p_slip, 0.1);
        assert_eq!(config.session.seed, Some(42));
        assert_eq!(config.data_path(), Some(PathBuf::from("/tmp/nits.json")));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.estimator.kind, EstimatorKind::Trainhmm);
        assert_eq!(config.estimator.timeout_secs, 30);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("[estimator]\nkinds = \"trainhmm\"\n").is_err());
    }

    #[test]
    fn out_of_range_params_are_rejected() {
        let err = Config::parse("[estimator.params]\np_guess = 2.0\n").unwrap_err();
        assert!(err.contains("p_guess"), "{err}");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn home_is_expanded() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/.nits_data")), home.join(".nits_data"));
        }
        assert_eq!(expand_home(Path::new("/abs")), PathBuf::from("/abs"));
    }
}
