//! A TOML config to specify AWS access and check thresholds.
//!
//! Format of config file:
//! ```rust
//! let cfg = "
//! [aws]
//! region = \"ap-northeast-1\"
//!
//! [check]
//! elb_names = [\"app\", \"api\"]
//! warning_over = 1
//! critical_over = 2
//! timeout = \"15s\"
//! no_resources = \"unknown\"
//! ";
//! cloud_check_plugins::parse_config_str(cfg).unwrap();
//! ```
//!
//! Every field is optional; command line flags override the file.

use std::path::Path;

use chrono::Duration;
use color_eyre::{eyre::Context, Report};
use serde::Deserialize;

use crate::Status;

pub fn parse_config(config_file: impl AsRef<Path>) -> Result<Config, Report> {
    let path = config_file.as_ref();
    let cfg = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("could not read config file {}", path.display()))?;
    parse_config_str(&cfg)
}

pub fn parse_config_str(cfg: &str) -> Result<Config, Report> {
    toml::from_str::<Config>(cfg)
        .wrap_err("TOML file did not match deserialization struct, or was malformed")
}

// rust toml uses serde, so we define structs to deserialize into.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub aws: Aws,
    #[serde(default)]
    pub check: Check,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Aws {
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Check {
    pub elb_names: Option<Vec<String>>,
    pub warning_over: Option<u32>,
    pub critical_over: Option<u32>,
    #[serde(
        default,
        deserialize_with = "duration_str::deserialize_option_duration_chrono"
    )]
    pub timeout: Option<Duration>,
    pub no_resources: Option<Status>,
}
