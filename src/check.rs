//! A single run of a check plugin: configure, list, evaluate, report.

use std::time::Duration;

use tracing::{info, warn};

use crate::config_file::Config;
use crate::{
    AwsSettings, FetchError, NameFilter, ResourceLister, SeverityThreshold, StaticCredentials,
    Status, ThresholdEvaluator, Verdict,
};

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// Bad or incomplete parameters, detected before anything is fetched.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("could not fetch resources: {0}")]
    Fetch(#[from] FetchError),
}

/// Values given on the command line. Each one that is set wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub elb_names: Option<NameFilter>,
    pub warning_over: Option<u32>,
    pub critical_over: Option<u32>,
    pub timeout: Option<Duration>,
    pub no_resources: Option<Status>,
}

/// Everything a run needs, validated once at startup and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    pub aws: AwsSettings,
    pub names: Option<NameFilter>,
    /// an absent severity is never raised
    pub thresholds: Vec<SeverityThreshold>,
    /// status to report when no resource is left to check
    pub no_resources: Status,
}

impl CheckConfig {
    pub fn build(file: Option<Config>, overrides: Overrides) -> Result<Self, CheckError> {
        let Config { aws, check } = file.unwrap_or_default();

        let access_key_id = overrides.access_key_id.or(aws.access_key_id);
        let secret_access_key = overrides.secret_access_key.or(aws.secret_access_key);
        let credentials = match (access_key_id, secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                access_key_id,
                secret_access_key,
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(CheckError::Configuration(
                    "access key id given without a secret access key".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(CheckError::Configuration(
                    "secret access key given without an access key id".to_string(),
                ))
            }
        };

        let timeout = match overrides.timeout {
            Some(timeout) => Some(timeout),
            None => check
                .timeout
                .map(|t| t.to_std())
                .transpose()
                .map_err(|_| CheckError::Configuration("timeout must not be negative".into()))?,
        };
        if timeout == Some(Duration::ZERO) {
            return Err(CheckError::Configuration(
                "timeout must be longer than zero".to_string(),
            ));
        }

        let names = match overrides.elb_names {
            Some(names) => Some(names),
            None => check
                .elb_names
                .map(|names| NameFilter::new(names))
                .transpose()
                .map_err(CheckError::Configuration)?,
        };

        let mut thresholds = Vec::new();
        if let Some(count) = overrides.critical_over.or(check.critical_over) {
            thresholds.push(SeverityThreshold::critical(count));
        }
        if let Some(count) = overrides.warning_over.or(check.warning_over) {
            thresholds.push(SeverityThreshold::warning(count));
        }

        Ok(Self {
            aws: AwsSettings {
                region: overrides.region.or(aws.region),
                credentials,
                timeout,
            },
            names,
            thresholds,
            no_resources: overrides
                .no_resources
                .or(check.no_resources)
                .unwrap_or(Status::Ok),
        })
    }
}

/// The evaluated state of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRun {
    pub verdict: Verdict,
    pub resource_count: usize,
}

/// Fetch the resources once and evaluate them. A failed fetch never reaches the evaluator.
pub async fn run_check<L: ResourceLister + ?Sized>(
    lister: &L,
    config: &CheckConfig,
    evaluator: &ThresholdEvaluator,
) -> Result<CheckRun, CheckError> {
    let resources = lister.list(config.names.as_ref()).await?;
    if resources.is_empty() {
        warn!(filter = ?config.names, "no resources to check");
    }

    let verdict = evaluator.evaluate(&resources, &config.thresholds);
    info!(
        level = ?verdict.level,
        resources = resources.len(),
        "evaluated thresholds"
    );
    Ok(CheckRun {
        verdict,
        resource_count: resources.len(),
    })
}

/// The single line and exit status handed back to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutput {
    pub status: Status,
    pub line: String,
}

impl CheckOutput {
    pub fn from_run(plugin: &str, run: &CheckRun, config: &CheckConfig) -> Self {
        let status = if run.resource_count == 0 {
            config.no_resources
        } else {
            run.verdict.status()
        };
        Self::new(plugin, status, &run.verdict.summary)
    }

    pub fn from_error(plugin: &str, err: &CheckError) -> Self {
        Self::unknown(plugin, &err.to_string())
    }

    pub fn unknown(plugin: &str, message: &str) -> Self {
        Self::new(plugin, Status::Unknown, message)
    }

    pub fn from_result(
        plugin: &str,
        result: Result<CheckRun, CheckError>,
        config: &CheckConfig,
    ) -> Self {
        match result {
            Ok(run) => Self::from_run(plugin, &run, config),
            Err(err) => Self::from_error(plugin, &err),
        }
    }

    fn new(plugin: &str, status: Status, message: &str) -> Self {
        let message = message.replace(&['\r', '\n'][..], " ");
        Self {
            status,
            line: format!("[{}] {}: {}", plugin, status, message),
        }
    }

    pub fn emit(self) -> ! {
        println!("{}", self.line);
        self.status.exit()
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::{CheckConfig, CheckError, CheckOutput, CheckRun, Overrides};
    use crate::config_file::parse_config_str;
    use crate::{Level, NameFilter, SeverityThreshold, Status, Verdict};

    #[test]
    fn defaults_have_no_thresholds() {
        let config = CheckConfig::build(None, Overrides::default()).unwrap();
        assert!(config.thresholds.is_empty());
        assert!(config.names.is_none());
        assert!(config.aws.credentials.is_none());
        assert_eq!(config.no_resources, Status::Ok);
    }

    #[test]
    fn flags_override_file() {
        let file = parse_config_str(
            r#"
            [aws]
            region = "eu-west-1"
            [check]
            elb_names = ["app"]
            warning_over = 3
            critical_over = 5
            timeout = "1m"
            "#,
        )
        .unwrap();
        let config = CheckConfig::build(
            Some(file),
            Overrides {
                region: Some("us-west-2".to_string()),
                warning_over: Some(1),
                elb_names: Some(NameFilter::parse("api").unwrap()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.aws.region.as_deref(), Some("us-west-2"));
        assert_eq!(config.aws.timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.names, Some(NameFilter::parse("api").unwrap()));
        assert_eq!(
            config.thresholds,
            vec![SeverityThreshold::critical(5), SeverityThreshold::warning(1)]
        );
    }

    #[test]
    fn half_credentials_are_a_configuration_error() {
        let err = CheckConfig::build(
            None,
            Overrides {
                access_key_id: Some("AKIDEXAMPLE".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, CheckError::Configuration(_)));

        let err = CheckConfig::build(
            None,
            Overrides {
                secret_access_key: Some("secret".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, CheckError::Configuration(_)));
    }

    #[test]
    fn empty_name_list_is_a_configuration_error() {
        let file = parse_config_str("[check]\nelb_names = []\n").unwrap();
        let err = CheckConfig::build(Some(file), Overrides::default()).unwrap_err();
        assert!(matches!(err, CheckError::Configuration(_)));
    }

    #[test]
    fn empty_name_is_a_configuration_error() {
        let file = parse_config_str("[check]\nelb_names = [\"\", \"app\"]\n").unwrap();
        let err = CheckConfig::build(Some(file), Overrides::default()).unwrap_err();
        assert!(matches!(err, CheckError::Configuration(_)));
    }

    #[test]
    fn zero_timeout_is_a_configuration_error() {
        let err = CheckConfig::build(
            None,
            Overrides {
                timeout: Some(Duration::ZERO),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, CheckError::Configuration(_)));
    }

    #[test]
    fn output_line_and_status() {
        let config = CheckConfig::build(None, Overrides::default()).unwrap();
        let run = CheckRun {
            verdict: Verdict {
                level: Level::Warning,
                summary: "app; 1 unhealthy instances. (expected lower than 1)".to_string(),
            },
            resource_count: 1,
        };
        let out = CheckOutput::from_run("check-elb-unhealthy-instances", &run, &config);
        assert_eq!(out.status, Status::Warning);
        assert_eq!(
            out.line,
            "[check-elb-unhealthy-instances] WARNING: app; 1 unhealthy instances. (expected lower than 1)"
        );
    }

    #[test]
    fn empty_run_uses_configured_status() {
        let config = CheckConfig::build(
            None,
            Overrides {
                no_resources: Some(Status::Unknown),
                ..Default::default()
            },
        )
        .unwrap();
        let run = CheckRun {
            verdict: Verdict {
                level: Level::Ok,
                summary: "0 load balancers total".to_string(),
            },
            resource_count: 0,
        };
        let out = CheckOutput::from_run("check", &run, &config);
        assert_eq!(out.status, Status::Unknown);
        assert_eq!(out.line, "[check] UNKNOWN: 0 load balancers total");
    }

    #[test]
    fn errors_are_unknown_on_one_line() {
        let err = CheckError::Configuration("bad\nthing".to_string());
        let out = CheckOutput::from_error("check", &err);
        assert_eq!(out.status, Status::Unknown);
        assert_eq!(out.line, "[check] UNKNOWN: invalid configuration: bad thing");
    }
}
