//! Check unhealthy instances of Classic Elastic Load Balancers.
//!
//! ```plain
//! # Warning if any load balancer's attached instance is OutOfService.
//! check-elb-unhealthy-instances --warning-over 1
//!
//! # Warning if any of "app" load balancer's attached instance is OutOfService,
//! # critical if 2 or more instances are OutOfService.
//! check-elb-unhealthy-instances --elb-names app --warning-over 1 --critical-over 2
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use cloud_check_plugins::{
    parse_config, run_check, CheckConfig, CheckError, CheckOutput, CheckRun, ElbLister,
    NameFilter, Overrides, Status, ThresholdEvaluator,
};
use tracing_subscriber::EnvFilter;

const PLUGIN: &str = "check-elb-unhealthy-instances";

/// Check unhealthy instances through the ELB API
#[derive(Debug, Parser)]
#[command(name = PLUGIN, version)]
struct Args {
    /// AWS access key ID
    #[arg(short = 'k', long, value_name = "ID")]
    access_key_id: Option<String>,

    /// AWS secret access key
    #[arg(short = 's', long, value_name = "KEY")]
    secret_access_key: Option<String>,

    /// AWS region
    #[arg(short = 'r', long, value_name = "REGION")]
    region: Option<String>,

    /// Load balancer names to check, separated by , or ;. If not specified, check all load balancers
    #[arg(short = 'l', long, value_name = "NAMES")]
    elb_names: Option<NameFilter>,

    /// Trigger a warning if unhealthy instances is specified count or over
    #[arg(long, value_name = "COUNT")]
    warning_over: Option<u32>,

    /// Trigger a critical if unhealthy instances is specified count or over
    #[arg(long, value_name = "COUNT")]
    critical_over: Option<u32>,

    /// Give up on the ELB API after this long, e.g. 10s
    #[arg(long, value_name = "DURATION", value_parser = parse_timeout)]
    timeout: Option<Duration>,

    /// Status to report when no load balancer matches. Default: ok
    #[arg(long, value_name = "STATUS")]
    no_resources: Option<Status>,

    /// TOML file with defaults for any of the above
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log what is fetched to stderr
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            region: self.region.clone(),
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            elb_names: self.elb_names.clone(),
            warning_over: self.warning_over,
            critical_over: self.critical_over,
            timeout: self.timeout,
            no_resources: self.no_resources,
        }
    }

    fn load_config(&self) -> Result<CheckConfig, CheckError> {
        let file = self
            .config
            .as_ref()
            .map(parse_config)
            .transpose()
            .map_err(|e| CheckError::Configuration(format!("{:#}", e)))?;
        CheckConfig::build(file, self.overrides())
    }
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    duration_str::parse(s).map_err(|e| e.to_string())
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,cloud_check_plugins=debug,check_elb_unhealthy_instances=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn check_load_balancers(config: &CheckConfig) -> Result<CheckRun, CheckError> {
    let lister = ElbLister::new(&config.aws).await?;
    run_check(&lister, config, &ThresholdEvaluator::new("load balancers")).await
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let rendered = err.to_string();
            let first = rendered.lines().next().unwrap_or("invalid arguments");
            CheckOutput::unknown(PLUGIN, first).emit()
        }
    };
    init_tracing(args.verbose);
    if let Err(err) = color_eyre::install() {
        CheckOutput::unknown(PLUGIN, &format!("{:#}", err)).emit()
    }

    let config = match args.load_config() {
        Ok(config) => config,
        Err(err) => CheckOutput::from_error(PLUGIN, &err).emit(),
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => CheckOutput::unknown(PLUGIN, &format!("could not start runtime: {}", err)).emit(),
    };
    let result = rt.block_on(check_load_balancers(&config));

    CheckOutput::from_result(PLUGIN, result, &config).emit()
}
