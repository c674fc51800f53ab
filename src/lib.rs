//! Check plugins for cloud resources.
//!
//! A plugin lists the resources of a provider through a [`ResourceLister`],
//! evaluates their unhealthy member counts against severity thresholds with a
//! [`ThresholdEvaluator`], and reports one line plus an exit [`Status`].

pub mod check;
pub mod config_file;
pub mod elb;
pub mod lister;
pub mod resource;
pub mod status;
pub mod threshold;

pub use check::{run_check, CheckConfig, CheckError, CheckOutput, CheckRun, Overrides};
pub use config_file::{parse_config, parse_config_str};
pub use elb::{AwsSettings, ElbLister, StaticCredentials};
pub use lister::{FetchError, NameFilter, ResourceLister, StaticLister};
pub use resource::{Member, MemberState, Resource};
pub use status::Status;
pub use threshold::{evaluate, Level, Severity, SeverityThreshold, ThresholdEvaluator, Verdict};
