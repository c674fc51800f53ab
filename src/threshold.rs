//! Multi-severity thresholds over unhealthy member counts.

use std::borrow::Cow;

use crate::{Resource, Status};

/// A severity that a threshold can raise, ordered by priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Critical,
}

/// The level of a whole check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Ok,
    Warning,
    Critical,
}

impl From<Severity> for Level {
    fn from(value: Severity) -> Self {
        match value {
            Severity::Warning => Self::Warning,
            Severity::Critical => Self::Critical,
        }
    }
}

impl From<Level> for Status {
    fn from(value: Level) -> Self {
        match value {
            Level::Ok => Self::Ok,
            Level::Warning => Self::Warning,
            Level::Critical => Self::Critical,
        }
    }
}

/// Raise `severity` when a resource has at least `min_count` unhealthy members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeverityThreshold {
    pub severity: Severity,
    pub min_count: u32,
}

impl SeverityThreshold {
    pub fn warning(min_count: u32) -> Self {
        Self {
            severity: Severity::Warning,
            min_count,
        }
    }

    pub fn critical(min_count: u32) -> Self {
        Self {
            severity: Severity::Critical,
            min_count,
        }
    }

    /// A threshold of 0 still needs one unhealthy member.
    pub fn is_met_by(&self, unhealthy: usize) -> bool {
        unhealthy > 0 && unhealthy >= self.min_count as usize
    }
}

/// Outcome of evaluating every resource of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub level: Level,
    pub summary: String,
}

impl Verdict {
    pub fn status(&self) -> Status {
        self.level.into()
    }
}

/// Computes the worst triggered severity across resources.
///
/// Each resource is checked against the configured severities from highest to
/// lowest priority and contributes at most one message fragment, for the first
/// severity it meets. The run level is the maximum over all resources.
#[derive(Debug, Clone)]
pub struct ThresholdEvaluator {
    resource_noun: Cow<'static, str>,
}

impl Default for ThresholdEvaluator {
    fn default() -> Self {
        Self::new("resources")
    }
}

impl ThresholdEvaluator {
    /// `resource_noun` is the plural used in the summary, e.g. "load balancers".
    pub fn new(resource_noun: impl Into<Cow<'static, str>>) -> Self {
        Self {
            resource_noun: resource_noun.into(),
        }
    }

    pub fn evaluate(&self, resources: &[Resource], thresholds: &[SeverityThreshold]) -> Verdict {
        let mut ordered = thresholds.to_vec();
        // highest severity first, lowest count first within a severity
        ordered.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(a.min_count.cmp(&b.min_count))
        });

        let mut summary = match resources {
            [only] => only.identifier.clone(),
            _ => format!("{} {} total", resources.len(), self.resource_noun),
        };
        let name_each = resources.len() != 1;

        let mut level = Level::Ok;
        for resource in resources {
            let unhealthy = resource.unhealthy_count();
            let Some(hit) = ordered.iter().find(|t| t.is_met_by(unhealthy)) else {
                continue;
            };

            level = level.max(hit.severity.into());
            summary.push_str("; ");
            if name_each {
                summary.push_str(&resource.identifier);
                summary.push_str(": ");
            }
            summary.push_str(&format!(
                "{} unhealthy instances. (expected lower than {})",
                unhealthy, hit.min_count
            ));
        }

        Verdict { level, summary }
    }
}

/// Evaluate with the default "resources" wording.
pub fn evaluate(resources: &[Resource], thresholds: &[SeverityThreshold]) -> Verdict {
    ThresholdEvaluator::default().evaluate(resources, thresholds)
}
