//! Where resources come from.

use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Report};

use crate::Resource;

/// The provider could not be queried: network, auth, throttling or timeout.
#[derive(Debug, thiserror::Error)]
#[error("{0:#}")]
pub struct FetchError(Report);

impl From<Report> for FetchError {
    fn from(value: Report) -> Self {
        Self(value)
    }
}

impl FetchError {
    pub fn report(&self) -> &Report {
        &self.0
    }
}

/// Lists the resources currently known to a monitored system.
#[async_trait]
pub trait ResourceLister {
    /// Resources in provider order, restricted to `filter` when given.
    async fn list(&self, filter: Option<&NameFilter>) -> Result<Vec<Resource>, FetchError>;
}

/// A set of resource names to check. Matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFilter {
    names: BTreeSet<String>,
}

impl NameFilter {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Result<Self, String> {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if names.contains("") {
            return Err("name filter contains an empty name".to_string());
        }
        if names.is_empty() {
            return Err("name filter must contain at least one name".to_string());
        }
        Ok(Self { names })
    }

    /// Parse names separated by `,` or `;`, e.g. `"app, api;web"`.
    pub fn parse(s: &str) -> Result<Self, String> {
        Self::new(s.split(&[',', ';'][..]).map(str::trim))
    }

    pub fn matches(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Keep matching resources, in their original order.
    pub fn apply(&self, resources: Vec<Resource>) -> Vec<Resource> {
        resources
            .into_iter()
            .filter(|r| self.matches(&r.identifier))
            .collect()
    }
}

impl FromStr for NameFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A lister over a fixed snapshot, or one that always fails.
#[derive(Debug, Clone, Default)]
pub struct StaticLister {
    resources: Vec<Resource>,
    failure: Option<String>,
}

impl StaticLister {
    pub fn new(resources: impl IntoIterator<Item = Resource>) -> Self {
        Self {
            resources: resources.into_iter().collect(),
            failure: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            resources: Vec::new(),
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl ResourceLister for StaticLister {
    async fn list(&self, filter: Option<&NameFilter>) -> Result<Vec<Resource>, FetchError> {
        if let Some(msg) = &self.failure {
            return Err(eyre!("{}", msg).into());
        }

        let resources = self.resources.clone();
        Ok(match filter {
            Some(filter) => filter.apply(resources),
            None => resources,
        })
    }
}
