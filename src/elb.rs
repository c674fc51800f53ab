//! Classic Elastic Load Balancers and the health of their registered instances.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_elasticloadbalancing::Client;
use color_eyre::eyre::{bail, eyre, Context, Report};
use tracing::debug;

use crate::{FetchError, Member, NameFilter, Resource, ResourceLister};

/// An access key pair given on the command line or in the config file.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .finish()
    }
}

/// How to reach the AWS API. Unset fields fall back to the SDK's default chains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsSettings {
    pub region: Option<String>,
    pub credentials: Option<StaticCredentials>,
    /// applied twice: once to loading the SDK config (region and credential
    /// lookups), once to the fetch with all its pages and health requests
    pub timeout: Option<Duration>,
}

/// Run `fut`, failing with a `FetchError` naming `what` if `limit` passes first.
async fn within<T>(
    limit: Option<Duration>,
    what: &str,
    fut: impl Future<Output = Result<T, Report>>,
) -> Result<T, FetchError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| eyre!("ElbLister: {} took longer than {:?}", what, limit))?
            .map_err(FetchError::from),
        None => fut.await.map_err(FetchError::from),
    }
}

/// Lists load balancers with the state of every registered instance.
pub struct ElbLister {
    client: Client,
    timeout: Option<Duration>,
}

impl ElbLister {
    pub async fn new(settings: &AwsSettings) -> Result<Self, FetchError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(creds) = &settings.credentials {
            loader = loader.credentials_provider(Credentials::new(
                creds.access_key_id.clone(),
                creds.secret_access_key.clone(),
                None,
                None,
                "check-config",
            ));
        }

        let sdk_config = within(settings.timeout, "loading the AWS configuration", async {
            Ok(loader.load().await)
        })
        .await?;
        Ok(Self::from_client(Client::new(&sdk_config), settings.timeout))
    }

    pub fn from_client(client: Client, timeout: Option<Duration>) -> Self {
        Self { client, timeout }
    }

    async fn load_balancer_names(&self) -> Result<Vec<String>, Report> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let page = self
                .client
                .describe_load_balancers()
                .set_marker(marker.clone())
                .send()
                .await
                .wrap_err("ElbLister: DescribeLoadBalancers request")?;
            names.extend(
                page.load_balancer_descriptions()
                    .iter()
                    .filter_map(|lb| lb.load_balancer_name())
                    .map(str::to_owned),
            );

            match page.next_marker() {
                Some(next) if !next.is_empty() => {
                    if marker.as_deref() == Some(next) {
                        bail!("ElbLister: DescribeLoadBalancers repeated marker {:?}", next);
                    }
                    marker = Some(next.to_owned());
                }
                _ => break,
            }
        }
        Ok(names)
    }

    async fn instance_health(&self, name: String) -> Result<Resource, Report> {
        let health = self
            .client
            .describe_instance_health()
            .load_balancer_name(&name)
            .send()
            .await
            .wrap_err_with(|| format!("ElbLister: DescribeInstanceHealth for {:?}", name))?;
        let members = health
            .instance_states()
            .iter()
            .map(|instance| Member {
                id: instance.instance_id().map(str::to_owned),
                state: instance.state().into(),
            })
            .collect();

        Ok(Resource {
            identifier: name,
            members,
        })
    }

    async fn fetch(&self, filter: Option<&NameFilter>) -> Result<Vec<Resource>, Report> {
        let mut names = self.load_balancer_names().await?;
        debug!(count = names.len(), "listed load balancers");
        if let Some(filter) = filter {
            names.retain(|name| filter.matches(name));
        }

        let mut resources = Vec::with_capacity(names.len());
        for name in names {
            let lb = self.instance_health(name).await?;
            debug!(
                load_balancer = %lb.identifier,
                instances = lb.members.len(),
                unhealthy = lb.unhealthy_count(),
                "fetched instance health"
            );
            resources.push(lb);
        }
        Ok(resources)
    }
}

#[async_trait]
impl ResourceLister for ElbLister {
    async fn list(&self, filter: Option<&NameFilter>) -> Result<Vec<Resource>, FetchError> {
        within(self.timeout, "the ELB API", self.fetch(filter)).await
    }
}
