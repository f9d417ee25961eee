use aws_sdk_ec2::types::{Instance, InstanceStateName};
use aws_sdk_ec2::Client as Ec2Client;
use tracing::{debug, info};

use crate::error::{Result, SchedulerError};

/// EC2 lifecycle state as reported by `DescribeInstances`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceLifecycle {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    Unknown(String),
}

impl InstanceLifecycle {
    pub fn from_api_state(state: &InstanceStateName) -> Self {
        match state {
            InstanceStateName::Pending => Self::Pending,
            InstanceStateName::Running => Self::Running,
            InstanceStateName::ShuttingDown => Self::ShuttingDown,
            InstanceStateName::Terminated => Self::Terminated,
            InstanceStateName::Stopping => Self::Stopping,
            InstanceStateName::Stopped => Self::Stopped,
            other => Self::Unknown(other.as_str().to_string()),
        }
    }

    /// Only settled instances may be started or stopped; anything in
    /// transition is left alone.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Running | Self::Stopped)
    }
}

impl std::fmt::Display for InstanceLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::ShuttingDown => "shutting-down",
            Self::Terminated => "terminated",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Unknown(name) => name,
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: Option<String>,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

/// The parts of an EC2 instance the scheduler looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSummary {
    pub id: String,
    pub state: InstanceLifecycle,
    pub tags: Vec<Tag>,
}

impl InstanceSummary {
    pub fn new(id: impl Into<String>, state: InstanceLifecycle) -> Self {
        Self {
            id: id.into(),
            state,
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    pub fn has_tag_key(&self, key: &str) -> bool {
        self.tags.iter().any(|tag| tag.key == key)
    }

    fn from_api(instance: &Instance) -> Option<Self> {
        let id = instance.instance_id()?.to_string();
        let state = instance
            .state()
            .and_then(|s| s.name())
            .map(InstanceLifecycle::from_api_state)
            .unwrap_or_else(|| InstanceLifecycle::Unknown(String::new()));

        let tags = instance
            .tags()
            .iter()
            .filter_map(|tag| {
                tag.key().map(|key| Tag {
                    key: key.to_string(),
                    value: tag.value().map(str::to_string),
                })
            })
            .collect();

        Some(Self { id, state, tags })
    }
}

/// Every instance in the region, across all reservations and pages.
pub async fn list_ec2_instances(client: &Ec2Client) -> Result<Vec<InstanceSummary>> {
    let mut pages = client.describe_instances().into_paginator().send();
    let mut instances = Vec::new();

    while let Some(page) = pages.next().await {
        let page = page.map_err(|e| SchedulerError::provider("DescribeInstances", e))?;
        instances.extend(
            page.reservations()
                .iter()
                .flat_map(|res| res.instances())
                .filter_map(InstanceSummary::from_api),
        );
    }

    debug!(count = instances.len(), "Described EC2 instances");
    Ok(instances)
}

pub async fn start_ec2_instances(client: &Ec2Client, instance_ids: &[String]) -> Result<()> {
    client
        .start_instances()
        .set_instance_ids(Some(instance_ids.to_vec()))
        .send()
        .await
        .map_err(|e| SchedulerError::provider("StartInstances", e))?;

    info!(count = instance_ids.len(), "Requested start for instances: {:?}", instance_ids);
    Ok(())
}

pub async fn stop_ec2_instances(client: &Ec2Client, instance_ids: &[String]) -> Result<()> {
    client
        .stop_instances()
        .set_instance_ids(Some(instance_ids.to_vec()))
        .send()
        .await
        .map_err(|e| SchedulerError::provider("StopInstances", e))?;

    info!(count = instance_ids.len(), "Requested stop for instances: {:?}", instance_ids);
    Ok(())
}
