//! The AWS calls the scheduler needs, behind one trait.
//!
//! `Schedule` only talks to `ComputeApi`; `AwsCompute` is the real thing,
//! built from a resolved `SdkConfig`.

use async_trait::async_trait;
use aws_sdk_autoscaling::Client as AutoScalingClient;
use aws_sdk_ec2::Client as Ec2Client;
use std::collections::HashSet;

use crate::autoscaling::list_asg_instance_ids;
use crate::ec2::{list_ec2_instances, start_ec2_instances, stop_ec2_instances, InstanceSummary};
use crate::error::Result;

#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Instance ids managed by any Auto Scaling group in the region
    async fn autoscaling_instance_ids(&self) -> Result<HashSet<String>>;

    /// All instances in the region
    async fn describe_instances(&self) -> Result<Vec<InstanceSummary>>;

    /// Bulk start, one request
    async fn start_instances(&self, instance_ids: &[String]) -> Result<()>;

    /// Bulk stop, one request
    async fn stop_instances(&self, instance_ids: &[String]) -> Result<()>;
}

pub struct AwsCompute {
    ec2: Ec2Client,
    autoscaling: AutoScalingClient,
}

impl AwsCompute {
    pub fn new(config: &aws_types::SdkConfig) -> Self {
        Self {
            ec2: Ec2Client::new(config),
            autoscaling: AutoScalingClient::new(config),
        }
    }
}

#[async_trait]
impl ComputeApi for AwsCompute {
    async fn autoscaling_instance_ids(&self) -> Result<HashSet<String>> {
        list_asg_instance_ids(&self.autoscaling).await
    }

    async fn describe_instances(&self) -> Result<Vec<InstanceSummary>> {
        list_ec2_instances(&self.ec2).await
    }

    async fn start_instances(&self, instance_ids: &[String]) -> Result<()> {
        start_ec2_instances(&self.ec2, instance_ids).await
    }

    async fn stop_instances(&self, instance_ids: &[String]) -> Result<()> {
        stop_ec2_instances(&self.ec2, instance_ids).await
    }
}
