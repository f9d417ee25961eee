use aws_sdk_autoscaling::Client as AutoScalingClient;
use std::collections::HashSet;
use tracing::debug;

use crate::error::{Result, SchedulerError};

/// Ids of every instance currently owned by an Auto Scaling group.
///
/// The group's own control loop would undo a direct start or stop, so these
/// are excluded before any policy is applied. All result pages are read.
pub async fn list_asg_instance_ids(client: &AutoScalingClient) -> Result<HashSet<String>> {
    let mut pages = client
        .describe_auto_scaling_instances()
        .into_paginator()
        .send();
    let mut ids = HashSet::new();

    while let Some(page) = pages.next().await {
        let page =
            page.map_err(|e| SchedulerError::provider("DescribeAutoScalingInstances", e))?;
        ids.extend(
            page.auto_scaling_instances()
                .iter()
                .map(|details| details.instance_id().to_string()),
        );
    }

    debug!(count = ids.len(), "Described Auto Scaling instances");
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_autoscaling::operation::describe_auto_scaling_instances::DescribeAutoScalingInstancesOutput;
    use aws_sdk_autoscaling::types::AutoScalingInstanceDetails;
    use aws_smithy_mocks::{mock, mock_client};

    fn asg_member(instance_id: &str, group: &str) -> AutoScalingInstanceDetails {
        AutoScalingInstanceDetails::builder()
            .instance_id(instance_id)
            .instance_type("t3.micro")
            .auto_scaling_group_name(group)
            .availability_zone("us-east-1a")
            .lifecycle_state("InService")
            .health_status("HEALTHY")
            .protected_from_scale_in(false)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_membership_is_read_across_pages() {
        let first = mock!(AutoScalingClient::describe_auto_scaling_instances)
            .match_requests(|req| req.next_token().is_none())
            .then_output(|| {
                DescribeAutoScalingInstancesOutput::builder()
                    .auto_scaling_instances(asg_member("i-web-1", "web"))
                    .auto_scaling_instances(asg_member("i-web-2", "web"))
                    .next_token("page-2")
                    .build()
            });
        let second = mock!(AutoScalingClient::describe_auto_scaling_instances)
            .match_requests(|req| req.next_token() == Some("page-2"))
            .then_output(|| {
                DescribeAutoScalingInstancesOutput::builder()
                    .auto_scaling_instances(asg_member("i-batch-1", "batch"))
                    .build()
            });
        let client = mock_client!(aws_sdk_autoscaling, [&first, &second]);

        let ids = list_asg_instance_ids(&client).await.unwrap();
        let expected: HashSet<String> = ["i-web-1", "i-web-2", "i-batch-1"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(ids, expected);
        assert_eq!(second.num_calls(), 1);
    }
}
