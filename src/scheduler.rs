//! Tag-driven start/stop of EC2 instances
//!
//! To minimize accidental chaos the defaults are an opt-in start: only
//! instances carrying the schedule tag are touched. Opt-out flips that and
//! acts on every eligible instance *without* the tag.

use std::str::FromStr;
use tracing::{debug, info};

use crate::aws_config::{aws_session, SessionSettings};
use crate::compute::{AwsCompute, ComputeApi};
use crate::ec2::InstanceSummary;
use crate::error::{Result, SchedulerError};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_SCHEDULE_TAG: &str = "Schedule";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

impl FromStr for Action {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            other => Err(SchedulerError::invalid_argument(format!(
                "action should be 'start' or 'stop'. The value of action was: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Act only on tagged instances
    OptIn,
    /// Act on every instance except tagged ones
    OptOut,
}

impl Policy {
    pub fn includes(&self, has_schedule_tag: bool) -> bool {
        match self {
            Self::OptIn => has_schedule_tag,
            Self::OptOut => !has_schedule_tag,
        }
    }
}

impl From<bool> for Policy {
    fn from(opt_in: bool) -> Self {
        if opt_in {
            Self::OptIn
        } else {
            Self::OptOut
        }
    }
}

/// Everything one invocation needs. `action` stays a string so that an
/// unknown value is reported as `InvalidArgument` by `run` itself.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub opt_in: bool,
    pub action: String,
    pub region: String,
    pub role_arn: Option<String>,
    pub session_name: Option<String>,
    pub dry_run: bool,
    pub schedule_tag: String,
    pub max_attempts: Option<u32>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            opt_in: true,
            action: Action::Start.to_string(),
            region: DEFAULT_REGION.to_string(),
            role_arn: None,
            session_name: None,
            dry_run: false,
            schedule_tag: DEFAULT_SCHEDULE_TAG.to_string(),
            max_attempts: None,
        }
    }
}

impl RunOptions {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            region: Some(self.region.clone()),
            max_attempts: self.max_attempts,
        }
    }
}

/// A validated policy, ready to be evaluated against any `ComputeApi`.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub policy: Policy,
    pub action: Action,
    pub dry_run: bool,
    pub schedule_tag: String,
}

impl Schedule {
    pub fn new(policy: Policy, action: Action) -> Self {
        Self {
            policy,
            action,
            dry_run: false,
            schedule_tag: DEFAULT_SCHEDULE_TAG.to_string(),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_schedule_tag(mut self, key: impl Into<String>) -> Self {
        self.schedule_tag = key.into();
        self
    }

    pub fn from_options(options: &RunOptions) -> Result<Self> {
        let action = options.action.parse()?;
        if options.schedule_tag.is_empty() {
            return Err(SchedulerError::invalid_argument(
                "schedule tag key must not be empty",
            ));
        }

        Ok(Self::new(options.opt_in.into(), action)
            .with_dry_run(options.dry_run)
            .with_schedule_tag(options.schedule_tag.clone()))
    }

    /// Single-instance decision, ignoring Auto Scaling membership.
    pub fn selects(&self, instance: &InstanceSummary) -> bool {
        if !instance.state.is_settled() {
            debug!(instance_id = %instance.id, state = %instance.state, "Skipping instance in transition");
            return false;
        }

        let has_tag = instance.has_tag_key(&self.schedule_tag);
        let included = self.policy.includes(has_tag);
        if !included {
            debug!(instance_id = %instance.id, has_tag, "Skipping instance by tag policy");
        }
        included
    }

    /// Instance ids this schedule would act on, in enumeration order.
    pub async fn plan<A: ComputeApi + ?Sized>(&self, api: &A) -> Result<Vec<String>> {
        let asg_instances = api.autoscaling_instance_ids().await?;
        let instances = api.describe_instances().await?;

        let mut excluded_asg = 0usize;
        let targets: Vec<String> = instances
            .iter()
            .filter(|instance| {
                let managed = asg_instances.contains(&instance.id);
                if managed {
                    excluded_asg += 1;
                    debug!(instance_id = %instance.id, "Skipping Auto Scaling instance");
                }
                !managed
            })
            .filter(|instance| self.selects(instance))
            .map(|instance| instance.id.clone())
            .collect();

        debug!(
            described = instances.len(),
            asg_members = asg_instances.len(),
            excluded_asg,
            selected = targets.len(),
            "Planned {} action",
            self.action
        );
        Ok(targets)
    }

    /// Issue the bulk action for `targets`. Dry runs and empty sets make no call.
    pub async fn apply<A: ComputeApi + ?Sized>(&self, api: &A, targets: &[String]) -> Result<()> {
        if self.dry_run {
            info!(
                action = %self.action,
                count = targets.len(),
                "This would perform the {} action on {} instances",
                self.action,
                targets.len()
            );
            return Ok(());
        }

        if targets.is_empty() {
            info!(action = %self.action, "No instances to {}", self.action);
            return Ok(());
        }

        match self.action {
            Action::Start => api.start_instances(targets).await,
            Action::Stop => api.stop_instances(targets).await,
        }
    }

    pub async fn execute<A: ComputeApi + ?Sized>(&self, api: &A) -> Result<Vec<String>> {
        let targets = self.plan(api).await?;
        self.apply(api, &targets).await?;
        Ok(targets)
    }
}

/// Runs the scheduler to start or stop EC2 instances in one region.
///
/// The returned ids are what was (or, on a dry run, would have been) acted
/// on. They reflect the request sent, not confirmed state transitions.
///
/// Fails with `InvalidArgument` before touching AWS if `action` is neither
/// `start` nor `stop`.
pub async fn run(options: &RunOptions) -> Result<Vec<String>> {
    let schedule = Schedule::from_options(options)?;

    info!(
        region = %options.region,
        action = %schedule.action,
        policy = ?schedule.policy,
        dry_run = schedule.dry_run,
        "Running scheduler"
    );

    let api = connect(options).await?;
    schedule.execute(&api).await
}

/// Resolve credentials for `options` and build the AWS clients on them.
pub async fn connect(options: &RunOptions) -> Result<AwsCompute> {
    let config = aws_session(
        options.role_arn.as_deref(),
        options.session_name.as_deref(),
        &options.session_settings(),
    )
    .await?;
    Ok(AwsCompute::new(&config))
}

/// Blocking form of [`run`] for callers without a Tokio runtime.
///
/// # Panics
///
/// Panics if called from within a Tokio runtime, since it starts and blocks
/// on its own.
pub fn run_blocking(options: &RunOptions) -> Result<Vec<String>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(options))
}
