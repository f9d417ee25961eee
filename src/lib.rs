//! Start or stop EC2 instances by tag, leaving Auto Scaling groups alone.
//!
//! ```no_run
//! # async fn demo() -> ec2_scheduler::Result<()> {
//! use ec2_scheduler::RunOptions;
//!
//! let stopped = ec2_scheduler::run(&RunOptions {
//!     opt_in: false,
//!     action: "stop".to_string(),
//!     dry_run: true,
//!     ..Default::default()
//! })
//! .await?;
//! println!("{:?}", stopped);
//! # Ok(())
//! # }
//! ```

pub mod autoscaling;
pub mod aws_config;
pub mod compute;
pub mod config;
pub mod ec2;
pub mod error;
pub mod interactive;
pub mod scheduler;

pub use crate::aws_config::{aws_session, SessionSettings};
pub use compute::{AwsCompute, ComputeApi};
pub use ec2::{InstanceLifecycle, InstanceSummary};
pub use error::{Result, SchedulerError};
pub use scheduler::{connect, run, run_blocking, Action, Policy, RunOptions, Schedule};
