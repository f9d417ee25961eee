use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_sts::Client as StsClient;
use aws_types::region::Region;
use std::time::SystemTime;
use tracing::{debug, info};

use crate::error::{Result, SchedulerError};

/// Session label used for `AssumeRole` when the caller does not supply one.
pub const DEFAULT_SESSION_NAME: &str = "ec2-scheduler";

/// Shared knobs for every config the resolver builds.
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub region: Option<String>,
    /// Total attempts per request for the SDK's standard retry strategy.
    /// `None` keeps the SDK default.
    pub max_attempts: Option<u32>,
}

impl SessionSettings {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: Some(region.into()),
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    fn loader(&self) -> aws_config::ConfigLoader {
        let region_provider = RegionProviderChain::first_try(self.region.clone().map(Region::new))
            .or_default_provider();

        let loader = aws_config::defaults(BehaviorVersion::v2024_03_28()).region(region_provider);
        match self.max_attempts {
            Some(attempts) => {
                loader.retry_config(RetryConfig::standard().with_max_attempts(attempts))
            }
            None => loader,
        }
    }
}

pub async fn configure_aws(settings: &SessionSettings) -> aws_types::SdkConfig {
    settings.loader().load().await
}

/// Resolve an authenticated config for one invocation.
///
/// Without a role this is the caller's own default credential chain. With a
/// role, STS `AssumeRole` is called once and the returned temporary
/// credentials back the config. Nothing is cached between calls.
pub async fn aws_session(
    role_arn: Option<&str>,
    session_name: Option<&str>,
    settings: &SessionSettings,
) -> Result<aws_types::SdkConfig> {
    let Some(role_arn) = role_arn.filter(|arn| !arn.is_empty()) else {
        debug!("Using default credential chain");
        return Ok(configure_aws(settings).await);
    };

    let base = configure_aws(settings).await;
    assume_role(&StsClient::new(&base), role_arn, session_name, settings).await
}

/// Exchange `role_arn` for temporary credentials and build a config on them.
pub async fn assume_role(
    sts: &StsClient,
    role_arn: &str,
    session_name: Option<&str>,
    settings: &SessionSettings,
) -> Result<aws_types::SdkConfig> {
    let session_name = session_name.unwrap_or(DEFAULT_SESSION_NAME);
    info!(role_arn = %role_arn, session_name = %session_name, "Assuming role");

    let response = sts
        .assume_role()
        .role_arn(role_arn)
        .role_session_name(session_name)
        .send()
        .await
        .map_err(|e| SchedulerError::Authorization {
            role_arn: role_arn.to_string(),
            message: aws_sdk_sts::error::DisplayErrorContext(e).to_string(),
        })?;

    let credentials = response
        .credentials()
        .ok_or_else(|| SchedulerError::Authorization {
            role_arn: role_arn.to_string(),
            message: "AssumeRole returned no credentials".to_string(),
        })?;

    let expiry = SystemTime::try_from(*credentials.expiration()).ok();
    let temporary = Credentials::new(
        credentials.access_key_id(),
        credentials.secret_access_key(),
        Some(credentials.session_token().to_string()),
        expiry,
        "AssumeRole",
    );

    Ok(settings.loader().credentials_provider(temporary).load().await)
}
