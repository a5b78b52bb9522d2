//! Shared AWS SDK configuration
//!
//! Both backends are built from one `SdkConfig`. Static keys from settings
//! take precedence; without them the SDK default provider chain applies.
//! The account and region checks here back `seva-diagnose`.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use seva_config::AwsConfig;
use seva_core::BackendFailure;

const PROVIDER_NAME: &str = "seva-settings";

/// Regions known to serve Bedrock knowledge bases
pub const BEDROCK_REGIONS: &[&str] = &["us-east-1", "us-west-2", "eu-central-1", "ap-northeast-1"];

pub async fn load_sdk_config(aws: &AwsConfig) -> SdkConfig {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(aws.region.clone()));

    match aws.static_credentials() {
        Some((access_key_id, secret_access_key)) => {
            tracing::info!(region = %aws.region, "Using static AWS credentials from settings");
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                PROVIDER_NAME,
            ));
        },
        None => {
            tracing::info!(region = %aws.region, "Using default AWS credential provider chain");
        },
    }

    loader.load().await
}

/// Principal the resolved credentials belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: String,
    pub arn: String,
}

/// Resolve the credentials with STS `GetCallerIdentity`
pub async fn caller_identity(sdk_config: &SdkConfig) -> Result<CallerIdentity, BackendFailure> {
    let response = aws_sdk_sts::Client::new(sdk_config)
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| BackendFailure::from_sdk_error(&e))?;

    Ok(CallerIdentity {
        account: response.account().unwrap_or_default().to_string(),
        arn: response.arn().unwrap_or_default().to_string(),
    })
}

/// Number of foundation models Bedrock offers in the configured region
pub async fn foundation_model_count(sdk_config: &SdkConfig) -> Result<usize, BackendFailure> {
    let response = aws_sdk_bedrock::Client::new(sdk_config)
        .list_foundation_models()
        .send()
        .await
        .map_err(|e| BackendFailure::from_sdk_error(&e))?;
    Ok(response.model_summaries().len())
}

pub fn is_bedrock_region(region: &str) -> bool {
    BEDROCK_REGIONS.contains(&region)
}
