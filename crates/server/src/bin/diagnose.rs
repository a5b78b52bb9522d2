//! Connectivity checker
//!
//! Loads the configuration, resolves the AWS account behind the credentials,
//! checks that Bedrock answers in the configured region, then probes the
//! knowledge base with one retrieve-and-generate call and Polly with one short
//! synthesis. Prints the categorized failure with a remediation hint and exits
//! non-zero when any check fails. Rejected credentials stop the run early.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use seva_config::{load_settings, ConfigError, Settings};
use seva_core::{BackendFailure, Language};
use seva_pipeline::{PollyTts, SpeechSynthesizer, TtsError};
use seva_rag::{BedrockKnowledgeBase, RagError, RetrievalGateway};
use seva_server::aws::{
    caller_identity, foundation_model_count, is_bedrock_region, load_sdk_config, BEDROCK_REGIONS,
};

const PROBE_QUERY: &str = "test";
const RULE: &str = "======================================================================";

#[tokio::main]
async fn main() -> ExitCode {
    println!("{RULE}\nSEVASETU DIAGNOSTIC TOOL\n{RULE}");

    match diagnose().await {
        Ok(true) => {
            println!("\n{RULE}\nALL CHECKS PASSED\n{RULE}");
            ExitCode::SUCCESS
        },
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            println!("\n   FAILED: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// `Ok(false)` when a backend check failed, `Err` when the tool could not run
async fn diagnose() -> Result<bool> {
    println!("\n1. Loading configuration...");
    let settings = match load_settings(std::env::var("SEVA_ENV").ok().as_deref()) {
        Ok(settings) => settings,
        Err(ConfigError::Invalid(violations)) => {
            for violation in &violations {
                println!("   - {violation}");
            }
            anyhow::bail!("{} configuration problems", violations.len());
        },
        Err(e) => return Err(anyhow::Error::new(e).context("configuration could not be read")),
    };
    print_summary(&settings);

    println!("\n2. Building AWS clients for {}...", settings.aws.region);
    let sdk_config = load_sdk_config(&settings.aws).await;
    println!("   OK");

    if !check_credentials(&sdk_config).await {
        return Ok(false);
    }
    let region_ok = check_bedrock_region(&settings, &sdk_config).await;
    let kb_ok = probe_knowledge_base(&settings, &sdk_config).await;
    let tts_ok = probe_speech(&sdk_config).await;
    Ok(region_ok && kb_ok && tts_ok)
}

fn print_summary(settings: &Settings) {
    let width = settings.summary().iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in settings.summary() {
        println!("   {key:<width$}  {value}");
    }
}

async fn check_credentials(sdk_config: &aws_config::SdkConfig) -> bool {
    println!("\n3. Checking AWS credentials...");
    match caller_identity(sdk_config).await {
        Ok(identity) => {
            println!("   OK: account {}", identity.account);
            println!("   ARN: {}", identity.arn);
            true
        },
        Err(failure) => {
            print_failure(&failure);
            false
        },
    }
}

async fn check_bedrock_region(settings: &Settings, sdk_config: &aws_config::SdkConfig) -> bool {
    println!("\n4. Checking Bedrock in {}...", settings.aws.region);
    if !is_bedrock_region(&settings.aws.region) {
        println!("   WARNING: {} is not a known Bedrock region", settings.aws.region);
    }
    match foundation_model_count(sdk_config).await {
        Ok(count) => {
            println!("   OK: {count} foundation models available");
            true
        },
        Err(failure) => {
            print_failure(&failure);
            println!("   Bedrock regions: {}", BEDROCK_REGIONS.join(", "));
            false
        },
    }
}

async fn probe_knowledge_base(settings: &Settings, sdk_config: &aws_config::SdkConfig) -> bool {
    println!(
        "\n5. Testing knowledge base {} with model {}...",
        settings.knowledge_base.knowledge_base_id, settings.knowledge_base.model_arn
    );
    let gateway = RetrievalGateway::new(
        Arc::new(BedrockKnowledgeBase::new(sdk_config)),
        settings.retrieval_config(),
    );

    match gateway.query(PROBE_QUERY).await {
        Ok(result) => {
            println!(
                "   OK: {} chars, {} citations",
                result.generated_text.chars().count(),
                result.citations.len()
            );
            true
        },
        Err(RagError::BackendUnavailable(failure)) => {
            print_failure(&failure);
            false
        },
        Err(e) => {
            println!("   FAILED: {e}");
            false
        },
    }
}

async fn probe_speech(sdk_config: &aws_config::SdkConfig) -> bool {
    println!("\n6. Testing speech synthesis...");
    let synthesizer = SpeechSynthesizer::new(Arc::new(PollyTts::new(sdk_config)));

    match synthesizer
        .try_synthesize(PROBE_QUERY, Language::English.profile())
        .await
    {
        Ok(clip) => {
            println!("   OK: {} bytes of {}", clip.len(), clip.mime_type);
            true
        },
        Err(TtsError::Backend(failure)) => {
            print_failure(&failure);
            false
        },
        Err(e) => {
            println!("   FAILED: {e}");
            false
        },
    }
}

fn print_failure(failure: &BackendFailure) {
    println!(
        "   FAILED [{}]: {}",
        failure.code.as_deref().unwrap_or(failure.kind.as_str()),
        failure.message
    );
    println!("\n   Fix: {}", failure.kind.remediation_hint());
}
