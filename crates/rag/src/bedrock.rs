//! Amazon Bedrock knowledge base backend
//!
//! Issues one `RetrieveAndGenerate` call per question against a Bedrock
//! knowledge base, with the text inference parameters from
//! [`RetrievalConfig`]. SDK errors are classified with
//! [`BackendFailure::from_sdk_error`].

use async_trait::async_trait;
use aws_sdk_bedrockagentruntime as bedrock;
use bedrock::types::{
    GenerationConfiguration, InferenceConfig, KnowledgeBaseRetrieveAndGenerateConfiguration,
    RetrieveAndGenerateConfiguration, RetrieveAndGenerateInput, RetrieveAndGenerateType,
    TextInferenceConfig,
};

use seva_core::{
    BackendErrorKind, BackendFailure, KnowledgeBase, RawGeneration, RetrievalConfig,
    RetrievedReference,
};

/// Bedrock knowledge base client
pub struct BedrockKnowledgeBase {
    client: bedrock::Client,
}

impl BedrockKnowledgeBase {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: bedrock::Client::new(sdk_config),
        }
    }

    pub fn from_client(client: bedrock::Client) -> Self {
        Self { client }
    }

    fn build_configuration(
        config: &RetrievalConfig,
    ) -> Result<RetrieveAndGenerateConfiguration, BackendFailure> {
        let inference = InferenceConfig::builder()
            .text_inference_config(
                TextInferenceConfig::builder()
                    .max_tokens(config.max_tokens.min(i32::MAX as u32) as i32)
                    .temperature(config.temperature)
                    .top_p(config.top_p)
                    .build(),
            )
            .build();

        let knowledge_base = KnowledgeBaseRetrieveAndGenerateConfiguration::builder()
            .knowledge_base_id(&config.knowledge_base_id)
            .model_arn(&config.model_reference)
            .generation_configuration(
                GenerationConfiguration::builder()
                    .inference_config(inference)
                    .build(),
            )
            .build()
            .map_err(invalid_request)?;

        RetrieveAndGenerateConfiguration::builder()
            .r#type(RetrieveAndGenerateType::KnowledgeBase)
            .knowledge_base_configuration(knowledge_base)
            .build()
            .map_err(invalid_request)
    }
}

#[async_trait]
impl KnowledgeBase for BedrockKnowledgeBase {
    async fn retrieve_and_generate(
        &self,
        query: &str,
        config: &RetrievalConfig,
    ) -> Result<RawGeneration, BackendFailure> {
        let input = RetrieveAndGenerateInput::builder()
            .text(query)
            .build()
            .map_err(invalid_request)?;

        let response = self
            .client
            .retrieve_and_generate()
            .input(input)
            .retrieve_and_generate_configuration(Self::build_configuration(config)?)
            .send()
            .await
            .map_err(|e| BackendFailure::from_sdk_error(&e))?;

        let text = response
            .output()
            .map(|o| o.text().to_string())
            .unwrap_or_default();

        let references = response
            .citations()
            .iter()
            .flat_map(|citation| citation.retrieved_references().iter())
            .map(|r| RetrievedReference {
                uri: r.location().and_then(|loc| {
                    location_uri(
                        loc.s3_location().and_then(|s3| s3.uri()),
                        loc.web_location().and_then(|web| web.url()),
                    )
                }),
                text: r.content().map(|c| c.text()).map(str::to_string),
            })
            .collect();

        Ok(RawGeneration {
            text,
            references,
            session_id: response.session_id().to_string(),
        })
    }

    fn name(&self) -> &str {
        "bedrock"
    }
}

/// S3 URI when present, else the web URL
fn location_uri(s3_uri: Option<&str>, web_url: Option<&str>) -> Option<String> {
    s3_uri
        .filter(|u| !u.is_empty())
        .or_else(|| web_url.filter(|u| !u.is_empty()))
        .map(str::to_string)
}

fn invalid_request(err: impl std::fmt::Display) -> BackendFailure {
    BackendFailure::new(BackendErrorKind::Validation, err.to_string())
}
