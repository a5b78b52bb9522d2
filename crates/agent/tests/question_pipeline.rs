//! Integration tests for the question pipeline (router -> retrieval -> speech)
//!
//! Backends are in-process doubles that count their calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use seva_agent::{AgentError, AssistantSession, QuestionAssistant, FALLBACK_ANSWER};
use seva_core::{
    BackendErrorKind, BackendFailure, KnowledgeBase, Language, LanguageRouter, RawGeneration,
    RetrievalConfig, RetrievedReference, SpeechRequest, TextToSpeech, TurnRole,
    VoiceActivityState,
};
use seva_pipeline::SpeechSynthesizer;
use seva_rag::RetrievalGateway;

struct MockKnowledgeBase {
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
    reply: Result<RawGeneration, BackendFailure>,
    delay: Duration,
}

#[async_trait]
impl KnowledgeBase for MockKnowledgeBase {
    async fn retrieve_and_generate(
        &self,
        query: &str,
        _config: &RetrievalConfig,
    ) -> Result<RawGeneration, BackendFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone()
    }

    fn name(&self) -> &str {
        "mock-kb"
    }
}

struct MockTts {
    calls: AtomicUsize,
    locales: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl TextToSpeech for MockTts {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, BackendFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.locales.lock().unwrap().push(request.locale_code.clone());
        if self.fail {
            Err(BackendFailure::from_code("ServiceFailureException", "polly down"))
        } else {
            Ok(vec![0xFF, 0xFB, 0x90, 0x00])
        }
    }

    fn model_name(&self) -> &str {
        "mock-tts"
    }
}

struct Harness {
    kb: Arc<MockKnowledgeBase>,
    tts: Arc<MockTts>,
    session: AssistantSession,
}

fn pm_kisan_answer() -> RawGeneration {
    RawGeneration {
        text: "PM-Kisan provides income support of Rs 6000 per year to farmer families.".into(),
        references: vec![
            RetrievedReference::new("s3://bucket/doc1.pdf", "PM-Kisan scheme guidelines"),
            RetrievedReference::new("s3://bucket/doc2.pdf", "Eligibility criteria"),
        ],
        session_id: "bedrock-session-1".into(),
    }
}

fn harness(reply: Result<RawGeneration, BackendFailure>, tts_fails: bool) -> Harness {
    slow_harness(reply, tts_fails, Duration::ZERO)
}

fn slow_harness(
    reply: Result<RawGeneration, BackendFailure>,
    tts_fails: bool,
    delay: Duration,
) -> Harness {
    let kb = Arc::new(MockKnowledgeBase {
        calls: AtomicUsize::new(0),
        queries: Mutex::new(Vec::new()),
        reply,
        delay,
    });
    let tts = Arc::new(MockTts {
        calls: AtomicUsize::new(0),
        locales: Mutex::new(Vec::new()),
        fail: tts_fails,
    });
    let config = RetrievalConfig {
        knowledge_base_id: "OUQVSP38X2".into(),
        model_reference: "arn:aws:bedrock:us-east-1::foundation-model/anthropic.claude-v2".into(),
        max_tokens: 512,
        temperature: 0.7,
        top_p: 0.9,
    };
    let assistant = QuestionAssistant::new(
        LanguageRouter::default(),
        RetrievalGateway::new(kb.clone(), config),
        SpeechSynthesizer::new(tts.clone()),
    );
    Harness {
        kb,
        tts,
        session: AssistantSession::new(Arc::new(assistant)),
    }
}

#[tokio::test]
async fn test_english_question_end_to_end() {
    let mut h = harness(Ok(pm_kisan_answer()), false);

    let turn = h
        .session
        .submit_question("What is PM-Kisan scheme?", "English")
        .await
        .unwrap();

    assert_eq!(turn.role, TurnRole::Assistant);
    assert!(turn.text.starts_with("PM-Kisan provides"));
    let names: Vec<_> = turn
        .citations
        .iter()
        .map(|c| c.source_document_name.as_str())
        .collect();
    assert_eq!(names, ["doc1.pdf", "doc2.pdf"]);
    assert_eq!(turn.audio.as_ref().map(|a| a.mime_type.as_str()), Some("audio/mpeg"));

    // English carries no instruction prefix
    assert_eq!(h.kb.queries.lock().unwrap()[0], "What is PM-Kisan scheme?");
    assert_eq!(h.tts.locales.lock().unwrap()[0], "en-IN");

    let history = h.session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, TurnRole::User);
    assert_eq!(history[0].text, "What is PM-Kisan scheme?");
    assert_eq!(history[1], turn);
    assert_eq!(h.session.voice_state(), VoiceActivityState::Speaking);
}

#[tokio::test]
async fn test_hindi_question_is_prefixed_and_voiced_in_hindi() {
    let mut h = harness(Ok(pm_kisan_answer()), false);

    h.session
        .submit_question("PM-Kisan kya hai?", "Hindi (हिंदी)")
        .await
        .unwrap();

    let sent = h.kb.queries.lock().unwrap()[0].clone();
    let prefix = Language::Hindi.profile().instruction_prefix;
    assert!(sent.starts_with(prefix));
    assert_eq!(&sent[prefix.len()..], "PM-Kisan kya hai?");
    assert_eq!(h.tts.locales.lock().unwrap()[0], "hi-IN");

    // The stored user turn keeps the original wording
    assert_eq!(h.session.history()[0].text, "PM-Kisan kya hai?");
}

#[tokio::test]
async fn test_empty_question_never_reaches_backends() {
    let mut h = harness(Ok(pm_kisan_answer()), false);

    let err = h.session.submit_question("   ", "English").await.unwrap_err();
    assert!(matches!(err, AgentError::InvalidInput(_)));
    assert_eq!(h.kb.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.tts.calls.load(Ordering::SeqCst), 0);
    assert!(h.session.history().is_empty());
    assert_eq!(h.session.voice_state(), VoiceActivityState::Idle);
}

#[tokio::test]
async fn test_backend_failure_is_surfaced_with_raw_message() {
    let mut h = harness(
        Err(BackendFailure::from_code(
            "ResourceNotFoundException",
            "Knowledge base OUQVSP38X2 does not exist",
        )),
        false,
    );

    let err = h
        .session
        .submit_question("What is PM-Kisan scheme?", "English")
        .await
        .unwrap_err();
    match err {
        AgentError::BackendUnavailable(failure) => {
            assert_eq!(failure.kind, BackendErrorKind::NotFound);
            assert!(failure.message.contains("does not exist"));
        },
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(h.tts.calls.load(Ordering::SeqCst), 0);
    let history = h.session.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, TurnRole::User);
    assert_eq!(h.session.voice_state(), VoiceActivityState::Idle);
}

#[tokio::test]
async fn test_synthesis_failure_degrades_to_text() {
    let mut h = harness(Ok(pm_kisan_answer()), true);

    let turn = h
        .session
        .submit_question("What is PM-Kisan scheme?", "Tamil (தமிழ்)")
        .await
        .unwrap();

    assert!(turn.audio.is_none());
    assert!(!turn.text.is_empty());
    assert_eq!(turn.citations.len(), 2);
    assert_eq!(h.tts.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.session.voice_state(), VoiceActivityState::Idle);
}

#[tokio::test]
async fn test_empty_generation_uses_fallback_answer() {
    let mut h = harness(
        Ok(RawGeneration {
            text: String::new(),
            references: vec![],
            session_id: "s".into(),
        }),
        false,
    );

    let turn = h.session.submit_question("Unknown scheme?", "English").await.unwrap();
    assert_eq!(turn.text, FALLBACK_ANSWER);
    assert!(turn.has_audio());
}

#[tokio::test]
async fn test_unknown_language_falls_back_to_english() {
    let mut h = harness(Ok(pm_kisan_answer()), false);

    h.session.submit_question("Question", "Klingon").await.unwrap();
    assert_eq!(h.kb.queries.lock().unwrap()[0], "Question");
    assert_eq!(h.tts.locales.lock().unwrap()[0], "en-IN");
}

#[tokio::test]
async fn test_clear_history() {
    let mut h = harness(Ok(pm_kisan_answer()), false);

    h.session.submit_question("First", "English").await.unwrap();
    h.session.submit_question("Second", "English").await.unwrap();
    assert_eq!(h.session.history().len(), 4);

    h.session.clear_history();
    assert!(h.session.history().is_empty());
}

#[tokio::test]
async fn test_voice_cycle() {
    let mut h = harness(Ok(pm_kisan_answer()), false);

    assert_eq!(h.session.begin_listening().unwrap(), VoiceActivityState::Listening);
    h.session.submit_question("Spoken question", "English").await.unwrap();
    assert_eq!(h.session.voice_state(), VoiceActivityState::Speaking);
    assert_eq!(h.session.playback_finished().unwrap(), VoiceActivityState::Idle);

    // Listening then giving up returns to idle
    h.session.begin_listening().unwrap();
    assert_eq!(h.session.stop_listening().unwrap(), VoiceActivityState::Idle);
}

#[tokio::test]
async fn test_abandoned_question_resets_indicator() {
    let mut h = slow_harness(Ok(pm_kisan_answer()), false, Duration::from_secs(5));

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        h.session.submit_question("What is PM-Kisan scheme?", "English"),
    )
    .await;
    assert!(outcome.is_err());
    assert_eq!(h.kb.calls.load(Ordering::SeqCst), 1);

    assert_eq!(h.session.voice_state(), VoiceActivityState::Idle);
    let history = h.session.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, TurnRole::User);
    assert_eq!(h.session.begin_listening().unwrap(), VoiceActivityState::Listening);
}
