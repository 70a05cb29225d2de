// Turn coordinator tests: the full session state machine driven against
// scripted in-process collaborators (generator, store, capture, playback).

use interview_coach::ai::QuestionGenerator;
use interview_coach::error::{Error, Result};
use interview_coach::motion::{FrameSource, VideoFrame};
use interview_coach::session::{
    ActivePhase, CoordinatorConfig, Message, Phase, Sender, TurnCoordinator,
};
use interview_coach::speech::{PlaybackOutcome, SpeechCapture, SpeechPlayback};
use interview_coach::store::{InterviewStore, InterviewUpdate, NewInterview, StoredInterview};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

// ============================================================================
// Scripted collaborators
// ============================================================================

#[derive(Default)]
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
    /// When set, `generate` blocks until `release` is called.
    gate: Option<Arc<Notify>>,
}

impl ScriptedGenerator {
    fn replies(replies: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        })
    }

    fn gated(replies: Vec<Result<String>>, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
            gate: Some(gate),
        })
    }

    async fn prompt(&self, index: usize) -> String {
        self.prompts.lock().await[index].clone()
    }
}

#[async_trait::async_trait]
impl QuestionGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().await.push(prompt.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(Error::Upstream("no scripted reply".into())))
    }
}

#[derive(Default)]
struct RecordingStore {
    /// Each update as `(messages, feedback)` partials
    updates: Mutex<Vec<(Option<Vec<Message>>, Option<String>)>>,
    fail_next_update: AtomicBool,
}

impl RecordingStore {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn update_count(&self) -> usize {
        self.updates.lock().await.len()
    }

    async fn update_at(&self, index: usize) -> (Option<Vec<Message>>, Option<String>) {
        self.updates.lock().await[index].clone()
    }
}

#[async_trait::async_trait]
impl InterviewStore for RecordingStore {
    async fn create(&self, new: NewInterview<'_>) -> Result<StoredInterview> {
        Ok(StoredInterview {
            id: "interview-1".to_string(),
            role: new.role.to_string(),
            tech_stack: new.tech_stack.to_string(),
            messages: new.messages.to_vec(),
            feedback: String::new(),
        })
    }

    async fn update(&self, _id: &str, update: InterviewUpdate<'_>) -> Result<()> {
        if self.fail_next_update.swap(false, Ordering::SeqCst) {
            return Err(Error::Upstream("store is down".into()));
        }
        self.updates.lock().await.push((
            update.messages.map(|m| m.to_vec()),
            update.feedback.map(str::to_string),
        ));
        Ok(())
    }
}

/// Playback that completes instantly
#[derive(Default)]
struct InstantPlayback;

#[async_trait::async_trait]
impl SpeechPlayback for InstantPlayback {
    async fn speak(&self, _text: &str) -> Result<PlaybackOutcome> {
        Ok(PlaybackOutcome::Completed)
    }

    async fn cancel(&self) {}
}

struct ScriptedCapture {
    replies: Mutex<VecDeque<Result<String>>>,
    /// When set, `capture` blocks until `release` is called.
    gate: Option<Arc<Notify>>,
}

impl ScriptedCapture {
    fn replies(replies: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            gate: None,
        })
    }

    fn gated(replies: Vec<Result<String>>, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            gate: Some(gate),
        })
    }
}

#[async_trait::async_trait]
impl SpeechCapture for ScriptedCapture {
    async fn capture(&self) -> Result<String> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(Error::Capture("no scripted utterance".into())))
    }
}

/// Frame source with nothing to show
struct NoFrames;

impl FrameSource for NoFrames {
    fn grab(&self) -> Option<VideoFrame> {
        None
    }
}

fn coordinator(
    generator: Arc<ScriptedGenerator>,
    store: Arc<RecordingStore>,
    capture: Arc<ScriptedCapture>,
) -> TurnCoordinator {
    TurnCoordinator::new(
        CoordinatorConfig {
            candidate_name: "Candidate".to_string(),
            video_enabled: false,
        },
        store,
        generator,
        capture,
        Arc::new(InstantPlayback::default()),
        Arc::new(NoFrames),
    )
}

fn no_capture() -> Arc<ScriptedCapture> {
    ScriptedCapture::replies(vec![])
}

// ============================================================================
// startSession
// ============================================================================

#[tokio::test]
async fn start_session_greets_then_asks_first_question() {
    let generator = ScriptedGenerator::replies(vec![Ok("What is a goroutine?".to_string())]);
    let store = RecordingStore::new();
    let coordinator = coordinator(Arc::clone(&generator), Arc::clone(&store), no_capture());

    let session = coordinator
        .start_session("Backend Developer", "Go")
        .await
        .unwrap();

    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[0].sender, Sender::Ai);
    assert!(session.messages[0].text.contains("Backend Developer"));
    assert!(session.messages[0].text.contains("Go"));
    assert_eq!(session.messages[1].sender, Sender::Ai);
    assert_eq!(session.messages[1].text, "What is a goroutine?");
    assert_eq!(session.phase, Phase::Active(ActivePhase::UserTurn));

    // The first prompt names the role and stack, not the transcript.
    let prompt = generator.prompt(0).await;
    assert!(prompt.contains("Backend Developer"));
    assert!(prompt.contains("Ask the first question"));

    // One transcript sync for the appended question.
    assert_eq!(store.update_count().await, 1);
    let (messages, feedback) = store.update_at(0).await;
    assert_eq!(messages.unwrap().len(), 2);
    assert!(feedback.is_none());
}

#[tokio::test]
async fn start_session_requires_role_and_stack() {
    let coordinator = coordinator(ScriptedGenerator::replies(vec![]), RecordingStore::new(), no_capture());

    assert!(matches!(
        coordinator.start_session("", "Go").await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        coordinator.start_session("Backend Developer", "   ").await,
        Err(Error::Validation(_))
    ));
    assert!(coordinator.snapshot().await.is_none());
}

#[tokio::test]
async fn first_question_failure_keeps_session_installed() {
    let generator =
        ScriptedGenerator::replies(vec![Err(Error::Upstream("generation is down".into()))]);
    let coordinator = coordinator(generator, RecordingStore::new(), no_capture());

    let result = coordinator.start_session("QA Engineer", "Cypress").await;
    assert!(matches!(result, Err(Error::Upstream(_))));

    // The greeting and the session survive the failed question.
    let session = coordinator.snapshot().await.unwrap();
    assert_eq!(session.messages.len(), 1);
    assert_eq!(session.phase, Phase::Active(ActivePhase::AwaitingAiQuestion));
}

// ============================================================================
// submitAnswer
// ============================================================================

#[tokio::test]
async fn answer_round_trip_appends_two_messages_and_syncs_twice() {
    let generator = ScriptedGenerator::replies(vec![
        Ok("What is a goroutine?".to_string()),
        Ok("How do goroutines communicate?".to_string()),
    ]);
    let store = RecordingStore::new();
    let coordinator = coordinator(Arc::clone(&generator), Arc::clone(&store), no_capture());

    coordinator
        .start_session("Backend Developer", "Go")
        .await
        .unwrap();

    coordinator
        .submit_answer("A goroutine is a lightweight thread.")
        .await
        .unwrap();

    let session = coordinator.snapshot().await.unwrap();
    assert_eq!(session.messages.len(), 4);
    assert_eq!(session.messages[2].sender, Sender::User);
    assert_eq!(session.messages[3].text, "How do goroutines communicate?");
    assert_eq!(session.phase, Phase::Active(ActivePhase::UserTurn));

    // Start synced once; the answer synced the transcript as it stood at
    // the time of the call, then the new question synced once more.
    assert_eq!(store.update_count().await, 3);
    let (after_answer, _) = store.update_at(1).await;
    let after_answer = after_answer.unwrap();
    assert_eq!(after_answer.len(), 3);
    assert_eq!(after_answer[2].sender, Sender::User);
    let (after_question, _) = store.update_at(2).await;
    assert_eq!(after_question.unwrap().len(), 4);

    // The follow-up prompt carries the rendered transcript.
    let prompt = generator.prompt(1).await;
    assert!(prompt.contains("ai: What is a goroutine?"));
    assert!(prompt.contains("user: A goroutine is a lightweight thread."));
    assert!(prompt.contains("next single, relevant technical question"));
}

#[tokio::test]
async fn blank_answers_never_mutate_the_transcript() {
    let generator = ScriptedGenerator::replies(vec![Ok("First question?".to_string())]);
    let store = RecordingStore::new();
    let coordinator = coordinator(generator, Arc::clone(&store), no_capture());

    coordinator
        .start_session("Data Scientist", "SQL")
        .await
        .unwrap();
    let before = coordinator.snapshot().await.unwrap().messages.len();

    assert!(matches!(
        coordinator.submit_answer("").await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        coordinator.submit_answer("   ").await,
        Err(Error::Validation(_))
    ));

    assert_eq!(coordinator.snapshot().await.unwrap().messages.len(), before);
    assert_eq!(store.update_count().await, 1); // only the start sync
}

#[tokio::test]
async fn answer_without_session_is_a_no_op() {
    let store = RecordingStore::new();
    let coordinator = coordinator(ScriptedGenerator::replies(vec![]), Arc::clone(&store), no_capture());

    coordinator.submit_answer("hello?").await.unwrap();

    assert!(coordinator.snapshot().await.is_none());
    assert_eq!(store.update_count().await, 0);
}

#[tokio::test]
async fn generation_failure_keeps_the_answer_and_waits() {
    let generator = ScriptedGenerator::replies(vec![
        Ok("First question?".to_string()),
        Err(Error::Upstream("generation is down".into())),
    ]);
    let coordinator = coordinator(generator, RecordingStore::new(), no_capture());

    coordinator
        .start_session("Backend Developer", "Rust")
        .await
        .unwrap();

    let result = coordinator.submit_answer("Ownership prevents data races.").await;
    assert!(matches!(result, Err(Error::Upstream(_))));

    // The optimistic append is kept; the phase stays awaiting with no
    // automatic retry.
    let session = coordinator.snapshot().await.unwrap();
    assert_eq!(session.messages.len(), 3);
    assert_eq!(session.phase, Phase::Active(ActivePhase::AwaitingAiQuestion));
}

#[tokio::test]
async fn persistence_failure_hands_the_turn_back() {
    let generator = ScriptedGenerator::replies(vec![Ok("First question?".to_string())]);
    let store = RecordingStore::new();
    let coordinator = coordinator(Arc::clone(&generator), Arc::clone(&store), no_capture());

    coordinator
        .start_session("DevOps Engineer", "Terraform")
        .await
        .unwrap();

    store.fail_next_update.store(true, Ordering::SeqCst);
    let result = coordinator.submit_answer("State files describe...").await;
    assert!(matches!(result, Err(Error::Upstream(_))));

    // Local transcript keeps the answer; the candidate can continue.
    let session = coordinator.snapshot().await.unwrap();
    assert_eq!(session.messages.len(), 3);
    assert_eq!(session.phase, Phase::Active(ActivePhase::UserTurn));

    // No question was requested for the failed sync.
    assert_eq!(generator.prompts.lock().await.len(), 1);
}

// ============================================================================
// Listening
// ============================================================================

#[tokio::test]
async fn listening_feeds_recognized_text_through_submit() {
    let generator = ScriptedGenerator::replies(vec![
        Ok("What is a goroutine?".to_string()),
        Ok("How do goroutines communicate?".to_string()),
    ]);
    let capture =
        ScriptedCapture::replies(vec![Ok("A goroutine is a lightweight thread.".to_string())]);
    let coordinator = coordinator(generator, RecordingStore::new(), capture);

    coordinator
        .start_session("Backend Developer", "Go")
        .await
        .unwrap();

    let recognized = coordinator.begin_listening().await.unwrap();
    assert_eq!(recognized, "A goroutine is a lightweight thread.");

    let session = coordinator.snapshot().await.unwrap();
    assert_eq!(session.messages.len(), 4);
    assert_eq!(session.phase, Phase::Active(ActivePhase::UserTurn));
}

#[tokio::test]
async fn capture_error_returns_to_user_turn() {
    let generator = ScriptedGenerator::replies(vec![Ok("First question?".to_string())]);
    let capture = ScriptedCapture::replies(vec![Err(Error::Capture("no speech".into()))]);
    let coordinator = coordinator(generator, RecordingStore::new(), capture);

    coordinator
        .start_session("Frontend Developer", "React")
        .await
        .unwrap();

    let result = coordinator.begin_listening().await;
    assert!(matches!(result, Err(Error::Capture(_))));

    let session = coordinator.snapshot().await.unwrap();
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.phase, Phase::Active(ActivePhase::UserTurn));
}

#[tokio::test]
async fn listening_requires_the_user_turn() {
    let generator =
        ScriptedGenerator::replies(vec![Err(Error::Upstream("generation is down".into()))]);
    let coordinator = coordinator(generator, RecordingStore::new(), no_capture());

    // Question failed, so the session is stuck awaiting; no capture allowed.
    let _ = coordinator.start_session("QA Engineer", "Selenium").await;
    assert!(matches!(
        coordinator.begin_listening().await,
        Err(Error::Validation(_))
    ));
}

// ============================================================================
// endSession / restart
// ============================================================================

#[tokio::test]
async fn end_session_generates_and_stores_feedback() {
    let generator = ScriptedGenerator::replies(vec![
        Ok("What is a goroutine?".to_string()),
        Ok("## Strengths\nClear communicator.".to_string()),
    ]);
    let store = RecordingStore::new();
    let coordinator = coordinator(Arc::clone(&generator), Arc::clone(&store), no_capture());

    coordinator
        .start_session("Backend Developer", "Go")
        .await
        .unwrap();

    let feedback = coordinator.end_session().await.unwrap();
    assert_eq!(feedback, "## Strengths\nClear communicator.");

    let session = coordinator.snapshot().await.unwrap();
    assert_eq!(session.phase, Phase::Feedback);
    assert_eq!(session.feedback, feedback);
    // The closing message was appended before feedback generation.
    assert_eq!(session.messages.len(), 3);
    assert!(session.messages[2].text.contains("generating your feedback"));

    // Syncs: question, closing message, feedback partial.
    assert_eq!(store.update_count().await, 3);
    let (messages, _) = store.update_at(1).await;
    assert_eq!(messages.unwrap().len(), 3);
    let (none_messages, stored_feedback) = store.update_at(2).await;
    assert!(none_messages.is_none());
    assert_eq!(stored_feedback.unwrap(), feedback);

    // The feedback prompt covers the structured review dimensions and the
    // full transcript.
    let prompt = generator.prompt(1).await;
    assert!(prompt.contains("technical knowledge"));
    assert!(prompt.contains("ai: What is a goroutine?"));
}

#[tokio::test]
async fn end_session_is_rejected_outside_active() {
    let generator = ScriptedGenerator::replies(vec![
        Ok("Question?".to_string()),
        Ok("Feedback.".to_string()),
    ]);
    let coordinator = coordinator(generator, RecordingStore::new(), no_capture());

    // Nothing to end yet.
    assert!(matches!(
        coordinator.end_session().await,
        Err(Error::Validation(_))
    ));

    coordinator
        .start_session("Full Stack Developer", "MERN")
        .await
        .unwrap();
    coordinator.end_session().await.unwrap();

    // Re-ending a finished session changes nothing.
    let before = coordinator.snapshot().await.unwrap();
    assert!(matches!(
        coordinator.end_session().await,
        Err(Error::Validation(_))
    ));
    let after = coordinator.snapshot().await.unwrap();
    assert_eq!(after.messages.len(), before.messages.len());
    assert_eq!(after.feedback, before.feedback);
}

#[tokio::test]
async fn restart_discards_the_session() {
    let generator = ScriptedGenerator::replies(vec![
        Ok("Question?".to_string()),
        Ok("Feedback.".to_string()),
    ]);
    let coordinator = coordinator(generator, RecordingStore::new(), no_capture());

    coordinator
        .start_session("Data Scientist", "R")
        .await
        .unwrap();
    coordinator.end_session().await.unwrap();

    coordinator.restart().await;

    assert!(coordinator.snapshot().await.is_none());
    assert_eq!(coordinator.motion().await, 0.0);
}

#[tokio::test]
async fn restart_drops_stale_capture_results() {
    let gate = Arc::new(Notify::new());
    let generator = ScriptedGenerator::replies(vec![Ok("Question?".to_string())]);
    let capture = ScriptedCapture::gated(
        vec![Ok("an answer for a dead session".to_string())],
        Arc::clone(&gate),
    );
    let store = RecordingStore::new();
    let coordinator = Arc::new(coordinator(generator, Arc::clone(&store), capture));

    coordinator
        .start_session("Backend Developer", "Go")
        .await
        .unwrap();

    let listening = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        async move { coordinator.begin_listening().await }
    });
    tokio::task::yield_now().await;

    // Candidate bails while the capture is outstanding.
    coordinator.restart().await;
    gate.notify_one();

    // The late recognition is discarded, not applied.
    assert!(listening.await.unwrap().is_err());
    assert!(coordinator.snapshot().await.is_none());
    assert_eq!(store.update_count().await, 1); // only the start sync
}

#[tokio::test]
async fn restart_drops_stale_generation_results() {
    let gate = Arc::new(Notify::new());
    let generator = ScriptedGenerator::gated(
        vec![Ok("a question for a dead session".to_string())],
        Arc::clone(&gate),
    );
    let store = RecordingStore::new();
    let coordinator = Arc::new(coordinator(generator, Arc::clone(&store), no_capture()));

    let starting = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        async move { coordinator.start_session("Backend Developer", "Go").await }
    });
    tokio::task::yield_now().await;

    // Restart while the first question is still in flight.
    coordinator.restart().await;
    gate.notify_one();

    assert!(starting.await.unwrap().is_err());
    assert!(coordinator.snapshot().await.is_none());
    // The stale question was never synced.
    assert_eq!(store.update_count().await, 0);
}
