use super::model::{ActivePhase, Message, Phase, Sender, Session};
use crate::ai::{prompts, QuestionGenerator};
use crate::error::{Error, Result};
use crate::motion::{FrameSource, MotionDetector};
use crate::speech::{PlaybackOutcome, SpeechCapture, SpeechPlayback};
use crate::store::{InterviewStore, InterviewUpdate, NewInterview};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Coordinator-level settings
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Candidate display name used in the greeting
    pub candidate_name: String,

    /// Whether motion sampling should run (camera granted and enabled)
    pub video_enabled: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            candidate_name: "Candidate".to_string(),
            video_enabled: true,
        }
    }
}

/// Central orchestrator for one practice interview.
///
/// Owns the `Session` value and its phase exclusively; every mutation goes
/// through coordinator methods, and every transcript/feedback mutation is
/// followed by exactly one store sync. Completions of asynchronous work
/// (generation, capture, playback, persistence) are validated against an
/// epoch bumped by `restart()`, so results that arrive for a discarded
/// session are dropped instead of applied.
pub struct TurnCoordinator {
    config: CoordinatorConfig,
    store: Arc<dyn InterviewStore>,
    generator: Arc<dyn QuestionGenerator>,
    capture: Arc<dyn SpeechCapture>,
    playback: Arc<dyn SpeechPlayback>,
    frames: Arc<dyn FrameSource>,

    session: Mutex<Option<Session>>,
    motion: Mutex<Option<MotionDetector>>,

    /// Bumped on restart/teardown; in-flight completions from an older
    /// epoch are discarded.
    epoch: AtomicU64,

    /// At most one generation request in flight per session
    generating: AtomicBool,

    /// Serializes store writes so updates land in step order
    sync_gate: Mutex<()>,
}

/// Clears the in-flight flag when a generation round ends, unless the
/// session was restarted and the flag now belongs to a newer round.
struct FlightGuard<'a> {
    flag: &'a AtomicBool,
    epoch: &'a AtomicU64,
    acquired_at: u64,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.epoch.load(Ordering::SeqCst) == self.acquired_at {
            self.flag.store(false, Ordering::SeqCst);
        }
    }
}

impl TurnCoordinator {
    pub fn new(
        config: CoordinatorConfig,
        store: Arc<dyn InterviewStore>,
        generator: Arc<dyn QuestionGenerator>,
        capture: Arc<dyn SpeechCapture>,
        playback: Arc<dyn SpeechPlayback>,
        frames: Arc<dyn FrameSource>,
    ) -> Self {
        Self {
            config,
            store,
            generator,
            capture,
            playback,
            frames,
            session: Mutex::new(None),
            motion: Mutex::new(None),
            epoch: AtomicU64::new(0),
            generating: AtomicBool::new(false),
            sync_gate: Mutex::new(()),
        }
    }

    /// Start a new practice interview.
    ///
    /// Persists the session with its greeting, installs it, then requests
    /// the first question. A generation failure is surfaced but does not
    /// roll back session creation: the session stays installed in
    /// `awaiting_ai_question` with the greeting on record.
    pub async fn start_session(&self, role: &str, tech_stack: &str) -> Result<Session> {
        let role = role.trim();
        let tech_stack = tech_stack.trim();
        if role.is_empty() || tech_stack.is_empty() {
            return Err(Error::Validation(
                "Please select a role and tech stack.".into(),
            ));
        }

        if self.session.lock().await.is_some() {
            return Err(Error::Validation(
                "An interview is already in progress.".into(),
            ));
        }

        let epoch = self.current_epoch();
        let greeting = Message::new(
            Sender::Ai,
            prompts::greeting(&self.config.candidate_name, role, tech_stack),
        );

        let stored = self
            .store
            .create(NewInterview {
                role,
                tech_stack,
                messages: std::slice::from_ref(&greeting),
            })
            .await?;

        info!("Interview {} started ({}, {})", stored.id, role, tech_stack);

        {
            let mut session = self.session.lock().await;
            if self.current_epoch() != epoch {
                return Err(Error::Validation("The session was restarted.".into()));
            }
            *session = Some(Session::new(
                stored.id,
                role.to_string(),
                tech_stack.to_string(),
                greeting.clone(),
            ));
        }

        self.start_motion().await;

        // The greeting is fire-and-forget: its completion never drives a
        // phase transition, and the first question may interrupt it.
        let playback = Arc::clone(&self.playback);
        let greeting_text = greeting.text;
        tokio::spawn(async move {
            let _ = playback.speak(&greeting_text).await;
        });

        let first = self
            .run_question_round(epoch, prompts::first_question(role, tech_stack))
            .await;

        let snapshot = self
            .snapshot()
            .await
            .ok_or_else(|| Error::Validation("The session was restarted.".into()))?;
        first.map(|_| snapshot)
    }

    /// Submit a typed (or recognized) answer.
    ///
    /// No-op when a generation request is already in flight or no active
    /// session is awaiting the candidate; rejected outright when the text
    /// is empty or whitespace.
    pub async fn submit_answer(&self, text: &str) -> Result<()> {
        let answer = text.trim();
        if answer.is_empty() {
            return Err(Error::Validation("Answer is empty.".into()));
        }
        if self.generating.load(Ordering::SeqCst) {
            warn!("Ignoring answer: a generation request is in flight");
            return Ok(());
        }

        let epoch = self.current_epoch();

        // Optimistic append, only while the candidate holds the turn.
        let appended = {
            let mut session = self.session.lock().await;
            match session.as_mut() {
                Some(s)
                    if matches!(
                        s.phase,
                        Phase::Active(ActivePhase::UserTurn)
                            | Phase::Active(ActivePhase::Listening)
                    ) =>
                {
                    s.phase = Phase::Active(ActivePhase::SubmittingAnswer);
                    let snapshot = s.push_message(Message::new(Sender::User, answer));
                    Some((s.id.clone(), snapshot))
                }
                _ => None,
            }
        };
        let Some((id, messages)) = appended else {
            warn!("Ignoring answer: no active session awaiting the candidate");
            return Ok(());
        };

        if let Err(e) = self.sync_messages(&id, &messages).await {
            error!("Transcript update failed after answer: {}", e);
            // The local transcript keeps the answer; hand the turn back so
            // the candidate can continue. Store divergence is accepted.
            self.mutate(epoch, |s| s.phase = Phase::Active(ActivePhase::UserTurn))
                .await;
            return Err(e);
        }

        self.run_question_round(epoch, prompts::next_question(&messages))
            .await
    }

    /// Run one voice round: flip to listening, capture a single utterance,
    /// and feed it through the submit path. Returns the recognized text.
    pub async fn begin_listening(&self) -> Result<String> {
        let epoch = self.current_epoch();

        let flipped = self
            .mutate(epoch, |s| {
                if s.phase == Phase::Active(ActivePhase::UserTurn) {
                    s.phase = Phase::Active(ActivePhase::Listening);
                    true
                } else {
                    false
                }
            })
            .await
            .unwrap_or(false);
        if !flipped {
            return Err(Error::Validation("It is not the candidate's turn.".into()));
        }

        match self.capture.capture().await {
            Ok(text) => {
                if self.current_epoch() != epoch {
                    info!("Dropping utterance captured for a discarded session");
                    return Err(Error::Validation("The session was restarted.".into()));
                }
                self.submit_answer(&text).await.map(|_| text)
            }
            Err(e) => {
                // All capture failures are treated identically: back to the
                // candidate's turn, error surfaced, no automatic retry.
                self.mutate(epoch, |s| {
                    if s.phase == Phase::Active(ActivePhase::Listening) {
                        s.phase = Phase::Active(ActivePhase::UserTurn);
                    }
                })
                .await;
                Err(e)
            }
        }
    }

    /// End the interview: closing message, feedback generation, terminal
    /// phase. Returns the feedback text.
    pub async fn end_session(&self) -> Result<String> {
        let epoch = self.current_epoch();

        let Some(_flight) = self.begin_flight() else {
            return Err(Error::Validation(
                "The interviewer is still responding.".into(),
            ));
        };

        let entered = {
            let mut session = self.session.lock().await;
            match session.as_mut() {
                Some(s) if s.phase.is_active() && s.phase != Phase::Active(ActivePhase::Ending) => {
                    s.phase = Phase::Active(ActivePhase::Ending);
                    let snapshot = s.push_message(Message::new(Sender::Ai, prompts::CLOSING_MESSAGE));
                    Some((s.id.clone(), snapshot))
                }
                _ => None,
            }
        };
        let Some((id, messages)) = entered else {
            return Err(Error::Validation("No interview to end.".into()));
        };

        info!("Ending interview {}", id);

        // Nothing keeps talking once the candidate ends the interview.
        self.playback.cancel().await;

        let closing_sync = self.sync_messages(&id, &messages).await;
        if let Err(e) = &closing_sync {
            error!("Transcript update failed for closing message: {}", e);
        }

        let feedback = match self.generator.generate(&prompts::feedback(&messages)).await {
            Ok(text) => text,
            Err(e) => {
                // Remain in `ending`; recovery is restart().
                error!("Feedback generation failed: {}", e);
                return Err(e);
            }
        };

        let applied = self
            .mutate(epoch, |s| {
                s.feedback = feedback.clone();
            })
            .await;
        if applied.is_none() {
            info!("Dropping feedback generated for a discarded session");
            return Err(Error::Validation("The session was restarted.".into()));
        }

        let feedback_sync = {
            let _gate = self.sync_gate.lock().await;
            self.store
                .update(&id, InterviewUpdate::feedback(&feedback))
                .await
        };
        if let Err(e) = &feedback_sync {
            error!("Feedback update failed: {}", e);
        }

        // Terminal regardless of persistence: in-memory state is
        // authoritative, divergence is accepted.
        self.mutate(epoch, |s| s.phase = Phase::Feedback).await;
        self.stop_motion().await;

        info!("Interview {} reached feedback", id);
        closing_sync.and(feedback_sync).map(|_| feedback)
    }

    /// Discard the session and all in-flight request state; back to setup.
    pub async fn restart(&self) {
        info!("Restarting: discarding session and in-flight work");

        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.generating.store(false, Ordering::SeqCst);
        self.playback.cancel().await;
        self.stop_motion().await;
        *self.session.lock().await = None;
    }

    /// Clone of the current session, if one is installed
    pub async fn snapshot(&self) -> Option<Session> {
        self.session.lock().await.clone()
    }

    /// Latest motion percentage (0 when idle or degraded)
    pub async fn motion(&self) -> f64 {
        match self.motion.lock().await.as_ref() {
            Some(detector) => detector.latest(),
            None => 0.0,
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn begin_flight(&self) -> Option<FlightGuard<'_>> {
        if self.generating.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(FlightGuard {
            flag: &self.generating,
            epoch: &self.epoch,
            acquired_at: self.current_epoch(),
        })
    }

    /// Apply `f` to the live session unless the epoch has moved on.
    /// Returns `None` when the session is gone or was restarted.
    async fn mutate<T>(&self, epoch: u64, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        let mut session = self.session.lock().await;
        if self.current_epoch() != epoch {
            return None;
        }
        session.as_mut().map(f)
    }

    /// One transcript sync per mutation, serialized so writes land in
    /// step order.
    async fn sync_messages(&self, id: &str, messages: &[Message]) -> Result<()> {
        let _gate = self.sync_gate.lock().await;
        self.store
            .update(id, InterviewUpdate::messages(messages))
            .await
    }

    /// One question round: generate, append, persist, speak, hand over.
    ///
    /// On generation failure the phase stays `awaiting_ai_question` and the
    /// error surfaces (no automatic retry). A persistence failure after the
    /// append is surfaced too, but the round still completes: the question
    /// is spoken and the turn passes to the candidate.
    async fn run_question_round(&self, epoch: u64, prompt: String) -> Result<()> {
        let Some(_flight) = self.begin_flight() else {
            warn!("Ignoring question request: one is already in flight");
            return Ok(());
        };

        self.mutate(epoch, |s| {
            s.phase = Phase::Active(ActivePhase::AwaitingAiQuestion)
        })
        .await;

        let question = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!("Question generation failed: {}", e);
                return Err(e);
            }
        };

        let appended = self
            .mutate(epoch, |s| {
                let snapshot = s.push_message(Message::new(Sender::Ai, question.clone()));
                (s.id.clone(), snapshot)
            })
            .await;
        let Some((id, messages)) = appended else {
            info!("Dropping question generated for a discarded session");
            return Ok(());
        };

        let sync = self.sync_messages(&id, &messages).await;
        if let Err(e) = &sync {
            error!("Transcript update failed after AI question: {}", e);
        }

        // Hand the turn over only once the question has been spoken in
        // full; an interrupted utterance leaves the transition to whoever
        // interrupted it.
        let outcome = self.playback.speak(&question).await?;
        if outcome == PlaybackOutcome::Completed {
            self.mutate(epoch, |s| {
                if s.phase == Phase::Active(ActivePhase::AwaitingAiQuestion) {
                    s.phase = Phase::Active(ActivePhase::UserTurn);
                }
            })
            .await;
        }

        sync
    }

    async fn start_motion(&self) {
        let detector = if self.config.video_enabled {
            MotionDetector::start(Arc::clone(&self.frames))
        } else {
            MotionDetector::degraded()
        };
        *self.motion.lock().await = Some(detector);
    }

    async fn stop_motion(&self) {
        let detector = self.motion.lock().await.take();
        if let Some(detector) = detector {
            detector.stop().await;
        }
    }
}
