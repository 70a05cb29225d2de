use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The automated interviewer
    Ai,
    /// The human candidate
    User,
}

impl Sender {
    /// Wire/prompt label ("ai" or "user")
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::Ai => "ai",
            Sender::User => "user",
        }
    }
}

/// One turn of the conversation; append-only, immutable once appended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Which party produced this message
    pub sender: Sender,

    /// Message text
    pub text: String,

    /// When the message was appended (insertion order equals timestamp order)
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Subphase while an interview is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePhase {
    /// A generation request for the next question is in flight
    AwaitingAiQuestion,
    /// The candidate may type or trigger voice capture
    UserTurn,
    /// A speech capture is outstanding
    Listening,
    /// The candidate's answer is being persisted
    SubmittingAnswer,
    /// The closing/feedback round is running
    Ending,
}

/// Session state machine phase
///
/// `Setup → Active(..) → Feedback`, with restart discarding the session and
/// returning to `Setup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Active(ActivePhase),
    Feedback,
}

impl Phase {
    /// Stable snake_case label for the status endpoint
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Active(ActivePhase::AwaitingAiQuestion) => "awaiting_ai_question",
            Phase::Active(ActivePhase::UserTurn) => "user_turn",
            Phase::Active(ActivePhase::Listening) => "listening",
            Phase::Active(ActivePhase::SubmittingAnswer) => "submitting_answer",
            Phase::Active(ActivePhase::Ending) => "ending",
            Phase::Feedback => "feedback",
        }
    }

    /// Whether the interview is running (any `Active` subphase)
    pub fn is_active(&self) -> bool {
        matches!(self, Phase::Active(_))
    }
}

/// One practice interview: role, tech stack, transcript, feedback, phase
///
/// Owned exclusively by the turn coordinator for the lifetime of one
/// practice session; discarded on restart.
#[derive(Debug, Clone)]
pub struct Session {
    /// Store-assigned identifier, opaque and stable for the session's lifetime
    pub id: String,

    /// Target role (e.g. "Backend Developer")
    pub role: String,

    /// Target tech stack (e.g. "Go")
    pub tech_stack: String,

    /// Ordered conversation transcript; grows monotonically while active
    pub messages: Vec<Message>,

    /// Final review text; empty until the session reaches `Feedback`
    pub feedback: String,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// Current state machine phase
    pub phase: Phase,
}

impl Session {
    pub fn new(id: String, role: String, tech_stack: String, greeting: Message) -> Self {
        Self {
            id,
            role,
            tech_stack,
            messages: vec![greeting],
            feedback: String::new(),
            started_at: Utc::now(),
            phase: Phase::Active(ActivePhase::AwaitingAiQuestion),
        }
    }

    /// Append a message and return a snapshot of the updated transcript
    /// for the persistence call that must follow every mutation.
    pub fn push_message(&mut self, message: Message) -> Vec<Message> {
        self.messages.push(message);
        self.messages.clone()
    }

    /// Seconds elapsed since the session started
    pub fn duration_secs(&self) -> f64 {
        let elapsed = Utc::now().signed_duration_since(self.started_at);
        elapsed.num_milliseconds() as f64 / 1000.0
    }
}
