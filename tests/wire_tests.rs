// Serialization-shape tests for the types that cross process boundaries:
// transcript messages, store payloads, and phase labels.

use chrono::TimeZone;
use interview_coach::session::{ActivePhase, Message, Phase, Sender};
use interview_coach::store::{InterviewUpdate, NewInterview, StoredInterview};

fn message(sender: Sender, text: &str) -> Message {
    Message {
        sender,
        text: text.to_string(),
        timestamp: chrono::Utc.with_ymd_and_hms(2025, 10, 27, 14, 30, 0).unwrap(),
    }
}

#[test]
fn test_message_serialization() {
    let msg = message(Sender::Ai, "What is a goroutine?");

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"sender\":\"ai\""));
    assert!(json.contains("What is a goroutine?"));
    assert!(json.contains("2025-10-27T14:30:00Z"));

    let deserialized: Message = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.sender, Sender::Ai);
    assert_eq!(deserialized.text, "What is a goroutine?");
}

#[test]
fn test_user_sender_is_lowercase() {
    let json = serde_json::to_string(&message(Sender::User, "hi")).unwrap();
    assert!(json.contains("\"sender\":\"user\""));
}

#[test]
fn test_new_interview_uses_camel_case_tech_stack() {
    let messages = vec![message(Sender::Ai, "Hello!")];
    let new = NewInterview {
        role: "Backend Developer",
        tech_stack: "Go",
        messages: &messages,
    };

    let json = serde_json::to_string(&new).unwrap();
    assert!(json.contains("\"techStack\":\"Go\""));
    assert!(json.contains("\"role\":\"Backend Developer\""));
    assert!(json.contains("\"messages\":["));
}

#[test]
fn test_update_omits_absent_fields() {
    let messages = vec![message(Sender::User, "An answer.")];

    let json = serde_json::to_string(&InterviewUpdate::messages(&messages)).unwrap();
    assert!(json.contains("\"messages\""));
    assert!(!json.contains("\"feedback\""));

    let json = serde_json::to_string(&InterviewUpdate::feedback("## Strengths")).unwrap();
    assert!(json.contains("\"feedback\":\"## Strengths\""));
    assert!(!json.contains("\"messages\""));
}

#[test]
fn test_stored_interview_deserialization() {
    let json = r#"{
        "_id": "671f8b2e9d1c000000000000",
        "role": "Backend Developer",
        "techStack": "Go",
        "messages": [
            { "sender": "ai", "text": "Hello!", "timestamp": "2025-10-27T14:30:00Z" }
        ]
    }"#;

    let stored: StoredInterview = serde_json::from_str(json).unwrap();
    assert_eq!(stored.id, "671f8b2e9d1c000000000000");
    assert_eq!(stored.tech_stack, "Go");
    assert_eq!(stored.messages.len(), 1);
    // Feedback defaults to empty until the session ends.
    assert!(stored.feedback.is_empty());
}

#[test]
fn test_phase_labels_are_stable() {
    assert_eq!(Phase::Setup.label(), "setup");
    assert_eq!(
        Phase::Active(ActivePhase::AwaitingAiQuestion).label(),
        "awaiting_ai_question"
    );
    assert_eq!(Phase::Active(ActivePhase::UserTurn).label(), "user_turn");
    assert_eq!(Phase::Active(ActivePhase::Listening).label(), "listening");
    assert_eq!(
        Phase::Active(ActivePhase::SubmittingAnswer).label(),
        "submitting_answer"
    );
    assert_eq!(Phase::Active(ActivePhase::Ending).label(), "ending");
    assert_eq!(Phase::Feedback.label(), "feedback");
}

#[test]
fn test_only_active_phases_count_as_active() {
    assert!(Phase::Active(ActivePhase::Ending).is_active());
    assert!(!Phase::Setup.is_active());
    assert!(!Phase::Feedback.is_active());
}
