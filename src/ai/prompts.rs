use crate::session::Message;

/// Closing line appended when the candidate ends the interview
pub const CLOSING_MESSAGE: &str =
    "Thank you for your time. I'm now generating your feedback...";

/// Opening line spoken when the session starts
pub fn greeting(candidate: &str, role: &str, tech_stack: &str) -> String {
    format!(
        "Hello {}! I'll be your interviewer today for a {} position focusing on {}. Let's begin.",
        candidate, role, tech_stack
    )
}

/// Prompt for the very first question, before any candidate input exists
pub fn first_question(role: &str, tech_stack: &str) -> String {
    format!(
        "You are a technical interviewer. Start an interview for a {} position on {}. \
         Ask the first question.",
        role, tech_stack
    )
}

/// Render the conversation as `sender: text` lines joined by newlines
pub fn transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.sender.as_str(), m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt for the next question, built over the full transcript
pub fn next_question(messages: &[Message]) -> String {
    format!(
        "This is a technical interview. Here is the transcript so far:\n{}\n\n\
         Based on the candidate's last answer, ask the next single, relevant technical question.",
        transcript(messages)
    )
}

/// Prompt for the structured end-of-interview review
pub fn feedback(messages: &[Message]) -> String {
    format!(
        "The interview is over. Here is the transcript:\n{}\n\n\
         Provide a detailed performance review in Markdown format. Cover technical knowledge, \
         problem-solving skills, and communication. Include strengths, weaknesses, and areas \
         for improvement.",
        transcript(messages)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Sender;

    #[test]
    fn transcript_renders_sender_prefixed_lines() {
        let messages = vec![
            Message::new(Sender::Ai, "What is ownership?"),
            Message::new(Sender::User, "A move semantics model."),
        ];

        let rendered = transcript(&messages);
        assert_eq!(
            rendered,
            "ai: What is ownership?\nuser: A move semantics model."
        );
    }

    #[test]
    fn next_question_prompt_contains_transcript_and_instruction() {
        let messages = vec![Message::new(Sender::Ai, "Hello!")];
        let prompt = next_question(&messages);

        assert!(prompt.contains("ai: Hello!"));
        assert!(prompt.contains("next single, relevant technical question"));
    }

    #[test]
    fn feedback_prompt_requests_structured_review() {
        let prompt = feedback(&[Message::new(Sender::User, "Done.")]);

        assert!(prompt.contains("technical knowledge"));
        assert!(prompt.contains("problem-solving"));
        assert!(prompt.contains("communication"));
    }

    #[test]
    fn greeting_names_role_and_stack() {
        let text = greeting("Candidate", "Backend Developer", "Go");
        assert!(text.contains("Backend Developer"));
        assert!(text.contains("Go"));
    }
}
