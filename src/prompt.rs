//! Car-repair prompt assembly for the chat completions backend.

use crate::llm::{ChatMessage, Role};

/// How many prior messages are sent upstream as conversation context.
pub const CONTEXT_MESSAGES: usize = 10;

/// System instructions for the automotive assistant.
pub const SYSTEM_PROMPT: &str = "\
You are an expert automotive mechanic and car repair assistant. Your role is \
to help users diagnose car problems, provide repair guidance, and offer \
automotive advice.

Guidelines:
- Always prioritize safety first
- Provide step-by-step instructions when appropriate
- Explain technical terms in simple language
- Suggest when professional help is needed
- Ask clarifying questions to better diagnose issues
- Provide cost estimates when possible
- Cover all car makes and models
- Include both DIY solutions and professional repair options

When responding:
1. Acknowledge the user's problem
2. Ask clarifying questions if needed
3. Provide possible diagnoses
4. Suggest troubleshooting steps
5. Recommend next actions (DIY or professional)
6. Include safety warnings when relevant";

/// Build the upstream message list for one conversation turn.
///
/// The system prompt comes first, followed by up to [`CONTEXT_MESSAGES`]
/// of the most recent history in order, then the current user message.
pub fn build_messages(history: &[ChatMessage], user_message: &str) -> Vec<ChatMessage> {
    let context_start = history.len().saturating_sub(CONTEXT_MESSAGES);

    let mut messages = Vec::with_capacity(history.len() - context_start + 2);
    messages.push(ChatMessage::new(Role::System, SYSTEM_PROMPT));
    messages.extend_from_slice(&history[context_start..]);
    messages.push(ChatMessage::new(Role::User, user_message));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(n: usize) -> Vec<ChatMessage> {
        (0..n)
            .map(|i| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                ChatMessage::new(role, format!("message {}", i))
            })
            .collect()
    }

    #[test]
    fn system_prompt_comes_first_and_user_message_last() {
        let messages = build_messages(&exchange(4), "my brakes squeal");
        assert_eq!(messages.first().unwrap().role, Role::System);
        assert_eq!(messages.last().unwrap().content, "my brakes squeal");
        assert_eq!(messages.len(), 6);
    }

    #[test]
    fn history_is_capped_to_most_recent_context() {
        let messages = build_messages(&exchange(30), "still stalling");
        // system + CONTEXT_MESSAGES + current user message
        assert_eq!(messages.len(), CONTEXT_MESSAGES + 2);
        // Oldest entries were dropped, most recent kept.
        assert_eq!(messages[1].content, "message 20");
        assert_eq!(messages[CONTEXT_MESSAGES].content, "message 29");
    }

    #[test]
    fn empty_history_yields_system_and_user_only() {
        let messages = build_messages(&[], "engine light is on");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }
}
