//! Instruction payloads for the three generation modes

use jawi_core::{ChatMessage, Document, GenerationMode, GenerationRequest, Query, RetrievalOutcome};

pub const GROUNDED_SYSTEM_PROMPT: &str = "You are JawiAI, an intelligent and precise AI assistant for the Jawi Script. Follow these rules strictly:
1.  **Grounding Rule:** Your answers MUST be based ONLY on the provided 'Context' and the 'Conversation History'. Do not invent information.
2.  **Formatting Rule:** When giving an example, you MUST use the format: Latin (Jawi).
3.  **Follow-up Rule:** If the user asks for 'another' or 'more', provide another example or detail related to the last topic.
4.  **Repetition Handling Rule:** If you find yourself out of new examples from the 'Context', you MUST offer to switch to a creative mode. For example, say: \"I have no more examples for that in my knowledge base. Would you like me to try to **create a new example** for you?\"
5.  **Fallback Rule:** If you cannot answer the question based on the provided context or history, state that you do not have that information.";

pub const GUARDED_SYSTEM_PROMPT: &str = "You are JawiAI, an assistant that ONLY discusses the Jawi script. The user's message seems unclear or off-topic. Politely inform the user that you can only answer questions about the Jawi script and ask them to clarify their question about Jawi.";

pub const GROUNDED_MAX_TOKENS: u32 = 300;
pub const GROUNDED_TEMPERATURE: f32 = 0.5;
pub const GUARDED_MAX_TOKENS: u32 = 1024;
pub const GUARDED_TEMPERATURE: f32 = 0.7;
pub const CREATIVE_MAX_TOKENS: u32 = 150;
pub const CREATIVE_TEMPERATURE: f32 = 0.8;

/// Pick grounded or guarded-fallback mode from the retrieval outcome.
///
/// The final turn always carries `query.text` as typed, even when retrieval
/// ran on the context hint.
pub fn assemble(outcome: &RetrievalOutcome, query: &Query) -> GenerationRequest {
    match outcome {
        RetrievalOutcome::ExactMatch(document)
        | RetrievalOutcome::SemanticMatch { document, .. } => grounded(document, query),
        RetrievalOutcome::NoMatch => guarded_fallback(query),
    }
}

/// Final user turn of a grounded request
pub fn grounded_turn(document: &Document, question: &str) -> String {
    format!("Context:\n---\n{document}\n---\n\nQuestion: {question}")
}

pub fn grounded(document: &Document, query: &Query) -> GenerationRequest {
    let mut messages = Vec::with_capacity(query.history.len() + 2);
    messages.push(ChatMessage::system(GROUNDED_SYSTEM_PROMPT));
    messages.extend(query.history.iter().cloned());
    messages.push(ChatMessage::user(grounded_turn(document, &query.text)));

    GenerationRequest {
        mode: GenerationMode::Grounded,
        messages,
        max_tokens: GROUNDED_MAX_TOKENS,
        temperature: GROUNDED_TEMPERATURE,
    }
}

pub fn guarded_fallback(query: &Query) -> GenerationRequest {
    let mut messages = Vec::with_capacity(query.history.len() + 2);
    messages.push(ChatMessage::system(GUARDED_SYSTEM_PROMPT));
    messages.extend(query.history.iter().cloned());
    messages.push(ChatMessage::user(query.text.clone()));

    GenerationRequest {
        mode: GenerationMode::GuardedFallback,
        messages,
        max_tokens: GUARDED_MAX_TOKENS,
        temperature: GUARDED_TEMPERATURE,
    }
}

/// Wrap a free-form request in the creative-writing template. Single turn,
/// no history, no retrieval.
pub fn creative(request: &str) -> GenerationRequest {
    let content = format!(
        "You are a creative Jawi language teacher. Fulfill the user's request creatively. Include both Latin and Jawi script whenever possible.\nRequest: \"{request}\"\nYour Creative Answer:"
    );

    GenerationRequest {
        mode: GenerationMode::Creative,
        messages: vec![ChatMessage::user(content)],
        max_tokens: CREATIVE_MAX_TOKENS,
        temperature: CREATIVE_TEMPERATURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<ChatMessage> {
        vec![
            ChatMessage::user("what is alif?"),
            ChatMessage::assistant("Alif is the first letter."),
        ]
    }

    #[test]
    fn test_grounded_layout() {
        let document = Document::new("Topic: Origins. Explanation: Arabic script");
        let query = Query::new("where does it come from?").with_history(history());
        let request = assemble(&RetrievalOutcome::ExactMatch(document), &query);

        assert_eq!(request.mode, GenerationMode::Grounded);
        assert_eq!(request.messages.len(), 4);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1..3], history()[..]);
        assert_eq!(request.max_tokens, 300);
        assert_eq!(request.temperature, 0.5);
    }

    #[test]
    fn test_guarded_fallback_forwards_query_unchanged() {
        let query = Query::new("  What is the weather today?").with_history(history());
        let request = assemble(&RetrievalOutcome::NoMatch, &query);

        assert_eq!(request.mode, GenerationMode::GuardedFallback);
        assert_eq!(request.messages.len(), 4);
        let last = request.final_turn().unwrap();
        assert_eq!(last.content, "  What is the weather today?");
        assert!(request.messages.iter().all(|m| !m.content.contains("Context:")));
        assert_eq!((request.max_tokens, request.temperature), (1024, 0.7));
    }

    #[test]
    fn test_creative_is_single_turn() {
        let request = creative("a pantun about cats");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert!(request.messages[0].content.contains("Request: \"a pantun about cats\""));
        assert!(request.temperature > GUARDED_TEMPERATURE);
        assert!(request.max_tokens < GROUNDED_MAX_TOKENS);
    }
}
