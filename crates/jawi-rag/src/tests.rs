//! Orchestrator tests with fake embedding, index and generation services

#[cfg(test)]
mod fakes {
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::HashEmbedder;
    use jawi_core::{
        DocumentId, Embedder, Error, GenerationRequest, Generator, Neighbor, Result,
        SimilarityIndex,
    };

    /// Hash embedder that counts how often it is asked for a vector
    pub struct CountingEmbedder {
        inner: HashEmbedder,
        calls: AtomicUsize,
    }

    impl CountingEmbedder {
        pub fn new(dimensions: usize) -> Self {
            Self {
                inner: HashEmbedder::new(dimensions),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed(text).await
        }

        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }

        fn name(&self) -> &str {
            self.inner.name()
        }
    }

    /// Index that answers every lookup with document 0 at a fixed distance
    pub struct FixedDistanceIndex {
        pub size: usize,
        pub dimensions: usize,
        pub distance: f32,
    }

    impl SimilarityIndex for FixedDistanceIndex {
        fn len(&self) -> usize {
            self.size
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        fn nearest(&self, _vector: &[f32], k: usize) -> Result<Vec<Neighbor>> {
            let id: DocumentId = 0;
            Ok(std::iter::once(Neighbor {
                distance: self.distance,
                id,
            })
            .take(k.min(self.size))
            .collect())
        }
    }

    /// Generator that records every payload and replays a canned reply
    pub struct RecordingGenerator {
        reply: std::result::Result<String, String>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl RecordingGenerator {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(Error::Delegate)
        }

        fn model_id(&self) -> &str {
            "recording"
        }
    }
}

#[cfg(test)]
mod orchestrator_tests {
    use std::sync::Arc;

    use super::fakes::{CountingEmbedder, FixedDistanceIndex, RecordingGenerator};
    use crate::{
        Document, Error, FlatL2Index, GenerationMode, KnowledgeBase, KnowledgeCompiler, Query,
        RetrievalOrchestrator, RetrievalOutcome, RetrievalTier, parse_records,
    };
    use jawi_core::ChatMessage;

    const SOURCE: &str = r#"[
        {"type": "general_topic", "topic": "History of Jawi", "content": "Jawi script came to the Malay world with Islam."},
        {"type": "letter", "name": "Ca Final", "character": "چ", "info": "Ca at the end of a word.", "latin_example": "kucing", "jawi_example": "کوچيڠ"},
        {"type": "letter", "name": "Nga", "character": "ڠ", "info": "Velar nasal.", "latin_example": "bunga", "jawi_example": "بوڠا"}
    ]"#;

    struct Harness {
        orchestrator: RetrievalOrchestrator,
        embedder: Arc<CountingEmbedder>,
        generator: Arc<RecordingGenerator>,
    }

    async fn compiled_knowledge() -> KnowledgeBase {
        let records = parse_records(SOURCE).unwrap();
        let compiled = KnowledgeCompiler::new(Arc::new(CountingEmbedder::new(64)))
            .compile(&records)
            .await
            .unwrap();
        KnowledgeBase::from_compiled(compiled).unwrap()
    }

    fn harness(knowledge: KnowledgeBase, generator: RecordingGenerator) -> Harness {
        let embedder = Arc::new(CountingEmbedder::new(64));
        let generator = Arc::new(generator);
        let orchestrator =
            RetrievalOrchestrator::new(Arc::new(knowledge), embedder.clone(), generator.clone());
        Harness {
            orchestrator,
            embedder,
            generator,
        }
    }

    fn far_away_knowledge(distance: f32) -> KnowledgeBase {
        let index = FixedDistanceIndex {
            size: 1,
            dimensions: 64,
            distance,
        };
        KnowledgeBase::from_parts(
            vec![Document::new("Topic: History of Jawi. Explanation: Islam")],
            Box::new(index),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_exact_match_skips_semantic_search() {
        let h = harness(compiled_knowledge().await, RecordingGenerator::replying("ok"));

        for text in ["ca final", "Ca Final", "  CA FINAL\t", "nga"] {
            let (outcome, _) = h.orchestrator.prepare(&Query::new(text)).await.unwrap();
            assert_eq!(outcome.tier(), RetrievalTier::Exact, "{text}");
        }
        assert_eq!(h.embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_ca_final_scenario() {
        let h = harness(
            compiled_knowledge().await,
            RecordingGenerator::replying("  Ca Final is چ.\n"),
        );

        let answer = h.orchestrator.answer(&Query::new("ca final")).await.unwrap();
        assert_eq!(answer.response, "Ca Final is چ.");
        assert_eq!(answer.tier, RetrievalTier::Exact);
        assert_eq!(answer.distance, None);

        let requests = h.generator.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].mode, GenerationMode::Grounded);

        let document = h.orchestrator.knowledge().exact_match("ca final").unwrap();
        let last = &requests[0].final_turn().unwrap().content;
        let context_at = last.find("Context:").unwrap();
        let document_at = last.find(document.as_str()).unwrap();
        let question_at = last.find("Question: ca final").unwrap();
        assert!(context_at < document_at && document_at < question_at);
    }

    #[tokio::test]
    async fn test_hint_drives_retrieval_but_not_the_question() {
        let h = harness(compiled_knowledge().await, RecordingGenerator::replying("ok"));
        let query = Query::new("How do I write it?").with_context_hint("Nga");

        let (outcome, request) = h.orchestrator.prepare(&query).await.unwrap();
        assert_eq!(outcome.tier(), RetrievalTier::Exact);
        assert!(outcome.document().unwrap().as_str().starts_with("Letter name: Nga."));

        let last = &request.final_turn().unwrap().content;
        assert!(last.ends_with("Question: How do I write it?"));
        assert!(!last.contains("Question: Nga"));
    }

    #[tokio::test]
    async fn test_blank_hint_uses_query_text() {
        let h = harness(compiled_knowledge().await, RecordingGenerator::replying("ok"));
        let query = Query::new("Ca Final").with_context_hint("   ");

        let (outcome, _) = h.orchestrator.prepare(&query).await.unwrap();
        assert_eq!(outcome.tier(), RetrievalTier::Exact);
    }

    #[tokio::test]
    async fn test_distant_neighbor_falls_back_without_context() {
        let h = harness(
            far_away_knowledge(1.5),
            RecordingGenerator::replying("Please ask about Jawi."),
        );
        let history = vec![
            ChatMessage::user("hello"),
            ChatMessage::assistant("Hi! Ask me about Jawi."),
        ];
        let query = Query::new("What is the weather today?").with_history(history.clone());

        let answer = h.orchestrator.answer(&query).await.unwrap();
        assert_eq!(answer.tier, RetrievalTier::None);
        assert_eq!(h.embedder.calls(), 1);

        let request = &h.generator.requests()[0];
        assert_eq!(request.mode, GenerationMode::GuardedFallback);
        assert!(request.messages.iter().all(|m| !m.content.contains("Context:")));
        assert_eq!(request.messages[1..3], history[..]);
        assert_eq!(request.final_turn().unwrap().content, "What is the weather today?");
    }

    #[tokio::test]
    async fn test_close_neighbor_is_semantic_match() {
        let h = harness(far_away_knowledge(0.4), RecordingGenerator::replying("ok"));

        let answer = h.orchestrator.answer(&Query::new("where did jawi come from?")).await.unwrap();
        assert_eq!(answer.tier, RetrievalTier::Semantic);
        assert_eq!(answer.distance, Some(0.4));
        assert_eq!(h.generator.requests()[0].mode, GenerationMode::Grounded);
    }

    #[tokio::test]
    async fn test_threshold_is_configurable() {
        let h = harness(far_away_knowledge(0.4), RecordingGenerator::replying("ok"));
        let orchestrator = h.orchestrator.with_relevance_threshold(0.3);
        assert_eq!(orchestrator.relevance_threshold(), 0.3);

        let (outcome, _) = orchestrator.prepare(&Query::new("jawi history")).await.unwrap();
        assert_eq!(outcome, RetrievalOutcome::NoMatch);
    }

    #[tokio::test]
    async fn test_empty_knowledge_base_never_embeds() {
        let empty = KnowledgeBase::from_parts(Vec::new(), Box::new(FlatL2Index::new(64))).unwrap();
        let h = harness(empty, RecordingGenerator::replying("ok"));

        let (outcome, request) = h.orchestrator.prepare(&Query::new("alif")).await.unwrap();
        assert_eq!(outcome, RetrievalOutcome::NoMatch);
        assert_eq!(request.mode, GenerationMode::GuardedFallback);
        assert_eq!(h.embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_query_reaches_nothing() {
        let h = harness(compiled_knowledge().await, RecordingGenerator::replying("ok"));

        let err = h.orchestrator.answer(&Query::new("  \n")).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.to_string(), "Validation error: Query not found");
        assert_eq!(h.embedder.calls(), 0);
        assert!(h.generator.requests().is_empty());

        let err = h.orchestrator.create("").await.unwrap_err();
        assert!(err.is_client_error());
        assert!(h.generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_delegate_failure_is_not_retried() {
        let h = harness(
            compiled_knowledge().await,
            RecordingGenerator::failing("request timed out after 60s"),
        );

        let err = h.orchestrator.answer(&Query::new("ca final")).await.unwrap_err();
        assert!(matches!(err, Error::Delegate(_)));
        assert!(err.to_string().contains("timed out"));
        assert_eq!(h.generator.requests().len(), 1);

        // The orchestrator is still usable for the next request.
        let _ = h.orchestrator.answer(&Query::new("nga")).await;
        assert_eq!(h.generator.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_completion_is_a_delegate_error() {
        let h = harness(compiled_knowledge().await, RecordingGenerator::replying(" \n "));
        let err = h.orchestrator.answer(&Query::new("nga")).await.unwrap_err();
        assert!(matches!(err, Error::Delegate(_)));
    }

    #[tokio::test]
    async fn test_creative_bypasses_retrieval() {
        let h = harness(
            compiled_knowledge().await,
            RecordingGenerator::replying("\nKucing (کوچيڠ)\n"),
        );

        let text = h.orchestrator.create("ca final").await.unwrap();
        assert_eq!(text, "Kucing (کوچيڠ)");
        assert_eq!(h.embedder.calls(), 0);

        let requests = h.generator.requests();
        assert_eq!(requests[0].mode, GenerationMode::Creative);
        assert_eq!(requests[0].messages.len(), 1);
        assert!(!requests[0].messages[0].content.contains("Context:"));
    }
}

#[cfg(test)]
mod compiler_tests {
    use std::sync::Arc;

    use crate::{
        HashEmbedder, KnowledgeBase, KnowledgeCompiler, flatten, letter_key, parse_records,
    };
    use jawi_core::normalize_key;

    const SOURCE: &str = r#"[
        {"type": "letter", "name": "Alif", "character": "ا"},
        {"type": "letter", "name": "Ca Final", "latinExample": "kucing", "jawiExample": "کوچيڠ"},
        {"type": "general_topic", "topic": "Usage", "content": "Signboards and religious texts."}
    ]"#;

    #[test]
    fn test_letter_names_round_trip_through_documents() {
        for record in parse_records(SOURCE).unwrap() {
            let document = flatten(&record);
            match record {
                jawi_core::KnowledgeRecord::Letter(letter) => {
                    assert_eq!(letter_key(&document), Some(normalize_key(&letter.name)));
                }
                jawi_core::KnowledgeRecord::Topic(_) => assert_eq!(letter_key(&document), None),
            }
        }
    }

    #[tokio::test]
    async fn test_compile_file_twice_publishes_the_same_documents() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("jawi_knowledge.json");
        let documents_path = dir.path().join("documents.json");
        let index_path = dir.path().join("jawi_index.json");
        std::fs::write(&source, SOURCE).unwrap();

        let embedder = HashEmbedder::new(48);
        let compiler = KnowledgeCompiler::new(Arc::new(embedder.clone()));

        let first = compiler.compile_file(&source, &documents_path, &index_path).await.unwrap();
        let first_docs = std::fs::read_to_string(&documents_path).unwrap();
        let second = compiler.compile_file(&source, &documents_path, &index_path).await.unwrap();
        let second_docs = std::fs::read_to_string(&documents_path).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_docs, second_docs);
        assert_eq!(first.documents, 3);

        let kb = KnowledgeBase::load(&documents_path, &index_path, &embedder).unwrap();
        assert_eq!(kb.exact_match_index().len(), 2);
        assert!(kb.exact_match("alif").unwrap().as_str().contains("ا"));
    }
}

#[cfg(test)]
mod snapshot_tests {
    use crate::{GROUNDED_SYSTEM_PROMPT, GUARDED_SYSTEM_PROMPT, creative, grounded_turn};
    use insta::assert_snapshot;
    use jawi_core::{Document, KnowledgeRecord, LetterRecord};

    #[test]
    fn test_grounded_turn_snapshot() {
        let document = crate::flatten(&KnowledgeRecord::Letter(LetterRecord {
            name: "Ca Final".to_string(),
            character: Some("چ".to_string()),
            info: "Ca at the end of a word.".to_string(),
            latin_example: Some("kucing".to_string()),
            jawi_example: Some("کوچيڠ".to_string()),
        }));

        assert_snapshot!(grounded_turn(&document, "ca final"), @r###"
        Context:
        ---
        Letter name: Ca Final. Jawi character form: چ. Info: Ca at the end of a word. Example word in Latin is 'kucing' and in Jawi is 'کوچيڠ'.
        ---

        Question: ca final
        "###);
    }

    #[test]
    fn test_creative_prompt_snapshot() {
        let request = creative("Write a sentence with the word 'kucing'");
        assert_eq!((request.max_tokens, request.temperature), (150, 0.8));

        assert_snapshot!(request.messages[0].content, @r###"
        You are a creative Jawi language teacher. Fulfill the user's request creatively. Include both Latin and Jawi script whenever possible.
        Request: "Write a sentence with the word 'kucing'"
        Your Creative Answer:
        "###);
    }

    #[test]
    fn test_grounded_document_is_verbatim() {
        let document = Document::new("Topic: a. Explanation: b");
        assert!(grounded_turn(&document, "q").contains("---\nTopic: a. Explanation: b\n---"));
    }

    #[test]
    fn test_grounded_system_prompt_snapshot() {
        assert_snapshot!(GROUNDED_SYSTEM_PROMPT, @r###"
        You are JawiAI, an intelligent and precise AI assistant for the Jawi Script. Follow these rules strictly:
        1.  **Grounding Rule:** Your answers MUST be based ONLY on the provided 'Context' and the 'Conversation History'. Do not invent information.
        2.  **Formatting Rule:** When giving an example, you MUST use the format: Latin (Jawi).
        3.  **Follow-up Rule:** If the user asks for 'another' or 'more', provide another example or detail related to the last topic.
        4.  **Repetition Handling Rule:** If you find yourself out of new examples from the 'Context', you MUST offer to switch to a creative mode. For example, say: "I have no more examples for that in my knowledge base. Would you like me to try to **create a new example** for you?"
        5.  **Fallback Rule:** If you cannot answer the question based on the provided context or history, state that you do not have that information.
        "###);
    }

    #[test]
    fn test_guarded_system_prompt_snapshot() {
        assert_snapshot!(GUARDED_SYSTEM_PROMPT, @"You are JawiAI, an assistant that ONLY discusses the Jawi script. The user's message seems unclear or off-topic. Politely inform the user that you can only answer questions about the Jawi script and ask them to clarify their question about Jawi.");
    }
}
