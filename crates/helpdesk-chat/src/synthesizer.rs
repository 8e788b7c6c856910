//! Document-grounded answers from the completion service.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::completion::{CompletionError, CompletionRequest, CompletionService};
use crate::document::{DocumentCache, DocumentContent};

/// Outcome of answering one free-text question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Synthesis {
    /// Text returned by the service, unmodified.
    Answered(String),
    /// No reference document is loaded; the service was not called.
    NotAvailable,
    /// The service responded without usable text.
    NotFound,
    /// The call failed or the response deviated from the schema.
    Failed(CompletionError),
}

/// Answers questions using only the cached reference document.
pub struct AnswerSynthesizer<C> {
    service: C,
    document: Arc<DocumentCache>,
}

impl<C: CompletionService> AnswerSynthesizer<C> {
    pub fn new(service: C, document: Arc<DocumentCache>) -> Self {
        Self { service, document }
    }

    /// Whether a reference document is currently loaded.
    pub fn has_document(&self) -> bool {
        self.document.current().is_available()
    }

    /// Answer `question` from the reference document.
    pub async fn answer(&self, question: &str) -> Synthesis {
        let document = match self.document.current() {
            DocumentContent::Available(text) => text,
            DocumentContent::Unavailable => return Synthesis::NotAvailable,
        };

        let request = CompletionRequest::user_turn(grounding_instruction(&document, question));
        debug!(question = %question, "Requesting grounded completion");

        match self.service.complete(&request).await {
            Ok(response) => match response.first_text() {
                Some(text) => Synthesis::Answered(text.to_string()),
                None => {
                    warn!(question = %question, "Completion service returned no answer");
                    Synthesis::NotFound
                }
            },
            Err(e) => {
                error!(question = %question, error = %e, "Completion call failed");
                Synthesis::Failed(e)
            }
        }
    }
}

/// Instruction binding the reference text and the question, with the
/// constraint to answer from the reference text only.
pub fn grounding_instruction(document: &str, question: &str) -> String {
    format!(
        "You are a helpful customer service bot. Answer the following question based ONLY on \
         the provided document content. If the answer is not found in the document, state that \
         you cannot answer based on the provided information. Do not make up information.\n\n\
         Document Content:\n{}\n\n\
         User Question: {}\n\n\
         Answer:",
        document, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionResponse;
    use crate::mock::ScriptedCompletion;

    fn synthesizer(
        doc: Option<&str>,
        service: ScriptedCompletion,
    ) -> AnswerSynthesizer<ScriptedCompletion> {
        let cache = match doc {
            Some(text) => DocumentCache::preloaded(text),
            None => DocumentCache::new(),
        };
        AnswerSynthesizer::new(service, Arc::new(cache))
    }

    #[test]
    fn test_instruction_binds_document_and_question() {
        let text = grounding_instruction("DOC BODY", "Q TEXT");
        assert!(text.starts_with("You are a helpful customer service bot."));
        assert!(text.contains("based ONLY on the provided document content"));
        assert!(text.contains("Do not make up information."));
        assert!(text.contains("Document Content:\nDOC BODY\n\n"));
        assert!(text.contains("User Question: Q TEXT\n\n"));
        assert!(text.ends_with("Answer:"));
        assert!(!text.contains("  "));
    }

    #[tokio::test]
    async fn test_not_available_skips_service() {
        let service = ScriptedCompletion::answering("never");
        let synth = synthesizer(None, service.clone());
        assert!(!synth.has_document());
        assert_eq!(synth.answer("anything").await, Synthesis::NotAvailable);
        assert_eq!(synth.answer("").await, Synthesis::NotAvailable);
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_answer_verbatim() {
        let reply = "  Standard delivery takes *5-7* business days.\n";
        let service = ScriptedCompletion::answering(reply);
        let synth = synthesizer(Some("Shipping: 5-7 days"), service.clone());
        assert_eq!(
            synth.answer("How long is shipping?").await,
            Synthesis::Answered(reply.to_string())
        );
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn test_request_carries_single_user_turn() {
        let service = ScriptedCompletion::answering("ok");
        let synth = synthesizer(Some("the doc"), service.clone());
        synth.answer("the question").await;

        let requests = service.requests();
        assert_eq!(requests.len(), 1);
        let contents = &requests[0].contents;
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].role.as_deref(), Some("user"));
        assert_eq!(contents[0].parts.len(), 1);
        assert_eq!(
            contents[0].parts[0].text.as_deref(),
            Some(grounding_instruction("the doc", "the question").as_str())
        );
    }

    #[tokio::test]
    async fn test_empty_response_is_not_found() {
        let service = ScriptedCompletion::responding(CompletionResponse::default());
        let synth = synthesizer(Some("doc"), service);
        assert_eq!(synth.answer("q").await, Synthesis::NotFound);
    }

    #[tokio::test]
    async fn test_blank_parts_are_not_found() {
        let service = ScriptedCompletion::responding(CompletionResponse::with_parts(["", " "]));
        let synth = synthesizer(Some("doc"), service);
        assert_eq!(synth.answer("q").await, Synthesis::NotFound);
    }

    #[tokio::test]
    async fn test_call_failure_is_failed() {
        let err = CompletionError::Http("connection reset".to_string());
        let service = ScriptedCompletion::failing(err.clone());
        let synth = synthesizer(Some("doc"), service);
        assert_eq!(synth.answer("q").await, Synthesis::Failed(err));
    }

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    async fn answer_with_logs(service: ScriptedCompletion, question: &str) -> String {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);
        synthesizer(Some("doc"), service).answer(question).await;
        logs.contents()
    }

    #[tokio::test]
    async fn test_call_failure_is_logged_with_question() {
        let service = ScriptedCompletion::failing(CompletionError::Status {
            status: 503,
            body: "overloaded".to_string(),
        });
        let logs = answer_with_logs(service, "Can I pay by cheque?").await;
        assert!(logs.contains("ERROR"), "{}", logs);
        assert!(logs.contains("Can I pay by cheque?"), "{}", logs);
        assert!(logs.contains("Completion call failed"), "{}", logs);
    }

    #[tokio::test]
    async fn test_empty_response_is_logged_with_question() {
        let service = ScriptedCompletion::responding(CompletionResponse::default());
        let logs = answer_with_logs(service, "Do you ship to Mars?").await;
        assert!(logs.contains("WARN"), "{}", logs);
        assert!(logs.contains("Do you ship to Mars?"), "{}", logs);
        assert!(!logs.contains("ERROR"), "{}", logs);
    }

    #[tokio::test]
    async fn test_whitespace_question_still_calls_service() {
        let service = ScriptedCompletion::responding(CompletionResponse::default());
        let synth = synthesizer(Some("doc"), service.clone());
        assert_eq!(synth.answer("   ").await, Synthesis::NotFound);
        assert_eq!(service.call_count(), 1);
    }
}
