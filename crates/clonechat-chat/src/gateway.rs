//! Question → persona answer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::prompt::PromptTemplate;
use crate::traits::{Generator, Retriever};
use clonechat_core::{Error, Result};

/// Separator between retrieved passages in the rendered context.
pub const PASSAGE_SEPARATOR: &str = "\n\n";

/// Stateless RAG pipeline. Every field is shared and immutable, so one
/// gateway serves any number of concurrent requests.
#[derive(Clone)]
pub struct ChatGateway {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    template: Arc<PromptTemplate>,
    retrieval_timeout: Duration,
    generation_timeout: Duration,
}

impl ChatGateway {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        template: PromptTemplate,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            retriever,
            generator,
            template: Arc::new(template),
            retrieval_timeout: upstream_timeout,
            generation_timeout: upstream_timeout,
        }
    }

    pub fn with_timeouts(mut self, retrieval: Duration, generation: Duration) -> Self {
        self.retrieval_timeout = retrieval;
        self.generation_timeout = generation;
        self
    }

    pub fn generator_model(&self) -> &str {
        self.generator.model()
    }

    /// Answer one question.
    ///
    /// An empty question fails with `Error::Validation` before either
    /// collaborator is called. A retrieval failure stops the pipeline, so the
    /// generator is never called for it.
    pub async fn answer(&self, question: &str) -> Result<String> {
        if question.is_empty() {
            return Err(Error::validation("question is empty"));
        }

        let start = Instant::now();
        let passages = tokio::time::timeout(self.retrieval_timeout, self.retriever.retrieve(question))
            .await
            .map_err(|_| Error::Timeout("retrieval", self.retrieval_timeout.as_secs()))??;
        debug!(
            "Retrieved {} passage(s) in {}ms",
            passages.len(),
            start.elapsed().as_millis()
        );

        let context = passages.join(PASSAGE_SEPARATOR);
        let prompt = self.template.render(&context, question);

        let start = Instant::now();
        let response = tokio::time::timeout(self.generation_timeout, self.generator.generate(&prompt))
            .await
            .map_err(|_| Error::Timeout("generation", self.generation_timeout.as_secs()))??;
        debug!(
            "Generated {} byte(s) in {}ms",
            response.len(),
            start.elapsed().as_millis()
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use clonechat_core::ErrorKind;

    #[derive(Default)]
    struct FixedRetriever {
        passages: Vec<String>,
        fail: bool,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn retrieve(&self, _question: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(Error::embedding("connection refused"));
            }
            Ok(self.passages.clone())
        }
    }

    /// Echoes the prompt back and remembers it.
    #[derive(Default)]
    struct EchoGenerator {
        fail: bool,
        delay: Option<Duration>,
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
    }

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(Error::generation("API error 500"));
            }
            Ok(prompt.to_string())
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    fn gateway(retriever: Arc<FixedRetriever>, generator: Arc<EchoGenerator>) -> ChatGateway {
        let template = PromptTemplate::parse("CONTEXT:\n{context}\nQ: {question}").unwrap();
        ChatGateway::new(retriever, generator, template, Duration::from_secs(5))
    }

    fn passages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_answer_splices_context_and_question() {
        let retriever = Arc::new(FixedRetriever {
            passages: passages(&["A", "B"]),
            ..Default::default()
        });
        let generator = Arc::new(EchoGenerator::default());
        let gw = gateway(retriever.clone(), generator.clone());

        let answer = gw.answer("What is X?").await.unwrap();
        assert_eq!(answer, "CONTEXT:\nA\n\nB\nQ: What is X?");
        assert_eq!(retriever.calls.load(Ordering::SeqCst), 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_question_calls_nothing() {
        let retriever = Arc::new(FixedRetriever::default());
        let generator = Arc::new(EchoGenerator::default());
        let gw = gateway(retriever.clone(), generator.clone());

        let err = gw.answer("").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(retriever.calls.load(Ordering::SeqCst), 0);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_whitespace_question_is_answered() {
        let retriever = Arc::new(FixedRetriever::default());
        let generator = Arc::new(EchoGenerator::default());
        let gw = gateway(retriever, generator.clone());

        assert!(gw.answer("  ").await.is_ok());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_passages_gives_empty_context() {
        let retriever = Arc::new(FixedRetriever::default());
        let generator = Arc::new(EchoGenerator::default());
        let gw = gateway(retriever, generator);

        assert_eq!(gw.answer("hi").await.unwrap(), "CONTEXT:\n\nQ: hi");
    }

    #[tokio::test]
    async fn test_retrieval_failure_skips_generation() {
        let retriever = Arc::new(FixedRetriever {
            fail: true,
            ..Default::default()
        });
        let generator = Arc::new(EchoGenerator::default());
        let gw = gateway(retriever, generator.clone());

        let err = gw.answer("hi").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_is_upstream() {
        let retriever = Arc::new(FixedRetriever::default());
        let generator = Arc::new(EchoGenerator {
            fail: true,
            ..Default::default()
        });
        let gw = gateway(retriever, generator);

        let err = gw.answer("hi").await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[tokio::test]
    async fn test_retrieval_timeout() {
        let retriever = Arc::new(FixedRetriever {
            delay: Some(Duration::from_secs(2)),
            ..Default::default()
        });
        let generator = Arc::new(EchoGenerator::default());
        let gw = gateway(retriever, generator.clone())
            .with_timeouts(Duration::from_millis(20), Duration::from_secs(5));

        let err = gw.answer("hi").await.unwrap_err();
        assert!(matches!(err, Error::Timeout("retrieval", _)));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generation_timeout() {
        let retriever = Arc::new(FixedRetriever::default());
        let generator = Arc::new(EchoGenerator {
            delay: Some(Duration::from_secs(2)),
            ..Default::default()
        });
        let gw = gateway(retriever.clone(), generator.clone())
            .with_timeouts(Duration::from_secs(5), Duration::from_millis(20));

        let err = gw.answer("hi").await.unwrap_err();
        assert!(matches!(err, Error::Timeout("generation", _)));
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(retriever.calls.load(Ordering::SeqCst), 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_placeholders_in_question_are_literal() {
        let retriever = Arc::new(FixedRetriever {
            passages: passages(&["{question}"]),
            ..Default::default()
        });
        let generator = Arc::new(EchoGenerator::default());
        let gw = gateway(retriever, generator.clone());

        gw.answer("{context}").await.unwrap();
        let prompt = generator.last_prompt.lock().unwrap().clone().unwrap();
        assert_eq!(prompt, "CONTEXT:\n{question}\nQ: {context}");
    }
}
