use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use edurag_answer::{AnswerError, GenerateError, Generator, QueryService};
use edurag_core::traits::Embedder;
use edurag_core::types::Chunk;
use edurag_embed::HashEmbedder;
use edurag_vector::IndexStore;
use tempfile::TempDir;

const DIM: usize = 384;

/// Replays a fixed result and records what it was asked.
struct ScriptedGenerator {
    reply: Result<String, fn() -> GenerateError>,
    seen: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self { reply: Ok(text.to_string()), seen: Mutex::new(Vec::new()) })
    }

    fn failing(err: fn() -> GenerateError) -> Arc<Self> {
        Arc::new(Self { reply: Err(err), seen: Mutex::new(Vec::new()) })
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, question: &str, context: &str) -> Result<String, GenerateError> {
        self.seen.lock().unwrap().push((question.to_string(), context.to_string()));
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(make) => Err(make()),
        }
    }
}

async fn service_with(generator: Arc<ScriptedGenerator>) -> (TempDir, QueryService) {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(IndexStore::open(tmp.path(), DIM).await.unwrap());
    let embedder = Arc::new(HashEmbedder::new(DIM));
    let chunks = vec![
        Chunk::new("TCP provides reliable ordered delivery of a byte stream.", "transport.pdf"),
        Chunk::new("UDP sends datagrams without connection setup.", "transport.pdf"),
        Chunk::new("Routers forward packets using routing tables.", "network.pptx"),
        Chunk::new("Ethernet frames carry MAC addresses.", "link.txt"),
    ];
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder.embed_batch(&texts).unwrap();
    store.update("computer_network", &vectors, &chunks).await.unwrap();
    let service = QueryService::new(store, embedder, generator, 3);
    (tmp, service)
}

#[tokio::test]
async fn answer_uses_top_chunks_as_context() {
    let generator = ScriptedGenerator::answering("TCP is the reliable one.");
    let (_tmp, service) = service_with(generator.clone()).await;

    let answer = service.answer("computer_network", "Which protocol provides reliable delivery, TCP?").await.unwrap();
    assert_eq!(answer.answer, "TCP is the reliable one.");
    let blocks: Vec<&str> = answer.context.split("\n\n").collect();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0], "TCP provides reliable ordered delivery of a byte stream.");
    assert!(answer.sources.contains(&"transport.pdf".to_string()));
    let unique: std::collections::HashSet<&String> = answer.sources.iter().collect();
    assert_eq!(unique.len(), answer.sources.len());

    let seen = generator.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].1, answer.context);
}

#[tokio::test]
async fn request_problems_are_typed() {
    let (_tmp, service) = service_with(ScriptedGenerator::answering("unused")).await;

    assert!(matches!(service.answer("", "q").await, Err(AnswerError::InvalidRequest(_))));
    assert!(matches!(service.answer("computer_network", "   ").await, Err(AnswerError::InvalidRequest(_))));
    assert!(matches!(service.answer("astronomy", "What is a star?").await, Err(AnswerError::NotFound(s)) if s == "astronomy"));
    assert!(matches!(service.answer("../etc", "x").await, Err(AnswerError::NotFound(_))));
}

#[tokio::test]
async fn generator_failures_map_to_config_or_upstream() {
    let (_tmp, service) = service_with(ScriptedGenerator::failing(|| GenerateError::MissingCredential)).await;
    let err = service.answer("computer_network", "What is UDP?").await.unwrap_err();
    assert!(matches!(err, AnswerError::Config(_)), "{err}");

    let (_tmp, service) = service_with(ScriptedGenerator::failing(|| GenerateError::Status { status: 503, body: "busy".into() })).await;
    let err = service.answer("computer_network", "What is UDP?").await.unwrap_err();
    assert!(matches!(err, AnswerError::Upstream(_)), "{err}");
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn retrieve_honours_k() {
    let (_tmp, service) = service_with(ScriptedGenerator::answering("unused")).await;
    let hits = service.retrieve("computer_network", "routers and packets", 10).await.unwrap();
    assert_eq!(hits.len(), 4);
    assert_eq!(hits[0].source, "network.pptx");
    assert_eq!(service.subjects().unwrap(), vec!["computer_network".to_string()]);
}
