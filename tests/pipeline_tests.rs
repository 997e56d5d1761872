// End-to-end pipeline tests
//
// Ingest a data directory, index it with a keyword embedder, and run a full
// session turn with scripted models standing in for Ollama.

use async_trait::async_trait;
use docsmith::agent::Agent;
use docsmith::application::assistant::AssistantPipeline;
use docsmith::application::formatter::OutputFormatter;
use docsmith::application::ingest::DirectoryReader;
use docsmith::application::persistence::OutputStore;
use docsmith::application::rag::{QueryEngine, TextSplitter, VectorIndex};
use docsmith::client::{ChatClient, ClientConfig};
use docsmith::model::{EmbeddingProvider, ModelError, ModelProvider, ModelRequest, ModelResponse};
use docsmith::session::Session;
use docsmith::tooling::{CodeReaderTool, DocumentationTool, Tool, ToolRegistry};
use docsmith::types::{ChatMessage, MessageRole};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Mutex;

const VOCABULARY: [&str; 4] = ["endpoint", "items", "weather", "add"];

struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                VOCABULARY
                    .iter()
                    .map(|word| lower.matches(word).count() as f32)
                    .collect()
            })
            .collect())
    }
}

#[derive(Clone)]
struct ScriptedModel {
    replies: Arc<Mutex<Vec<String>>>,
    seen: Arc<Mutex<Vec<ModelRequest>>>,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.iter().map(|r| r.to_string()).collect())),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    async fn prompts(&self) -> Vec<String> {
        self.seen
            .lock()
            .await
            .iter()
            .filter_map(|request| request.messages.last())
            .map(|message| message.content.clone())
            .collect()
    }
}

#[async_trait]
impl ModelProvider for ScriptedModel {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let mut replies = self.replies.lock().await;
        if replies.is_empty() {
            return Err(ModelError::InvalidResponse("script exhausted".into()));
        }
        let reply = replies.remove(0);
        let session_id = request.session_id.clone();
        self.seen.lock().await.push(request);
        Ok(ModelResponse {
            message: ChatMessage::new(MessageRole::Assistant, reply),
            session_id,
        })
    }
}

fn seed_data(dir: &TempDir) -> std::path::PathBuf {
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).expect("data dir");
    std::fs::write(
        data.join("api.md"),
        "# Items API\n\nThe items endpoint accepts POST /items with a JSON body.",
    )
    .expect("write api doc");
    std::fs::write(
        data.join("weather.txt"),
        "Weather is reported by a separate weather service.",
    )
    .expect("write weather doc");
    std::fs::write(data.join("test.py"), "def add(a, b):\n    return a + b\n")
        .expect("write code");
    data
}

#[tokio::test]
async fn prompt_flows_from_documents_to_saved_file() {
    let dir = TempDir::new().expect("tempdir");
    let data = seed_data(&dir);
    let output_dir = dir.path().join("output");

    let documents = DirectoryReader::new(&data).load().await.expect("load documents");
    assert_eq!(documents.len(), 3);

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(KeywordEmbedder);
    let index = VectorIndex::build(&documents, &TextSplitter::new(256, 32), embedder.as_ref())
        .await
        .expect("build index");

    let coder = ScriptedModel::new(&[
        r#"{"action":"call_tool","tool":"api_documentation","input":{"input":"How do I create items via the endpoint?"}}"#,
        r#"{"action":"call_tool","tool":"code_reader","input":{"file_name":"test.py"}}"#,
        r#"{"action":"final","response":"import requests\nrequests.post('/items', json={})"}"#,
    ]);
    let reader = ScriptedModel::new(&[
        "Send POST /items with a JSON body.",
        r#"assistant: {"code":"import requests\nrequests.post('/items', json={})","description":"Creates an item","filename":"create_item.py"}"#,
    ]);

    let reader_client = Arc::new(ChatClient::new(reader.clone(), ClientConfig::new("llama3.2")));
    let coder_client = Arc::new(ChatClient::new(coder.clone(), ClientConfig::new("codellama")));
    let engine = QueryEngine::new(Arc::new(index), embedder, reader_client.clone(), 1);
    let tools = Arc::new(ToolRegistry::new(vec![
        Tool::Documentation(DocumentationTool::new(engine)),
        Tool::CodeReader(CodeReaderTool::new(&data)),
    ]));
    let assistant = AssistantPipeline::new(
        Agent::new(coder_client, tools),
        OutputFormatter::new(reader_client),
        10,
    );
    let mut session = Session::new(assistant, OutputStore::new(&output_dir), 3);

    let mut console = Vec::new();
    session
        .run(&b"create an item using the API\nq\n"[..], &mut console)
        .await
        .expect("session io");
    let console = String::from_utf8(console).expect("utf8");

    assert_eq!(session.retries(), 0, "{console}");
    assert!(console.contains("Saved file create_item.py"));
    assert_eq!(
        std::fs::read_to_string(output_dir.join("create_item.py")).expect("saved"),
        "import requests\nrequests.post('/items', json={})"
    );

    let reader_prompts = reader.prompts().await;
    assert!(reader_prompts[0].contains("api.md"));
    assert!(!reader_prompts[0].contains("weather.txt"));
    assert!(reader_prompts[1].contains("requests.post('/items'"));

    let coder_prompts = coder.prompts().await;
    assert!(coder_prompts[1].contains("Send POST /items"));
    assert!(coder_prompts[2].contains("def add(a, b)"));
}

#[tokio::test]
async fn model_failure_counts_as_a_retry() {
    let dir = TempDir::new().expect("tempdir");
    let data = seed_data(&dir);

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(KeywordEmbedder);
    let coder = ScriptedModel::new(&[]);
    let reader = ScriptedModel::new(&[]);
    let reader_client = Arc::new(ChatClient::new(reader, ClientConfig::new("llama3.2")));
    let coder_client = Arc::new(ChatClient::new(coder, ClientConfig::new("codellama")));
    let engine = QueryEngine::new(
        Arc::new(VectorIndex::from_chunks(Vec::new())),
        embedder,
        reader_client.clone(),
        2,
    );
    let tools = Arc::new(ToolRegistry::new(vec![
        Tool::Documentation(DocumentationTool::new(engine)),
        Tool::CodeReader(CodeReaderTool::new(&data)),
    ]));
    let assistant = AssistantPipeline::new(
        Agent::new(coder_client, tools),
        OutputFormatter::new(reader_client),
        10,
    );
    let mut session = Session::new(assistant, OutputStore::new(dir.path().join("output")), 3);

    let mut console = Vec::new();
    session
        .run(&b"anything\nq\n"[..], &mut console)
        .await
        .expect("session io");
    let console = String::from_utf8(console).expect("utf8");

    assert_eq!(session.retries(), 1);
    assert!(console.contains("Error occurred, retry 1: "));
    assert!(!dir.path().join("output").exists());
}

#[tokio::test]
async fn documentation_failure_ends_the_turn() {
    let dir = TempDir::new().expect("tempdir");
    let data = seed_data(&dir);
    let output_dir = dir.path().join("output");

    let documents = DirectoryReader::new(&data).load().await.expect("load documents");
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(KeywordEmbedder);
    let index = VectorIndex::build(&documents, &TextSplitter::new(256, 32), embedder.as_ref())
        .await
        .expect("build index");

    let coder = ScriptedModel::new(&[
        r#"{"action":"call_tool","tool":"api_documentation","input":"How does the items endpoint work?"}"#,
        r#"{"action":"final","response":"print('never')"}"#,
    ]);
    // The reader has nothing scripted, so the documentation answer fails.
    let reader = ScriptedModel::new(&[]);
    let reader_client = Arc::new(ChatClient::new(reader, ClientConfig::new("llama3.2")));
    let coder_client = Arc::new(ChatClient::new(coder.clone(), ClientConfig::new("codellama")));
    let engine = QueryEngine::new(Arc::new(index), embedder, reader_client.clone(), 2);
    let tools = Arc::new(ToolRegistry::new(vec![
        Tool::Documentation(DocumentationTool::new(engine)),
        Tool::CodeReader(CodeReaderTool::new(&data)),
    ]));
    let assistant = AssistantPipeline::new(
        Agent::new(coder_client, tools),
        OutputFormatter::new(reader_client),
        10,
    );
    let mut session = Session::new(assistant, OutputStore::new(&output_dir), 3);

    let mut console = Vec::new();
    session
        .run(&b"create an item\nq\n"[..], &mut console)
        .await
        .expect("session io");
    let console = String::from_utf8(console).expect("utf8");

    assert_eq!(session.retries(), 1);
    assert!(console.contains("Error occurred, retry 1: "), "{console}");
    assert!(!console.contains("Code Generated"));
    assert_eq!(coder.prompts().await.len(), 1);
    assert!(!output_dir.exists());
}
