pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, client, session, tooling};
pub use cli::Cli;
pub use config::AppConfig;
pub use domain::types;
pub use infrastructure::{model, parsing};

use application::agent::Agent;
use application::assistant::AssistantPipeline;
use application::formatter::OutputFormatter;
use application::ingest::DirectoryReader;
use application::persistence::OutputStore;
use application::rag::{QueryEngine, TextSplitter, VectorIndex};
use application::session::Session;
use application::tooling::{CodeReaderTool, DocumentationTool, Tool, ToolRegistry};
use client::{ChatClient, ClientConfig};
use model::{EmbeddingProvider, OllamaClient};
use parsing::LlamaParseClient;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Builds the index from the data directory, wires the agent and tools, and
/// runs the interactive session on stdin/stdout.
pub async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    init_tracing();
    info!("Starting docsmith");

    let config_path = cli.config.as_deref().map(Path::new);
    let mut config = AppConfig::load(config_path)?;
    if let Some(url) = cli.ollama_url {
        config = config.with_ollama_url(url);
    }
    debug!(?config.data_dir, ?config.output_dir, ollama_url = %config.ollama_url, "Configuration resolved");

    let ollama = OllamaClient::new(config.ollama_url.clone(), config.request_timeout)?;
    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(ollama.embedder(config.embed_model.clone()));

    let pdf_parser = config
        .parser
        .api_key
        .as_deref()
        .map(|key| LlamaParseClient::new(&config.parser, key))
        .transpose()?;
    if pdf_parser.is_none() {
        warn!(
            var = config::PARSER_API_KEY_VAR,
            "No parsing service key set; PDF files will be skipped"
        );
    }
    let mut reader = DirectoryReader::new(&config.data_dir).recursive(config.recursive);
    if let Some(parser) = pdf_parser.as_ref() {
        reader = reader.with_pdf_parser(parser);
    }
    let documents = reader.load().await?;

    let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap);
    let index = Arc::new(VectorIndex::build(&documents, &splitter, embedder.as_ref()).await?);

    let reader_client = Arc::new(ChatClient::new(
        ollama.clone(),
        ClientConfig::new(&config.reader_model),
    ));
    let coder_client = Arc::new(ChatClient::new(
        ollama,
        ClientConfig::new(&config.coder_model).with_history_limit(config.history_limit),
    ));

    let engine = QueryEngine::new(
        index,
        embedder,
        reader_client.clone(),
        config.similarity_top_k,
    );
    let tools = Arc::new(ToolRegistry::new(vec![
        Tool::Documentation(DocumentationTool::new(engine)),
        Tool::CodeReader(CodeReaderTool::new(&config.data_dir)),
    ]));
    let agent = Agent::new(coder_client, tools).verbose(config.verbose);
    let assistant = AssistantPipeline::new(
        agent,
        OutputFormatter::new(reader_client),
        config.max_agent_steps,
    );

    let mut session = Session::new(
        assistant,
        OutputStore::new(&config.output_dir),
        config.max_retries,
    );
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    session.run(stdin, &mut stdout).await?;

    info!("docsmith finished");
    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .init();
    });
}
