use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "docsmith",
    version,
    about = "Ask questions about your docs and generate code files with a local model"
)]
pub struct Cli {
    /// Configuration file (defaults to config/docsmith.toml when present)
    #[arg(long)]
    pub config: Option<String>,
    /// Ollama base URL, overriding the configuration file
    #[arg(long)]
    pub ollama_url: Option<String>,
}
