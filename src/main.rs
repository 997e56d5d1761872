use clap::Parser;
use docsmith::Cli;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    docsmith::run(Cli::parse()).await
}
