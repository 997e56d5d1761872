//! Interactive prompt loop.
//!
//! Reads one prompt per line, runs it through a [`CodeAssistant`], prints the
//! result and saves the generated file. Failed turns draw from a retry budget
//! shared by the whole session; once it is spent every later turn only
//! reports the failure, but `q` still quits.

use crate::application::assistant::CodeAssistant;
use crate::application::persistence::OutputStore;
use std::io;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

pub const PROMPT: &str = "Enter a prompt (q to quit): ";
pub const EXHAUSTED_MESSAGE: &str = "Unable to process request, try again...";
const QUIT_COMMAND: &str = "q";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Quit,
    Skipped,
    Saved(PathBuf),
    SaveFailed,
    Failed { retries: u32 },
    Exhausted,
}

pub struct Session<A: CodeAssistant> {
    assistant: A,
    store: OutputStore,
    max_retries: u32,
    retries: u32,
}

impl<A: CodeAssistant> Session<A> {
    pub fn new(assistant: A, store: OutputStore, max_retries: u32) -> Self {
        Self {
            assistant,
            store,
            max_retries,
            retries: 0,
        }
    }

    /// Failures so far. Never reset during the session.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn is_exhausted(&self) -> bool {
        self.retries >= self.max_retries
    }

    /// Runs until `q` or end of input.
    pub async fn run<R, W>(&mut self, mut input: R, output: &mut W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(max_retries = self.max_retries, "Interactive session started");
        let mut line = String::new();
        loop {
            output.write_all(PROMPT.as_bytes()).await?;
            output.flush().await?;

            line.clear();
            if input.read_line(&mut line).await? == 0 {
                debug!("Input closed; ending session");
                break;
            }
            if self.handle_line(&line, output).await? == TurnOutcome::Quit {
                break;
            }
        }
        info!(retries = self.retries, "Interactive session finished");
        Ok(())
    }

    pub async fn handle_line<W>(&mut self, line: &str, output: &mut W) -> io::Result<TurnOutcome>
    where
        W: AsyncWrite + Unpin,
    {
        let prompt = line.trim();
        if prompt.eq_ignore_ascii_case(QUIT_COMMAND) {
            return Ok(TurnOutcome::Quit);
        }
        if self.is_exhausted() {
            say(output, EXHAUSTED_MESSAGE).await?;
            return Ok(TurnOutcome::Exhausted);
        }
        if prompt.is_empty() {
            return Ok(TurnOutcome::Skipped);
        }

        let record = match self.assistant.generate(prompt).await {
            Ok(record) => record,
            Err(err) => {
                self.retries += 1;
                warn!(retries = self.retries, error = %err, "Turn failed");
                say(
                    output,
                    &format!(
                        "Error occurred, retry {}: {}",
                        self.retries,
                        err.user_message()
                    ),
                )
                .await?;
                if self.is_exhausted() {
                    say(output, EXHAUSTED_MESSAGE).await?;
                }
                return Ok(TurnOutcome::Failed {
                    retries: self.retries,
                });
            }
        };

        say(output, "Code Generated").await?;
        say(output, &record.code).await?;
        say(output, &format!("\n\nDescription: {}", record.description)).await?;

        match self.store.save(&record).await {
            Ok(path) => {
                say(output, &format!("Saved file {}", record.filename)).await?;
                Ok(TurnOutcome::Saved(path))
            }
            Err(err) => {
                warn!(error = %err, "Could not save generated file");
                say(output, &format!("Error saving file: {err}")).await?;
                Ok(TurnOutcome::SaveFailed)
            }
        }
    }
}

async fn say<W>(output: &mut W, text: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await
}
