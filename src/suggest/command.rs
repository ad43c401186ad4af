use super::prompt::render_prompt;
use super::structured_output::parse_restructure_response;
use super::{SuggestionFuture, SuggestionProvider, SuggestionRequest};
use crate::errors::{AppError, AppResult};
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

#[derive(Debug, Clone)]
pub struct CommandSuggestionProvider {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandSuggestionProvider {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    async fn run(&self, prompt: String) -> AppResult<String> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|err| AppError::Suggestion(format!("Failed to start '{}': {}", self.program, err)))?;

        let exchange = async move {
            if let Some(mut stdin) = child.stdin.take() {
                match stdin.write_all(prompt.as_bytes()).await {
                    Ok(()) => {}
                    Err(error) if error.kind() == ErrorKind::BrokenPipe => {
                        tracing::debug!("suggestion command closed stdin before reading the prompt");
                    }
                    Err(error) => return Err(error),
                }
            }
            child.wait_with_output().await
        };

        let output = timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                AppError::Suggestion(format!(
                    "Suggestion command timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|err| AppError::Suggestion(err.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(AppError::Suggestion(format!(
                "Suggestion command failed with status {:?}: {}",
                output.status.code(),
                stderr
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl SuggestionProvider for CommandSuggestionProvider {
    fn suggest<'a>(&'a self, request: &'a SuggestionRequest) -> SuggestionFuture<'a> {
        Box::pin(async move {
            tracing::info!(
                program = %self.program,
                bucket = %request.bucket,
                folders = request.profiles.len(),
                "requesting folder merge suggestions"
            );
            let stdout = self.run(render_prompt(request)).await?;
            parse_restructure_response(&stdout)
        })
    }
}
