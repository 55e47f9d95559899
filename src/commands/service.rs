//! Async front-end over the command facade
//!
//! Commands run on tokio's blocking pool so a long region scan never stalls
//! the task that received the request. [`CommandService::serve`] gives every
//! request line its own task; responses are written back in completion
//! order, each carrying the id of its request.

use super::facade::CommandFacade;
use super::protocol::{Command, CommandOutput, Request, Response};
use crate::core::types::{MemoryError, MemoryResult};
use crate::process::ProcessApi;
use serde_json::Value;
use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Responses buffered between request tasks and the output writer
const RESPONSE_QUEUE: usize = 64;

/// Why a [`CommandService::serve`] loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeExit {
    /// Input ended and every pending response was written
    Eof,
    /// The shutdown signal fired; requests still running were abandoned
    Interrupted,
}

/// Cloneable handle that executes commands off the async runtime
pub struct CommandService<A: ProcessApi> {
    facade: Arc<CommandFacade<A>>,
}

impl<A: ProcessApi> Clone for CommandService<A> {
    fn clone(&self) -> Self {
        CommandService {
            facade: Arc::clone(&self.facade),
        }
    }
}

impl<A: ProcessApi> CommandService<A> {
    pub fn new(facade: CommandFacade<A>) -> Self {
        CommandService {
            facade: Arc::new(facade),
        }
    }

    pub fn facade(&self) -> &CommandFacade<A> {
        &self.facade
    }

    /// Runs `command` on a blocking worker and resolves with its output
    pub async fn execute(&self, command: Command) -> MemoryResult<CommandOutput> {
        let facade = Arc::clone(&self.facade);
        let name = command.name();
        debug!(command = name, "Dispatching command");

        tokio::task::spawn_blocking(move || facade.execute(command))
            .await
            .map_err(|e| MemoryError::Worker(format!("{} worker failed: {}", name, e)))
    }

    /// Decodes one request line, runs it and builds the response
    pub async fn handle_line(&self, line: &str) -> Response {
        let request = match Request::parse(line) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Malformed request");
                return Response::failure(Value::Null, format!("Malformed request: {}", e));
            }
        };

        let command = match request.command() {
            Ok(command) => command,
            Err(e) => {
                warn!(command = %request.command, error = %e, "Invalid command");
                return Response::failure(
                    request.id,
                    format!("Invalid command {:?}: {}", request.command, e),
                );
            }
        };

        match self.execute(command).await {
            Ok(output) => Response::success(request.id, output),
            Err(e) => Response::failure(request.id, e.to_string()),
        }
    }

    /// Answers JSON-lines requests from `input` on `output` until the input
    /// ends or `shutdown` resolves.
    ///
    /// Reading never waits on a running command, so a status query issued
    /// during a long search is answered before the search completes. A
    /// single writer task owns `output`, keeping each response on its own
    /// line.
    pub async fn serve<R, W, S>(&self, input: R, output: W, shutdown: S) -> io::Result<ServeExit>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
        S: Future<Output = ()>,
    {
        let (sender, receiver) = mpsc::channel(RESPONSE_QUEUE);
        let writer = tokio::spawn(write_responses(output, receiver));
        let mut requests = JoinSet::new();
        let mut lines = input.lines();
        tokio::pin!(shutdown);

        let exit = loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!("Input closed");
                        break ServeExit::Eof;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }

                    let service = self.clone();
                    let sender = sender.clone();
                    requests.spawn(async move {
                        let response = service.handle_line(&line).await;
                        if sender.send(response).await.is_err() {
                            warn!("Response dropped, output writer has stopped");
                        }
                    });
                }
                Some(joined) = requests.join_next(), if !requests.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Request task failed");
                    }
                }
                _ = &mut shutdown => {
                    info!(pending = requests.len(), "Interrupted");
                    break ServeExit::Interrupted;
                }
            }
        };

        match exit {
            ServeExit::Eof => {
                while let Some(joined) = requests.join_next().await {
                    if let Err(e) = joined {
                        error!(error = %e, "Request task failed");
                    }
                }
            }
            ServeExit::Interrupted => requests.shutdown().await,
        }

        drop(sender);
        writer
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;
        Ok(exit)
    }
}

async fn write_responses<W>(mut output: W, mut responses: mpsc::Receiver<Response>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = responses.recv().await {
        let mut encoded = match serde_json::to_vec(&response) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!(error = %e, "Failed to encode response");
                continue;
            }
        };
        encoded.push(b'\n');
        output.write_all(&encoded).await?;
        output.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::facade::FacadeOptions;
    use crate::core::types::Protection;
    use crate::memory::ScanOptions;
    use crate::process::mock::{MockProcess, MockProcessApi};
    use serde_json::json;

    fn service() -> CommandService<MockProcessApi> {
        let api = MockProcessApi::new().with_process(
            MockProcess::new(5, "daemon").with_region(0x1000, Protection::READ_WRITE, vec![1, 0, 0, 0]),
        );
        let facade =
            CommandFacade::new(Arc::new(api), ScanOptions::default(), FacadeOptions::default())
                .unwrap();
        CommandService::new(facade)
    }

    #[tokio::test]
    async fn test_handle_line_round() {
        let service = service();

        let response = service
            .handle_line(r#"{"id":1,"command":"attach","params":{"pid":5}}"#)
            .await;
        assert_eq!(response, Response::success(json!(1), CommandOutput::Bool(true)));

        let response = service
            .handle_line(r#"{"id":2,"command":"searchNumber","params":{"value":"1","type":"I32"}}"#)
            .await;
        assert_eq!(response.result, Some(CommandOutput::Count(1)));
    }

    #[tokio::test]
    async fn test_handle_line_errors_keep_id() {
        let service = service();

        let response = service.handle_line("{oops").await;
        assert!(response.is_error());
        assert_eq!(response.id, Value::Null);

        let response = service
            .handle_line(r#"{"id":"x","command":"explode"}"#)
            .await;
        assert!(response.is_error());
        assert_eq!(response.id, json!("x"));
    }

    #[tokio::test]
    async fn test_concurrent_reads_while_searching() {
        let service = service();
        service
            .execute(Command::Attach(crate::commands::AttachTarget::Pid { pid: 5 }))
            .await
            .unwrap();

        let search = service.execute(Command::SearchNumber {
            value: "1".to_string(),
            value_type: "I32".to_string(),
            start_addr: None,
            end_addr: None,
        });
        let count = service.execute(Command::GetResultsCount);
        let (search, count) = tokio::join!(search, count);

        assert_eq!(search.unwrap(), CommandOutput::Count(1));
        // Either the old (empty) or the new complete set, never a partial one
        assert!(matches!(
            count.unwrap(),
            CommandOutput::Count(0) | CommandOutput::Count(1)
        ));
    }
}
