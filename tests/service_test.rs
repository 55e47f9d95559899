//! Request concurrency of the async command service

use memprobe::commands::{
    AttachTarget, Command, CommandFacade, CommandOutput, CommandService, FacadeOptions, ServeExit,
};
use memprobe::core::types::Protection;
use memprobe::memory::ScanOptions;
use memprobe::process::mock::{MockProcess, MockProcessApi, ReadGate};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use tokio::sync::oneshot;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn service(gate: ReadGate) -> CommandService<MockProcessApi> {
    let bytes = [250i32, 1, 250].iter().flat_map(|v| v.to_le_bytes()).collect();
    let api = MockProcessApi::new()
        .with_process(MockProcess::new(9, "arena").with_region(0x4000, Protection::READ_WRITE, bytes))
        .with_read_gate(gate);
    let facade =
        CommandFacade::new(Arc::new(api), ScanOptions::default(), FacadeOptions::default()).unwrap();
    CommandService::new(facade)
}

fn search(value: &str) -> Command {
    Command::SearchNumber {
        value: value.to_string(),
        value_type: "I32".to_string(),
        start_addr: None,
        end_addr: None,
    }
}

async fn reply(lines: &mut Lines<BufReader<DuplexStream>>) -> Value {
    let line = timeout(WAIT, lines.next_line())
        .await
        .expect("reply within timeout")
        .unwrap()
        .expect("output still open");
    serde_json::from_str(&line).unwrap()
}

#[tokio::test]
async fn test_count_answers_while_search_is_held() {
    let gate = ReadGate::new();
    let service = service(gate.clone());
    service
        .execute(Command::Attach(AttachTarget::Pid { pid: 9 }))
        .await
        .unwrap();

    let searching = tokio::spawn({
        let service = service.clone();
        async move { service.execute(search("250")).await }
    });

    let count = timeout(WAIT, service.execute(Command::GetResultsCount))
        .await
        .expect("count answered during search")
        .unwrap();
    assert_eq!(count, CommandOutput::Count(0));
    assert!(!searching.is_finished());

    gate.open();
    assert_eq!(searching.await.unwrap().unwrap(), CommandOutput::Count(2));
    assert_eq!(
        service.execute(Command::GetResultsCount).await.unwrap(),
        CommandOutput::Count(2)
    );
}

#[tokio::test]
async fn test_serve_replies_in_completion_order() {
    let gate = ReadGate::new();
    let service = service(gate.clone());
    let (mut client, server_input) = tokio::io::duplex(4096);
    let (server_output, client_output) = tokio::io::duplex(4096);
    let server = tokio::spawn({
        let service = service.clone();
        async move {
            service
                .serve(BufReader::new(server_input), server_output, std::future::pending())
                .await
        }
    });
    let mut replies = BufReader::new(client_output).lines();

    client
        .write_all(b"{\"id\":1,\"command\":\"attach\",\"params\":{\"pid\":9}}\n")
        .await
        .unwrap();
    assert_eq!(reply(&mut replies).await, json!({"id": 1, "result": true}));

    client
        .write_all(
            b"{\"id\":2,\"command\":\"searchNumber\",\"params\":{\"value\":\"250\",\"type\":\"I32\"}}\n\
              \n\
              {\"id\":3,\"command\":\"getResultsCount\"}\n",
        )
        .await
        .unwrap();
    assert_eq!(reply(&mut replies).await, json!({"id": 3, "result": 0}));

    gate.open();
    assert_eq!(reply(&mut replies).await, json!({"id": 2, "result": 2}));

    drop(client);
    let exit = timeout(WAIT, server).await.unwrap().unwrap().unwrap();
    assert_eq!(exit, ServeExit::Eof);
}

#[tokio::test]
async fn test_serve_stops_on_shutdown_during_search() {
    let gate = ReadGate::new();
    let service = service(gate.clone());
    let (mut client, server_input) = tokio::io::duplex(4096);
    let (server_output, client_output) = tokio::io::duplex(4096);
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn({
        let service = service.clone();
        async move {
            let shutdown = async {
                let _ = stopped.await;
            };
            service
                .serve(BufReader::new(server_input), server_output, shutdown)
                .await
        }
    });
    let mut replies = BufReader::new(client_output).lines();

    client
        .write_all(b"{\"id\":1,\"command\":\"attach\",\"params\":{\"pid\":9}}\n")
        .await
        .unwrap();
    assert_eq!(reply(&mut replies).await, json!({"id": 1, "result": true}));
    client
        .write_all(b"{\"id\":2,\"command\":\"searchNumber\",\"params\":{\"value\":\"250\",\"type\":\"I32\"}}\n")
        .await
        .unwrap();

    stop.send(()).unwrap();
    let exit = timeout(WAIT, server).await.unwrap().unwrap().unwrap();
    assert_eq!(exit, ServeExit::Interrupted);

    // Release the blocking worker still parked inside the scan
    gate.open();
}
