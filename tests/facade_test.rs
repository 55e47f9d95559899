//! Command surface behavior end to end over a simulated target

use memprobe::commands::{
    AttachTarget, Command, CommandFacade, CommandOutput, CommandService, FacadeOptions, Response,
};
use memprobe::core::types::Protection;
use memprobe::memory::ScanOptions;
use memprobe::process::mock::{MockProcess, MockProcessApi};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn target() -> Arc<MockProcessApi> {
    let mut bytes: Vec<u8> = [250i32, 3, 250, 4, 250]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    bytes.extend_from_slice(&1.25f32.to_le_bytes());

    Arc::new(
        MockProcessApi::new().with_process(
            MockProcess::new(77, "HeroQuest")
                .with_region(0xA000, Protection::READ_WRITE, bytes)
                .with_threads(12),
        ),
    )
}

fn facade(api: &Arc<MockProcessApi>) -> CommandFacade<MockProcessApi> {
    CommandFacade::new(Arc::clone(api), ScanOptions::default(), FacadeOptions::default()).unwrap()
}

#[test]
fn test_get_results_counts() {
    let api = target();
    let facade = facade(&api);
    assert!(facade.attach_by_name("hero"));
    assert_eq!(facade.search_number("250", "I32", None, None), 3);

    assert!(facade.get_results(0).is_empty());
    assert!(facade.get_results(-1).is_empty());
    assert_eq!(facade.get_results(2).len(), 2);
    assert_eq!(facade.get_results(1_000).len(), 3);
    assert_eq!(facade.get_results_count(), 3);
}

#[test]
fn test_result_rendering() {
    let api = target();
    let facade = facade(&api);
    facade.attach_by_id(77);
    assert_eq!(facade.search_number("1.25", "F32", Some("0xa000"), Some("0xB000")), 1);

    let entry = &facade.get_results(1)[0];
    assert_eq!(entry.address, "0xA014");
    assert_eq!(entry.value, "1.25");
    assert_eq!(entry.value_type, "F32");
}

#[test]
fn test_edit_all_then_read_back() {
    let api = target();
    let facade = facade(&api);
    facade.attach_by_id(77);
    facade.search_number("250", "I32", None, None);

    assert_eq!(facade.edit_all("999", "I32"), 3);
    assert_eq!(facade.read_value("A000", "I32"), "999");
    assert_eq!(facade.read_value("A004", "I32"), "3");
    assert_eq!(facade.read_value("A010", "I32"), "999");

    // Unparseable edit value writes nothing
    api.clear_log();
    assert_eq!(facade.edit_all("lots", "I32"), 0);
    assert!(api.writes().is_empty());
}

#[test]
fn test_nearby_through_facade() {
    let api = target();
    let facade = facade(&api);
    facade.attach_by_id(77);
    facade.search_number("250", "I32", None, None);

    assert_eq!(facade.search_nearby("4", "I32", "0x4"), 1);
    assert_eq!(facade.get_results(5)[0].address, "0xA00C");

    assert_eq!(facade.search_nearby("250", "I32", "-4"), 1);
    assert_eq!(facade.get_results(5)[0].address, "0xA008");

    // Bad offset is rejected without touching the results
    assert_eq!(facade.search_nearby("250", "I32", "0xZZ"), 0);
    assert_eq!(facade.get_results_count(), 1);
}

#[test]
fn test_process_info_summary() {
    let api = target();
    let facade = facade(&api);
    assert_eq!(facade.process_info(), "");

    facade.attach(&AttachTarget::Pid { pid: 77 });
    assert_eq!(
        facade.process_info(),
        "PID: 77\nVirtual Size: 0.00 MB\nResident Size: 0.00 MB\nThreads: 12"
    );
}

#[test]
fn test_list_processes() {
    let api = target();
    let facade = facade(&api);
    let processes = facade.list_processes();
    assert_eq!(processes.len(), 1);
    assert_eq!(processes[0].pid, 77);
    assert_eq!(processes[0].name, "HeroQuest");
}

#[test]
fn test_results_survive_reattach() {
    let api = target();
    let facade = facade(&api);
    facade.attach_by_id(77);
    facade.search_number("3", "I32", None, None);

    facade.detach();
    assert!(!facade.is_attached());
    assert_eq!(facade.get_results_count(), 1);

    // Searching while detached fails without wiping the previous set
    assert_eq!(facade.search_number("3", "I32", None, None), 0);
    assert_eq!(facade.get_results_count(), 1);
    assert_eq!(facade.execute(Command::GetResultsCount), CommandOutput::Count(1));
}

#[tokio::test]
async fn test_json_session() {
    let api = target();
    let service = CommandService::new(facade(&api));

    let lines = [
        r#"{"id":1,"command":"attach","params":{"name":"quest"}}"#,
        r#"{"id":2,"command":"isAttached"}"#,
        r#"{"id":3,"command":"searchNumber","params":{"value":"200~300","type":"I32","startAddr":"0","endAddr":"0xFFFFFF"}}"#,
        r#"{"id":4,"command":"getResults","params":{"count":2}}"#,
        r#"{"id":5,"command":"setValue","params":{"address":"0xA004","value":"17","type":"I32"}}"#,
        r#"{"id":6,"command":"readValue","params":{"address":"0xA004","type":"I32"}}"#,
        r#"{"id":7,"command":"clearResults"}"#,
        r#"{"id":8,"command":"getResultsCount"}"#,
        r#"{"id":9,"command":"detach"}"#,
    ];

    let mut responses = Vec::new();
    for line in lines {
        let response: Response = service.handle_line(line).await;
        responses.push(serde_json::to_value(&response).unwrap());
    }

    assert_eq!(
        responses,
        vec![
            json!({"id": 1, "result": true}),
            json!({"id": 2, "result": true}),
            json!({"id": 3, "result": 3}),
            json!({"id": 4, "result": [
                {"address": "0xA000", "value": "250", "type": "I32"},
                {"address": "0xA008", "value": "250", "type": "I32"}
            ]}),
            json!({"id": 5, "result": true}),
            json!({"id": 6, "result": "17"}),
            json!({"id": 7, "result": null}),
            json!({"id": 8, "result": 0}),
            json!({"id": 9, "result": null}),
        ]
    );
    assert_eq!(api.live_handles(), 0);
}
