//! Search, refinement and bulk edit against simulated targets

use memprobe::core::types::{Address, MemoryError, NumericType, Protection, TypedValue};
use memprobe::memory::{ScanEngine, ScanOptions};
use memprobe::process::mock::{MockProcess, MockProcessApi};
use memprobe::process::ProcessSession;
use pretty_assertions::assert_eq;
use std::sync::Arc;

const LOW: Address = Address::new(0);
const HIGH: Address = Address::new(u64::MAX);

fn i32_bytes(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn attach(process: MockProcess) -> (Arc<MockProcessApi>, ProcessSession<MockProcessApi>) {
    let pid = process.pid;
    let api = Arc::new(MockProcessApi::new().with_process(process));
    let mut session = ProcessSession::open(Arc::clone(&api));
    session.attach_by_id(pid).unwrap();
    (api, session)
}

fn addresses(engine: &ScanEngine) -> Vec<u64> {
    engine
        .results()
        .snapshot()
        .iter()
        .map(|r| r.address.as_u64())
        .collect()
}

#[test]
fn test_exact_search_ascending_at_type_stride() {
    let mut first = i32_bytes(&[42, 1, 42, 42]);
    // Trailing partial window holding the first bytes of 42
    first.extend_from_slice(&[42, 0]);
    let (_api, session) = attach(
        MockProcess::new(1, "game")
            .with_region(0x1000, Protection::READ_WRITE, first)
            .with_region(0x8000, Protection::READ, i32_bytes(&[0, 42])),
    );
    let engine = ScanEngine::new(ScanOptions::default()).unwrap();

    let count = engine
        .search_exact(&session, "42", NumericType::I32, LOW, HIGH)
        .unwrap();

    assert_eq!(count, 4);
    assert_eq!(addresses(&engine), vec![0x1000, 0x1008, 0x100C, 0x8004]);
}

#[test]
fn test_unaligned_value_is_not_found() {
    // 42 stored at offset 2 straddles two windows
    let mut bytes = vec![0u8; 2];
    bytes.extend_from_slice(&42i32.to_le_bytes());
    bytes.extend_from_slice(&[0, 0]);
    let (_api, session) = attach(MockProcess::new(1, "game").with_region(0x1000, Protection::READ, bytes));
    let engine = ScanEngine::new(ScanOptions::default()).unwrap();

    assert_eq!(
        engine.search_exact(&session, "42", NumericType::I32, LOW, HIGH).unwrap(),
        0
    );
}

#[test]
fn test_range_search_inclusive_and_reversed() {
    let (_api, session) = attach(
        MockProcess::new(1, "game").with_region(0x1000, Protection::READ, i32_bytes(&[9, 10, 15, 20, 21])),
    );
    let engine = ScanEngine::new(ScanOptions::default()).unwrap();

    assert_eq!(
        engine.search_range(&session, "10~20", NumericType::I32, LOW, HIGH).unwrap(),
        3
    );
    assert_eq!(
        engine.search_range(&session, "20~10", NumericType::I32, LOW, HIGH).unwrap(),
        0
    );
    assert!(engine.results().is_empty());
}

#[test]
fn test_float_search_uses_tolerance() {
    let bytes: Vec<u8> = [1.5f64, 1.5 + f64::EPSILON * 4.0, 1.6]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    let (_api, session) = attach(MockProcess::new(1, "game").with_region(0x1000, Protection::READ, bytes));
    let engine = ScanEngine::new(ScanOptions::default()).unwrap();

    assert_eq!(
        engine.search_exact(&session, "1.5", NumericType::F64, LOW, HIGH).unwrap(),
        2
    );
}

#[test]
fn test_parallel_region_scan_keeps_order() {
    let values: Vec<i32> = (0..10_000).map(|i| if i % 97 == 0 { 7 } else { i }).collect();
    let (_api, session) = attach(
        MockProcess::new(1, "game").with_region(0x10_0000, Protection::READ, i32_bytes(&values)),
    );
    let options = ScanOptions {
        parallel_threshold: 64,
        max_threads: 4,
        ..ScanOptions::default()
    };
    let engine = ScanEngine::new(options).unwrap();

    let count = engine
        .search_exact(&session, "7", NumericType::I32, LOW, HIGH)
        .unwrap();
    let expected: Vec<u64> = (0..10_000u64)
        .filter(|i| i % 97 == 0 || *i == 7)
        .map(|i| 0x10_0000 + i * 4)
        .collect();

    assert_eq!(count, expected.len());
    assert_eq!(addresses(&engine), expected);
}

#[test]
fn test_oversized_region_is_skipped() {
    let (api, session) = attach(
        MockProcess::new(1, "game")
            .with_region(0x1000, Protection::READ, i32_bytes(&[3; 64]))
            .with_region(0x9000, Protection::READ, i32_bytes(&[3])),
    );
    let options = ScanOptions {
        max_region_size: 16,
        ..ScanOptions::default()
    };
    let engine = ScanEngine::new(options).unwrap();

    assert_eq!(
        engine.search_exact(&session, "3", NumericType::I32, LOW, HIGH).unwrap(),
        1
    );
    assert_eq!(api.reads(), vec![(Address::new(0x9000), 4)]);
}

#[test]
fn test_nearby_on_empty_results() {
    let (_api, session) = attach(MockProcess::new(1, "game").with_region(0x1000, Protection::READ, i32_bytes(&[1])));
    let engine = ScanEngine::new(ScanOptions::default()).unwrap();

    assert!(matches!(
        engine.search_nearby(&session, "1", NumericType::I32, 4),
        Err(MemoryError::NoPriorResults)
    ));
}

#[test]
fn test_nearby_probes_candidate_address() {
    let (api, session) = attach(
        MockProcess::new(1, "game").with_region(0x1000, Protection::READ, i32_bytes(&[100, 5, 100, 6])),
    );
    let engine = ScanEngine::new(ScanOptions::default()).unwrap();
    engine
        .search_exact(&session, "100", NumericType::I32, LOW, Address::new(0x1001))
        .unwrap();
    assert_eq!(addresses(&engine), vec![0x1000, 0x1008]);

    api.clear_log();
    let count = engine
        .search_nearby(&session, "5", NumericType::I32, 0x4)
        .unwrap();

    assert_eq!(count, 1);
    assert_eq!(
        api.reads(),
        vec![(Address::new(0x1004), 4), (Address::new(0x100C), 4)]
    );
    assert_eq!(addresses(&engine), vec![0x1004]);
    assert_eq!(
        engine.results().snapshot()[0].value,
        TypedValue::I32(5)
    );
}

#[test]
fn test_nearby_composes() {
    let (_api, session) = attach(
        MockProcess::new(1, "game").with_region(0x1000, Protection::READ, i32_bytes(&[1, 2, 3, 1, 2, 9])),
    );
    let engine = ScanEngine::new(ScanOptions::default()).unwrap();
    engine
        .search_exact(&session, "1", NumericType::I32, LOW, HIGH)
        .unwrap();

    assert_eq!(engine.search_nearby(&session, "2", NumericType::I32, 4).unwrap(), 2);
    assert_eq!(engine.search_nearby(&session, "3~5", NumericType::I32, 4).unwrap(), 1);
    assert_eq!(addresses(&engine), vec![0x1008]);
}

#[test]
fn test_edit_all_counts_partial_success() {
    let (api, session) = attach(
        MockProcess::new(1, "game")
            .with_region(0x1000, Protection::READ_WRITE, i32_bytes(&[50, 0, 50]))
            .with_region(0x2000, Protection::READ, i32_bytes(&[50])),
    );
    let engine = ScanEngine::new(ScanOptions::default()).unwrap();
    let n = engine
        .search_exact(&session, "50", NumericType::I32, LOW, HIGH)
        .unwrap();
    assert_eq!(n, 3);

    api.clear_log();
    let written = engine.edit_all(&session, &TypedValue::I32(42)).unwrap();

    // The read-only region fails
    assert_eq!(written, n - 1);
    let touched: Vec<u64> = api.writes().iter().map(|(a, _)| a.as_u64()).collect();
    assert_eq!(touched, vec![0x1000, 0x1008, 0x2000]);
    assert_eq!(api.peek(1, 0x1000, 12), Some(i32_bytes(&[42, 0, 42])));
    assert_eq!(api.peek(1, 0x2000, 4), Some(i32_bytes(&[50])));
}

#[test]
fn test_clear_results() {
    let (_api, session) = attach(MockProcess::new(1, "game").with_region(0x1000, Protection::READ, i32_bytes(&[8])));
    let engine = ScanEngine::new(ScanOptions::default()).unwrap();
    engine
        .search_exact(&session, "8", NumericType::I32, LOW, HIGH)
        .unwrap();
    assert_eq!(engine.results().len(), 1);

    engine.clear();
    assert!(engine.results().is_empty());
    assert!(engine.results().prefix(10).is_empty());
}
