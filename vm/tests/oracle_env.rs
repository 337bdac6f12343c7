//! Two-phase runs against the production environment.

mod common;

use std::sync::Arc;

use oracle_hostapi::{EnvConfig, OracleEnv, OracleRequest};
use oracle_vm::{ErrorKind, RawReport, RawRequest};

use common::*;

fn request() -> OracleRequest {
    OracleRequest {
        calldata: b"ETH".to_vec(),
        ask_count: 3,
        min_count: 2,
        prepare_time: 1_000,
    }
}

fn report(eid: i64, exit_code: u32, data: &[u8]) -> RawReport {
    RawReport { external_id: eid, exit_code, data: data.to_vec() }
}

fn prepare_env() -> Arc<OracleEnv> {
    Arc::new(OracleEnv::prepare(request(), EnvConfig::default()))
}

/// Asks for external data `1` and `2`, both from data source `7` with
/// calldata `"beeb"`.
const ASK_TWO: &str = r#"
    (call $ask_external_data (i64.const 1) (i64.const 7) (i64.const 1024) (i64.const 4))
    (call $ask_external_data (i64.const 2) (i64.const 7) (i64.const 1024) (i64.const 4))
"#;

#[test]
fn test_prepare_then_execute() {
    let vm = new_vm();
    let execute = r#"
        (if (i64.ne (call $get_ans_count) (i64.const 2)) (then unreachable))
        (if (i64.ne (call $get_execute_time) (i64.const 2000)) (then unreachable))
        (if (i64.ne (call $get_external_data_status (i64.const 2) (i64.const 1)) (i64.const -1))
            (then unreachable))
        (if (i64.ne (call $get_external_data_status (i64.const 1) (i64.const 2)) (i64.const 4))
            (then unreachable))
        (call $set_return_data
            (i64.const 0)
            (call $read_external_data (i64.const 2) (i64.const 0) (i64.const 0)))
    "#;
    let artifact = compile_script(&vm, ASK_TWO, execute);

    let prepared = prepare_env();
    vm.prepare(&artifact, GAS, prepared.clone()).unwrap();
    assert_eq!(
        prepared.raw_requests(),
        vec![
            RawRequest { external_id: 1, data_source_id: 7, calldata: b"beeb".to_vec() },
            RawRequest { external_id: 2, data_source_id: 7, calldata: b"beeb".to_vec() },
        ]
    );

    let executing = Arc::new(OracleEnv::execute(
        &prepared,
        2_000,
        vec![
            Some(vec![report(1, 0, b"100"), report(2, 0, b"42")]),
            None,
            Some(vec![report(1, 4, b""), report(2, 0, b"43")]),
        ],
    ));
    vm.execute(&artifact, GAS, executing.clone()).unwrap();
    assert_eq!(executing.return_data(), Some(b"42".to_vec()));
}

#[test]
fn test_request_metadata_in_prepare() {
    let vm = new_vm();
    let prepare = r#"
        (if (i64.ne (call $get_ask_count) (i64.const 3)) (then unreachable))
        (if (i64.ne (call $get_min_count) (i64.const 2)) (then unreachable))
        (if (i64.ne (call $get_prepare_time) (i64.const 1000)) (then unreachable))
        (if (i64.ne (call $read_calldata (i64.const 0)) (i64.const 3)) (then unreachable))
    "#;
    let artifact = compile_script(&vm, prepare, "");
    vm.prepare(&artifact, GAS, prepare_env()).unwrap();
}

// ── Test: prepare errors ──

#[test]
fn test_duplicate_external_id() {
    let vm = new_vm();
    let prepare = r#"
        (call $ask_external_data (i64.const 1) (i64.const 7) (i64.const 1024) (i64.const 4))
        (call $ask_external_data (i64.const 1) (i64.const 8) (i64.const 1024) (i64.const 4))
    "#;
    let artifact = compile_script(&vm, prepare, "");
    let env = prepare_env();
    assert_eq!(
        vm.prepare(&artifact, GAS, env.clone()),
        Err(ErrorKind::DuplicateExternalID)
    );
    assert_eq!(env.raw_requests().len(), 1);
}

#[test]
fn test_too_many_external_data() {
    let vm = new_vm();
    let prepare = r#"
        (local $i i64)
        (loop $next
            (call $ask_external_data (local.get $i) (i64.const 7) (i64.const 1024) (i64.const 4))
            (local.set $i (i64.add (local.get $i) (i64.const 1)))
            (br $next))
    "#;
    let artifact = compile_script(&vm, prepare, "");
    let env = prepare_env();
    assert_eq!(
        vm.prepare(&artifact, GAS, env.clone()),
        Err(ErrorKind::TooManyExternalData)
    );
    assert_eq!(env.raw_requests().len(), EnvConfig::default().max_raw_requests);
}

#[test]
fn test_execute_only_call_in_prepare() {
    let vm = new_vm();
    let artifact = compile_script(&vm, "(drop (call $get_execute_time))", "");
    assert_eq!(
        vm.prepare(&artifact, GAS, prepare_env()),
        Err(ErrorKind::WrongPeriodAction)
    );
}

#[test]
fn test_set_return_data_in_prepare() {
    let vm = new_vm();
    let artifact = compile_script(&vm, "(call $set_return_data (i64.const 1024) (i64.const 4))", "");
    assert_eq!(
        vm.prepare(&artifact, GAS, prepare_env()),
        Err(ErrorKind::WrongPeriodAction)
    );
}

// ── Test: execute errors ──

fn run_execute(body: &str) -> Result<Arc<OracleEnv>, ErrorKind> {
    let vm = new_vm();
    let artifact = compile_script(&vm, ASK_TWO, body);
    let prepared = prepare_env();
    vm.prepare(&artifact, GAS, prepared.clone()).unwrap();
    let env = Arc::new(OracleEnv::execute(
        &prepared,
        2_000,
        vec![Some(vec![report(1, 0, b"100"), report(2, 1, b"")]), None],
    ));
    vm.execute(&artifact, GAS, env.clone())?;
    Ok(env)
}

#[test]
fn test_repeat_set_return_data() {
    let body = r#"
        (call $set_return_data (i64.const 1024) (i64.const 4))
        (call $set_return_data (i64.const 1024) (i64.const 4))
    "#;
    assert_eq!(run_execute(body).unwrap_err(), ErrorKind::RepeatSetReturnData);
}

#[test]
fn test_bad_validator_index() {
    let body = "(drop (call $get_external_data_status (i64.const 1) (i64.const 2)))";
    assert_eq!(run_execute(body).unwrap_err(), ErrorKind::BadValidatorIndex);
    let body = "(drop (call $get_external_data_status (i64.const 1) (i64.const -1)))";
    assert_eq!(run_execute(body).unwrap_err(), ErrorKind::BadValidatorIndex);
}

#[test]
fn test_bad_external_id() {
    let body = "(drop (call $read_external_data (i64.const 3) (i64.const 0) (i64.const 0)))";
    assert_eq!(run_execute(body).unwrap_err(), ErrorKind::BadExternalID);
}

#[test]
fn test_unavailable_external_data() {
    let body = "(drop (call $read_external_data (i64.const 2) (i64.const 0) (i64.const 0)))";
    assert_eq!(run_execute(body).unwrap_err(), ErrorKind::UnavailableExternalData);
    let body = "(drop (call $read_external_data (i64.const 1) (i64.const 1) (i64.const 0)))";
    assert_eq!(run_execute(body).unwrap_err(), ErrorKind::UnavailableExternalData);
}

#[test]
fn test_failed_execute_sets_no_return_data() {
    let vm = new_vm();
    let execute = r#"
        (call $set_return_data (i64.const 1024) (i64.const 4))
        unreachable
    "#;
    let artifact = compile_script(&vm, "", execute);
    let prepared = prepare_env();
    vm.prepare(&artifact, GAS, prepared.clone()).unwrap();
    let env = Arc::new(OracleEnv::execute(&prepared, 2_000, vec![None]));
    assert_eq!(vm.execute(&artifact, GAS, env.clone()), Err(ErrorKind::Runtime));
    // The env keeps what the script set; callers discard it on failure.
    assert_eq!(env.return_data(), Some(b"beeb".to_vec()));
}
