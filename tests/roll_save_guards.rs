use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rollcalld");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rollcalld");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value.get("error")?.get("code")?.as_str()
}

fn open_with_two_students(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>) {
    let _ = request_ok(stdin, reader, "open", "board.open", json!({}));
    let begun = request_ok(stdin, reader, "begin", "roster.beginLoad", json!({}));
    let generation = begun
        .get("generation")
        .and_then(|v| v.as_u64())
        .expect("generation");
    let _ = request_ok(
        stdin,
        reader,
        "load",
        "roster.loadResult",
        json!({
            "generation": generation,
            "students": [
                { "id": 1, "firstName": "Alice", "lastName": "Smith" },
                { "id": 2, "firstName": "Bob", "lastName": "Jones", "rollState": "absent" },
            ],
        }),
    );
}

#[test]
fn marks_outside_an_active_session_are_rejected() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_with_two_students(&mut stdin, &mut reader);

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "roll.mark",
        json!({ "studentId": 1, "state": "present" }),
    );
    assert_eq!(error_code(&resp), Some("no_active_roll"), "{}", resp);

    // The rejected edit must not have touched the roster.
    let view = request_ok(&mut stdin, &mut reader, "2", "board.view", json!({}));
    assert_eq!(view["counts"]["present"].as_u64(), Some(0));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn starting_twice_and_starting_unloaded_are_rejected() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(&mut stdin, &mut reader, "open", "board.open", json!({}));
    let resp = request(&mut stdin, &mut reader, "1", "roll.start", json!({}));
    assert_eq!(error_code(&resp), Some("not_loaded"), "{}", resp);

    open_with_two_students(&mut stdin, &mut reader);
    let _ = request_ok(&mut stdin, &mut reader, "2", "roll.start", json!({}));
    let resp = request(&mut stdin, &mut reader, "3", "roll.start", json!({}));
    assert_eq!(error_code(&resp), Some("roll_active"), "{}", resp);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn exit_restores_every_pre_session_roll_state() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_with_two_students(&mut stdin, &mut reader);

    let _ = request_ok(&mut stdin, &mut reader, "start", "roll.start", json!({}));
    for (id, rid, state) in [(1, "m1", "present"), (2, "m2", "late"), (1, "m3", "absent")] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            rid,
            "roll.mark",
            json!({ "studentId": id, "state": state }),
        );
    }

    let exited = request_ok(&mut stdin, &mut reader, "exit", "roll.exit", json!({}));
    let view = &exited["view"];
    assert_eq!(view["roll"]["phase"].as_str(), Some("inactive"));
    // Bob came in absent and must leave absent; Alice returns to unset.
    let students = view["students"].as_array().expect("students");
    assert!(students[0].get("rollState").is_none(), "{}", view);
    assert_eq!(students[1]["rollState"].as_str(), Some("absent"));
    assert_eq!(view["counts"]["absent"].as_u64(), Some(1));
    assert_eq!(view["counts"]["present"].as_u64(), Some(0));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn an_outstanding_save_blocks_complete_exit_mark_and_reload() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_with_two_students(&mut stdin, &mut reader);

    let _ = request_ok(&mut stdin, &mut reader, "start", "roll.start", json!({}));
    let completed = request_ok(&mut stdin, &mut reader, "done", "roll.complete", json!({}));
    let save_id = completed["saveId"].as_str().expect("saveId").to_string();

    for (rid, method, params) in [
        ("1", "roll.complete", json!({})),
        ("2", "roll.exit", json!({})),
        ("3", "roll.mark", json!({ "studentId": 1, "state": "late" })),
        ("4", "roster.beginLoad", json!({})),
        ("5", "roster.seedDemo", json!({})),
    ] {
        let resp = request(&mut stdin, &mut reader, rid, method, params);
        assert_eq!(error_code(&resp), Some("save_in_flight"), "{}: {}", method, resp);
    }

    // Criteria stay available while the save is in flight.
    let resp = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "board.setSearch",
        json!({ "value": "jo" }),
    );
    assert_eq!(resp["view"]["totalVisible"].as_u64(), Some(1));

    let resolved = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "roll.saveResult",
        json!({ "saveId": save_id, "ok": true }),
    );
    assert_eq!(resolved.get("applied"), Some(&json!(true)));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn failed_save_keeps_the_session_active_for_retry() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_with_two_students(&mut stdin, &mut reader);

    let _ = request_ok(&mut stdin, &mut reader, "start", "roll.start", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "mark",
        "roll.mark",
        json!({ "studentId": 1, "state": "present" }),
    );
    let first = request_ok(&mut stdin, &mut reader, "c1", "roll.complete", json!({}));
    let first_id = first["saveId"].as_str().expect("saveId").to_string();

    let failed = request_ok(
        &mut stdin,
        &mut reader,
        "f1",
        "roll.saveResult",
        json!({ "saveId": first_id, "ok": false, "error": "502 bad gateway" }),
    );
    let view = &failed["view"];
    assert_eq!(view["roll"]["phase"].as_str(), Some("active"));
    assert_eq!(view["roll"]["lastSaveError"].as_str(), Some("502 bad gateway"));
    // No attendance was lost.
    assert_eq!(view["counts"]["present"].as_u64(), Some(1));

    let retry = request_ok(&mut stdin, &mut reader, "c2", "roll.complete", json!({}));
    let retry_id = retry["saveId"].as_str().expect("saveId").to_string();
    assert_ne!(retry_id, first_id);

    // The superseded token no longer resolves anything.
    let stale = request_ok(
        &mut stdin,
        &mut reader,
        "f2",
        "roll.saveResult",
        json!({ "saveId": first_id, "ok": true }),
    );
    assert_eq!(stale.get("applied"), Some(&json!(false)));
    assert_eq!(stale["reason"].as_str(), Some("stale_save"));
    assert_eq!(stale["view"]["roll"]["phase"].as_str(), Some("saving"));

    let resolved = request_ok(
        &mut stdin,
        &mut reader,
        "f3",
        "roll.saveResult",
        json!({ "saveId": retry_id, "ok": true }),
    );
    assert_eq!(resolved["view"]["roll"]["phase"].as_str(), Some("inactive"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn reopening_the_board_orphans_an_outstanding_save() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_with_two_students(&mut stdin, &mut reader);

    let _ = request_ok(&mut stdin, &mut reader, "start", "roll.start", json!({}));
    let completed = request_ok(&mut stdin, &mut reader, "done", "roll.complete", json!({}));
    let save_id = completed["saveId"].as_str().expect("saveId").to_string();

    // Navigation away and back: a fresh board replaces the old one.
    let _ = request_ok(&mut stdin, &mut reader, "reopen", "board.open", json!({}));

    let late = request_ok(
        &mut stdin,
        &mut reader,
        "late",
        "roll.saveResult",
        json!({ "saveId": save_id, "ok": true }),
    );
    assert_eq!(late.get("applied"), Some(&json!(false)));
    assert_eq!(late["view"]["roll"]["phase"].as_str(), Some("inactive"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn marking_an_unknown_student_is_acknowledged_but_not_applied() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    open_with_two_students(&mut stdin, &mut reader);

    let _ = request_ok(&mut stdin, &mut reader, "start", "roll.start", json!({}));
    let resp = request_ok(
        &mut stdin,
        &mut reader,
        "mark",
        "roll.mark",
        json!({ "studentId": 99, "state": "present" }),
    );
    assert_eq!(resp.get("applied"), Some(&json!(false)));
    assert_eq!(resp["view"]["counts"]["present"].as_u64(), Some(0));

    drop(stdin);
    let _ = child.wait();
}
