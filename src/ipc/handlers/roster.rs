use std::path::PathBuf;

use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{board_err, board_mut, view_json};
use crate::ipc::types::{AppState, Request};
use crate::roster::Student;
use crate::seed;

fn handle_begin_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    match board.begin_load() {
        Ok(generation) => ok(
            &req.id,
            json!({ "generation": generation, "view": view_json(&board.view()) }),
        ),
        Err(e) => board_err(&req.id, e),
    }
}

fn handle_load_result(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(generation) = req.params.get("generation").and_then(|v| v.as_u64()) else {
        return err(&req.id, "bad_params", "missing generation", None);
    };

    // The host reports either the fetched students or the fetch failure;
    // both resolve the same generation.
    if let Some(error_value) = req.params.get("error").filter(|v| !v.is_null()) {
        let Some(message) = error_value.as_str() else {
            return err(&req.id, "bad_params", "error must be a string", None);
        };
        let board = match board_mut(state, req) {
            Ok(b) => b,
            Err(resp) => return resp,
        };
        let applied = board.fail_load(generation, message.to_string());
        let mut result = json!({ "applied": applied, "view": view_json(&board.view()) });
        if !applied {
            result["reason"] = json!("stale_generation");
        }
        return ok(&req.id, result);
    }

    let Some(students_value) = req.params.get("students") else {
        return err(&req.id, "bad_params", "missing students or error", None);
    };
    let students: Vec<Student> = match serde_json::from_value(students_value.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", format!("bad students: {e}"), None),
    };
    let count = students.len();

    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    if board.apply_load(generation, students) {
        ok(
            &req.id,
            json!({
                "applied": true,
                "studentCount": count,
                "view": view_json(&board.view()),
            }),
        )
    } else {
        ok(
            &req.id,
            json!({
                "applied": false,
                "reason": "stale_generation",
                "view": view_json(&board.view()),
            }),
        )
    }
}

fn handle_seed_demo(state: &mut AppState, req: &Request) -> serde_json::Value {
    let count = match req.params.get("count") {
        None | Some(serde_json::Value::Null) => seed::DEFAULT_COUNT,
        Some(v) => match v.as_u64() {
            Some(n) if n >= 1 && n as usize <= seed::MAX_COUNT => n as usize,
            _ => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("count must be between 1 and {}", seed::MAX_COUNT),
                    Some(json!({ "count": v.clone() })),
                )
            }
        },
    };

    let pool = match req.params.get("namePoolPath").and_then(|v| v.as_str()) {
        Some(path) => match seed::parse_name_pool(&PathBuf::from(path)) {
            Ok(pool) => pool,
            Err(e) => return err(&req.id, "bad_params", format!("{e:#}"), None),
        },
        None => seed::builtin_name_pool(),
    };

    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    match board.seed(seed::generate(&pool, count)) {
        Ok(generation) => ok(
            &req.id,
            json!({
                "generation": generation,
                "studentCount": count,
                "view": view_json(&board.view()),
            }),
        ),
        Err(e) => board_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.beginLoad" => Some(handle_begin_load(state, req)),
        "roster.loadResult" => Some(handle_load_result(state, req)),
        "roster.seedDemo" => Some(handle_seed_demo(state, req)),
        _ => None,
    }
}
