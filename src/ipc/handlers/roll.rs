use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{board_err, board_mut, view_json};
use crate::ipc::types::{AppState, Request};
use crate::roster::RollState;

fn handle_start(state: &mut AppState, req: &Request) -> serde_json::Value {
    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    match board.start_roll() {
        Ok(()) => ok(&req.id, json!({ "view": view_json(&board.view()) })),
        Err(e) => board_err(&req.id, e),
    }
}

fn handle_mark(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    let Some(state_value) = req.params.get("state") else {
        return err(
            &req.id,
            "bad_params",
            "missing state (present, absent, late, or null to clear)",
            None,
        );
    };
    let roll_state = if state_value.is_null() {
        None
    } else {
        let Some(raw) = state_value.as_str() else {
            return err(&req.id, "bad_params", "state must be a string or null", None);
        };
        match RollState::parse(raw) {
            Some(parsed) => Some(parsed),
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "state must be one of: present, absent, late",
                    Some(json!({ "state": raw })),
                )
            }
        }
    };

    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    match board.mark(student_id, roll_state) {
        Ok(applied) => ok(
            &req.id,
            json!({ "applied": applied, "view": view_json(&board.view()) }),
        ),
        Err(e) => board_err(&req.id, e),
    }
}

fn handle_exit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    match board.exit_roll() {
        Ok(()) => ok(&req.id, json!({ "view": view_json(&board.view()) })),
        Err(e) => board_err(&req.id, e),
    }
}

fn handle_complete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    match board.complete_roll() {
        Ok(save) => {
            // {saveId, payload} plus the post-transition view; the host
            // delivers payload to the gateway and echoes saveId back.
            let mut result = serde_json::to_value(&save).unwrap_or_else(|_| json!({}));
            result["view"] = view_json(&board.view());
            ok(&req.id, result)
        }
        Err(e) => board_err(&req.id, e),
    }
}

fn handle_save_result(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(save_id) = req.params.get("saveId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing saveId", None);
    };
    let save_id = save_id.to_string();
    let Some(saved) = req.params.get("ok").and_then(|v| v.as_bool()) else {
        return err(&req.id, "bad_params", "missing ok", None);
    };
    let error = req
        .params
        .get("error")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let applied = board.resolve_save(&save_id, saved, error);
    let mut result = json!({ "applied": applied, "view": view_json(&board.view()) });
    if !applied {
        result["reason"] = json!("stale_save");
    }
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roll.start" => Some(handle_start(state, req)),
        "roll.mark" => Some(handle_mark(state, req)),
        "roll.exit" => Some(handle_exit(state, req)),
        "roll.complete" => Some(handle_complete(state, req)),
        "roll.saveResult" => Some(handle_save_result(state, req)),
        _ => None,
    }
}
