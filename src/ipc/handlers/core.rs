use serde_json::json;

use crate::board::Board;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::view_json;
use crate::ipc::types::{AppState, Request};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "boardOpen": state.board.is_some(),
            "className": state.board.as_ref().and_then(|b| b.class_name()),
        }),
    )
}

fn handle_board_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let class_name = match req.params.get("className") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(_) => return err(&req.id, "bad_params", "className must be a string", None),
    };

    // Reopening replaces the previous board; outstanding load generations
    // and save tokens die with it.
    let board = Board::open(class_name);
    let view = view_json(&board.view());
    state.board = Some(board);
    ok(&req.id, json!({ "view": view }))
}

fn handle_board_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    let closed = state.board.take().is_some();
    ok(&req.id, json!({ "closed": closed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "board.open" => Some(handle_board_open(state, req)),
        "board.close" => Some(handle_board_close(state, req)),
        _ => None,
    }
}
