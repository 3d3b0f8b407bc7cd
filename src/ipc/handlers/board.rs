use serde_json::json;

use crate::engine::{RollFilter, SortDirection, SortField, SortSpec};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{board_mut, view_json};
use crate::ipc::types::{AppState, Request};

fn handle_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    ok(&req.id, view_json(&board.view()))
}

fn handle_set_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    // The search string is stored verbatim; null clears it. Whitespace is
    // significant, so no trimming here.
    let value = match req.params.get("value") {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(_) => return err(&req.id, "bad_params", "value must be a string or null", None),
    };
    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    board.set_search(value);
    ok(&req.id, json!({ "view": view_json(&board.view()) }))
}

fn handle_set_sort(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(field_raw) = req.params.get("field").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing field", None);
    };
    let Some(field) = SortField::parse(field_raw) else {
        return err(
            &req.id,
            "bad_params",
            "field must be one of: none, firstName, lastName",
            Some(json!({ "field": field_raw })),
        );
    };
    let direction = match req.params.get("direction") {
        None | Some(serde_json::Value::Null) => SortDirection::Ascending,
        Some(v) => match v.as_str().and_then(SortDirection::parse) {
            Some(d) => d,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "direction must be ascending or descending",
                    Some(json!({ "direction": v.clone() })),
                )
            }
        },
    };
    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    board.set_sort(SortSpec { field, direction });
    ok(&req.id, json!({ "view": view_json(&board.view()) }))
}

fn handle_set_roll_filter(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("value").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing value", None);
    };
    let Some(filter) = RollFilter::parse(raw) else {
        return err(
            &req.id,
            "bad_params",
            "value must be one of: all, present, absent, late",
            Some(json!({ "value": raw })),
        );
    };
    let board = match board_mut(state, req) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    board.set_roll_filter(filter);
    ok(&req.id, json!({ "view": view_json(&board.view()) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "board.view" => Some(handle_view(state, req)),
        "board.setSearch" => Some(handle_set_search(state, req)),
        "board.setSort" => Some(handle_set_sort(state, req)),
        "board.setRollFilter" => Some(handle_set_roll_filter(state, req)),
        _ => None,
    }
}
