use crate::board::{Board, BoardError, BoardView};
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};

/// Every method past `board.open` needs an open board; callers get a ready
/// error envelope when there is none.
pub fn board_mut<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<&'a mut Board, serde_json::Value> {
    match state.board.as_mut() {
        Some(board) => Ok(board),
        None => Err(err(&req.id, "no_board", "open a board first", None)),
    }
}

pub fn board_err(id: &str, e: BoardError) -> serde_json::Value {
    err(id, e.code, e.message, None)
}

pub fn view_json(view: &BoardView) -> serde_json::Value {
    serde_json::to_value(view).unwrap_or_else(|_| serde_json::json!({}))
}
