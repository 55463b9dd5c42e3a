/// Structured-document codec.
///
/// Current format:
///   { "columns": [ { "id": "todo", "name": "To Do", "tickets": [ ... ] }, ... ] }
///
/// Legacy format (read only): a bare array of ticket-like objects, bucketed
/// into columns by their status.
use serde_json::Value;

use super::Buckets;
use crate::error::BoardError;
use crate::ticket::{ensure_ticket, raw_position, timestamp_now, TicketIds};
use crate::types::{Board, Status};

/// Pretty-printed JSON, two-space indent.
pub fn encode(board: &Board) -> Result<String, BoardError> {
    Ok(serde_json::to_string_pretty(board)?)
}

/// Parse a board document. Only syntax errors fail; everything else is repaired.
pub fn decode(text: &str) -> Result<Board, BoardError> {
    let data: Value = serde_json::from_str(text)?;
    let now = timestamp_now();
    let mut ids = TicketIds::new();

    if let Some(columns) = data.get("columns") {
        return Ok(decode_board(columns, &mut ids, &now));
    }

    let mut buckets = Buckets::new();
    if let Some(records) = data.as_array() {
        for raw in records {
            let ticket = ensure_ticket(raw, &mut ids, &now);
            buckets.push(ticket, raw_position(raw));
        }
    }
    Ok(buckets.into_board())
}

fn decode_board(columns: &Value, ids: &mut TicketIds, now: &str) -> Board {
    let mut buckets = Buckets::new();
    let empty = Vec::new();

    for raw_col in columns.as_array().unwrap_or(&empty) {
        let column_id = raw_col
            .get("id")
            .and_then(Value::as_str)
            .and_then(Status::parse);
        if let Some(status) = column_id {
            buckets.declare(status, raw_col.get("name").and_then(Value::as_str));
        }

        let tickets = raw_col
            .get("tickets")
            .and_then(Value::as_array)
            .unwrap_or(&empty);
        for raw in tickets {
            let mut ticket = ensure_ticket(raw, ids, now);
            // The containing column wins; strays from unknown columns keep
            // their own status.
            if let Some(status) = column_id {
                ticket.status = status;
            }
            buckets.push(ticket, raw_position(raw));
        }
    }

    buckets.into_board()
}
