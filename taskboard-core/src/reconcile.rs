/// Board mutations.
///
/// Every operation takes the current board by reference and hands back a new
/// one; nothing here touches files or keeps state between calls. Lookups
/// that miss (stale ticket id, unknown column) return the board unchanged so
/// a drag from an out-of-date view never fails.
///
/// Each operation keeps `ticket.status == column.id` for every ticket it
/// touches, and leaves each column it touches ordered by position.
use serde::{Deserialize, Serialize};

use crate::error::BoardError;
use crate::position::{append_position, fits_slot, insert_position, rebalance};
use crate::ticket::{timestamp_now, TicketIds};
use crate::types::{Board, Column, Status, Ticket, TicketDraft, TicketPatch};

/// One user action forwarded by the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BoardIntent {
    CreateTicket {
        title: String,
        #[serde(default)]
        description: String,
        status: Status,
    },
    DeleteTicket {
        ticket_id: String,
    },
    UpdateTicket {
        ticket_id: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        status: Option<Status>,
    },
    MoveTicket {
        ticket_id: String,
        destination_column_id: String,
        destination_index: usize,
    },
    RenameColumn {
        column_id: String,
        name: String,
    },
    RebalanceColumn {
        column_id: String,
    },
}

/// Apply one intent. Only `CreateTicket` can fail.
pub fn apply(board: &Board, intent: &BoardIntent) -> Result<Board, BoardError> {
    match intent {
        BoardIntent::CreateTicket {
            title,
            description,
            status,
        } => create_ticket(
            board,
            &TicketDraft {
                title: title.clone(),
                description: description.clone(),
                status: *status,
            },
        ),
        BoardIntent::DeleteTicket { ticket_id } => Ok(delete_ticket(board, ticket_id)),
        BoardIntent::UpdateTicket {
            ticket_id,
            title,
            description,
            status,
        } => Ok(update_ticket(
            board,
            ticket_id,
            &TicketPatch {
                title: title.clone(),
                description: description.clone(),
                status: *status,
            },
        )),
        BoardIntent::MoveTicket {
            ticket_id,
            destination_column_id,
            destination_index,
        } => Ok(move_ticket(
            board,
            ticket_id,
            destination_column_id,
            *destination_index,
        )),
        BoardIntent::RenameColumn { column_id, name } => {
            Ok(rename_column(board, column_id, name))
        }
        BoardIntent::RebalanceColumn { column_id } => Ok(rebalance_column(board, column_id)),
    }
}

/// Append `ticket` at the end of `column`.
fn append(column: &mut Column, mut ticket: Ticket) {
    ticket.status = column.id;
    ticket.position = append_position(column);
    column.tickets.push(ticket);
    column.sort_by_position();
    if !column.is_ordered() {
        rebalance(column);
    }
}

/// Insert `ticket` at `index` with a midpoint key. When the gap is exhausted
/// the column is renumbered around the requested slot instead.
fn insert_at(column: &mut Column, mut ticket: Ticket, index: usize) {
    let index = index.min(column.tickets.len());
    let position = insert_position(&column.tickets, index);
    let fits = fits_slot(&column.tickets, index, position);
    ticket.status = column.id;
    ticket.position = position;
    column.tickets.insert(index, ticket);
    if fits {
        column.sort_by_position();
    }
    if !fits || !column.is_ordered() {
        rebalance(column);
    }
}

/// Create a ticket at the end of the column for `draft.status`.
/// Soft-deleted tickets cannot be created directly.
pub fn create_ticket(board: &Board, draft: &TicketDraft) -> Result<Board, BoardError> {
    if !draft.status.is_working() {
        return Err(BoardError::InvalidStatus(draft.status.to_string()));
    }

    let mut next = board.clone();
    let now = timestamp_now();
    let ticket = Ticket {
        id: TicketIds::from_board(board).generate(),
        title: draft.title.clone(),
        description: draft.description.clone(),
        status: draft.status,
        created_at: now.clone(),
        updated_at: now,
        position: 0.0,
    };
    append(next.ensure_column(draft.status), ticket);
    Ok(next)
}

/// Move a ticket into the hidden column with `status = deleted`.
pub fn delete_ticket(board: &Board, ticket_id: &str) -> Board {
    let mut next = board.clone();
    let Some((ci, ti)) = next.find_ticket(ticket_id) else {
        return next;
    };
    if next.columns[ci].id == Status::Deleted {
        return next;
    }

    let mut ticket = next.columns[ci].tickets.remove(ti);
    ticket.updated_at = timestamp_now();
    append(next.ensure_column(Status::Deleted), ticket);
    next
}

/// Edit title/description/status. A status change relocates the ticket to the
/// end of the new column; `updatedAt` moves only if something changed.
pub fn update_ticket(board: &Board, ticket_id: &str, patch: &TicketPatch) -> Board {
    let mut next = board.clone();
    let Some((ci, ti)) = next.find_ticket(ticket_id) else {
        return next;
    };
    let current_column = next.columns[ci].id;
    let new_status = patch.status.filter(|s| *s != current_column);

    let ticket = &mut next.columns[ci].tickets[ti];
    let mut changed = false;
    if let Some(title) = patch.title.as_ref().filter(|t| **t != ticket.title) {
        ticket.title = title.clone();
        changed = true;
    }
    if let Some(description) = patch
        .description
        .as_ref()
        .filter(|d| **d != ticket.description)
    {
        ticket.description = description.clone();
        changed = true;
    }

    match new_status {
        Some(status) => {
            let mut ticket = next.columns[ci].tickets.remove(ti);
            ticket.updated_at = timestamp_now();
            append(next.ensure_column(status), ticket);
        }
        None if changed => ticket.updated_at = timestamp_now(),
        None => {}
    }
    next
}

/// Drag-and-drop entry point: move a ticket to `destination_index` of the
/// column named `destination_column_id` (same column reorders).
pub fn move_ticket(
    board: &Board,
    ticket_id: &str,
    destination_column_id: &str,
    destination_index: usize,
) -> Board {
    let mut next = board.clone();
    let Some(destination) = Status::parse(destination_column_id) else {
        return next;
    };
    if next.column(destination).is_none() {
        return next;
    }
    let Some((ci, ti)) = next.find_ticket(ticket_id) else {
        return next;
    };
    let source = next.columns[ci].id;
    // Same column: indices past the end mean "last slot".
    let last = next.columns[ci].tickets.len() - 1;
    if source == destination && ti == destination_index.min(last) {
        return next;
    }

    let mut ticket = next.columns[ci].tickets.remove(ti);
    ticket.updated_at = timestamp_now();
    if let Some(column) = next.column_mut(destination) {
        insert_at(column, ticket, destination_index);
    }
    next
}

/// Change a column's display label. Ticket data is untouched.
pub fn rename_column(board: &Board, column_id: &str, name: &str) -> Board {
    let mut next = board.clone();
    if let Some(column) = Status::parse(column_id).and_then(|id| next.column_mut(id)) {
        column.name = name.to_string();
    }
    next
}

/// Spread a column's positions back out to 1000, 2000, ...
pub fn rebalance_column(board: &Board, column_id: &str) -> Board {
    let mut next = board.clone();
    if let Some(column) = Status::parse(column_id).and_then(|id| next.column_mut(id)) {
        rebalance(column);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(id: &str, status: Status, position: f64) -> Ticket {
        Ticket {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            status,
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            updated_at: "2024-01-01T00:00:00.000Z".to_string(),
            position,
        }
    }

    fn board_with(todo: &[f64], in_progress: &[f64], done: &[f64]) -> Board {
        let mut board = Board::default();
        for (ci, (prefix, positions)) in [("t", todo), ("p", in_progress), ("d", done)]
            .into_iter()
            .enumerate()
        {
            let status = board.columns[ci].id;
            for (i, p) in positions.iter().enumerate() {
                board.columns[ci]
                    .tickets
                    .push(ticket(&format!("ticket-{}{}", prefix, i), status, *p));
            }
        }
        board
    }

    fn assert_invariants(board: &Board) {
        let mut seen = std::collections::HashSet::new();
        for column in &board.columns {
            assert!(column.is_ordered(), "column {} out of order", column.id);
            for t in &column.tickets {
                assert_eq!(t.status, column.id);
                assert!(seen.insert(t.id.clone()), "duplicate id {}", t.id);
            }
        }
        let ids: Vec<Status> = board.columns.iter().take(3).map(|c| c.id).collect();
        assert_eq!(ids, Status::WORKING.to_vec());
    }

    fn ids(column: &Column) -> Vec<&str> {
        column.tickets.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_create_appends_after_existing_positions() {
        let board = board_with(&[1000.0, 7000.0, 3000.0], &[], &[]);
        let next = create_ticket(
            &board,
            &TicketDraft {
                title: "New".to_string(),
                description: "d".to_string(),
                status: Status::Todo,
            },
        )
        .unwrap();
        let todo = next.column(Status::Todo).unwrap();
        let created = todo.tickets.iter().find(|t| t.title == "New").unwrap();
        assert_eq!(created.position, 8000.0);
        assert_eq!(created.status, Status::Todo);
        assert!(!board.contains_ticket(&created.id));
        assert_eq!(created.created_at, created.updated_at);
    }

    #[test]
    fn test_create_in_every_working_column_beats_max() {
        for status in Status::WORKING {
            let board = board_with(&[1000.0], &[500.0, 2500.0], &[]);
            let before = board.column(status).unwrap().max_position();
            let next = apply(
                &board,
                &BoardIntent::CreateTicket {
                    title: "x".to_string(),
                    description: String::new(),
                    status,
                },
            )
            .unwrap();
            let column = next.column(status).unwrap();
            let created = column.tickets.last().unwrap();
            assert!(created.position > before);
            assert!(board.column(status).unwrap().tickets.iter().all(|t| t.position < created.position));
            assert_invariants(&next);
        }
    }

    #[test]
    fn test_create_deleted_is_validation_error() {
        let err = create_ticket(
            &Board::default(),
            &TicketDraft {
                title: "x".to_string(),
                description: String::new(),
                status: Status::Deleted,
            },
        )
        .unwrap_err();
        assert!(matches!(err, BoardError::InvalidStatus(ref s) if s == "deleted"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_delete_moves_to_hidden_column() {
        let board = board_with(&[], &[1000.0, 2000.0], &[]);
        let next = delete_ticket(&board, "ticket-p0");
        assert!(!next.column(Status::InProgress).unwrap().tickets.iter().any(|t| t.id == "ticket-p0"));
        let deleted = next.column(Status::Deleted).unwrap();
        assert_eq!(ids(deleted), vec!["ticket-p0"]);
        assert_eq!(deleted.tickets[0].status, Status::Deleted);
        assert_ne!(deleted.tickets[0].updated_at, "2024-01-01T00:00:00.000Z");
        assert_eq!(next.columns.last().unwrap().id, Status::Deleted);
        assert_invariants(&next);
    }

    #[test]
    fn test_delete_appends_to_existing_hidden_column() {
        let board = board_with(&[1000.0, 2000.0], &[], &[]);
        let once = delete_ticket(&board, "ticket-t0");
        let twice = delete_ticket(&once, "ticket-t1");
        assert_eq!(ids(twice.column(Status::Deleted).unwrap()), vec!["ticket-t0", "ticket-t1"]);
        assert_eq!(twice.columns.len(), 4);
        assert_invariants(&twice);
    }

    #[test]
    fn test_delete_unknown_or_already_deleted_is_noop() {
        let board = board_with(&[1000.0], &[], &[]);
        assert_eq!(delete_ticket(&board, "ticket-missing"), board);
        let deleted = delete_ticket(&board, "ticket-t0");
        assert_eq!(delete_ticket(&deleted, "ticket-t0"), deleted);
    }

    #[test]
    fn test_update_in_place_refreshes_updated_at() {
        let board = board_with(&[1000.0, 2000.0], &[], &[]);
        let next = update_ticket(
            &board,
            "ticket-t1",
            &TicketPatch {
                title: Some("Renamed".to_string()),
                ..TicketPatch::default()
            },
        );
        let todo = next.column(Status::Todo).unwrap();
        assert_eq!(ids(todo), vec!["ticket-t0", "ticket-t1"]);
        assert_eq!(todo.tickets[1].title, "Renamed");
        assert_eq!(todo.tickets[1].position, 2000.0);
        assert_ne!(todo.tickets[1].updated_at, "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_update_without_change_keeps_board() {
        let board = board_with(&[1000.0], &[], &[]);
        let patch = TicketPatch {
            title: Some("ticket-t0".to_string()),
            status: Some(Status::Todo),
            ..TicketPatch::default()
        };
        assert_eq!(update_ticket(&board, "ticket-t0", &patch), board);
        assert_eq!(update_ticket(&board, "nope", &patch), board);
    }

    #[test]
    fn test_update_status_relocates_with_append_position() {
        let board = board_with(&[1000.0], &[], &[1000.0, 4000.0]);
        let next = update_ticket(
            &board,
            "ticket-t0",
            &TicketPatch {
                description: Some("now done".to_string()),
                status: Some(Status::Done),
                ..TicketPatch::default()
            },
        );
        assert!(next.column(Status::Todo).unwrap().tickets.is_empty());
        let done = next.column(Status::Done).unwrap();
        assert_eq!(ids(done), vec!["ticket-d0", "ticket-d1", "ticket-t0"]);
        assert_eq!(done.tickets[2].position, 5000.0);
        assert_eq!(done.tickets[2].status, Status::Done);
        assert_eq!(done.tickets[2].description, "now done");
        assert_invariants(&next);
    }

    #[test]
    fn test_update_status_to_deleted_creates_hidden_column() {
        let board = board_with(&[1000.0], &[], &[]);
        let next = update_ticket(
            &board,
            "ticket-t0",
            &TicketPatch {
                status: Some(Status::Deleted),
                ..TicketPatch::default()
            },
        );
        assert_eq!(next.ticket("ticket-t0").unwrap().status, Status::Deleted);
        assert_invariants(&next);
    }

    #[test]
    fn test_move_across_columns_uses_midpoint() {
        let board = board_with(&[1000.0], &[], &[1000.0, 2000.0]);
        let next = move_ticket(&board, "ticket-t0", "done", 1);
        let done = next.column(Status::Done).unwrap();
        assert_eq!(ids(done), vec!["ticket-d0", "ticket-t0", "ticket-d1"]);
        assert_eq!(done.tickets[1].position, 1500.0);
        assert_eq!(done.tickets[1].status, Status::Done);
        assert!(next.column(Status::Todo).unwrap().tickets.is_empty());
        assert_invariants(&next);
    }

    #[test]
    fn test_move_to_front_and_end() {
        let board = board_with(&[1000.0, 2000.0], &[], &[1000.0, 2000.0]);
        let front = move_ticket(&board, "ticket-t0", "done", 0);
        assert_eq!(front.ticket("ticket-t0").unwrap().position, 500.0);
        assert_eq!(front.column(Status::Done).unwrap().tickets[0].id, "ticket-t0");

        let end = move_ticket(&board, "ticket-t0", "done", 99);
        assert_eq!(end.ticket("ticket-t0").unwrap().position, 3000.0);
        assert_eq!(end.column(Status::Done).unwrap().tickets[2].id, "ticket-t0");
    }

    #[test]
    fn test_reorder_within_column() {
        let board = board_with(&[1000.0, 2000.0, 3000.0], &[], &[]);
        let next = move_ticket(&board, "ticket-t0", "todo", 1);
        let todo = next.column(Status::Todo).unwrap();
        assert_eq!(ids(todo), vec!["ticket-t1", "ticket-t0", "ticket-t2"]);
        assert_eq!(todo.tickets[1].position, 2500.0);
        assert_invariants(&next);

        let back = move_ticket(&next, "ticket-t2", "todo", 0);
        assert_eq!(ids(back.column(Status::Todo).unwrap()), vec!["ticket-t2", "ticket-t1", "ticket-t0"]);
        assert_invariants(&back);
    }

    #[test]
    fn test_move_to_same_slot_is_noop() {
        let board = board_with(&[1000.0, 2000.0], &[], &[]);
        assert_eq!(move_ticket(&board, "ticket-t1", "todo", 1), board);
    }

    #[test]
    fn test_move_last_ticket_past_end_of_own_column_is_noop() {
        let board = board_with(&[1000.0, 2000.0], &[], &[]);
        assert_eq!(move_ticket(&board, "ticket-t1", "todo", 2), board);
        assert_eq!(move_ticket(&board, "ticket-t1", "todo", 99), board);
    }

    #[test]
    fn test_move_with_unknown_ticket_or_column_is_noop() {
        let board = board_with(&[1000.0], &[], &[]);
        assert_eq!(move_ticket(&board, "ticket-zz", "done", 0), board);
        assert_eq!(move_ticket(&board, "ticket-t0", "review", 0), board);
        assert_eq!(move_ticket(&board, "ticket-t0", "deleted", 0), board);
    }

    #[test]
    fn test_exhausted_gap_renumbers_around_slot() {
        let board = board_with(&[1.0, 1.0 + f64::EPSILON], &[1000.0], &[]);
        let next = move_ticket(&board, "ticket-p0", "todo", 1);
        let todo = next.column(Status::Todo).unwrap();
        assert_eq!(ids(todo), vec!["ticket-t0", "ticket-p0", "ticket-t1"]);
        assert!(todo.is_ordered());
        assert_eq!(todo.tickets[1].position, 2000.0);
        assert_invariants(&next);
    }

    #[test]
    fn test_repeated_front_inserts_stay_ordered() {
        let mut board = board_with(&[1000.0], &[], &[]);
        for i in 0..120 {
            board = create_ticket(
                &board,
                &TicketDraft {
                    title: format!("n{}", i),
                    description: String::new(),
                    status: Status::InProgress,
                },
            )
            .unwrap();
            let id = board.column(Status::InProgress).unwrap().tickets.last().unwrap().id.clone();
            board = move_ticket(&board, &id, "todo", 1);
            assert_invariants(&board);
        }
        assert_eq!(board.column(Status::Todo).unwrap().tickets.len(), 121);
    }

    #[test]
    fn test_rename_column_is_idempotent() {
        let board = board_with(&[1000.0], &[], &[]);
        let once = rename_column(&board, "todo", "Backlog");
        let twice = rename_column(&once, "todo", "Backlog");
        assert_eq!(once, twice);
        assert_eq!(once.column(Status::Todo).unwrap().name, "Backlog");
        assert_eq!(once.column(Status::Todo).unwrap().tickets, board.column(Status::Todo).unwrap().tickets);
        assert_eq!(rename_column(&board, "deleted", "Trash"), board);
        assert_eq!(rename_column(&board, "nope", "x"), board);
    }

    #[test]
    fn test_rebalance_column_spreads_positions() {
        let board = board_with(&[0.5, 0.75], &[], &[]);
        let next = rebalance_column(&board, "todo");
        let positions: Vec<f64> = next.columns[0].tickets.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![1000.0, 2000.0]);
        assert_eq!(ids(&next.columns[0]), ids(&board.columns[0]));
    }

    #[test]
    fn test_intent_wire_format() {
        let intent: BoardIntent = serde_json::from_str(
            r#"{ "type": "moveTicket", "ticketId": "ticket-1", "destinationColumnId": "done", "destinationIndex": 2 }"#,
        )
        .unwrap();
        assert_eq!(
            intent,
            BoardIntent::MoveTicket {
                ticket_id: "ticket-1".to_string(),
                destination_column_id: "done".to_string(),
                destination_index: 2,
            }
        );

        let update: BoardIntent =
            serde_json::from_str(r#"{ "type": "updateTicket", "ticketId": "ticket-1", "status": "in-progress" }"#)
                .unwrap();
        assert!(matches!(
            update,
            BoardIntent::UpdateTicket { status: Some(Status::InProgress), title: None, .. }
        ));
    }
}
