/// Ticket identity and record repair.
///
/// Ticket ids look like `ticket-<unix millis>`; anything else found in a file
/// is replaced on load. `ensure_ticket` is the single place where loosely
/// shaped input becomes a valid `Ticket`, and it never fails.
use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde_json::Value;

use crate::types::{Board, Status, Ticket};

static TICKET_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ticket-[A-Za-z0-9_-]+$").unwrap());

/// Current time as ISO-8601 text, millisecond precision, UTC `Z` suffix.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Whether `id` has the recognized ticket id shape.
pub fn is_valid_ticket_id(id: &str) -> bool {
    TICKET_ID_RE.is_match(id)
}

/// Ids already handed out in the current board or decode pass.
///
/// Guarantees that two records never end up sharing an id, even when the
/// clock has not ticked between generations.
#[derive(Debug, Default)]
pub struct TicketIds {
    taken: HashSet<String>,
}

impl TicketIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with every id on `board`, hidden column included.
    pub fn from_board(board: &Board) -> Self {
        Self {
            taken: board.tickets().map(|t| t.id.clone()).collect(),
        }
    }

    /// Keep `candidate` when it is well formed and unused, else mint a new id.
    pub fn claim(&mut self, candidate: Option<&str>) -> String {
        match candidate {
            Some(id) if is_valid_ticket_id(id) && !self.taken.contains(id) => {
                self.taken.insert(id.to_string());
                id.to_string()
            }
            _ => self.generate(),
        }
    }

    /// Mint a fresh time-based id that is not in the taken set.
    pub fn generate(&mut self) -> String {
        let millis = Utc::now().timestamp_millis();
        let mut id = format!("ticket-{}", millis);
        let mut n: u32 = 1;
        while self.taken.contains(&id) {
            id = format!("ticket-{}-{}", millis, n);
            n += 1;
        }
        self.taken.insert(id.clone());
        id
    }
}

fn text_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

fn non_empty_text(raw: &Value, key: &str) -> Option<String> {
    text_field(raw, key).filter(|s| !s.is_empty())
}

/// Position carried by a raw record, if it is a finite number.
pub fn raw_position(raw: &Value) -> Option<f64> {
    raw.get("position")
        .and_then(Value::as_f64)
        .filter(|p| p.is_finite())
}

/// Status carried by a raw record, if it is one of the four known values.
pub fn raw_status(raw: &Value) -> Option<Status> {
    raw.get("status").and_then(Value::as_str).and_then(Status::parse)
}

/// Repair a ticket-like record into a valid `Ticket`.
///
/// - bad, missing, or already-used id: a fresh one is generated
/// - missing title/description: empty
/// - missing or unknown status: `todo`
/// - missing timestamps: `now`
/// - missing position: 0 (codecs lay out positions afterwards)
pub fn ensure_ticket(raw: &Value, ids: &mut TicketIds, now: &str) -> Ticket {
    let id = ids.claim(raw.get("id").and_then(Value::as_str));
    Ticket {
        id,
        title: text_field(raw, "title").unwrap_or_default(),
        description: text_field(raw, "description").unwrap_or_default(),
        status: raw_status(raw).unwrap_or(Status::Todo),
        created_at: non_empty_text(raw, "createdAt").unwrap_or_else(|| now.to_string()),
        updated_at: non_empty_text(raw, "updatedAt").unwrap_or_else(|| now.to_string()),
        position: raw_position(raw).unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ensure_ticket_empty_record() {
        let now = timestamp_now();
        let ticket = ensure_ticket(&json!({}), &mut TicketIds::new(), &now);
        assert!(!ticket.id.is_empty());
        assert!(is_valid_ticket_id(&ticket.id));
        assert_eq!(ticket.status, Status::Todo);
        assert_eq!(ticket.title, "");
        assert_eq!(ticket.description, "");
        assert!(chrono::DateTime::parse_from_rfc3339(&ticket.created_at).is_ok());
        assert!(chrono::DateTime::parse_from_rfc3339(&ticket.updated_at).is_ok());
    }

    #[test]
    fn test_ensure_ticket_keeps_valid_fields() {
        let raw = json!({
            "id": "ticket-1700000000000",
            "title": "Write docs",
            "description": "for the codec",
            "status": "in-progress",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z",
            "position": 2500.5
        });
        let ticket = ensure_ticket(&raw, &mut TicketIds::new(), "now");
        assert_eq!(ticket.id, "ticket-1700000000000");
        assert_eq!(ticket.title, "Write docs");
        assert_eq!(ticket.status, Status::InProgress);
        assert_eq!(ticket.created_at, "2024-01-01T00:00:00Z");
        assert_eq!(ticket.updated_at, "2024-01-02T00:00:00Z");
        assert_eq!(ticket.position, 2500.5);
    }

    #[test]
    fn test_ensure_ticket_replaces_foreign_id_shape() {
        let raw = json!({ "id": "42", "title": "x" });
        let ticket = ensure_ticket(&raw, &mut TicketIds::new(), "now");
        assert_ne!(ticket.id, "42");
        assert!(ticket.id.starts_with("ticket-"));
    }

    #[test]
    fn test_unknown_status_defaults_to_todo() {
        let raw = json!({ "status": "blocked" });
        let ticket = ensure_ticket(&raw, &mut TicketIds::new(), "now");
        assert_eq!(ticket.status, Status::Todo);
    }

    #[test]
    fn test_non_string_fields_treated_as_missing() {
        let raw = json!({ "id": 7, "title": ["a"], "createdAt": null });
        let ticket = ensure_ticket(&raw, &mut TicketIds::new(), "now");
        assert!(is_valid_ticket_id(&ticket.id));
        assert_eq!(ticket.title, "");
        assert_eq!(ticket.created_at, "now");
    }

    #[test]
    fn test_duplicate_ids_in_one_pass_get_distinct_ids() {
        let mut ids = TicketIds::new();
        let a = ensure_ticket(&json!({ "id": "ticket-1" }), &mut ids, "now");
        let b = ensure_ticket(&json!({ "id": "ticket-1" }), &mut ids, "now");
        assert_eq!(a.id, "ticket-1");
        assert_ne!(b.id, "ticket-1");
    }

    #[test]
    fn test_generate_never_repeats_within_same_millisecond() {
        let mut ids = TicketIds::new();
        let generated: HashSet<String> = (0..50).map(|_| ids.generate()).collect();
        assert_eq!(generated.len(), 50);
        assert!(generated.iter().all(|id| is_valid_ticket_id(id)));
    }

    #[test]
    fn test_from_board_reserves_existing_ids() {
        let mut board = Board::default();
        board.columns[0].tickets.push(ensure_ticket(
            &json!({ "id": "ticket-9" }),
            &mut TicketIds::new(),
            "now",
        ));
        let mut ids = TicketIds::from_board(&board);
        assert_ne!(ids.claim(Some("ticket-9")), "ticket-9");
    }
}
