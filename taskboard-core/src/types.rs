use serde::{Deserialize, Serialize};
use std::fmt;

/// Gap between neighbouring positions when a column is laid out fresh.
pub const POSITION_STEP: f64 = 1000.0;

/// Ticket lifecycle state. Doubles as the id of the column holding the ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Todo,
    InProgress,
    Done,
    /// Soft-deleted. Lives in the hidden fourth column.
    Deleted,
}

impl Status {
    /// The always-present working columns, in display order.
    pub const WORKING: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];

    /// Canonical column order, hidden column last.
    pub const ALL: [Status; 4] = [
        Status::Todo,
        Status::InProgress,
        Status::Done,
        Status::Deleted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in-progress",
            Status::Done => "done",
            Status::Deleted => "deleted",
        }
    }

    /// Strict parse of the on-disk spelling. Anything else is unrecognized.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "todo" => Some(Status::Todo),
            "in-progress" => Some(Status::InProgress),
            "done" => Some(Status::Done),
            "deleted" => Some(Status::Deleted),
            _ => None,
        }
    }

    pub fn is_working(self) -> bool {
        self != Status::Deleted
    }

    /// Label used when a column has to be created from scratch.
    pub fn default_column_name(self) -> &'static str {
        match self {
            Status::Todo => "To Do",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
            Status::Deleted => "Deleted",
        }
    }

    pub(crate) fn canonical_rank(self) -> usize {
        Status::ALL.iter().position(|s| *s == self).unwrap_or(Status::ALL.len())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: Status,
    /// ISO-8601 text, kept verbatim from the source file.
    pub created_at: String,
    pub updated_at: String,
    /// Sort key inside the column. Only relative order matters.
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: Status,
    pub name: String,
    pub tickets: Vec<Ticket>,
}

impl Column {
    pub fn empty(id: Status) -> Self {
        Self {
            id,
            name: id.default_column_name().to_string(),
            tickets: Vec::new(),
        }
    }

    /// Highest position in the column, or 0 when empty.
    pub fn max_position(&self) -> f64 {
        self.tickets
            .iter()
            .map(|t| t.position)
            .fold(0.0, f64::max)
    }

    /// True when positions strictly increase in sequence order.
    pub fn is_ordered(&self) -> bool {
        self.tickets
            .windows(2)
            .all(|pair| pair[0].position < pair[1].position)
    }

    /// Stable sort by position; equal keys keep their current order.
    pub fn sort_by_position(&mut self) {
        self.tickets.sort_by(|a, b| a.position.total_cmp(&b.position));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub columns: Vec<Column>,
}

impl Default for Board {
    /// Fresh board: the three working columns, all empty.
    fn default() -> Self {
        Self {
            columns: Status::WORKING.iter().map(|s| Column::empty(*s)).collect(),
        }
    }
}

impl Board {
    pub fn column(&self, id: Status) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn column_mut(&mut self, id: Status) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id == id)
    }

    /// Columns the user gets to see (everything but the soft-delete bucket).
    pub fn visible_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.id.is_working())
    }

    /// Every ticket in column order, then ticket order, hidden column included.
    pub fn tickets(&self) -> impl Iterator<Item = &Ticket> {
        self.columns.iter().flat_map(|c| c.tickets.iter())
    }

    /// Locate a ticket: (column index, ticket index).
    pub fn find_ticket(&self, ticket_id: &str) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(ci, col)| {
            col.tickets
                .iter()
                .position(|t| t.id == ticket_id)
                .map(|ti| (ci, ti))
        })
    }

    pub fn ticket(&self, ticket_id: &str) -> Option<&Ticket> {
        self.find_ticket(ticket_id)
            .map(|(ci, ti)| &self.columns[ci].tickets[ti])
    }

    pub fn contains_ticket(&self, ticket_id: &str) -> bool {
        self.find_ticket(ticket_id).is_some()
    }

    /// Get the column for `id`, inserting an empty one at its canonical slot
    /// if the board does not have it yet.
    pub fn ensure_column(&mut self, id: Status) -> &mut Column {
        let index = match self.columns.iter().position(|c| c.id == id) {
            Some(index) => index,
            None => {
                let rank = id.canonical_rank();
                let index = self
                    .columns
                    .iter()
                    .position(|c| c.id.canonical_rank() > rank)
                    .unwrap_or(self.columns.len());
                self.columns.insert(index, Column::empty(id));
                index
            }
        };
        &mut self.columns[index]
    }
}

/// Fields the view supplies when creating a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
}

/// Partial edit of a ticket. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}
