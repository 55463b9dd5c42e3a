/// Board codecs: structured document (`.json`) and delimited text (`.csv`).
///
/// Both decoders funnel records through `ticket::ensure_ticket` and then
/// through `Buckets`, which rebuilds the canonical column layout and repairs
/// ordering so every decoded board satisfies the board invariants.
pub mod csv;
pub mod json;

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BoardError;
use crate::position;
use crate::ticket::{is_valid_ticket_id, TicketIds};
use crate::types::{Board, Column, Status, Ticket, POSITION_STEP};

/// On-disk encoding of a board file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardFormat {
    Json,
    Csv,
}

impl BoardFormat {
    pub fn from_extension(ext: &str) -> Result<Self, BoardError> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Ok(BoardFormat::Json),
            "csv" => Ok(BoardFormat::Csv),
            other => Err(BoardError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Pick the codec from a file's extension.
    pub fn from_path(path: &Path) -> Result<Self, BoardError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            BoardError::UnsupportedFormat(path.to_string_lossy().to_string())
        })?;
        Self::from_extension(ext)
    }
}

/// Parse file text in the given format.
pub fn decode(format: BoardFormat, text: &str) -> Result<Board, BoardError> {
    match format {
        BoardFormat::Json => json::decode(text),
        BoardFormat::Csv => csv::decode(text),
    }
}

/// Render a board in the given format.
pub fn encode(format: BoardFormat, board: &Board) -> Result<String, BoardError> {
    match format {
        BoardFormat::Json => json::encode(board),
        BoardFormat::Csv => Ok(csv::encode(board)),
    }
}

/// Bring a board from an untrusted source (a view's whole-board save) back
/// to the shape a decoder would produce: canonical column order, each
/// ticket's status equal to its column, one copy of each id, and strictly
/// increasing positions. Later copies of a repeated id are dropped;
/// malformed ids are replaced.
pub fn normalize(board: Board) -> Board {
    let mut ids = TicketIds::from_board(&board);
    let mut seen = HashSet::new();
    let mut buckets = Buckets::new();

    for column in board.columns {
        buckets.declare(column.id, Some(&column.name));
        for mut ticket in column.tickets {
            if !seen.insert(ticket.id.clone()) {
                continue;
            }
            if !is_valid_ticket_id(&ticket.id) {
                ticket.id = ids.generate();
            }
            ticket.status = column.id;
            let position = Some(ticket.position).filter(|p| p.is_finite());
            buckets.push(ticket, position);
        }
    }

    buckets.into_board()
}

#[derive(Debug, Default)]
struct Bucket {
    present: bool,
    name: Option<String>,
    tickets: Vec<Ticket>,
}

/// Collects repaired tickets per status while decoding, then lays them out
/// as a board: working columns always, hidden column only when it was in the
/// source or received a ticket.
#[derive(Debug, Default)]
pub(crate) struct Buckets {
    slots: [Bucket; 4],
}

impl Buckets {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, status: Status) -> &mut Bucket {
        &mut self.slots[status.canonical_rank()]
    }

    /// Record that the source had a column for `status`, with its label.
    pub(crate) fn declare(&mut self, status: Status, name: Option<&str>) {
        let bucket = self.slot(status);
        bucket.present = true;
        if bucket.name.is_none() {
            bucket.name = name.map(str::to_string);
        }
    }

    /// Add a ticket to the bucket for its status. A ticket without a source
    /// position is appended after everything collected so far.
    pub(crate) fn push(&mut self, mut ticket: Ticket, source_position: Option<f64>) {
        let bucket = self.slot(ticket.status);
        bucket.present = true;
        ticket.position = match source_position {
            Some(p) => p,
            None => {
                bucket
                    .tickets
                    .iter()
                    .map(|t| t.position)
                    .fold(0.0, f64::max)
                    + POSITION_STEP
            }
        };
        bucket.tickets.push(ticket);
    }

    pub(crate) fn into_board(self) -> Board {
        let mut columns = Vec::with_capacity(4);
        for (status, bucket) in Status::ALL.iter().copied().zip(self.slots) {
            if !status.is_working() && !bucket.present {
                continue;
            }
            let mut column = Column {
                id: status,
                name: bucket
                    .name
                    .unwrap_or_else(|| status.default_column_name().to_string()),
                tickets: bucket.tickets,
            };
            settle(&mut column);
            columns.push(column);
        }
        Board { columns }
    }
}

/// Stable sort by position; renumber when keys collide.
fn settle(column: &mut Column) {
    column.sort_by_position();
    if !column.is_ordered() {
        position::rebalance(column);
    }
}
