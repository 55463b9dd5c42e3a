/// Delimited-text codec.
///
/// Handles the flat format:
///   id,title,description,status,createdAt,updatedAt
///   ticket-1700000000000,"Fix ""the"" bug, again",,todo,2024-01-01T00:00:00Z,...
///
/// Position and column names are not stored; decoding lays positions out as
/// 1000, 2000, ... in file order. A quoted field may span several lines.
use std::borrow::Cow;

use serde_json::{Map, Value};

use super::Buckets;
use crate::error::BoardError;
use crate::ticket::{ensure_ticket, timestamp_now, TicketIds};
use crate::types::Board;

/// Header row, in write order.
pub const REQUIRED_HEADERS: [&str; 6] = [
    "id",
    "title",
    "description",
    "status",
    "createdAt",
    "updatedAt",
];

/// Quote a field if it holds a comma, a quote, or a line break.
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Split one record into fields. Inside quotes, `""` is a literal quote and
/// commas do not separate; a lone quote toggles quoting.
pub fn parse_record(record: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut inside_quotes = false;
    let mut chars = record.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if inside_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => inside_quotes = !inside_quotes,
            ',' if !inside_quotes => values.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    values.push(current);
    values
}

/// Byte offset of the line break ending the record at the start of `text`
/// (or `text.len()`), when every quoted field in it opens at a field start
/// and closes on a field boundary. `None` means the quoting is broken.
fn quoted_record_end(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    let mut field_start = true;

    while i < bytes.len() {
        match bytes[i] {
            b'"' if field_start => {
                i += 1;
                loop {
                    match bytes.get(i) {
                        None => return None,
                        Some(b'"') if bytes.get(i + 1) == Some(&b'"') => i += 2,
                        Some(b'"') => {
                            i += 1;
                            break;
                        }
                        Some(_) => i += 1,
                    }
                }
                if !matches!(bytes.get(i), None | Some(b',' | b'\n' | b'\r')) {
                    return None;
                }
                field_start = false;
            }
            b'"' => return None,
            b',' => {
                field_start = true;
                i += 1;
            }
            b'\n' => return Some(i),
            _ => {
                field_start = false;
                i += 1;
            }
        }
    }
    Some(bytes.len())
}

/// Split text into records. A quoted field may carry line breaks; a record
/// whose quoting is broken falls back to ending at its first line break, so
/// a stray quote damages one row only. `\r\n` and `\n` both end a record;
/// blank records are dropped.
fn split_records(text: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut rest = text;

    loop {
        let end = quoted_record_end(rest)
            .unwrap_or_else(|| rest.find('\n').unwrap_or(rest.len()));
        records.push(&rest[..end]);
        if end >= rest.len() {
            break;
        }
        rest = &rest[end + 1..];
    }

    records
        .into_iter()
        .map(|r| r.strip_suffix('\r').unwrap_or(r))
        .filter(|r| !r.trim().is_empty())
        .collect()
}

/// Parse delimited text into a board.
pub fn decode(text: &str) -> Result<Board, BoardError> {
    let records = split_records(text);
    let Some((header_record, rows)) = records.split_first() else {
        return Ok(Board::default());
    };

    let headers: Vec<String> = parse_record(header_record.trim_start_matches('\u{feff}'))
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();
    let missing: Vec<String> = REQUIRED_HEADERS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .map(|h| h.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(BoardError::MissingHeaders(missing));
    }

    let now = timestamp_now();
    let mut ids = TicketIds::new();
    let mut buckets = Buckets::new();

    for row in rows {
        let mut values = parse_record(row).into_iter();
        let mut record = Map::new();
        for header in &headers {
            let value = values.next().unwrap_or_default();
            record.entry(header.clone()).or_insert(Value::String(value));
        }
        let ticket = ensure_ticket(&Value::Object(record), &mut ids, &now);
        buckets.push(ticket, None);
    }

    Ok(buckets.into_board())
}

/// Render every ticket, hidden column included, one row each.
pub fn encode(board: &Board) -> String {
    let mut out = REQUIRED_HEADERS.join(",");
    out.push('\n');

    for ticket in board.tickets() {
        let fields = [
            ticket.id.as_str(),
            ticket.title.as_str(),
            ticket.description.as_str(),
            ticket.status.as_str(),
            ticket.created_at.as_str(),
            ticket.updated_at.as_str(),
        ];
        let row: Vec<Cow<'_, str>> = fields.iter().map(|f| escape_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}
