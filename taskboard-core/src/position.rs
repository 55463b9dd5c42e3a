/// Fractional ordering keys for tickets inside a column.
///
/// Appends go `POSITION_STEP` past the current maximum; inserts take the
/// midpoint of the neighbouring keys so nothing else in the column has to be
/// renumbered. Repeated inserts into the same gap halve it every time, so
/// `rebalance` exists to spread a column back out.
use crate::types::{Column, Ticket, POSITION_STEP};

/// Key for a ticket appended at the end of `column`.
pub fn append_position(column: &Column) -> f64 {
    column.max_position() + POSITION_STEP
}

/// Key for a ticket inserted at `index` into `tickets` (the destination as it
/// looks before the insert). Indices past the end mean "append after last".
pub fn insert_position(tickets: &[Ticket], index: usize) -> f64 {
    let index = index.min(tickets.len());
    let prev = if index > 0 {
        tickets[index - 1].position
    } else {
        0.0
    };
    let next = match tickets.get(index) {
        Some(t) => t.position,
        None => prev + 2.0 * POSITION_STEP,
    };
    prev + (next - prev) / 2.0
}

/// Whether `position` sorts strictly between the neighbours of slot `index`.
/// False once a gap has been halved past f64 precision, or when the slot's
/// neighbours are not positive enough for the 0 lower bound to work.
pub fn fits_slot(tickets: &[Ticket], index: usize, position: f64) -> bool {
    let index = index.min(tickets.len());
    let after_prev = index == 0 || tickets[index - 1].position < position;
    let before_next = tickets.get(index).map_or(true, |t| position < t.position);
    after_prev && before_next
}

/// Renumber a column to `POSITION_STEP`, `2 * POSITION_STEP`, ... keeping the
/// current sequence order.
pub fn rebalance(column: &mut Column) {
    for (i, ticket) in column.tickets.iter_mut().enumerate() {
        ticket.position = (i as f64 + 1.0) * POSITION_STEP;
    }
}
