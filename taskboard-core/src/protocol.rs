/// Message types exchanged between the board host and its views.
///
/// Protocol:
///   View sends RequestBoardData when it is ready to render.
///   Host replies BoardData { board } (and sends it again after every change).
///   View sends BoardUpdated { board } for a whole-board save, or
///   Intent { intent } for a single mutation.
///   Host sends Error { error } when a request cannot be honoured; the view
///   keeps showing the last board it received.
use serde::{Deserialize, Serialize};

use crate::reconcile::BoardIntent;
use crate::types::Board;

/// Messages sent from a view to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ViewMessage {
    RequestBoardData,
    BoardUpdated { board: Board },
    Intent { intent: BoardIntent },
}

/// Messages sent from the host to its views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    BoardData { board: Board },
    Error { error: String },
}

impl HostMessage {
    pub fn error(error: impl std::fmt::Display) -> Self {
        HostMessage::Error {
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Status;

    #[test]
    fn test_view_messages_parse() {
        let msg: ViewMessage = serde_json::from_str(r#"{"type":"requestBoardData"}"#).unwrap();
        assert_eq!(msg, ViewMessage::RequestBoardData);

        let msg: ViewMessage = serde_json::from_str(
            r#"{"type":"intent","intent":{"type":"moveTicket","ticketId":"ticket-1",
                "destinationColumnId":"done","destinationIndex":0}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ViewMessage::Intent {
                intent: BoardIntent::MoveTicket {
                    ticket_id: "ticket-1".to_string(),
                    destination_column_id: "done".to_string(),
                    destination_index: 0,
                }
            }
        );
    }

    #[test]
    fn test_board_updated_carries_board() {
        let json = serde_json::to_string(&ViewMessage::BoardUpdated {
            board: Board::default(),
        })
        .unwrap();
        let back: ViewMessage = serde_json::from_str(&json).unwrap();
        match back {
            ViewMessage::BoardUpdated { board } => {
                assert_eq!(board.columns[1].id, Status::InProgress)
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_host_message_shape() {
        let json = serde_json::to_value(HostMessage::error("disk full")).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["error"], "disk full");

        let json = serde_json::to_value(HostMessage::BoardData {
            board: Board::default(),
        })
        .unwrap();
        assert_eq!(json["type"], "boardData");
        assert_eq!(json["board"]["columns"][0]["id"], "todo");
    }
}
