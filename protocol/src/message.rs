//! 消息类型定义
//!
//! 线上为 JSON 文本，每条消息一个逻辑事件，以 `type` 字段区分种类。
//! 两个方向都是封闭的枚举，未知的 `type` 直接解码失败。

use serde::{Deserialize, Serialize};

use crate::board::BoardSnapshot;
use crate::constants::MAX_MESSAGE_SIZE;
use crate::error::{ProtocolError, Result};
use crate::piece::Side;
use crate::square::DenseIndex;

/// 一步走法，坐标为紧凑索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub from: DenseIndex,
    pub to: DenseIndex,
}

impl MoveIntent {
    pub fn new(from: DenseIndex, to: DenseIndex) -> Self {
        Self { from, to }
    }
}

impl std::fmt::Display for MoveIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.from.cell(), self.to.cell())
    }
}

/// 客户端发送给服务端的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// 本地玩家走棋
    Move {
        #[serde(rename = "move")]
        intent: MoveIntent,
    },
    /// 请求引擎走棋
    EngineMove,
}

/// 服务端发送给客户端的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// 棋盘更新
    BoardUpdate {
        board: BoardSnapshot,
        /// 轮到哪一方（线上编号）
        turn: u8,
        /// 连吃未完成时必须继续走的格子
        #[serde(default, skip_serializing_if = "Option::is_none")]
        must_move_from: Option<DenseIndex>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// 服务端拒绝了走法
    Error { message: String },
    /// 游戏结束
    GameOver {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        board: Option<BoardSnapshot>,
        message: String,
    },
}

impl ServerMessage {
    /// 棋盘更新中的走子方
    pub fn turn_side(&self) -> Option<Side> {
        match self {
            ServerMessage::BoardUpdate { turn, .. } => Side::from_wire(*turn),
            _ => None,
        }
    }
}

/// 编码为 JSON 文本
pub fn encode<M: Serialize>(msg: &M) -> Result<String> {
    let text = serde_json::to_string(msg)?;
    check_size(text.len())?;
    Ok(text)
}

/// 从 JSON 文本解码
pub fn decode<'a, M: Deserialize<'a>>(text: &'a str) -> Result<M> {
    check_size(text.len())?;
    Ok(serde_json::from_str(text)?)
}

fn check_size(size: usize) -> Result<()> {
    if size > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size,
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dense(i: u8) -> DenseIndex {
        DenseIndex::new(i).unwrap()
    }

    #[test]
    fn test_move_wire_shape() {
        let msg = ClientMessage::Move {
            intent: MoveIntent::new(dense(9), dense(13)),
        };
        let value: serde_json::Value = serde_json::from_str(&encode(&msg).unwrap()).unwrap();
        assert_eq!(value, json!({"type": "move", "move": {"from": 9, "to": 13}}));
    }

    #[test]
    fn test_engine_move_wire_shape() {
        let text = encode(&ClientMessage::EngineMove).unwrap();
        assert_eq!(text, r#"{"type":"engine_move"}"#);
    }

    #[test]
    fn test_decode_board_update() {
        let text = r#"{
            "type": "board_update",
            "board": {"white_men": "4095", "black_men": "4293918720", "kings": "0"},
            "turn": 1,
            "must_move_from": 14,
            "message": "Finish the capture!"
        }"#;
        let msg: ServerMessage = decode(text).unwrap();
        assert_eq!(msg.turn_side(), Some(Side::White));
        match msg {
            ServerMessage::BoardUpdate {
                board,
                must_move_from,
                message,
                ..
            } => {
                assert_eq!(board, BoardSnapshot::initial());
                assert_eq!(must_move_from, Some(dense(14)));
                assert_eq!(message.as_deref(), Some("Finish the capture!"));
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_decode_optional_fields_absent() {
        let text = r#"{"type":"board_update","board":{"white_men":"1","black_men":"0","kings":"0"},"turn":2}"#;
        match decode::<ServerMessage>(text).unwrap() {
            ServerMessage::BoardUpdate {
                turn,
                must_move_from,
                message,
                ..
            } => {
                assert_eq!(turn, 2);
                assert_eq!(must_move_from, None);
                assert_eq!(message, None);
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_decode_error_and_game_over() {
        let msg: ServerMessage = decode(r#"{"type":"error","message":"Illegal move!"}"#).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Error {
                message: "Illegal move!".to_string()
            }
        );

        let msg: ServerMessage = decode(r#"{"type":"game_over","message":"You won"}"#).unwrap();
        assert_eq!(
            msg,
            ServerMessage::GameOver {
                board: None,
                message: "You won".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_type_fails() {
        assert!(decode::<ServerMessage>(r#"{"type":"chat","message":"hi"}"#).is_err());
        assert!(decode::<ServerMessage>(r#"{"message":"no tag"}"#).is_err());
    }

    #[test]
    fn test_out_of_range_square_fails() {
        let text = r#"{"type":"board_update","board":{"white_men":"1","black_men":"0","kings":"0"},"turn":1,"must_move_from":32}"#;
        assert!(decode::<ServerMessage>(text).is_err());
    }

    #[test]
    fn test_oversized_message_rejected() {
        let message = "x".repeat(MAX_MESSAGE_SIZE);
        let text = format!(r#"{{"type":"error","message":"{}"}}"#, message);
        assert!(matches!(
            decode::<ServerMessage>(&text),
            Err(ProtocolError::FrameTooLarge { .. })
        ));
    }
}
