//! 跳棋客户端共享协议库
//!
//! 包含:
//! - 格子坐标（紧凑索引 / 稀疏索引）与棋盘位集快照
//! - 消息类型定义 (ClientMessage, ServerMessage)
//! - 传输层抽象 (Connector, Connection traits) 与 WebSocket 实现

mod board;
mod constants;
mod error;
mod message;
mod piece;
mod square;
mod transport;

pub use board::{parse_bit_set, BoardSnapshot, SnapshotAnomaly};
pub use constants::*;
pub use error::{BoardError, ProtocolError, Result};
pub use message::{decode, encode, ClientMessage, MoveIntent, ServerMessage};
pub use piece::{Occupant, Side};
pub use square::{to_dense, Cell, DenseIndex, SparseIndex};
pub use transport::{
    is_payload_error, Connection, Connector, NetworkConfig, WsConnection, WsConnector, WsReader,
    WsWriter,
};
