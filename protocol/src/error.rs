//! 错误类型定义

use thiserror::Error;

/// 棋盘编码错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// 紧凑索引越界
    #[error("Invalid dense index: {0} (expected 0-31)")]
    InvalidDenseIndex(u8),

    /// 稀疏索引越界
    #[error("Invalid sparse index: {0} (expected 0-63)")]
    InvalidSparseIndex(u8),

    /// 位集不是十进制整数
    #[error("Invalid bit-set encoding: {value:?}")]
    InvalidBitSet { value: String },
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// JSON 序列化错误
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket 错误
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// 消息大小超限
    #[error("Message too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// 收到非文本帧
    #[error("Unexpected {kind} frame")]
    UnexpectedFrame { kind: &'static str },

    /// 连接超时
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
