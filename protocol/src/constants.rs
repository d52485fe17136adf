//! 协议常量定义

use std::time::Duration;

/// 协议修订号
///
/// 第 3 版起走法坐标统一使用 0-31 的紧凑索引，与早期 0-63 坐标的版本不兼容。
pub const PROTOCOL_REVISION: u8 = 3;

/// 棋盘边长
pub const BOARD_SIZE: u8 = 8;

/// 棋盘格子总数
pub const SQUARE_COUNT: usize = 64;

/// 可走的深色格子数
pub const PLAYABLE_SQUARES: usize = 32;

/// 位集中有效位的掩码
pub const PLAYABLE_MASK: u64 = (1u64 << PLAYABLE_SQUARES) - 1;

/// 消息最大大小
pub const MAX_MESSAGE_SIZE: usize = 65536;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 请求引擎走棋前的延迟（毫秒），只为让对方走棋肉眼可见
pub const ENGINE_MOVE_DELAY_MS: u64 = 500;

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);

/// 引擎请求延迟 Duration
pub const ENGINE_MOVE_DELAY: Duration = Duration::from_millis(ENGINE_MOVE_DELAY_MS);
