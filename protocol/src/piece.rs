//! 棋子定义

use serde::{Deserialize, Serialize};

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// 白方（本地玩家，在下方）
    White,
    /// 黑方（引擎，在上方）
    Black,
}

impl Side {
    /// 线上的回合编号
    pub const fn wire_code(self) -> u8 {
        match self {
            Side::White => 1,
            Side::Black => 2,
        }
    }

    /// 从线上的回合编号解析
    pub const fn from_wire(code: u8) -> Option<Side> {
        match code {
            1 => Some(Side::White),
            2 => Some(Side::Black),
            _ => None,
        }
    }

    /// 获取对方阵营
    pub fn opponent(&self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::White => f.write_str("white"),
            Side::Black => f.write_str("black"),
        }
    }
}

/// 格子上的棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occupant {
    pub side: Side,
    /// 是否已升王
    pub crowned: bool,
}

impl Occupant {
    pub fn new(side: Side, crowned: bool) -> Self {
        Self { side, crowned }
    }
}
