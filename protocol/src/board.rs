//! 棋盘快照
//!
//! 服务端用三个位集描述整盘棋：白子、黑子、王。第 n 位对应紧凑索引 n。
//! 线上以十进制字符串传输，保证超出浮点精度的整数不失真。

use serde::{Deserialize, Serialize};

use crate::constants::PLAYABLE_MASK;
use crate::error::BoardError;
use crate::piece::{Occupant, Side};
use crate::square::{Cell, DenseIndex};

/// 服务端下发的棋盘快照，客户端只读
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// 白方棋子（含王）
    #[serde(with = "decimal")]
    pub white_men: u64,
    /// 黑方棋子（含王）
    #[serde(with = "decimal")]
    pub black_men: u64,
    /// 已升王的棋子
    #[serde(with = "decimal")]
    pub kings: u64,
}

impl BoardSnapshot {
    pub fn new(white_men: u64, black_men: u64, kings: u64) -> Self {
        Self {
            white_men,
            black_men,
            kings,
        }
    }

    /// 开局局面：白方占 0-11，黑方占 20-31
    pub fn initial() -> Self {
        Self::new(0x0000_0FFF, 0xFFF0_0000, 0)
    }

    /// 查询某格的棋子
    ///
    /// 先测白方再测黑方，两方位集重叠时以白方为准。
    pub fn occupant(&self, index: DenseIndex) -> Option<Occupant> {
        let mask = index.bit();
        let crowned = self.kings & mask != 0;
        if self.white_men & mask != 0 {
            Some(Occupant::new(Side::White, crowned))
        } else if self.black_men & mask != 0 {
            Some(Occupant::new(Side::Black, crowned))
        } else {
            None
        }
    }

    /// 按显示格查询，浅色格永远为空
    pub fn occupant_at(&self, cell: Cell) -> Option<Occupant> {
        cell.to_dense().and_then(|index| self.occupant(index))
    }

    /// 所有棋子
    pub fn pieces(&self) -> impl Iterator<Item = (DenseIndex, Occupant)> + '_ {
        DenseIndex::all().filter_map(move |index| self.occupant(index).map(|o| (index, o)))
    }

    /// 某方棋子数
    pub fn count(&self, side: Side) -> usize {
        self.pieces().filter(|(_, o)| o.side == side).count()
    }

    /// 检查服务端数据是否违反位集约束
    pub fn anomalies(&self) -> Vec<SnapshotAnomaly> {
        let mut found = Vec::new();

        let stray = (self.white_men | self.black_men | self.kings) & !PLAYABLE_MASK;
        if stray != 0 {
            found.push(SnapshotAnomaly::OutOfRange { bits: stray });
        }

        for index in DenseIndex::all() {
            let mask = index.bit();
            let white = self.white_men & mask != 0;
            let black = self.black_men & mask != 0;
            if white && black {
                found.push(SnapshotAnomaly::Overlap(index));
            }
            if self.kings & mask != 0 && !white && !black {
                found.push(SnapshotAnomaly::OrphanCrown(index));
            }
        }

        found
    }
}

/// 快照中违反约束的地方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotAnomaly {
    /// 同一格同时属于两方
    Overlap(DenseIndex),
    /// 王标记落在空格上
    OrphanCrown(DenseIndex),
    /// 第 31 位以上有置位
    OutOfRange { bits: u64 },
}

impl std::fmt::Display for SnapshotAnomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotAnomaly::Overlap(index) => write!(f, "{} occupied by both sides", index),
            SnapshotAnomaly::OrphanCrown(index) => write!(f, "crown on empty square {}", index),
            SnapshotAnomaly::OutOfRange { bits } => write!(f, "bits outside board: {:#x}", bits),
        }
    }
}

/// 解析十进制位集
///
/// 位数不限。64 位以上的高位不可能对应棋盘格，丢弃并记一条警告；
/// 第 32-63 位保留，由 [`BoardSnapshot::anomalies`] 报告。
pub fn parse_bit_set(text: &str) -> Result<u64, BoardError> {
    let (bits, truncated) = parse_low_bits(text)?;
    if truncated {
        tracing::warn!(
            "Bit set of {} digits is wider than 64 bits, high bits discarded",
            text.len()
        );
    }
    Ok(bits)
}

/// 取低 64 位，并返回是否有更高位被丢弃
fn parse_low_bits(text: &str) -> Result<(u64, bool), BoardError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BoardError::InvalidBitSet {
            value: text.to_string(),
        });
    }

    let mut low = 0u64;
    let mut truncated = false;
    for digit in text.bytes().map(|b| u64::from(b - b'0')) {
        // 回绕运算按 2^64 取模，结果恰好是低 64 位
        let (scaled, mul_overflow) = low.overflowing_mul(10);
        let (next, add_overflow) = scaled.overflowing_add(digit);
        truncated |= mul_overflow || add_overflow;
        low = next;
    }
    Ok((low, truncated))
}

/// 位集与十进制字符串互转
mod decimal {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_bit_set(&text).map_err(de::Error::custom)
    }
}
