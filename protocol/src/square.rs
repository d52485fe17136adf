//! 格子坐标
//!
//! 同一批 32 个深色格子有两套编号:
//! - 紧凑索引 (0-31)：位集中的位序号，也是线上走法使用的坐标
//! - 稀疏索引 (0-63)：8x8 棋盘的行列编号 `row * 8 + col`
//!
//! 行号自下而上 0-7，(0, 0) 为左下角的浅色格。

use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_SIZE, PLAYABLE_SQUARES, SQUARE_COUNT};
use crate::error::BoardError;

/// 紧凑索引到稀疏索引的固定对照表，不在运行时推导
const DENSE_TO_SPARSE: [u8; PLAYABLE_SQUARES] = [
    1, 3, 5, 7, //
    8, 10, 12, 14, //
    17, 19, 21, 23, //
    24, 26, 28, 30, //
    33, 35, 37, 39, //
    40, 42, 44, 46, //
    49, 51, 53, 55, //
    56, 58, 60, 62,
];

/// 深色格的紧凑索引 (0-31)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DenseIndex(u8);

impl DenseIndex {
    /// 创建紧凑索引
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < PLAYABLE_SQUARES {
            Some(Self(index))
        } else {
            None
        }
    }

    /// 所有深色格，按位序
    pub fn all() -> impl Iterator<Item = DenseIndex> {
        (0..PLAYABLE_SQUARES as u8).map(DenseIndex)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// 该格在位集中的掩码
    pub const fn bit(self) -> u64 {
        1u64 << self.0
    }

    /// 对应的显示格
    pub const fn cell(self) -> Cell {
        let row = self.0 / 4;
        let col = (self.0 % 4) * 2 + if row % 2 == 0 { 1 } else { 0 };
        Cell { row, col }
    }

    /// 查表得到稀疏索引
    pub const fn to_sparse(self) -> SparseIndex {
        SparseIndex(DENSE_TO_SPARSE[self.0 as usize])
    }
}

impl TryFrom<u8> for DenseIndex {
    type Error = BoardError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        DenseIndex::new(value).ok_or(BoardError::InvalidDenseIndex(value))
    }
}

impl From<DenseIndex> for u8 {
    fn from(index: DenseIndex) -> u8 {
        index.0
    }
}

impl std::fmt::Display for DenseIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "d{}", self.0)
    }
}

/// 8x8 棋盘上的稀疏索引 (0-63)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SparseIndex(u8);

impl SparseIndex {
    /// 创建稀疏索引
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < SQUARE_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn cell(self) -> Cell {
        Cell {
            row: self.0 / BOARD_SIZE,
            col: self.0 % BOARD_SIZE,
        }
    }

    /// 转为紧凑索引，浅色格返回 None
    pub const fn to_dense(self) -> Option<DenseIndex> {
        self.cell().to_dense()
    }
}

impl TryFrom<u8> for SparseIndex {
    type Error = BoardError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        SparseIndex::new(value).ok_or(BoardError::InvalidSparseIndex(value))
    }
}

impl std::fmt::Display for SparseIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// 显示网格中的格子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// 行 (0-7，自下而上)
    pub row: u8,
    /// 列 (0-7，自左而右)
    pub col: u8,
}

impl Cell {
    /// 创建格子
    pub const fn new(row: u8, col: u8) -> Option<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// 是否为深色（可走）格
    pub const fn is_dark(self) -> bool {
        (self.row + self.col) % 2 == 1
    }

    /// 深色格的紧凑索引: row * 4 + col / 2
    pub const fn to_dense(self) -> Option<DenseIndex> {
        if self.row < BOARD_SIZE && self.col < BOARD_SIZE && self.is_dark() {
            Some(DenseIndex(self.row * 4 + self.col / 2))
        } else {
            None
        }
    }

    pub const fn to_sparse(self) -> SparseIndex {
        SparseIndex(self.row * BOARD_SIZE + self.col)
    }

    /// 按显示顺序遍历全部 64 格：自上而下（第 7 行到第 0 行），每行从左到右
    pub fn display_order() -> impl Iterator<Item = Cell> {
        (0..BOARD_SIZE)
            .rev()
            .flat_map(|row| (0..BOARD_SIZE).map(move |col| Cell { row, col }))
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", (b'a' + self.col) as char, self.row + 1)
    }
}

/// 由行列计算紧凑索引，浅色格或越界返回 None
pub fn to_dense(row: u8, col: u8) -> Option<DenseIndex> {
    Cell::new(row, col).and_then(Cell::to_dense)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_sparse_bijection() {
        let mut seen = [false; SQUARE_COUNT];
        for dense in DenseIndex::all() {
            let sparse = dense.to_sparse();
            assert!(!seen[sparse.get() as usize], "{} mapped twice", sparse);
            seen[sparse.get() as usize] = true;
            assert_eq!(sparse.to_dense(), Some(dense));
            assert_eq!(dense.cell().to_sparse(), sparse);
        }
        assert_eq!(seen.iter().filter(|s| **s).count(), PLAYABLE_SQUARES);
    }

    #[test]
    fn test_table_matches_row_col_formula() {
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let cell = Cell::new(row, col).unwrap();
                match to_dense(row, col) {
                    Some(dense) => {
                        assert!(cell.is_dark());
                        assert_eq!(dense.get(), row * 4 + col / 2);
                        assert_eq!(dense.to_sparse().get(), row * 8 + col);
                        assert_eq!(dense.cell(), cell);
                    }
                    None => assert!(!cell.is_dark()),
                }
            }
        }
    }

    #[test]
    fn test_known_squares() {
        // 左下角 (0,0) 为浅色格，右侧 (0,1) 为第一个深色格
        assert_eq!(to_dense(0, 0), None);
        assert_eq!(to_dense(0, 1), DenseIndex::new(0));
        assert_eq!(to_dense(1, 0), DenseIndex::new(4));
        assert_eq!(to_dense(7, 6), DenseIndex::new(31));
        assert_eq!(DenseIndex::new(31).unwrap().to_sparse().get(), 62);
        assert_eq!(DenseIndex::new(4).unwrap().to_sparse().get(), 8);
    }

    #[test]
    fn test_light_sparse_has_no_dense() {
        assert_eq!(SparseIndex::new(0).unwrap().to_dense(), None);
        assert_eq!(SparseIndex::new(9).unwrap().to_dense(), None);
        assert_eq!(SparseIndex::new(63).unwrap().to_dense(), None);
    }

    #[test]
    fn test_bounds() {
        assert!(DenseIndex::new(32).is_none());
        assert!(SparseIndex::new(64).is_none());
        assert!(Cell::new(8, 0).is_none());
        assert_eq!(to_dense(0, 8), None);
        assert_eq!(
            DenseIndex::try_from(40),
            Err(BoardError::InvalidDenseIndex(40))
        );
        assert_eq!(
            SparseIndex::try_from(64),
            Err(BoardError::InvalidSparseIndex(64))
        );
    }

    #[test]
    fn test_display_order() {
        let cells: Vec<Cell> = Cell::display_order().collect();
        assert_eq!(cells.len(), SQUARE_COUNT);
        assert_eq!(cells[0], Cell { row: 7, col: 0 });
        assert_eq!(cells[7], Cell { row: 7, col: 7 });
        assert_eq!(cells[56], Cell { row: 0, col: 0 });
        assert_eq!(cells[63], Cell { row: 0, col: 7 });
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::new(0, 0).unwrap().to_string(), "a1");
        assert_eq!(Cell::new(7, 6).unwrap().to_string(), "g8");
        assert_eq!(DenseIndex::new(12).unwrap().to_string(), "d12");
    }
}
