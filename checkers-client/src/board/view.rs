//! 棋盘视图模型
//!
//! 由快照和回合状态计算出每一格该画什么，渲染层只负责照着生成实体。

use protocol::{BoardSnapshot, Cell, DenseIndex, Occupant, Side};

use crate::game::Session;

/// 格子上的棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceView {
    pub occupant: Occupant,
    /// 是否挂上拖拽入口
    pub draggable: bool,
}

/// 单个格子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView {
    pub cell: Cell,
    /// 深色格的紧凑索引
    pub square: Option<DenseIndex>,
    pub piece: Option<PieceView>,
    /// 连吃提示，纯装饰
    pub highlighted: bool,
}

impl CellView {
    pub fn is_dark(&self) -> bool {
        self.square.is_some()
    }
}

/// 整个棋盘，按显示顺序排列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub cells: Vec<CellView>,
}

impl BoardView {
    /// 生成视图
    ///
    /// `movable` 只在本地回合时为本方阵营，其余时间为 None。
    pub fn build(
        snapshot: Option<&BoardSnapshot>,
        movable: Option<Side>,
        must_move_from: Option<DenseIndex>,
    ) -> Self {
        let cells = Cell::display_order()
            .map(|cell| {
                let square = cell.to_dense();
                let piece = snapshot
                    .and_then(|board| board.occupant_at(cell))
                    .map(|occupant| PieceView {
                        occupant,
                        draggable: movable == Some(occupant.side),
                    });
                CellView {
                    cell,
                    square,
                    piece,
                    highlighted: square.is_some() && square == must_move_from,
                }
            })
            .collect();
        Self { cells }
    }

    pub fn from_session(session: &Session) -> Self {
        Self::build(
            session.snapshot(),
            session.movable_side(),
            session.must_move_from(),
        )
    }

    /// 所有有棋子的格子
    pub fn pieces(&self) -> impl Iterator<Item = (&CellView, &PieceView)> {
        self.cells
            .iter()
            .filter_map(|cell| cell.piece.as_ref().map(|piece| (cell, piece)))
    }

    pub fn cell(&self, square: DenseIndex) -> Option<&CellView> {
        self.cells.iter().find(|c| c.square == Some(square))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::ServerMessage;

    fn dense(i: u8) -> DenseIndex {
        DenseIndex::new(i).unwrap()
    }

    #[test]
    fn test_initial_position_layout() {
        let view = BoardView::build(Some(&BoardSnapshot::initial()), Some(Side::White), None);
        assert_eq!(view.cells.len(), 64);

        let dark: Vec<&CellView> = view.cells.iter().filter(|c| c.is_dark()).collect();
        assert_eq!(dark.len(), 32);

        let white_bottom = dark
            .iter()
            .filter(|c| c.cell.row <= 2)
            .filter(|c| matches!(c.piece, Some(p) if p.occupant.side == Side::White))
            .count();
        let black_top = dark
            .iter()
            .filter(|c| c.cell.row >= 5)
            .filter(|c| matches!(c.piece, Some(p) if p.occupant.side == Side::Black))
            .count();
        let empty_middle = dark
            .iter()
            .filter(|c| (3..=4).contains(&c.cell.row) && c.piece.is_none())
            .count();

        assert_eq!(white_bottom, 12);
        assert_eq!(black_top, 12);
        assert_eq!(empty_middle, 8);
        assert_eq!(view.pieces().count(), 24);
    }

    #[test]
    fn test_bottom_left_rendered_last_row_first() {
        let view = BoardView::build(None, None, None);
        assert_eq!(view.cells[0].cell, Cell::new(7, 0).unwrap());
        assert_eq!(view.cells[56].cell, Cell::new(0, 0).unwrap());
        assert!(!view.cells[56].is_dark());
        assert_eq!(view.cells[57].square, Some(dense(0)));
    }

    #[test]
    fn test_light_squares_never_hold_pieces() {
        let board = BoardSnapshot::new(u64::MAX, 0, u64::MAX);
        let view = BoardView::build(Some(&board), Some(Side::White), None);
        for cell in &view.cells {
            assert_eq!(cell.piece.is_some(), cell.is_dark());
        }
    }

    #[test]
    fn test_only_local_pieces_draggable_on_local_turn() {
        let view = BoardView::build(Some(&BoardSnapshot::initial()), Some(Side::White), None);
        for (_, piece) in view.pieces() {
            assert_eq!(piece.draggable, piece.occupant.side == Side::White);
        }
    }

    #[test]
    fn test_remote_turn_disables_all_drags() {
        let mut session = Session::default();
        session.on_channel_open();
        session.apply(ServerMessage::BoardUpdate {
            board: BoardSnapshot::initial(),
            turn: Side::Black.wire_code(),
            must_move_from: None,
            message: None,
        });

        let view = BoardView::from_session(&session);
        assert_eq!(view.pieces().count(), 24);
        assert!(view.pieces().all(|(_, piece)| !piece.draggable));
    }

    #[test]
    fn test_must_move_highlight() {
        let board = BoardSnapshot::new(1 << 14, 0, 1 << 14);
        let view = BoardView::build(Some(&board), Some(Side::White), Some(dense(14)));

        let highlighted: Vec<&CellView> = view.cells.iter().filter(|c| c.highlighted).collect();
        assert_eq!(highlighted.len(), 1);
        assert_eq!(highlighted[0].square, Some(dense(14)));

        let piece = view.cell(dense(14)).and_then(|c| c.piece).unwrap();
        assert!(piece.occupant.crowned);
        // 提示不影响拖拽资格
        assert!(piece.draggable);
    }

    #[test]
    fn test_no_snapshot_renders_empty_grid() {
        let view = BoardView::build(None, Some(Side::White), None);
        assert_eq!(view.cells.len(), 64);
        assert_eq!(view.pieces().count(), 0);
    }
}
