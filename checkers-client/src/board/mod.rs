//! 棋盘渲染模块
//!
//! 负责棋盘格、棋子和连吃提示的渲染。每次收到新快照都整体重建。

mod render;
mod view;

pub use render::*;
pub use view::*;

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use protocol::{Cell, DenseIndex, Occupant, Side, BOARD_SIZE};

use crate::game::{despawn_ghost, DragEffect, DragState, RedrawBoard, Session, SquareHit};
use crate::theme::ColorTheme;

/// 棋盘插件
pub struct BoardPlugin;

impl Plugin for BoardPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(BoardLayout::default())
            .add_systems(Startup, setup_piece_assets)
            .add_systems(
                Update,
                (fit_layout_to_window, redraw_board).chain().in_set(BoardRebuild),
            );
    }
}

/// 棋盘布局和重建，输入处理排在它之后
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardRebuild;

/// 棋盘布局配置
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct BoardLayout {
    /// 棋盘左下角（世界坐标）
    pub origin: Vec2,
    /// 格子大小
    pub cell_size: f32,
    /// 棋子半径
    pub piece_radius: f32,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self::with_cell_size(Vec2::new(-240.0, -270.0), 60.0)
    }
}

impl BoardLayout {
    fn with_cell_size(origin: Vec2, cell_size: f32) -> Self {
        Self {
            origin,
            cell_size,
            piece_radius: cell_size * 0.4,
        }
    }

    /// 根据窗口大小计算布局
    pub fn from_window_size(width: f32, height: f32) -> Self {
        // 顶部留给状态栏
        let available = (width * 0.9).min(height * 0.8);
        let cell_size = (available / BOARD_SIZE as f32).floor().max(8.0);
        let side = cell_size * BOARD_SIZE as f32;

        let origin = Vec2::new(-side / 2.0, -side / 2.0 - height * 0.05);
        Self::with_cell_size(origin, cell_size)
    }

    /// 棋盘边长
    pub fn side(&self) -> f32 {
        self.cell_size * BOARD_SIZE as f32
    }

    /// 棋盘中心
    pub fn center(&self) -> Vec2 {
        self.origin + Vec2::splat(self.side() / 2.0)
    }

    /// 格子中心的世界坐标，第 0 行在下方
    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        self.origin
            + Vec2::new(
                (cell.col as f32 + 0.5) * self.cell_size,
                (cell.row as f32 + 0.5) * self.cell_size,
            )
    }

    /// 世界坐标命中的格子
    pub fn hit(&self, pos: Vec2) -> SquareHit {
        let relative = (pos - self.origin) / self.cell_size;
        let col = relative.x.floor();
        let row = relative.y.floor();
        let range = 0.0..BOARD_SIZE as f32;
        if !range.contains(&col) || !range.contains(&row) {
            return SquareHit::Outside;
        }

        match Cell::new(row as u8, col as u8).and_then(|cell| cell.to_dense()) {
            Some(square) => SquareHit::Dark(square),
            None => SquareHit::Light,
        }
    }
}

/// 棋盘标记组件，重建时整体清除
#[derive(Component)]
pub struct BoardMarker;

/// 棋盘格
#[derive(Component)]
pub struct SquareMarker {
    pub cell: Cell,
}

/// 棋子信息
#[derive(Component, Clone, Copy, Debug)]
pub struct PieceInfo {
    pub square: DenseIndex,
    pub occupant: Occupant,
}

/// 可拖动的棋子，只在本地回合挂到本方棋子上
#[derive(Component)]
pub struct Draggable;

/// 跟随指针的影子棋子
#[derive(Component)]
pub struct GhostPiece;

/// 高亮标记组件
#[derive(Component)]
pub struct HighlightMarker;

/// 棋子共用的网格和材质
#[derive(Resource, Clone)]
pub struct PieceAssets {
    /// 单位圆，按半径缩放
    pub disc: Handle<Mesh>,
    pub white: Handle<ColorMaterial>,
    pub black: Handle<ColorMaterial>,
    pub white_dimmed: Handle<ColorMaterial>,
    pub black_dimmed: Handle<ColorMaterial>,
    pub border: Handle<ColorMaterial>,
    pub crown: Handle<ColorMaterial>,
}

impl PieceAssets {
    pub fn material(&self, side: Side, dimmed: bool) -> Handle<ColorMaterial> {
        match (side, dimmed) {
            (Side::White, false) => self.white.clone(),
            (Side::White, true) => self.white_dimmed.clone(),
            (Side::Black, false) => self.black.clone(),
            (Side::Black, true) => self.black_dimmed.clone(),
        }
    }
}

fn setup_piece_assets(
    mut commands: Commands,
    theme: Res<ColorTheme>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let mut material = |color: Color| materials.add(ColorMaterial::from_color(color));

    let assets = PieceAssets {
        disc: meshes.add(Circle::new(1.0)),
        white: material(theme.white_piece),
        black: material(theme.black_piece),
        white_dimmed: material(theme.white_piece.with_alpha(theme.dimmed_alpha)),
        black_dimmed: material(theme.black_piece.with_alpha(theme.dimmed_alpha)),
        border: material(theme.piece_border),
        crown: material(theme.crown),
    };
    commands.insert_resource(assets);
}

/// 窗口尺寸变化时更新布局
fn fit_layout_to_window(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut layout: ResMut<BoardLayout>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let fitted = BoardLayout::from_window_size(window.width(), window.height());
    if *layout != fitted {
        tracing::debug!("Board layout: cell size {}", fitted.cell_size);
        *layout = fitted;
    }
}

/// 收到重绘请求或布局变化时整体重建棋盘
#[allow(clippy::too_many_arguments)]
fn redraw_board(
    mut commands: Commands,
    mut redraws: MessageReader<RedrawBoard>,
    layout: Res<BoardLayout>,
    theme: Res<ColorTheme>,
    session: Res<Session>,
    assets: Option<Res<PieceAssets>>,
    mut drag: ResMut<DragState>,
    board_query: Query<Entity, With<BoardMarker>>,
) {
    let requested = redraws.read().count() > 0;
    if !requested && !layout.is_changed() {
        return;
    }
    let Some(assets) = assets else {
        return;
    };

    // 旧棋子马上被清除，拖拽随之作废；原棋子不必恢复
    let state = &mut *drag;
    for effect in state.controller.abort() {
        if let DragEffect::DespawnGhost = effect {
            despawn_ghost(&mut commands, &mut state.ghost);
        }
    }

    for entity in board_query.iter() {
        commands.entity(entity).despawn();
    }

    let view = BoardView::from_session(&session);
    render::spawn_board(&mut commands, &layout, &theme, &assets, &view);
    tracing::debug!(
        "Board redrawn: {} pieces, phase {:?}",
        view.pieces().count(),
        session.phase()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> BoardLayout {
        BoardLayout::with_cell_size(Vec2::ZERO, 10.0)
    }

    #[test]
    fn test_cell_center() {
        let layout = layout();
        let a1 = Cell::new(0, 0).unwrap();
        let h8 = Cell::new(7, 7).unwrap();
        assert_eq!(layout.cell_center(a1), Vec2::new(5.0, 5.0));
        assert_eq!(layout.cell_center(h8), Vec2::new(75.0, 75.0));
    }

    #[test]
    fn test_hit_dark_and_light() {
        let layout = layout();
        // b1 是深色格，紧凑索引 0
        assert_eq!(
            layout.hit(Vec2::new(15.0, 5.0)),
            SquareHit::Dark(DenseIndex::new(0).unwrap())
        );
        assert_eq!(layout.hit(Vec2::new(5.0, 5.0)), SquareHit::Light);
        // g8 -> 紧凑索引 31
        assert_eq!(
            layout.hit(Vec2::new(65.0, 75.0)),
            SquareHit::Dark(DenseIndex::new(31).unwrap())
        );
    }

    #[test]
    fn test_hit_outside() {
        let layout = layout();
        assert_eq!(layout.hit(Vec2::new(-0.1, 5.0)), SquareHit::Outside);
        assert_eq!(layout.hit(Vec2::new(5.0, 80.0)), SquareHit::Outside);
        assert_eq!(layout.hit(Vec2::new(200.0, -50.0)), SquareHit::Outside);
    }

    #[test]
    fn test_hit_every_cell_center() {
        let layout = layout();
        for cell in Cell::display_order() {
            let expected = match cell.to_dense() {
                Some(square) => SquareHit::Dark(square),
                None => SquareHit::Light,
            };
            assert_eq!(layout.hit(layout.cell_center(cell)), expected, "{}", cell);
        }
    }

    #[test]
    fn test_from_window_size_fits() {
        let layout = BoardLayout::from_window_size(1280.0, 720.0);
        assert!(layout.side() <= 720.0 * 0.8);
        assert!(layout.origin.x < 0.0);
        assert!((layout.center().x).abs() < f32::EPSILON);

        let narrow = BoardLayout::from_window_size(400.0, 900.0);
        assert!(narrow.side() <= 400.0 * 0.9);
    }
}
