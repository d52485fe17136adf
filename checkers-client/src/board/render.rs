//! 棋盘渲染

use bevy::prelude::*;
use protocol::Occupant;

use super::{
    BoardLayout, BoardMarker, BoardView, CellView, Draggable, HighlightMarker, PieceAssets,
    PieceInfo, SquareMarker,
};
use crate::theme::ColorTheme;

/// 棋子的层级
pub const PIECE_Z: f32 = 10.0;
/// 影子棋子的层级，高于所有棋子
pub const GHOST_Z: f32 = 50.0;

/// 按视图生成整个棋盘
pub fn spawn_board(
    commands: &mut Commands,
    layout: &BoardLayout,
    theme: &ColorTheme,
    assets: &PieceAssets,
    view: &BoardView,
) {
    // 边框
    let center = layout.center();
    commands.spawn((
        Sprite {
            color: theme.piece_border,
            custom_size: Some(Vec2::splat(layout.side() + layout.cell_size * 0.2)),
            ..default()
        },
        Transform::from_xyz(center.x, center.y, 0.0),
        BoardMarker,
    ));

    for cell in &view.cells {
        spawn_square(commands, layout, theme, cell);

        if cell.highlighted {
            spawn_highlight(commands, layout, theme, cell);
        }

        if let (Some(square), Some(piece)) = (cell.square, cell.piece) {
            let pos = layout.cell_center(cell.cell);
            let mut entity = spawn_piece(
                commands,
                assets,
                piece.occupant,
                pos.extend(PIECE_Z),
                layout.piece_radius,
            );
            entity.insert((
                PieceInfo {
                    square,
                    occupant: piece.occupant,
                },
                BoardMarker,
            ));
            if piece.draggable {
                entity.insert(Draggable);
            }
        }
    }
}

fn spawn_square(commands: &mut Commands, layout: &BoardLayout, theme: &ColorTheme, cell: &CellView) {
    let pos = layout.cell_center(cell.cell);
    let color = if cell.is_dark() {
        theme.dark_square
    } else {
        theme.light_square
    };

    commands.spawn((
        Sprite {
            color,
            custom_size: Some(Vec2::splat(layout.cell_size)),
            ..default()
        },
        Transform::from_xyz(pos.x, pos.y, 1.0),
        SquareMarker { cell: cell.cell },
        BoardMarker,
    ));
}

/// 连吃提示：半透明色块盖在格子上
fn spawn_highlight(commands: &mut Commands, layout: &BoardLayout, theme: &ColorTheme, cell: &CellView) {
    let pos = layout.cell_center(cell.cell);
    commands.spawn((
        Sprite {
            color: theme.must_move_highlight,
            custom_size: Some(Vec2::splat(layout.cell_size * 0.96)),
            ..default()
        },
        Transform::from_xyz(pos.x, pos.y, 2.0),
        HighlightMarker,
        BoardMarker,
    ));
}

/// 生成一枚棋子的外观
///
/// 根实体带棋子底色材质，变暗时只替换这一个材质。
/// 边框和王冠作为子实体，随根实体一起缩放和移动。
pub fn spawn_piece<'a>(
    commands: &'a mut Commands,
    assets: &PieceAssets,
    occupant: Occupant,
    translation: Vec3,
    radius: f32,
) -> EntityCommands<'a> {
    let mut entity = commands.spawn((
        Mesh2d(assets.disc.clone()),
        MeshMaterial2d(assets.material(occupant.side, false)),
        Transform::from_translation(translation).with_scale(Vec3::new(radius, radius, 1.0)),
    ));

    let crowned = occupant.crowned;
    let disc = assets.disc.clone();
    let border = assets.border.clone();
    let crown = assets.crown.clone();
    entity.with_children(|parent| {
        parent.spawn((
            Mesh2d(disc.clone()),
            MeshMaterial2d(border),
            Transform::from_xyz(0.0, 0.0, -0.1).with_scale(Vec3::new(1.1, 1.1, 1.0)),
        ));

        if crowned {
            parent.spawn((
                Mesh2d(disc),
                MeshMaterial2d(crown),
                Transform::from_xyz(0.0, 0.0, 0.1).with_scale(Vec3::new(0.45, 0.45, 1.0)),
            ));
        }
    });

    entity
}
