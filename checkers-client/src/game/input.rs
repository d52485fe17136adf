//! 输入处理
//!
//! 鼠标和触摸先统一成指针事件排队，再交给拖拽控制器，最后把返回的效果落到实体上。

use bevy::input::touch::Touches;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::{DragEffect, DragState, Grab, MoveRequested, PointerId, Session, SquareHit};
use crate::board::{
    spawn_piece, BoardLayout, Draggable, GhostPiece, PieceAssets, PieceInfo, GHOST_Z,
};

/// 一帧内收集到的指针事件，坐标已换算到世界坐标
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press(PointerId, Vec2),
    Move(PointerId, Vec2),
    /// 松开位置可能已经不在窗口内
    Release(PointerId, Option<Vec2>),
    Cancel(PointerId),
}

/// 等待处理的指针事件
#[derive(Resource, Debug, Default)]
pub struct PointerQueue {
    events: Vec<PointerEvent>,
}

impl PointerQueue {
    pub fn push(&mut self, event: PointerEvent) {
        self.events.push(event);
    }
}

/// 把鼠标和触摸换算成指针事件
pub fn collect_pointer_events(
    mouse_button: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    windows: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform)>,
    mut queue: ResMut<PointerQueue>,
) {
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    let to_world = |pos: Vec2| camera.viewport_to_world_2d(camera_transform, pos).ok();

    let cursor = windows
        .single()
        .ok()
        .and_then(|window| window.cursor_position())
        .and_then(to_world);

    if mouse_button.just_pressed(MouseButton::Left) {
        if let Some(at) = cursor {
            queue.push(PointerEvent::Press(PointerId::Mouse, at));
        }
    }
    if mouse_button.pressed(MouseButton::Left) {
        if let Some(at) = cursor {
            queue.push(PointerEvent::Move(PointerId::Mouse, at));
        }
    }
    if mouse_button.just_released(MouseButton::Left) {
        queue.push(PointerEvent::Release(PointerId::Mouse, cursor));
    }

    for touch in touches.iter_just_pressed() {
        if let Some(at) = to_world(touch.position()) {
            queue.push(PointerEvent::Press(PointerId::Touch(touch.id()), at));
        }
    }
    for touch in touches.iter() {
        if touch.delta() != Vec2::ZERO {
            if let Some(at) = to_world(touch.position()) {
                queue.push(PointerEvent::Move(PointerId::Touch(touch.id()), at));
            }
        }
    }
    for touch in touches.iter_just_released() {
        queue.push(PointerEvent::Release(
            PointerId::Touch(touch.id()),
            to_world(touch.position()),
        ));
    }
    for touch in touches.iter_just_canceled() {
        queue.push(PointerEvent::Cancel(PointerId::Touch(touch.id())));
    }
}

/// 把指针事件交给拖拽控制器
///
/// 必须排在棋盘重建之后，按下时才能看到本帧新生成的棋子。
#[allow(clippy::too_many_arguments)]
pub fn process_pointer_events(
    mut commands: Commands,
    mut queue: ResMut<PointerQueue>,
    layout: Res<BoardLayout>,
    session: Res<Session>,
    assets: Option<Res<PieceAssets>>,
    mut drag: ResMut<DragState>,
    pieces: Query<(Entity, &PieceInfo), With<Draggable>>,
    mut ghosts: Query<&mut Transform, With<GhostPiece>>,
    mut moves: MessageWriter<MoveRequested>,
) {
    if queue.events.is_empty() {
        return;
    }
    let events = std::mem::take(&mut queue.events);
    let Some(assets) = assets else {
        return;
    };

    let state = &mut *drag;
    for event in events {
        let effects = match event {
            PointerEvent::Press(pointer, at) => {
                let grab = grab_at(&layout, &session, &pieces, at);
                state.controller.press(pointer, at, grab)
            }
            PointerEvent::Move(pointer, at) => state.controller.drag(pointer, at).into_iter().collect(),
            PointerEvent::Release(pointer, at) => {
                let hit = at.map_or(SquareHit::Outside, |at| layout.hit(at));
                state.controller.release(pointer, hit)
            }
            PointerEvent::Cancel(pointer) => state.controller.cancel(pointer),
        };

        for effect in effects {
            apply_effect(
                &mut commands,
                &assets,
                &layout,
                &pieces,
                &mut ghosts,
                &mut state.ghost,
                &mut moves,
                effect,
            );
        }
    }
}

/// 按下位置上可拖动的棋子
fn grab_at(
    layout: &BoardLayout,
    session: &Session,
    pieces: &Query<(Entity, &PieceInfo), With<Draggable>>,
    at: Vec2,
) -> Option<Grab<Entity>> {
    let SquareHit::Dark(square) = layout.hit(at) else {
        return None;
    };
    pieces
        .iter()
        .find(|(_, info)| info.square == square && session.can_drag(info.occupant))
        .map(|(piece, _)| Grab { piece, square })
}

#[allow(clippy::too_many_arguments)]
fn apply_effect(
    commands: &mut Commands,
    assets: &PieceAssets,
    layout: &BoardLayout,
    pieces: &Query<(Entity, &PieceInfo), With<Draggable>>,
    ghosts: &mut Query<&mut Transform, With<GhostPiece>>,
    ghost: &mut Option<Entity>,
    moves: &mut MessageWriter<MoveRequested>,
    effect: DragEffect<Entity>,
) {
    match effect {
        DragEffect::SpawnGhost { piece, at } => {
            let Ok((_, info)) = pieces.get(piece) else {
                return;
            };
            let id = spawn_piece(
                commands,
                assets,
                info.occupant,
                at.extend(GHOST_Z),
                layout.piece_radius,
            )
            .insert(GhostPiece)
            .id();
            *ghost = Some(id);
        }
        DragEffect::MoveGhost { at } => {
            // 刚生成的影子要到下一帧才能查询到
            if let Some(Ok(mut transform)) = ghost.map(|id| ghosts.get_mut(id)) {
                transform.translation.x = at.x;
                transform.translation.y = at.y;
            }
        }
        DragEffect::DimPiece(piece) | DragEffect::RestorePiece(piece) => {
            let dimmed = matches!(effect, DragEffect::DimPiece(_));
            let Ok((_, info)) = pieces.get(piece) else {
                return;
            };
            if let Ok(mut entity) = commands.get_entity(piece) {
                entity.try_insert(MeshMaterial2d(assets.material(info.occupant.side, dimmed)));
            }
        }
        DragEffect::DespawnGhost => despawn_ghost(commands, ghost),
        DragEffect::Submit(intent) => {
            tracing::debug!("Drag released: {}", intent);
            moves.write(MoveRequested(intent));
        }
    }
}

/// 移除影子棋子
pub fn despawn_ghost(commands: &mut Commands, ghost: &mut Option<Entity>) {
    if let Some(id) = ghost.take() {
        if let Ok(mut entity) = commands.get_entity(id) {
            entity.try_despawn();
        }
    }
}
