//! 游戏逻辑模块
//!
//! 会话状态机、拖拽手势和指针输入

mod drag;
mod input;
mod session;

pub use drag::*;
pub use input::*;
pub use session::*;

use bevy::prelude::{App, Entity, IntoScheduleConfigs, Message, Plugin, Resource, Update};
use protocol::MoveIntent;

use crate::board::BoardRebuild;

/// 游戏插件
pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DragState>()
            .init_resource::<PointerQueue>()
            .add_message::<MoveRequested>()
            .add_message::<RedrawBoard>()
            .add_message::<ResetRequested>()
            .add_systems(
                Update,
                (collect_pointer_events, process_pointer_events)
                    .chain()
                    .after(BoardRebuild),
            );
    }
}

/// 拖拽状态（Bevy 资源）
#[derive(Resource, Default)]
pub struct DragState {
    pub controller: DragController<Entity>,
    /// 当前影子实体，生成命令可能还未生效
    pub ghost: Option<Entity>,
}

/// 玩家拖出了一步走法，等待会话确认后发送
#[derive(Message, Clone, Copy, Debug)]
pub struct MoveRequested(pub MoveIntent);

/// 会话状态变化，需要重建棋盘
#[derive(Message, Clone, Copy, Debug, Default)]
pub struct RedrawBoard;

/// 玩家要求重新开始
#[derive(Message, Clone, Copy, Debug, Default)]
pub struct ResetRequested;
