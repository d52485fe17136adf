//! 西洋跳棋客户端
//!
//! 使用 Bevy 引擎实现的跳棋客户端。规则全部在服务端，客户端只负责
//! 显示快照、把拖拽变成走法，以及在对方回合请求引擎走棋。

pub mod board;
pub mod config;
pub mod game;
pub mod network;
pub mod theme;
pub mod ui;

use bevy::prelude::*;

use config::ClientConfig;
use game::Session;

/// 客户端插件
#[derive(Default)]
pub struct CheckersClientPlugin {
    pub config: ClientConfig,
}

impl Plugin for CheckersClientPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .insert_resource(Session::from_config(&self.config))
            .add_systems(Startup, spawn_camera)
            .add_plugins((
                theme::ThemePlugin,
                board::BoardPlugin,
                game::GamePlugin,
                network::NetworkPlugin,
                ui::UiPlugin,
            ));
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}
