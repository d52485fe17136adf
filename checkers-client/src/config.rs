//! 客户端配置
//!
//! 只在内存中存在，不读环境变量也不落盘。

use std::time::Duration;

use bevy::prelude::*;
use protocol::{NetworkConfig, Side, ENGINE_MOVE_DELAY};

/// 客户端配置
#[derive(Resource, Clone, Debug)]
pub struct ClientConfig {
    /// 服务端通道
    pub network: NetworkConfig,
    /// 轮到对方后，延迟多久请求引擎走棋
    pub engine_move_delay: Duration,
    /// 本地玩家阵营
    pub local_side: Side,
    /// 窗口标题
    pub window_title: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            engine_move_delay: ENGINE_MOVE_DELAY,
            local_side: Side::White,
            window_title: "Checkers".to_string(),
        }
    }
}
