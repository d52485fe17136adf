//! 主题和配色方案
//!
//! 定义棋盘、棋子的颜色配置

use bevy::prelude::*;

/// 主题插件
pub struct ThemePlugin;

impl Plugin for ThemePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ColorTheme::classic())
            .insert_resource(ClearColor(ColorTheme::classic().background));
    }
}

/// 颜色主题配置
#[derive(Resource, Clone, Debug)]
pub struct ColorTheme {
    pub background: Color,

    // 棋盘
    pub light_square: Color,
    pub dark_square: Color,

    // 棋子
    pub white_piece: Color,
    pub black_piece: Color,
    pub piece_border: Color,
    pub crown: Color,
    /// 拖动时原棋子的透明度
    pub dimmed_alpha: f32,

    // 交互高亮
    pub must_move_highlight: Color,

    // 状态栏
    pub status_text: Color,
}

impl ColorTheme {
    /// 经典木质配色
    pub fn classic() -> Self {
        Self {
            background: Color::srgb_u8(38, 32, 28),

            light_square: Color::srgb_u8(240, 217, 181), // #F0D9B5
            dark_square: Color::srgb_u8(181, 136, 99),   // #B58863

            white_piece: Color::srgb_u8(250, 250, 245),
            black_piece: Color::srgb_u8(33, 33, 33),
            piece_border: Color::srgb_u8(78, 52, 46),
            crown: Color::srgb_u8(255, 193, 7), // #FFC107 金色
            dimmed_alpha: 0.3,

            must_move_highlight: Color::srgba_u8(255, 82, 82, 200),

            status_text: Color::srgb_u8(238, 238, 238),
        }
    }
}
