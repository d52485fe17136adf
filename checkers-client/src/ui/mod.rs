//! UI 模块
//!
//! 顶部状态栏和重新开始按钮

use bevy::prelude::*;

use crate::game::{ResetRequested, Session};
use crate::theme::ColorTheme;

/// UI 插件
pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_status_bar)
            .add_systems(Update, (update_status_text, handle_buttons));
    }
}

/// 状态栏文本
#[derive(Component)]
pub struct StatusText;

/// 按钮类型
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    NewGame,
}

/// 按钮颜色
pub const NORMAL_BUTTON: Color = Color::srgb(0.25, 0.25, 0.25);
pub const HOVERED_BUTTON: Color = Color::srgb(0.35, 0.35, 0.35);
pub const PRESSED_BUTTON: Color = Color::srgb(0.45, 0.45, 0.45);

fn setup_status_bar(mut commands: Commands, theme: Res<ColorTheme>, session: Res<Session>) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Px(56.0),
            flex_direction: FlexDirection::Row,
            justify_content: JustifyContent::SpaceBetween,
            align_items: AlignItems::Center,
            padding: UiRect::horizontal(Val::Px(16.0)),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new(session.status().to_string()),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
                TextColor(theme.status_text),
                StatusText,
            ));

            parent
                .spawn((
                    Button,
                    Node {
                        width: Val::Px(140.0),
                        height: Val::Px(40.0),
                        justify_content: JustifyContent::Center,
                        align_items: AlignItems::Center,
                        ..default()
                    },
                    BackgroundColor(NORMAL_BUTTON),
                    ButtonAction::NewGame,
                ))
                .with_children(|parent| {
                    parent.spawn((
                        Text::new("New game"),
                        TextFont {
                            font_size: 20.0,
                            ..default()
                        },
                        TextColor(Color::WHITE),
                    ));
                });
        });
}

/// 状态文本变化时才写入
fn update_status_text(session: Res<Session>, mut query: Query<&mut Text, With<StatusText>>) {
    if !session.is_changed() {
        return;
    }
    let status = session.status().to_string();
    for mut text in query.iter_mut() {
        if text.0 != status {
            text.0 = status.clone();
        }
    }
}

/// 处理按钮点击
fn handle_buttons(
    mut interaction_query: Query<
        (&Interaction, &mut BackgroundColor, &ButtonAction),
        (Changed<Interaction>, With<Button>),
    >,
    mut resets: MessageWriter<ResetRequested>,
) {
    for (interaction, mut color, action) in &mut interaction_query {
        match *interaction {
            Interaction::Pressed => {
                *color = PRESSED_BUTTON.into();
                match action {
                    ButtonAction::NewGame => {
                        tracing::info!("New game requested");
                        resets.write(ResetRequested);
                    }
                }
            }
            Interaction::Hovered => {
                *color = HOVERED_BUTTON.into();
            }
            Interaction::None => {
                *color = NORMAL_BUTTON.into();
            }
        }
    }
}
