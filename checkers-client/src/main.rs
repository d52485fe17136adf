use bevy::log::LogPlugin;
use bevy::prelude::*;
use checkers_client::config::ClientConfig;
use checkers_client::CheckersClientPlugin;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // 初始化日志，替代 Bevy 自带的 LogPlugin
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("checkers_client=debug".parse()?)
            .add_directive("protocol=debug".parse()?))
        .init();

    let config = ClientConfig::default();
    tracing::info!("Checkers client starting, server {}", config.network.url());

    App::new()
        .add_plugins(
            DefaultPlugins
                .build()
                .disable::<LogPlugin>()
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: config.window_title.clone(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .add_plugins(CheckersClientPlugin { config })
        .run();

    Ok(())
}
