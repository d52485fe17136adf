//! 网络通信模块
//!
//! 使用全局静态 tokio Runtime 处理异步网络操作，每帧把通道事件交给会话。

mod connection;

pub use connection::*;

use bevy::prelude::*;
use protocol::ClientMessage;

use crate::config::ClientConfig;
use crate::game::{MoveRequested, Outcome, RedrawBoard, ResetRequested, Session};

/// 网络插件
pub struct NetworkPlugin;

impl Plugin for NetworkPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NetworkConnectionHandle>()
            .add_systems(Startup, open_channel)
            .add_systems(
                Update,
                (poll_channel, send_moves, tick_engine_request, handle_reset).chain(),
            );
    }
}

/// 网络连接句柄（Bevy 资源）
#[derive(Resource, Default)]
pub struct NetworkConnectionHandle {
    /// 当前连接，通道关闭后清空
    pub connection: Option<NetworkConnection>,
}

impl NetworkConnectionHandle {
    fn send(&self, msg: ClientMessage) {
        match &self.connection {
            Some(conn) => conn.queue_send(msg),
            None => tracing::warn!("No open channel, dropping {:?}", msg),
        }
    }
}

/// 打开到服务端的通道
fn connect(config: &ClientConfig, session: &mut Session, handle: &mut NetworkConnectionHandle) {
    let url = config.network.url();
    match NetworkConnection::open(&url) {
        Ok(conn) => handle.connection = Some(conn),
        Err(e) => {
            tracing::error!("Failed to open channel to {}: {:#}", url, e);
            handle.connection = None;
            session.on_channel_closed(Some(&e.to_string()));
        }
    }
}

fn open_channel(
    config: Res<ClientConfig>,
    mut session: ResMut<Session>,
    mut handle: ResMut<NetworkConnectionHandle>,
) {
    connect(&config, &mut session, &mut handle);
}

/// 轮询通道事件并驱动会话
fn poll_channel(
    mut handle: ResMut<NetworkConnectionHandle>,
    mut session: ResMut<Session>,
    mut redraws: MessageWriter<RedrawBoard>,
) {
    let Some(conn) = &handle.connection else {
        return;
    };
    let events = conn.drain_received();
    if events.is_empty() {
        return;
    }

    let mut redraw = false;
    let mut closed = false;
    for event in events {
        let outcome = match event {
            ChannelEvent::Opened => {
                tracing::info!("Channel open");
                session.on_channel_open()
            }
            ChannelEvent::Message(msg) => session.apply(msg),
            ChannelEvent::Malformed(reason) => session.on_malformed(&reason),
            ChannelEvent::Closed { reason } => {
                closed = true;
                session.on_channel_closed(reason.as_deref())
            }
        };
        redraw |= outcome == Outcome::Redraw;
    }

    if closed {
        handle.connection = None;
    }
    if redraw {
        redraws.write(RedrawBoard);
    }
}

/// 把拖拽产生的走法交给会话确认后发送
fn send_moves(
    mut moves: MessageReader<MoveRequested>,
    mut session: ResMut<Session>,
    handle: Res<NetworkConnectionHandle>,
) {
    for MoveRequested(intent) in moves.read() {
        if let Some(msg) = session.submit_move(*intent) {
            handle.send(msg);
        }
    }
}

/// 推进引擎请求计时
fn tick_engine_request(
    time: Res<Time>,
    mut session: ResMut<Session>,
    handle: Res<NetworkConnectionHandle>,
) {
    if !session.has_pending_engine_request() {
        return;
    }
    if let Some(msg) = session.tick(time.delta()) {
        tracing::info!("Requesting engine move (generation {})", session.generation());
        handle.send(msg);
    }
}

/// 重新开始：丢弃会话和连接，从头建立
fn handle_reset(
    mut resets: MessageReader<ResetRequested>,
    config: Res<ClientConfig>,
    mut session: ResMut<Session>,
    mut handle: ResMut<NetworkConnectionHandle>,
    mut redraws: MessageWriter<RedrawBoard>,
) {
    if resets.read().count() == 0 {
        return;
    }

    // 旧连接的发送端被丢弃后，后台任务自行关闭
    match handle.connection.take() {
        Some(old) => tracing::info!("Resetting session, dropping channel to {}", old.url()),
        None => tracing::info!("Resetting session"),
    }
    *session = Session::from_config(&config);
    connect(&config, &mut session, &mut handle);
    redraws.write(RedrawBoard);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::message::Messages;
    use futures_util::{SinkExt, StreamExt};
    use protocol::{BoardSnapshot, NetworkConfig, ServerMessage, Side};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio_tungstenite::{accept_async, tungstenite::Message};

    use crate::game::SessionPhase;

    fn test_app(port: u16) -> App {
        let config = ClientConfig {
            network: NetworkConfig {
                port,
                ..NetworkConfig::default()
            },
            ..ClientConfig::default()
        };
        let mut app = App::new();
        app.init_resource::<Time>()
            .insert_resource(Session::from_config(&config))
            .insert_resource(config)
            .add_message::<MoveRequested>()
            .add_message::<RedrawBoard>()
            .add_message::<ResetRequested>()
            .add_plugins(NetworkPlugin);
        app
    }

    /// 逐帧推进，直到会话进入指定阶段
    async fn update_until(app: &mut App, phase: SessionPhase) {
        for _ in 0..300 {
            app.update();
            if app.world().resource::<Session>().phase() == phase {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session stuck in {:?}", app.world().resource::<Session>().phase());
    }

    fn drain_redraws(app: &mut App) -> usize {
        app.world_mut()
            .resource_mut::<Messages<RedrawBoard>>()
            .drain()
            .count()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reset_replaces_session_and_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // 第一条连接下发棋盘并等客户端关闭，然后接受第二条连接
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut first = accept_async(tcp).await.unwrap();
            let update = ServerMessage::BoardUpdate {
                board: BoardSnapshot::initial(),
                turn: Side::White.wire_code(),
                must_move_from: None,
                message: None,
            };
            first
                .send(Message::Text(serde_json::to_string(&update).unwrap().into()))
                .await
                .unwrap();
            while let Some(Ok(frame)) = first.next().await {
                if frame.is_close() {
                    break;
                }
            }

            let (tcp, _) = listener.accept().await.unwrap();
            accept_async(tcp).await.unwrap()
        });

        let mut app = test_app(port);
        update_until(&mut app, SessionPhase::LocalTurn).await;
        assert!(app.world().resource::<Session>().snapshot().is_some());
        drain_redraws(&mut app);

        app.world_mut().write_message(ResetRequested);
        app.update();

        let session = app.world().resource::<Session>();
        assert_eq!(session.phase(), SessionPhase::AwaitingConnection);
        assert!(session.snapshot().is_none());
        assert!(app
            .world()
            .resource::<NetworkConnectionHandle>()
            .connection
            .is_some());
        assert_eq!(drain_redraws(&mut app), 1);

        // 新通道建立，服务端看到旧连接已关闭
        update_until(&mut app, SessionPhase::AwaitingBoard).await;
        let _second = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
    }
}
