//! 网络连接管理
//!
//! 使用 protocol 库的传输层抽象。连接在全局 Runtime 的后台任务里运行，
//! Bevy 一侧只通过两个队列和它交互。

use std::sync::{Arc, Mutex as StdMutex};

use anyhow::{anyhow, Context};
use lazy_static::lazy_static;
use protocol::{is_payload_error, ClientMessage, Connector, ProtocolError, ServerMessage, WsConnector, WsReader, WsWriter};
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;

lazy_static! {
    /// 网络任务共用的 Runtime
    static ref RUNTIME: std::io::Result<Runtime> = Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("checkers-net")
        .enable_all()
        .build();
}

/// 通道事件，按到达顺序排队
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// 通道建立
    Opened,
    /// 一条解码成功的消息
    Message(ServerMessage),
    /// 一条无法解析的消息，连接仍然可用
    Malformed(String),
    /// 通道关闭，之后不会再有事件
    Closed { reason: Option<String> },
}

/// 网络连接包装器
///
/// 用于在 Bevy 的同步环境中管理异步网络连接
pub struct NetworkConnection {
    url: String,
    /// 发送队列
    outbound: mpsc::UnboundedSender<ClientMessage>,
    /// 接收队列（使用标准库 Mutex 以支持同步访问）
    inbound: Arc<StdMutex<Vec<ChannelEvent>>>,
}

impl NetworkConnection {
    /// 在全局 Runtime 上打开通道，连接在后台完成
    pub fn open(url: &str) -> anyhow::Result<Self> {
        let runtime = RUNTIME
            .as_ref()
            .map_err(|e| anyhow!("network runtime unavailable: {}", e))?;
        Ok(Self::spawn_on(runtime.handle(), url))
    }

    /// 在指定 Runtime 上打开通道
    pub fn spawn_on(handle: &tokio::runtime::Handle, url: &str) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let inbound = Arc::new(StdMutex::new(Vec::new()));

        tracing::info!("Opening channel to {}", url);
        handle.spawn(run_channel(url.to_string(), outbound_rx, inbound.clone()));

        Self {
            url: url.to_string(),
            outbound,
            inbound,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 发送消息（加入发送队列，同步调用）
    pub fn queue_send(&self, msg: ClientMessage) {
        if self.outbound.send(msg).is_err() {
            tracing::warn!("Channel to {} already closed, message dropped", self.url);
        }
    }

    /// 取出所有已到达的事件（同步版本）
    pub fn drain_received(&self) -> Vec<ChannelEvent> {
        match self.inbound.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

fn push(inbound: &StdMutex<Vec<ChannelEvent>>, event: ChannelEvent) {
    match inbound.lock() {
        Ok(mut queue) => queue.push(event),
        Err(poisoned) => poisoned.into_inner().push(event),
    }
}

/// 后台任务：建立连接后同时处理收发，直到任一方向结束
async fn run_channel(
    url: String,
    outbound: mpsc::UnboundedReceiver<ClientMessage>,
    inbound: Arc<StdMutex<Vec<ChannelEvent>>>,
) {
    let reason = match WsConnector.connect(&url).await.context("connect failed") {
        Ok(conn) => {
            push(&inbound, ChannelEvent::Opened);
            let (reader, writer) = conn.split();
            pump(reader, writer, outbound, &inbound).await
        }
        Err(e) => Some(format!("{:#}", e)),
    };

    tracing::info!("Channel to {} closed", url);
    push(&inbound, ChannelEvent::Closed { reason });
}

async fn pump(
    mut reader: WsReader,
    mut writer: WsWriter,
    mut outbound: mpsc::UnboundedReceiver<ClientMessage>,
    inbound: &StdMutex<Vec<ChannelEvent>>,
) -> Option<String> {
    loop {
        tokio::select! {
            msg = outbound.recv() => {
                let Some(msg) = msg else {
                    // Bevy 一侧丢弃了连接
                    let _ = writer.close().await;
                    return Some("connection dropped".to_string());
                };
                if let Err(e) = writer.send(&msg).await {
                    tracing::error!("Failed to send message: {}", e);
                    return Some(e.to_string());
                }
                tracing::debug!("Sent {:?}", msg);
            }
            received = reader.recv::<ServerMessage>() => match received {
                Ok(msg) => push(inbound, ChannelEvent::Message(msg)),
                Err(e) if is_payload_error(&e) => push(inbound, ChannelEvent::Malformed(e.to_string())),
                Err(ProtocolError::ConnectionClosed) => return None,
                Err(e) => {
                    tracing::warn!("Receive error: {}", e);
                    return Some(e.to_string());
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use protocol::{BoardSnapshot, DenseIndex, MoveIntent};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio_tungstenite::{accept_async, tungstenite::Message};

    async fn wait_for(conn: &NetworkConnection, count: usize) -> Vec<ChannelEvent> {
        let mut events = Vec::new();
        for _ in 0..200 {
            events.extend(conn.drain_received());
            if events.len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        events
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_channel_events_in_order() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();

            let update = ServerMessage::BoardUpdate {
                board: BoardSnapshot::initial(),
                turn: 1,
                must_move_from: None,
                message: None,
            };
            ws.send(Message::Text(serde_json::to_string(&update).unwrap().into()))
                .await
                .unwrap();

            let frame = ws.next().await.unwrap().unwrap();
            let msg: ClientMessage = serde_json::from_str(frame.to_text().unwrap()).unwrap();

            ws.send(Message::Text(r#"{"type":"mystery"}"#.into())).await.unwrap();
            ws.close(None).await.unwrap();
            msg
        });

        let conn = NetworkConnection::spawn_on(&tokio::runtime::Handle::current(), &url);
        let events = wait_for(&conn, 2).await;
        assert_eq!(events[0], ChannelEvent::Opened);
        assert!(matches!(events[1], ChannelEvent::Message(ServerMessage::BoardUpdate { .. })));

        let intent = MoveIntent::new(DenseIndex::new(9).unwrap(), DenseIndex::new(13).unwrap());
        conn.queue_send(ClientMessage::Move { intent });

        let events = wait_for(&conn, 2).await;
        assert!(matches!(events[0], ChannelEvent::Malformed(_)));
        assert_eq!(events[1], ChannelEvent::Closed { reason: None });

        assert_eq!(server.await.unwrap(), ClientMessage::Move { intent });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unreachable_server_reports_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());
        drop(listener);

        let conn = NetworkConnection::spawn_on(&tokio::runtime::Handle::current(), &url);
        let events = wait_for(&conn, 1).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ChannelEvent::Closed { reason: Some(_) }));

        // 关闭后发送不会 panic
        conn.queue_send(ClientMessage::EngineMove);
    }
}
