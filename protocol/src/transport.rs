//! 传输层抽象
//!
//! 提供 Connector/Connection traits 使会话逻辑与具体通道解耦。
//! 默认实现为 WebSocket 文本帧，每帧一条 JSON 消息。

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::{ProtocolError, Result};
use crate::message::{decode, encode};
use crate::{CONNECT_TIMEOUT, PROTOCOL_REVISION};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 网络配置
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
    /// WebSocket 路径
    pub path: String,
    /// 使用 wss://
    pub secure: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            path: "/ws".to_string(),
            secure: false,
        }
    }
}

impl NetworkConfig {
    /// 通道地址
    pub fn url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}:{}{}", scheme, self.host, self.port, self.path)
    }
}

/// 连接抽象 trait（核心抽象，用于业务层）
#[async_trait]
pub trait Connection: Send + Sync {
    /// 发送消息
    async fn send<M: Serialize + Send + Sync>(&mut self, msg: &M) -> Result<()>;

    /// 接收消息
    async fn recv<M: DeserializeOwned>(&mut self) -> Result<M>;

    /// 关闭连接
    async fn close(&mut self) -> Result<()>;

    /// 获取远端地址
    fn peer_addr(&self) -> Option<String>;
}

/// 连接器 trait（客户端使用）
#[async_trait]
pub trait Connector: Send + Sync {
    type Conn: Connection;

    /// 建立连接
    async fn connect(&self, addr: &str) -> Result<Self::Conn>;
}

// ============================================================================
// WebSocket 实现
// ============================================================================

/// WebSocket 连接器
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    type Conn = WsConnection;

    async fn connect(&self, addr: &str) -> Result<Self::Conn> {
        let (stream, _response) = timeout(CONNECT_TIMEOUT, connect_async(addr))
            .await
            .map_err(|_| ProtocolError::ConnectionTimeout)??;

        let peer_addr = match stream.get_ref() {
            MaybeTlsStream::Plain(tcp) => tcp.peer_addr().ok().map(|a| a.to_string()),
            _ => None,
        };
        tracing::info!(
            "WebSocket connected to {} (peer {:?}, protocol revision {})",
            addr,
            peer_addr,
            PROTOCOL_REVISION
        );

        Ok(WsConnection::from_stream(stream, peer_addr))
    }
}

/// WebSocket 连接
pub struct WsConnection {
    reader: WsReader,
    writer: WsWriter,
    peer_addr: Option<String>,
}

impl WsConnection {
    fn from_stream(stream: WsStream, peer_addr: Option<String>) -> Self {
        let (sink, stream) = stream.split();
        Self {
            reader: WsReader { stream },
            writer: WsWriter { sink },
            peer_addr,
        }
    }

    /// 分离读写端
    pub fn split(self) -> (WsReader, WsWriter) {
        (self.reader, self.writer)
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn send<M: Serialize + Send + Sync>(&mut self, msg: &M) -> Result<()> {
        self.writer.send(msg).await
    }

    async fn recv<M: DeserializeOwned>(&mut self) -> Result<M> {
        self.reader.recv().await
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.close().await
    }

    fn peer_addr(&self) -> Option<String> {
        self.peer_addr.clone()
    }
}

/// 读取端
pub struct WsReader {
    stream: SplitStream<WsStream>,
}

impl WsReader {
    /// 读取下一条文本消息的原文，跳过 ping/pong
    pub async fn recv_text(&mut self) -> Result<String> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                Message::Text(text) => return Ok(text.as_str().to_owned()),
                Message::Close(_) => return Err(ProtocolError::ConnectionClosed),
                Message::Binary(_) => return Err(ProtocolError::UnexpectedFrame { kind: "binary" }),
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
                    tracing::trace!("Skipping control frame");
                }
            }
        }
        Err(ProtocolError::ConnectionClosed)
    }

    /// 读取并解码一条消息
    pub async fn recv<M: DeserializeOwned>(&mut self) -> Result<M> {
        let text = self.recv_text().await?;
        decode(&text)
    }
}

/// 写入端
pub struct WsWriter {
    sink: SplitSink<WsStream, Message>,
}

impl WsWriter {
    /// 编码并发送一条消息
    pub async fn send<M: Serialize>(&mut self, msg: &M) -> Result<()> {
        let text = encode(msg)?;
        self.sink.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// 发送关闭帧
    pub async fn close(&mut self) -> Result<()> {
        self.sink.close().await?;
        Ok(())
    }
}

/// 判断错误是否来自消息内容本身（连接仍然可用）
pub fn is_payload_error(err: &ProtocolError) -> bool {
    matches!(
        err,
        ProtocolError::Json(_)
            | ProtocolError::FrameTooLarge { .. }
            | ProtocolError::UnexpectedFrame { .. }
    )
}
