//! 客户端会话状态机
//!
//! 持有当前棋盘快照、回合归属和连吃提示。状态只由通道事件驱动，
//! 客户端从不推测走棋结果，也不在本地修改快照。

use std::time::Duration;

use bevy::prelude::*;
use protocol::{BoardSnapshot, ClientMessage, DenseIndex, MoveIntent, Occupant, ServerMessage, Side};

use crate::config::ClientConfig;

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// 等待通道建立
    AwaitingConnection,
    /// 通道已建立，等待第一份棋盘
    AwaitingBoard,
    /// 轮到本地玩家
    LocalTurn,
    /// 轮到对方（引擎）
    RemoteTurn,
    /// 游戏结束
    GameOver,
    /// 通道断开，只能整体重置
    ConnectionLost,
}

impl SessionPhase {
    /// 终止阶段不再接受任何状态消息
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::GameOver | SessionPhase::ConnectionLost)
    }
}

/// 状态栏文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Connecting,
    WaitingForBoard,
    YourTurn,
    EngineThinking,
    /// 服务端附带的提示
    Server(String),
    /// 服务端拒绝走法
    Rejected(String),
    /// 无法解析的消息
    Malformed(String),
    /// 游戏结束
    Finished(String),
    ConnectionLost,
}

impl std::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusLine::Connecting => f.write_str("Connecting..."),
            StatusLine::WaitingForBoard => f.write_str("Connection established. Waiting for board..."),
            StatusLine::YourTurn => f.write_str("Your move"),
            StatusLine::EngineThinking => f.write_str("Engine is thinking..."),
            StatusLine::Server(text) | StatusLine::Finished(text) => f.write_str(text),
            StatusLine::Rejected(text) => write!(f, "Error: {}", text),
            StatusLine::Malformed(text) => write!(f, "Protocol error: {}", text),
            StatusLine::ConnectionLost => f.write_str("Connection lost. Press New game to reload."),
        }
    }
}

/// 处理一个事件后需要做的事
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 重建棋盘
    Redraw,
    /// 只有状态栏变化
    StatusOnly,
    /// 事件被忽略
    Ignored,
}

/// 已排期的引擎走棋请求
#[derive(Debug, Clone, Copy)]
struct EngineRequest {
    /// 排期时的代数
    generation: u64,
    remaining: Duration,
}

/// 客户端会话
#[derive(Resource, Debug)]
pub struct Session {
    phase: SessionPhase,
    local_side: Side,
    snapshot: Option<BoardSnapshot>,
    must_move_from: Option<DenseIndex>,
    status: StatusLine,
    /// 每次回合归属变化加一，用于丢弃过期的引擎请求
    generation: u64,
    engine_delay: Duration,
    engine_request: Option<EngineRequest>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Side::White, protocol::ENGINE_MOVE_DELAY)
    }
}

impl Session {
    pub fn new(local_side: Side, engine_delay: Duration) -> Self {
        Self {
            phase: SessionPhase::AwaitingConnection,
            local_side,
            snapshot: None,
            must_move_from: None,
            status: StatusLine::Connecting,
            generation: 0,
            engine_delay,
            engine_request: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.local_side, config.engine_move_delay)
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn local_side(&self) -> Side {
        self.local_side
    }

    pub fn snapshot(&self) -> Option<&BoardSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn must_move_from(&self) -> Option<DenseIndex> {
        self.must_move_from
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 是否有尚未发出的引擎请求
    pub fn has_pending_engine_request(&self) -> bool {
        self.engine_request.is_some()
    }

    /// 当前可以拖动的阵营，不是本地回合时为 None
    pub fn movable_side(&self) -> Option<Side> {
        (self.phase == SessionPhase::LocalTurn).then_some(self.local_side)
    }

    /// 棋子能否被拖动：本地回合且是本方棋子
    pub fn can_drag(&self, occupant: Occupant) -> bool {
        self.movable_side() == Some(occupant.side)
    }

    /// 通道建立
    pub fn on_channel_open(&mut self) -> Outcome {
        if self.phase != SessionPhase::AwaitingConnection {
            tracing::warn!("Channel opened in phase {:?}", self.phase);
            return Outcome::Ignored;
        }
        self.phase = SessionPhase::AwaitingBoard;
        self.status = StatusLine::WaitingForBoard;
        Outcome::StatusOnly
    }

    /// 通道关闭，会话就此结束
    pub fn on_channel_closed(&mut self, reason: Option<&str>) -> Outcome {
        tracing::warn!("Channel closed: {}", reason.unwrap_or("closed by peer"));
        self.engine_request = None;
        if self.phase == SessionPhase::GameOver {
            return Outcome::Ignored;
        }
        self.phase = SessionPhase::ConnectionLost;
        self.status = StatusLine::ConnectionLost;
        Outcome::Redraw
    }

    /// 收到无法解析的消息
    pub fn on_malformed(&mut self, reason: &str) -> Outcome {
        tracing::error!("Malformed server message: {}", reason);
        if self.phase.is_terminal() {
            return Outcome::Ignored;
        }
        self.status = StatusLine::Malformed(reason.to_string());
        Outcome::StatusOnly
    }

    /// 处理服务端消息
    pub fn apply(&mut self, msg: ServerMessage) -> Outcome {
        if self.phase.is_terminal() {
            tracing::warn!("Ignoring {:?} in terminal phase {:?}", msg, self.phase);
            return Outcome::Ignored;
        }

        match msg {
            ServerMessage::BoardUpdate {
                board,
                turn,
                must_move_from,
                message,
            } => {
                for anomaly in board.anomalies() {
                    tracing::warn!("Snapshot anomaly: {}", anomaly);
                }

                let local = turn == self.local_side.wire_code();
                self.snapshot = Some(board);
                self.must_move_from = must_move_from;
                self.generation += 1;
                self.phase = if local {
                    SessionPhase::LocalTurn
                } else {
                    SessionPhase::RemoteTurn
                };
                self.status = match message {
                    Some(text) => StatusLine::Server(text),
                    None if local => StatusLine::YourTurn,
                    None => StatusLine::EngineThinking,
                };

                if !local {
                    self.engine_request = Some(EngineRequest {
                        generation: self.generation,
                        remaining: self.engine_delay,
                    });
                    tracing::debug!(
                        "Engine request scheduled in {:?} (generation {})",
                        self.engine_delay,
                        self.generation
                    );
                }
                tracing::info!("Board update: turn {} -> {:?}", turn, self.phase);
            }
            ServerMessage::Error { message } => {
                // 把回合还给本地玩家，快照保持原样
                tracing::warn!("Move rejected: {}", message);
                self.generation += 1;
                self.phase = SessionPhase::LocalTurn;
                self.status = StatusLine::Rejected(message);
            }
            ServerMessage::GameOver { board, message } => {
                if let Some(board) = board {
                    self.snapshot = Some(board);
                }
                self.must_move_from = None;
                self.engine_request = None;
                self.phase = SessionPhase::GameOver;
                tracing::info!("Game over: {}", message);
                self.status = StatusLine::Finished(message);
            }
        }

        Outcome::Redraw
    }

    /// 提交本地走法，返回要发送的消息
    pub fn submit_move(&mut self, intent: MoveIntent) -> Option<ClientMessage> {
        if self.phase != SessionPhase::LocalTurn {
            tracing::debug!("Dropping move {} in phase {:?}", intent, self.phase);
            return None;
        }
        if intent.from == intent.to {
            return None;
        }
        tracing::info!(
            "Move: {} -> {} ({} -> {})",
            intent.from,
            intent.to,
            intent.from.cell(),
            intent.to.cell()
        );
        Some(ClientMessage::Move { intent })
    }

    /// 推进引擎请求计时，到期时返回要发送的请求
    pub fn tick(&mut self, elapsed: Duration) -> Option<ClientMessage> {
        let request = self.engine_request.as_mut()?;
        request.remaining = request.remaining.saturating_sub(elapsed);
        if !request.remaining.is_zero() {
            return None;
        }

        let request = self.engine_request.take()?;
        if request.generation != self.generation || self.phase != SessionPhase::RemoteTurn {
            tracing::debug!(
                "Dropping stale engine request (generation {}, current {})",
                request.generation,
                self.generation
            );
            return None;
        }
        Some(ClientMessage::EngineMove)
    }
}
