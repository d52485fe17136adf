//! 拖拽手势状态机
//!
//! 只有两个状态：空闲和拖动中。每个指针事件同步处理，返回需要执行的
//! 视觉效果；具体的实体操作由调用方完成，这里不依赖 ECS。

use bevy::math::Vec2;
use protocol::{DenseIndex, MoveIntent};

/// 指针来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerId {
    Mouse,
    Touch(u64),
}

/// 松开位置命中的格子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquareHit {
    /// 深色格
    Dark(DenseIndex),
    /// 浅色格
    Light,
    /// 棋盘外
    Outside,
}

/// 可以拿起的棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grab<P> {
    pub piece: P,
    pub square: DenseIndex,
}

/// 拖拽产生的效果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEffect<P> {
    /// 生成跟随指针的影子棋子
    SpawnGhost { piece: P, at: Vec2 },
    /// 移动影子
    MoveGhost { at: Vec2 },
    /// 原棋子变暗
    DimPiece(P),
    /// 原棋子恢复
    RestorePiece(P),
    /// 移除影子
    DespawnGhost,
    /// 提交走法
    Submit(MoveIntent),
}

#[derive(Debug, Clone, Copy)]
struct DragSession<P> {
    pointer: PointerId,
    origin: DenseIndex,
    piece: P,
}

/// 拖拽控制器，同一时间最多一个拖拽
#[derive(Debug)]
pub struct DragController<P> {
    active: Option<DragSession<P>>,
}

impl<P> Default for DragController<P> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<P: Copy> DragController<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// 正在拖动的起点
    pub fn origin(&self) -> Option<DenseIndex> {
        self.active.as_ref().map(|s| s.origin)
    }

    /// 正在拖动的指针
    pub fn pointer(&self) -> Option<PointerId> {
        self.active.as_ref().map(|s| s.pointer)
    }

    /// 按下。只有可拖动的棋子才会传入 `grab`，拖动中再次按下被忽略
    pub fn press(&mut self, pointer: PointerId, at: Vec2, grab: Option<Grab<P>>) -> Vec<DragEffect<P>> {
        if self.active.is_some() {
            return Vec::new();
        }
        let Some(grab) = grab else {
            return Vec::new();
        };

        self.active = Some(DragSession {
            pointer,
            origin: grab.square,
            piece: grab.piece,
        });
        vec![
            DragEffect::SpawnGhost { piece: grab.piece, at },
            DragEffect::DimPiece(grab.piece),
        ]
    }

    /// 移动，只跟随发起拖拽的指针
    pub fn drag(&mut self, pointer: PointerId, at: Vec2) -> Option<DragEffect<P>> {
        match &self.active {
            Some(session) if session.pointer == pointer => Some(DragEffect::MoveGhost { at }),
            _ => None,
        }
    }

    /// 松开。落在不同于起点的深色格上才提交走法，任何情况下都清理影子
    pub fn release(&mut self, pointer: PointerId, hit: SquareHit) -> Vec<DragEffect<P>> {
        let Some(session) = self.take_if(pointer) else {
            return Vec::new();
        };

        let mut effects = Self::cleanup(&session);
        match hit {
            SquareHit::Dark(to) if to != session.origin => {
                effects.push(DragEffect::Submit(MoveIntent::new(session.origin, to)));
            }
            _ => {
                tracing::debug!("Drag from {} cancelled ({:?})", session.origin, hit);
            }
        }
        effects
    }

    /// 指针被系统取消（如触摸中断）
    pub fn cancel(&mut self, pointer: PointerId) -> Vec<DragEffect<P>> {
        self.take_if(pointer)
            .map(|session| Self::cleanup(&session))
            .unwrap_or_default()
    }

    /// 棋盘重建时放弃当前拖拽
    pub fn abort(&mut self) -> Vec<DragEffect<P>> {
        self.active
            .take()
            .map(|session| Self::cleanup(&session))
            .unwrap_or_default()
    }

    fn take_if(&mut self, pointer: PointerId) -> Option<DragSession<P>> {
        match &self.active {
            Some(session) if session.pointer == pointer => self.active.take(),
            _ => None,
        }
    }

    fn cleanup(session: &DragSession<P>) -> Vec<DragEffect<P>> {
        vec![DragEffect::RestorePiece(session.piece), DragEffect::DespawnGhost]
    }
}
