use crate::error::TimerError;
use std::fmt;

/// Identifier of a destination actor in the host runtime
///
/// 宿主运行时中目标 actor 的标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorId(u32);

impl ActorId {
    /// Wrap a raw runtime handle
    ///
    /// 包装一个原始的运行时句柄
    #[inline]
    pub const fn new(raw: u32) -> Self {
        ActorId(raw)
    }

    /// Get the numeric value of the actor ID
    ///
    /// 获取 actor ID 的数值
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{:08x}", self.0)
    }
}

/// Opaque correlation token chosen by the submitter
///
/// The timer never interprets it; it is carried through to the expiry
/// notification so the submitter can match the notification to its request.
///
/// 提交方自选的不透明关联令牌
///
/// 定时器不会解释它；令牌随到期通知原样送回，提交方据此将通知与请求配对。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Session(u32);

impl Session {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Session(raw)
    }

    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload of a pending timeout: who to notify, and with which token
///
/// 待触发超时的载荷：通知谁，带哪个令牌
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    /// 通知目标 (notification destination)
    pub destination: ActorId,
    /// 关联令牌 (correlation token)
    pub session: Session,
}

/// Message-delivery seam towards the host actor runtime
///
/// The timer core never touches mailboxes directly; when a timer fires it
/// hands the expiry notification to this trait. Implementations enqueue a
/// message for `destination` tagged with `session`.
///
/// Delivery runs with the wheel lock released, so implementations may take
/// their own locks, but they must not block indefinitely: a stalled delivery
/// stalls the whole tick loop.
///
/// 面向宿主 actor 运行时的消息投递接口
///
/// 定时器核心不直接操作邮箱；定时器到期时把通知交给该 trait，由实现方
/// 将带有 `session` 的消息投入 `destination` 的队列。
///
/// 投递时时间轮锁已释放，实现内部可以加自己的锁，但不得无限阻塞：
/// 投递卡住会拖住整个 tick 循环。
pub trait Delivery: Send + Sync {
    /// Enqueue an expiry notification for `destination` tagged with `session`
    ///
    /// # Errors
    /// [`TimerError::DeadDestination`] if the destination no longer exists.
    ///
    /// 为 `destination` 投递一条带 `session` 的到期通知
    ///
    /// # 错误
    /// 目标已不存在时返回 [`TimerError::DeadDestination`]。
    fn deliver(&self, destination: ActorId, session: Session) -> Result<(), TimerError>;
}
