use crate::config::ServiceConfig;
use crate::error::TimerError;
use crate::event::{ActorId, Delivery, Session};
use crate::timer::Timer;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// TimerService - 自带后台驱动的定时器服务
/// (TimerService - timer service with its own background driver)
///
/// 拥有一个 [`Timer`] 并启动一个 tokio 后台任务，按配置的间隔采样单调
/// 时钟并推进时间轮。生产者通过 [`schedule_timeout`](TimerService::schedule_timeout)
/// 或共享的 [`timer()`](TimerService::timer) 引用并发提交。
/// (Owns a [`Timer`] and spawns a tokio background task that samples the
/// monotonic clock at the configured interval and advances the wheel.
/// Producers submit concurrently through
/// [`schedule_timeout`](TimerService::schedule_timeout) or the shared
/// [`timer()`](TimerService::timer) reference)
///
/// # 注意 (Notes)
/// 服务是唯一驱动方：持有 `TimerService` 时不要再对同一个 `Timer` 调用
/// `update_time`/`reconcile`。
/// (The service is the sole driver: while a `TimerService` is alive, do not
/// also call `update_time`/`reconcile` on the same `Timer`)
///
/// # 示例 (Examples)
/// ```no_run
/// use merlin_timer::{ActorId, Delivery, Session, ServiceConfig, TimerError, TimerService};
/// use std::sync::Arc;
///
/// struct Mailbox;
///
/// impl Delivery for Mailbox {
///     fn deliver(&self, destination: ActorId, session: Session) -> Result<(), TimerError> {
///         println!("notify {} (session {})", destination, session);
///         Ok(())
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let service = TimerService::new(Arc::new(Mailbox), ServiceConfig::default());
///
///     // 50 个 tick（0.5 秒）后通知 actor 1 (notify actor 1 after 50 ticks, 0.5s)
///     service
///         .schedule_timeout(ActorId::new(1), 50, Session::new(7))
///         .unwrap();
///
///     tokio::time::sleep(std::time::Duration::from_secs(1)).await;
///     service.shutdown().await;
/// }
/// ```
pub struct TimerService {
    /// 共享的定时器实例 (shared timer instance)
    timer: Arc<Timer>,
    /// 后台驱动任务句柄 (background driver task handle)
    driver_handle: Option<JoinHandle<()>>,
}

impl TimerService {
    /// 创建服务并启动后台驱动任务
    /// (Create the service and spawn the background driver task)
    ///
    /// 必须在 tokio 运行时上下文中调用。
    /// (Must be called within a tokio runtime context)
    pub fn new(delivery: Arc<dyn Delivery>, config: ServiceConfig) -> Self {
        let timer = Arc::new(Timer::new(delivery));
        let driver = Arc::clone(&timer);
        let poll_interval = config.poll_interval;

        let driver_handle = tokio::spawn(async move {
            Self::driver_loop(driver, poll_interval).await;
        });

        Self {
            timer,
            driver_handle: Some(driver_handle),
        }
    }

    /// 使用默认配置创建服务 (Create the service with the default configuration)
    pub fn with_defaults(delivery: Arc<dyn Delivery>) -> Self {
        Self::new(delivery, ServiceConfig::default())
    }

    /// 共享的定时器实例，可分发给生产者线程
    /// (The shared timer instance, hand it out to producer threads)
    #[inline]
    pub fn timer(&self) -> &Arc<Timer> {
        &self.timer
    }

    /// 提交超时，语义同 [`Timer::schedule_timeout`]
    /// (Submit a timeout; same semantics as [`Timer::schedule_timeout`])
    #[inline]
    pub fn schedule_timeout(
        &self,
        destination: ActorId,
        delay: u32,
        session: Session,
    ) -> Result<Session, TimerError> {
        self.timer.schedule_timeout(destination, delay, session)
    }

    /// 后台驱动循环 (background driver loop)
    ///
    /// 每个采样周期调用一次 `update_time`；错过的周期无需补发：流逝的
    /// 厘秒数由时钟差值算出，下一次采样自动补齐。
    /// (Calls `update_time` once per poll period; missed periods need no
    /// replay, since elapsed centiseconds come from the clock delta and the
    /// next sample catches up automatically)
    async fn driver_loop(timer: Arc<Timer>, poll_interval: Duration) {
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            timer.update_time();
        }
    }

    /// 优雅关闭服务 (Graceful shutdown of the service)
    ///
    /// 终止后台驱动任务并等待其退出。已入轮但尚未到期的条目随服务一起
    /// 丢弃。
    /// (Aborts the background driver task and waits for it to exit. Entries
    /// still in the wheel are discarded with the service)
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.driver_handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        if let Some(handle) = self.driver_handle.take() {
            handle.abort();
        }
    }
}
