use crate::clock;
use crate::error::TimerError;
use crate::event::{ActorId, Delivery, Session, TimerEvent};
use crate::wheel::Wheel;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Process-wide timer instance
///
/// Owns the hierarchical wheel behind a mutex, the clock anchors, and the
/// delivery seam towards the host runtime. Create one at startup with
/// [`Timer::new`], share it via `Arc`, and drive it from exactly one place:
/// either [`TimerService`](crate::TimerService) or direct
/// [`reconcile`](Timer::reconcile)/[`update_time`](Timer::update_time) calls.
///
/// Any number of producer threads may call
/// [`schedule_timeout`](Timer::schedule_timeout) concurrently; the wheel
/// mutex is held only across O(1) bucket operations, never across delivery.
///
/// 进程级定时器实例
///
/// 持有互斥锁后的分层时间轮、时钟锚点，以及面向宿主运行时的投递接口。
/// 启动时用 [`Timer::new`] 创建一个，经 `Arc` 共享，并且只从一处驱动：
/// 要么 [`TimerService`](crate::TimerService)，要么直接调用
/// [`reconcile`](Timer::reconcile)/[`update_time`](Timer::update_time)。
///
/// 任意数量的生产者线程可并发调用
/// [`schedule_timeout`](Timer::schedule_timeout)；时间轮锁只在 O(1) 的桶
/// 操作期间持有，投递时绝不持锁。
pub struct Timer {
    /// 时间轮，互斥锁只覆盖桶操作 (the wheel; the mutex covers bucket operations only)
    wheel: Mutex<Wheel>,
    /// 启动以来的厘秒数，按 2^32 回绕 (centiseconds since start, wraps modulo 2^32)
    current: AtomicU32,
    /// tick 零对应的墙上时钟秒 (wall-clock second of tick zero)
    starttime: AtomicU32,
    /// 上一次单调时钟采样（厘秒） (last monotonic sample, centiseconds)
    current_point: AtomicU64,
    /// 单调时钟锚点 (monotonic clock anchor)
    origin: Instant,
    /// 宿主运行时的消息投递接口 (delivery seam towards the host runtime)
    delivery: Arc<dyn Delivery>,
}

impl Timer {
    /// Create the timer, anchoring tick zero to the current wall clock
    ///
    /// `starttime` records the wall-clock second and `current` starts at the
    /// centisecond within that second, so `starttime + current / 100` tracks
    /// absolute time.
    ///
    /// 创建定时器，把 tick 零锚定到当前墙上时钟
    ///
    /// `starttime` 记录墙上时钟的整秒，`current` 从该秒内的厘秒起步，
    /// 因此 `starttime + current / 100` 跟踪绝对时间。
    pub fn new(delivery: Arc<dyn Delivery>) -> Self {
        let (sec, cs) = clock::wall_clock();
        Self {
            wheel: Mutex::new(Wheel::new()),
            current: AtomicU32::new(cs),
            starttime: AtomicU32::new(sec),
            current_point: AtomicU64::new(0),
            origin: Instant::now(),
            delivery,
        }
    }

    /// Submit a timeout: notify `destination` with `session` after `delay` ticks
    ///
    /// A delay of zero attempts delivery synchronously and surfaces a dead
    /// destination as an error. A nonzero delay always succeeds: the entry is
    /// inserted under the wheel lock and *will* fire. There is no
    /// cancellation, and a delivery failure at fire time is not reported back
    /// (the submission has no return channel by then; the failure is only
    /// logged at trace level).
    ///
    /// Returns the session token as the acknowledgment handle.
    ///
    /// 提交一个超时：`delay` 个 tick 后携 `session` 通知 `destination`
    ///
    /// 延迟为零时同步尝试投递，目标已消亡则以错误返回。非零延迟总是成功：
    /// 条目在持轮锁状态下插入并且必然触发。没有取消机制，触发时投递失败
    /// 也不会回报提交方（彼时已无返回通道，仅按 trace 级别记录日志）。
    ///
    /// 返回 session 令牌作为确认凭据。
    ///
    /// # Errors
    /// [`TimerError::DeadDestination`]: zero-delay delivery to a destination
    /// that no longer exists.
    /// （零延迟投递到已不存在的目标时返回 [`TimerError::DeadDestination`]）
    pub fn schedule_timeout(
        &self,
        destination: ActorId,
        delay: u32,
        session: Session,
    ) -> Result<Session, TimerError> {
        if delay == 0 {
            self.delivery.deliver(destination, session)?;
        } else {
            let event = TimerEvent { destination, session };
            self.wheel.lock().schedule(event, delay);
        }
        Ok(session)
    }

    /// Reconcile against the monotonic clock and advance accordingly
    ///
    /// Samples centiseconds elapsed since creation and hands the sample to
    /// [`reconcile`](Timer::reconcile). Call this in a loop from exactly one
    /// driver thread.
    ///
    /// 对照单调时钟校准并相应推进。采样自创建起经过的厘秒数并交给
    /// [`reconcile`](Timer::reconcile)。应由唯一的驱动线程循环调用。
    #[inline]
    pub fn update_time(&self) {
        self.reconcile(clock::centis_since(self.origin));
    }

    /// Drive the timer from an explicit monotonic sample
    ///
    /// `sample` is centiseconds since creation on the caller's monotonic
    /// clock. A sample earlier than the previous one is a clock regression:
    /// it is logged, the stored sample is clamped to the new value, and no
    /// tick advances. Otherwise every elapsed centisecond performs one full
    /// update cycle (fire entries due at the current tick, advance one tick,
    /// fire again), preserving one-tick-at-a-time ordering even after long
    /// stalls. When the elapsed-centisecond counter wraps past 2^32 the
    /// wall-clock anchor moves forward by the wrapped amount.
    ///
    /// This is the manual-drive entry point: embedders with their own
    /// scheduler loop, and tests that must not run in real time, feed
    /// synthetic samples here. [`update_time`](Timer::update_time) is this
    /// method applied to the real clock. Like `update_time` it must be called
    /// from a single driver at a time. The delta between consecutive samples
    /// is truncated to `u32` centiseconds (a >497-day gap between samples is
    /// outside the service's envelope).
    ///
    /// 用显式单调时钟样本驱动定时器
    ///
    /// `sample` 是调用方单调时钟上自创建起的厘秒数。样本小于上一次即时钟
    /// 回拨：记录日志，把存储的样本钳制到新值，不推进任何 tick。否则每
    /// 流逝一厘秒执行一次完整更新周期（派发当前 tick 到期条目、推进一个
    /// tick、再派发），即使长时间停顿后也保持一次一 tick 的顺序。厘秒计数
    /// 回绕 2^32 时，墙上时钟锚点前移相应的量。
    ///
    /// 这是手动驱动入口：自带调度循环的嵌入方，以及不能按真实时间运行的
    /// 测试，从这里喂入合成样本。[`update_time`](Timer::update_time) 就是
    /// 本方法作用于真实时钟。与 `update_time` 一样须保持单一驱动方。相邻
    /// 样本的差值截断为 `u32` 厘秒（两次采样间隔超过约 497 天不在服务
    /// 包络内）。
    pub fn reconcile(&self, sample: u64) {
        let last = self.current_point.load(Ordering::Relaxed);
        if sample < last {
            log::error!("monotonic time went backwards: {} -> {}", last, sample);
            self.current_point.store(sample, Ordering::Relaxed);
            return;
        }
        if sample == last {
            return;
        }

        let diff = (sample - last) as u32;
        self.current_point.store(sample, Ordering::Relaxed);

        let before = self.current.load(Ordering::Relaxed);
        let after = before.wrapping_add(diff);
        self.current.store(after, Ordering::Relaxed);
        if after < before {
            // 厘秒计数回绕（约 497 天），前移墙钟锚点保持绝对时间近似正确
            // (centisecond counter wrapped (~497 days); move the wall-clock
            // anchor to keep absolute time approximately right)
            self.starttime.fetch_add(u32::MAX / 100, Ordering::Relaxed);
        }

        for _ in 0..diff {
            self.update();
        }
    }

    /// One full update cycle
    ///
    /// Fire anything already due at the current tick (entries can land in the
    /// current slot), advance one tick, fire again. Everything runs under the
    /// wheel lock except the delivery sub-steps.
    ///
    /// 一次完整更新周期：先派发当前 tick 已到期的条目（条目可能落在当前
    /// 槽），推进一个 tick，再派发。除投递子步骤外全程持轮锁。
    fn update(&self) {
        let guard = self.wheel.lock();
        let mut guard = self.execute(guard);
        guard.advance();
        let _guard = self.execute(guard);
    }

    /// Dispatch every entry due at the current tick
    ///
    /// Drains the due slot, releases the wheel lock, delivers, re-acquires
    /// and re-checks until the slot stays empty. Delivery never holds the
    /// wheel lock, and entries inserted concurrently during delivery are
    /// picked up by the re-check. The guard is passed through so the lock
    /// scope is explicit in the types.
    ///
    /// 派发当前 tick 到期的全部条目。倒出到期槽、释放轮锁、投递、重新加锁
    /// 并复查，直到槽保持为空。投递时绝不持轮锁，投递期间并发插入的条目
    /// 由复查接住。守卫按值传递，锁的作用域由类型显式表达。
    fn execute<'a>(&'a self, mut guard: MutexGuard<'a, Wheel>) -> MutexGuard<'a, Wheel> {
        loop {
            let due = guard.expire_current();
            if due.is_empty() {
                return guard;
            }
            drop(guard);
            for entry in due {
                let TimerEvent { destination, session } = entry.event;
                if self.delivery.deliver(destination, session).is_err() {
                    // 触发时已无返回通道，投递失败只记录不上抛
                    // (no return channel at fire time; log and drop)
                    log::trace!(
                        target: "timer",
                        "expired timer dropped, destination {} is gone (session {})",
                        destination,
                        session
                    );
                }
            }
            guard = self.wheel.lock();
        }
    }

    /// Centisecond ticks elapsed since start (wraps modulo 2^32)
    ///
    /// Lock-free read; never contends with the submission or dispatch paths.
    ///
    /// 启动以来经过的厘秒 tick 数（按 2^32 回绕）。无锁读取，不与提交或
    /// 派发路径争用。
    #[inline]
    pub fn elapsed(&self) -> u32 {
        self.current.load(Ordering::Relaxed)
    }

    /// Wall-clock second corresponding to tick zero
    ///
    /// Moves forward by `u32::MAX / 100` seconds each time the elapsed
    /// counter wraps.
    ///
    /// tick 零对应的墙上时钟秒。厘秒计数每回绕一次前移 `u32::MAX / 100` 秒。
    #[inline]
    pub fn start_time(&self) -> u32 {
        self.starttime.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// 记录投递的测试邮箱；`dead` 列表模拟已消亡的目标
    /// (Recording test mailbox; the `dead` list simulates gone destinations)
    #[derive(Default)]
    struct Mailbox {
        dead: Vec<ActorId>,
        delivered: Mutex<Vec<(ActorId, Session)>>,
    }

    impl Mailbox {
        fn with_dead(dead: Vec<ActorId>) -> Self {
            Self { dead, delivered: Mutex::new(Vec::new()) }
        }

        fn sessions(&self) -> Vec<u32> {
            self.delivered.lock().iter().map(|(_, s)| s.as_u32()).collect()
        }
    }

    impl Delivery for Mailbox {
        fn deliver(&self, destination: ActorId, session: Session) -> Result<(), TimerError> {
            if self.dead.contains(&destination) {
                return Err(TimerError::DeadDestination { destination });
            }
            self.delivered.lock().push((destination, session));
            Ok(())
        }
    }

    #[test]
    fn test_zero_delay_delivers_synchronously() {
        let mailbox = Arc::new(Mailbox::default());
        let timer = Timer::new(mailbox.clone());

        let result = timer.schedule_timeout(ActorId::new(1), 0, Session::new(7));
        assert_eq!(result, Ok(Session::new(7)));
        // 调用返回前已投递 (delivered before the call returned)
        assert_eq!(mailbox.sessions(), vec![7]);
    }

    #[test]
    fn test_zero_delay_to_dead_destination_errors() {
        let dead = ActorId::new(99);
        let mailbox = Arc::new(Mailbox::with_dead(vec![dead]));
        let timer = Timer::new(mailbox.clone());

        let result = timer.schedule_timeout(dead, 0, Session::new(1));
        assert_eq!(result, Err(TimerError::DeadDestination { destination: dead }));
        assert!(mailbox.sessions().is_empty());
    }

    #[test]
    fn test_fires_after_exact_delay_not_before() {
        let mailbox = Arc::new(Mailbox::default());
        let timer = Timer::new(mailbox.clone());

        timer
            .schedule_timeout(ActorId::new(2), 5, Session::new(9))
            .unwrap();

        timer.reconcile(4);
        assert!(mailbox.sessions().is_empty(), "fired before 5 elapsed centiseconds");

        timer.reconcile(5);
        assert_eq!(mailbox.sessions(), vec![9]);

        // 只触发一次 (fires exactly once)
        timer.reconcile(20);
        assert_eq!(mailbox.sessions(), vec![9]);
    }

    #[test]
    fn test_large_jump_runs_sequential_cycles() {
        let mailbox = Arc::new(Mailbox::default());
        let timer = Timer::new(mailbox.clone());

        timer.schedule_timeout(ActorId::new(1), 7, Session::new(7)).unwrap();
        timer.schedule_timeout(ActorId::new(1), 3, Session::new(3)).unwrap();

        // 一次大的时钟差按 tick 顺序触发，而不是批量跳过
        // (one large clock delta fires in tick order, not as a bulk jump)
        timer.reconcile(50);
        assert_eq!(mailbox.sessions(), vec![3, 7]);
    }

    #[test]
    fn test_clock_regression_clamps_without_advancing() {
        let mailbox = Arc::new(Mailbox::default());
        let timer = Timer::new(mailbox.clone());

        timer.reconcile(10);
        let elapsed = timer.elapsed();

        timer.schedule_timeout(ActorId::new(1), 1, Session::new(1)).unwrap();

        // 回拨：不推进、不触发、不崩溃 (regression: no advance, no firing, no crash)
        timer.reconcile(4);
        assert_eq!(timer.elapsed(), elapsed);
        assert!(mailbox.sessions().is_empty());

        // 钳制后从新样本继续计时 (after clamping, time continues from the new sample)
        timer.reconcile(5);
        assert_eq!(timer.elapsed(), elapsed.wrapping_add(1));
        assert_eq!(mailbox.sessions(), vec![1]);
    }

    #[test]
    fn test_same_sample_is_noop() {
        let mailbox = Arc::new(Mailbox::default());
        let timer = Timer::new(mailbox.clone());

        timer.reconcile(3);
        let elapsed = timer.elapsed();
        timer.reconcile(3);
        assert_eq!(timer.elapsed(), elapsed);
    }

    #[test]
    fn test_elapsed_advances_by_clock_delta() {
        let timer = Timer::new(Arc::new(Mailbox::default()));
        let base = timer.elapsed();

        timer.reconcile(3);
        assert_eq!(timer.elapsed(), base.wrapping_add(3));

        timer.reconcile(10);
        assert_eq!(timer.elapsed(), base.wrapping_add(10));
    }

    #[test]
    fn test_elapsed_wrap_adjusts_start_time() {
        let timer = Timer::new(Arc::new(Mailbox::default()));
        let start = timer.start_time();

        // 把厘秒计数推到回绕边缘 (push the centisecond counter to the wrap edge)
        timer.current.store(u32::MAX - 1, Ordering::Relaxed);
        timer.reconcile(3);

        assert_eq!(timer.start_time(), start.wrapping_add(u32::MAX / 100));
    }

    #[test]
    fn test_fire_time_delivery_failure_not_surfaced() {
        let dead = ActorId::new(5);
        let mailbox = Arc::new(Mailbox::with_dead(vec![dead]));
        let timer = Timer::new(mailbox.clone());

        // 非零延迟提交总是成功 (nonzero-delay submission always succeeds)
        let result = timer.schedule_timeout(dead, 2, Session::new(4));
        assert_eq!(result, Ok(Session::new(4)));

        // 触发时目标已消亡：丢弃，不恐慌 (destination gone at fire time: dropped, no panic)
        timer.reconcile(2);
        assert!(mailbox.sessions().is_empty());
    }

    #[test]
    fn test_interleaved_submissions_and_driving() {
        let mailbox = Arc::new(Mailbox::default());
        let timer = Timer::new(mailbox.clone());

        timer.schedule_timeout(ActorId::new(1), 2, Session::new(2)).unwrap();
        timer.reconcile(1);
        // 在已推进的时刻提交：到期 tick 相对当前计算 (submitted after advancing:
        // expiry counts from the current tick)
        timer.schedule_timeout(ActorId::new(1), 2, Session::new(3)).unwrap();

        timer.reconcile(2);
        assert_eq!(mailbox.sessions(), vec![2]);
        timer.reconcile(3);
        assert_eq!(mailbox.sessions(), vec![2, 3]);
    }
}
