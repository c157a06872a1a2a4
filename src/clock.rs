//! Clock sampling helpers
//!
//! The timer counts time in centiseconds (1/100 second). Two clocks are
//! involved: a monotonic clock that drives tick advancement, and the wall
//! clock that anchors tick zero to an absolute epoch at startup.
//!
//! 时钟采样辅助函数
//!
//! 定时器以厘秒（1/100 秒）计时。涉及两个时钟：驱动 tick 推进的单调时钟，
//! 以及启动时把 tick 零锚定到绝对纪元的墙上时钟。

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Duration of one tick (one centisecond)
///
/// 一个 tick 的时长（一厘秒）
pub const TICK: Duration = Duration::from_millis(10);

/// Centiseconds elapsed since `origin` on the monotonic clock
///
/// 单调时钟上自 `origin` 起经过的厘秒数
#[inline]
pub(crate) fn centis_since(origin: Instant) -> u64 {
    let elapsed = origin.elapsed();
    elapsed.as_secs() * 100 + u64::from(elapsed.subsec_nanos() / 10_000_000)
}

/// Wall clock split into (whole seconds, centisecond within the second)
///
/// Seconds are truncated to `u32` like the rest of the crate's second
/// counters; the value wraps in 2106.
///
/// 墙上时钟拆成（整秒，秒内厘秒）。秒数与 crate 内其余秒计数一样截断为
/// `u32`，2106 年回绕。
pub(crate) fn wall_clock() -> (u32, u32) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (now.as_secs() as u32, now.subsec_nanos() / 10_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centis_since_counts_forward() {
        let origin = Instant::now();
        let first = centis_since(origin);
        std::thread::sleep(Duration::from_millis(30));
        let second = centis_since(origin);
        // 30ms 对应 3 个厘秒，留出调度误差 (30ms is 3 centiseconds, allow scheduling slack)
        assert!(second >= first + 2, "expected progress, got {} -> {}", first, second);
    }

    #[test]
    fn test_wall_clock_centis_in_range() {
        let (_, cs) = wall_clock();
        assert!(cs < 100);
    }
}
