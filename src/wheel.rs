use crate::event::TimerEvent;
use smallvec::SmallVec;
use std::mem;

/// Near-ring index width: 256 slots at 1-tick resolution
///
/// 近环索引位宽：256 个槽，1 tick 精度
pub(crate) const NEAR_SHIFT: u32 = 8;
pub(crate) const NEAR: usize = 1 << NEAR_SHIFT;
pub(crate) const NEAR_MASK: u32 = (NEAR - 1) as u32;

/// Cascade-level index width: 64 slots per level
///
/// 级联层索引位宽：每层 64 个槽
pub(crate) const LEVEL_SHIFT: u32 = 6;
pub(crate) const LEVEL: usize = 1 << LEVEL_SHIFT;
pub(crate) const LEVEL_MASK: u32 = (LEVEL - 1) as u32;

/// Number of cascade levels above the near ring
///
/// 近环之上的级联层数
pub(crate) const LEVEL_COUNT: usize = 4;

/// A pending timeout: absolute expiry tick plus the notification payload
///
/// The entry is owned by exactly one bucket at a time; it moves by value
/// through cascade and dispatch, and is dropped after delivery.
///
/// 待触发的超时：绝对到期 tick 加通知载荷
///
/// 条目任一时刻只归属一个桶；级联和派发过程中按值移动，投递后即销毁。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimerEntry {
    /// 绝对到期 tick，按 2^32 回绕 (absolute expiry tick, wraps modulo 2^32)
    pub(crate) expire: u32,
    /// 通知载荷 (notification payload)
    pub(crate) event: TimerEvent,
}

/// Inline-first entry storage; most buckets hold only a few entries
///
/// 条目存储优先内联；大多数桶只有少量条目
pub(crate) type EntryList = SmallVec<[TimerEntry; 4]>;

/// FIFO bucket backing one wheel slot
///
/// `append` pushes to the tail in O(1); `drain` detaches the whole contents
/// and leaves the bucket empty. Entries are always consumed whole-bucket;
/// there is no search and no removal by value.
///
/// 支撑一个轮槽的 FIFO 桶
///
/// `append` O(1) 追加到尾部；`drain` 摘下全部内容并把桶置空。条目总是
/// 整桶消费，不存在查找或按值删除。
#[derive(Debug, Default)]
struct Bucket {
    entries: EntryList,
}

impl Bucket {
    #[inline]
    fn append(&mut self, entry: TimerEntry) {
        self.entries.push(entry);
    }

    #[inline]
    fn drain(&mut self) -> EntryList {
        mem::take(&mut self.entries)
    }
}

/// Whether two ticks fall inside the same wheel interval of width `mask + 1`
///
/// Equivalent to comparing all bits above the interval: the raw (wrapped)
/// values are compared directly, so the check stays correct across the
/// 2^32 tick rollover as long as both values come from the same epoch of
/// the counter.
///
/// 两个 tick 是否落在同一个宽度为 `mask + 1` 的轮区间内
///
/// 等价于比较区间位之上的全部高位：直接比较（已回绕的）原始值，因此只要
/// 两个值来自计数器同一轮纪元，跨 2^32 回绕时判断依然成立。
#[inline]
fn same_interval(expire: u32, time: u32, mask: u32) -> bool {
    (expire | mask) == (time | mask)
}

/// Index mask covering the tick range of cascade level `level`
///
/// Level 0 covers `256 << 6` ticks, each further level 64x more.
///
/// 覆盖级联层 `level` tick 范围的掩码。第 0 层覆盖 `256 << 6` 个 tick，
/// 每升一层扩大 64 倍。
#[inline]
fn level_interval_mask(level: usize) -> u32 {
    ((NEAR as u32) << (LEVEL_SHIFT * (level as u32 + 1))) - 1
}

/// Hierarchical timing wheel
///
/// One fine-grained near ring (256 slots, 1-tick resolution, covering the
/// next 256 ticks) plus four cascading rings (64 slots each, exponentially
/// coarser). An entry always sits in the coarsest bucket that still
/// distinguishes its expiry from "now"; as `time` advances into a coarse
/// bucket's range the bucket is drained and its entries re-placed into finer
/// rings, until they reach the near ring and fire.
///
/// This is a pure data structure: no locking, no clock. The [`crate::timer`]
/// facade owns the mutex and drives `advance`/`expire_current`.
///
/// 分层时间轮
///
/// 一个细粒度近环（256 槽，1 tick 精度，覆盖接下来的 256 个 tick）加四个
/// 级联环（每个 64 槽，精度逐层指数变粗）。条目总是放在仍能把它的到期时刻
/// 与“现在”区分开的最粗的桶里；当 `time` 推进到某个粗桶的范围时，整桶倒出
/// 并重新放入更细的环，直至进入近环触发。
///
/// 这是纯数据结构：不加锁、不碰时钟。[`crate::timer`] 门面持有互斥锁并
/// 驱动 `advance`/`expire_current`。
pub(crate) struct Wheel {
    /// 近环 (near ring)
    near: Vec<Bucket>,
    /// 级联环，从细到粗 (cascading rings, finest first)
    levels: Vec<Vec<Bucket>>,
    /// 当前 tick，按 2^32 回绕 (current tick, wraps modulo 2^32)
    time: u32,
}

impl Wheel {
    pub(crate) fn new() -> Self {
        Self::with_time(0)
    }

    /// Create a wheel whose tick counter starts at `time`
    ///
    /// The counter normally starts at zero; starting elsewhere exercises the
    /// 2^32 rollover paths.
    ///
    /// 创建 tick 计数器从 `time` 起步的时间轮。正常从零开始；从别处起步
    /// 用于覆盖 2^32 回绕路径。
    pub(crate) fn with_time(time: u32) -> Self {
        let mut near = Vec::with_capacity(NEAR);
        for _ in 0..NEAR {
            near.push(Bucket::default());
        }

        let mut levels = Vec::with_capacity(LEVEL_COUNT);
        for _ in 0..LEVEL_COUNT {
            let mut ring = Vec::with_capacity(LEVEL);
            for _ in 0..LEVEL {
                ring.push(Bucket::default());
            }
            levels.push(ring);
        }

        Self { near, levels, time }
    }

    /// Get current tick
    ///
    /// 获取当前 tick
    #[allow(dead_code)]
    #[inline]
    pub(crate) fn current_tick(&self) -> u32 {
        self.time
    }

    /// Insert a new timeout due `delay` ticks from now
    ///
    /// The absolute expiry tick is `time + delay` with wrapping arithmetic;
    /// a delay of zero lands in the current near slot and fires on the next
    /// dispatch of that slot.
    ///
    /// 插入一个 `delay` 个 tick 后到期的超时
    ///
    /// 绝对到期 tick 为回绕算术下的 `time + delay`；延迟为零会落在当前近环
    /// 槽位，于该槽下次派发时触发。
    #[inline]
    pub(crate) fn schedule(&mut self, event: TimerEvent, delay: u32) {
        let expire = self.time.wrapping_add(delay);
        self.add_entry(TimerEntry { expire, event });
    }

    /// Place an entry into the coarsest bucket consistent with its distance
    ///
    /// # Placement rule (放置规则)
    /// - Expiry within the near ring's 256-tick window of `time`: near ring,
    ///   slot `expire & 0xFF`.
    ///   (到期落在近环距 `time` 256 tick 的窗口内：近环，槽 `expire & 0xFF`)
    /// - Otherwise the smallest level 0..=2 whose interval contains both:
    ///   slot `(expire >> (8 + 6*level)) & 0x3F`.
    ///   (否则取区间同时包含两者的最小层 0..=2)
    /// - No match (only possible close to the 2^32 rollover): level 3.
    ///   (都不匹配时（仅在临近 2^32 回绕时发生）：第 3 层)
    fn add_entry(&mut self, entry: TimerEntry) {
        let expire = entry.expire;
        let time = self.time;

        if same_interval(expire, time, NEAR_MASK) {
            self.near[(expire & NEAR_MASK) as usize].append(entry);
            return;
        }

        let mut level = 0;
        while level < LEVEL_COUNT - 1 {
            if same_interval(expire, time, level_interval_mask(level)) {
                break;
            }
            level += 1;
        }

        let shift = NEAR_SHIFT + level as u32 * LEVEL_SHIFT;
        let slot = ((expire >> shift) & LEVEL_MASK) as usize;
        self.levels[level][slot].append(entry);
    }

    /// Drain one coarse bucket and re-place every entry
    ///
    /// Time has advanced into the bucket's range, so re-placement pushes the
    /// entries down into finer rings.
    ///
    /// 倒空一个粗桶并重新放置其中每个条目。时间已推进到该桶的范围内，
    /// 重新放置会把条目压入更细的环。
    fn cascade(&mut self, level: usize, slot: usize) {
        let entries = self.levels[level][slot].drain();
        for entry in entries {
            self.add_entry(entry);
        }
    }

    /// Advance the wheel by one tick, cascading any boundary crossed
    ///
    /// When the counter rolls over to zero the whole level-3 slot 0 bucket
    /// cascades. Otherwise, at the first 64-aligned boundary whose slot index
    /// is nonzero, that bucket cascades; a zero index means the same boundary
    /// also crossed the next coarser level, so the walk continues upward.
    ///
    /// 将时间轮推进一个 tick，并级联被跨越的边界
    ///
    /// 计数器回绕到零时，整个第 3 层 0 号桶级联。否则在第一个槽号非零的
    /// 64 对齐边界处级联该桶；槽号为零说明同一边界也跨过了更粗的一层，
    /// 继续向上检查。
    pub(crate) fn advance(&mut self) {
        self.time = self.time.wrapping_add(1);
        let ct = self.time;

        if ct == 0 {
            self.cascade(LEVEL_COUNT - 1, 0);
            return;
        }

        for level in 0..LEVEL_COUNT {
            let shift = NEAR_SHIFT + level as u32 * LEVEL_SHIFT;
            if ct & ((1 << shift) - 1) != 0 {
                // 该层边界未被跨越 (no boundary crossed at this level)
                break;
            }
            let slot = ((ct >> shift) & LEVEL_MASK) as usize;
            if slot != 0 {
                self.cascade(level, slot);
                break;
            }
        }
    }

    /// Detach every entry due at the current tick
    ///
    /// Returns the near-ring slot `time & 0xFF` drained whole. The caller
    /// dispatches the returned entries and re-checks until the slot stays
    /// empty, since producers may append to it concurrently between drains.
    ///
    /// 摘下当前 tick 到期的全部条目
    ///
    /// 整体倒出近环 `time & 0xFF` 号槽。调用方派发返回的条目后需再次检查，
    /// 直到槽保持为空，因为两次倒空之间生产者可能并发追加。
    #[inline]
    pub(crate) fn expire_current(&mut self) -> EntryList {
        let idx = (self.time & NEAR_MASK) as usize;
        self.near[idx].drain()
    }
}
