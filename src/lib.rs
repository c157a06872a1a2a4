//! # Actor 运行时定时器服务 (Timer Service for Actor Runtimes)
//!
//! 基于分层时间轮（Hierarchical Timing Wheel）的厘秒级定时器：调用方提交
//! “`delay` 个 tick 后通知 actor `destination`，关联令牌 `session`”，服务
//! 保证通知恰好投递一次、绝不早于约定时刻，经由运行时正常的消息投递路径
//! 送达。
//! (Centisecond-resolution timer built on a hierarchical timing wheel:
//! callers submit "notify actor `destination`, correlation `session`, after
//! `delay` ticks", and the service guarantees exactly-once delivery, never
//! earlier than requested, via the runtime's normal message-delivery path)
//!
//! ## 特性 (Features)
//!
//! - **O(1) 插入 (O(1) insertion)**: 按到期距离直接定位环与槽
//!   (ring and slot located directly from the distance to expiry)
//! - **级联推进 (Cascading advancement)**: 粗桶随时间推进整桶倒入细环，
//!   条目总在到期 tick 准时进入近环
//!   (coarse buckets spill into finer rings as time advances; entries reach
//!   the near ring exactly by their expiry tick)
//! - **并发提交 (Concurrent submission)**: 任意数量的生产者线程，
//!   parking_lot 互斥锁只覆盖 O(1) 桶操作
//!   (any number of producer threads; the parking_lot mutex covers O(1)
//!   bucket operations only)
//! - **投递不持锁 (Lock-free delivery)**: 派发循环先释放轮锁再投递，
//!   慢投递不会阻塞生产者
//!   (the dispatch loop releases the wheel lock before delivering, so a slow
//!   delivery never stalls producers)
//!
//! ## 快速开始 (Quick Start)
//!
//! ```no_run
//! use merlin_timer::{ActorId, Delivery, Session, ServiceConfig, TimerError, TimerService};
//! use std::sync::Arc;
//!
//! // 运行时侧的消息投递实现 (the runtime-side delivery implementation)
//! struct Mailbox;
//!
//! impl Delivery for Mailbox {
//!     fn deliver(&self, destination: ActorId, session: Session) -> Result<(), TimerError> {
//!         println!("notify {} (session {})", destination, session);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = TimerService::new(Arc::new(Mailbox), ServiceConfig::default());
//!
//!     // 延迟 0：同步投递，目标消亡则报错
//!     // (delay 0: synchronous delivery, errors if the destination is gone)
//!     service.schedule_timeout(ActorId::new(1), 0, Session::new(7)).unwrap();
//!
//!     // 延迟 100 个 tick（1 秒）：必然触发，不可取消
//!     // (delay 100 ticks (1s): guaranteed to fire, not cancellable)
//!     service.schedule_timeout(ActorId::new(1), 100, Session::new(8)).unwrap();
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(2)).await;
//!     service.shutdown().await;
//! }
//! ```
//!
//! ## 架构说明 (Architecture)
//!
//! ### 时间轮 (The wheel)
//!
//! tick 为 1/100 秒，tick 计数按 2^32 回绕。轮分两级结构：
//! (a tick is 1/100 second; the counter wraps modulo 2^32. Two tiers of
//! rings:)
//!
//! - **近环 (near ring)**: 256 槽，1 tick 精度，覆盖接下来的 256 个 tick
//! - **级联环 (cascade rings)**: 4 层，每层 64 槽，精度逐层扩大 64 倍；
//!   太远的条目先放粗桶，时间推进到范围内再整桶级联到细环
//!   (4 levels of 64 slots, each 64x coarser; far-out entries wait in coarse
//!   buckets and cascade into finer rings once time reaches their range)
//!
//! ### 驱动 (Driving)
//!
//! 唯一的驱动方采样单调时钟，把实际流逝的每一厘秒转换为一次“派发-推进-
//! 派发”周期；时钟回拨被钳制并记录日志，计数回绕自动校正墙钟锚点。
//! (A single driver samples the monotonic clock and turns every elapsed
//! centisecond into one fire-advance-fire cycle; clock regressions are
//! clamped and logged, counter wraparound adjusts the wall-clock anchor)
//!
//! [`TimerService`] 内置 tokio 后台驱动；嵌入自有调度循环时直接驱动
//! [`Timer`]。
//! ([`TimerService`] ships a tokio background driver; embedders with their
//! own scheduler loop drive [`Timer`] directly)
//!
//! ### 契约 (Contract)
//!
//! 非零延迟的提交没有失败路径，也没有取消：条目必然在 `提交时刻 + delay`
//! 的 tick 触发。触发时目标已消亡的通知被丢弃且不回报提交方，因为 API
//! 在触发时刻没有返回通道，这是有意保留的不对称。
//! (Nonzero-delay submission has no failure path and no cancellation: the
//! entry fires at tick `submission + delay`. A notification whose
//! destination died by fire time is dropped without informing the submitter,
//! since the API has no return channel at fire time; the asymmetry is kept
//! deliberately)

mod clock;
mod config;
mod error;
mod event;
mod service;
mod timer;
mod wheel;

// 重新导出公共 API (Re-export public API)
pub use clock::TICK;
pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use error::TimerError;
pub use event::{ActorId, Delivery, Session, TimerEvent};
pub use service::TimerService;
pub use timer::Timer;
