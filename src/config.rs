//! 定时器配置模块 (Timer Configuration Module)
//!
//! 提供服务层的配置结构和 Builder 模式。时间轮本身的几何参数（槽数、层数、
//! tick 精度）是固定的；可配置的只有驱动行为。
//! (Provides the service-level configuration structure and Builder pattern.
//! The wheel geometry itself (slot counts, levels, tick resolution) is
//! fixed; only the driver behavior is configurable)

use crate::clock::TICK;
use crate::error::TimerError;
use std::time::Duration;

/// 服务配置 (Service Configuration)
///
/// 用于配置后台驱动任务的节奏。
/// (Configuration for the background driver task cadence)
///
/// # 示例 (Examples)
/// ```
/// use merlin_timer::ServiceConfig;
/// use std::time::Duration;
///
/// // 使用默认配置 (Use default configuration)
/// let config = ServiceConfig::default();
///
/// // 使用 Builder 自定义配置 (Use Builder to customize configuration)
/// let config = ServiceConfig::builder()
///     .poll_interval(Duration::from_millis(1))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// 驱动任务采样单调时钟的间隔
    /// (Interval at which the driver task samples the monotonic clock)
    ///
    /// 每次采样根据实际流逝的厘秒数推进时间轮，因此采样得比 tick 更勤
    /// 只是降低触发抖动，不会让定时器提前；采样偏慢则由时钟差值自动补齐。
    /// (Each sample advances the wheel by the centiseconds that actually
    /// elapsed, so sampling faster than a tick only reduces firing jitter and
    /// never fires early; sampling slower is compensated by the clock delta)
    pub poll_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            // 2.5ms：tick 时长的四分之一 (a quarter of the tick duration)
            poll_interval: Duration::from_micros(2500),
        }
    }
}

impl ServiceConfig {
    /// 创建配置构建器 (Create configuration builder)
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }
}

/// 服务配置构建器 (Service Configuration Builder)
#[derive(Debug, Clone)]
pub struct ServiceConfigBuilder {
    poll_interval: Duration,
}

impl Default for ServiceConfigBuilder {
    fn default() -> Self {
        let config = ServiceConfig::default();
        Self {
            poll_interval: config.poll_interval,
        }
    }
}

impl ServiceConfigBuilder {
    /// 设置驱动采样间隔 (Set driver poll interval)
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// 构建配置并进行验证
    ///      (Build and validate configuration)
    ///
    /// # 返回 (Returns)
    /// - `Ok(ServiceConfig)`: 配置有效
    ///      (Configuration is valid)
    /// - `Err(TimerError)`: 配置验证失败
    ///      (Configuration validation failed)
    ///
    /// # 验证规则 (Validation Rules)
    /// - 采样间隔必须大于 0
    ///      (Poll interval must be greater than 0)
    /// - 采样间隔不得超过 100 个 tick（1 秒），否则可查询时间滞后过多
    ///      (Poll interval must not exceed 100 ticks (1 second), otherwise the
    ///      queryable time lags too far behind)
    pub fn build(self) -> Result<ServiceConfig, TimerError> {
        if self.poll_interval.is_zero() {
            return Err(TimerError::InvalidConfiguration {
                field: "poll_interval",
                reason: "采样间隔必须大于 0".to_string(),
            });
        }

        if self.poll_interval > TICK * 100 {
            return Err(TimerError::InvalidConfiguration {
                field: "poll_interval",
                reason: "采样间隔不得超过 1 秒".to_string(),
            });
        }

        Ok(ServiceConfig {
            poll_interval: self.poll_interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.poll_interval, Duration::from_micros(2500));
    }

    #[test]
    fn test_builder_custom_interval() {
        let config = ServiceConfig::builder()
            .poll_interval(Duration::from_millis(5))
            .build()
            .unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(5));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = ServiceConfig::builder()
            .poll_interval(Duration::ZERO)
            .build();
        assert!(matches!(
            result,
            Err(TimerError::InvalidConfiguration { field: "poll_interval", .. })
        ));
    }

    #[test]
    fn test_oversized_interval_rejected() {
        let result = ServiceConfig::builder()
            .poll_interval(Duration::from_secs(2))
            .build();
        assert!(result.is_err());
    }
}
