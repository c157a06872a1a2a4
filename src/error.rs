use crate::event::ActorId;
use std::fmt;

/// 定时器错误类型 (Timer Error Type)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// 目标 actor 已不存在，立即投递失败
    /// Destination actor no longer exists, immediate delivery failed
    DeadDestination {
        destination: ActorId,
    },

    /// 配置验证失败 (Configuration validation failed)
    InvalidConfiguration {
        field: &'static str,
        reason: String,
    },
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerError::DeadDestination { destination } => {
                write!(f, "Destination {} no longer exists", destination)
            }
            TimerError::InvalidConfiguration { field, reason } => {
                write!(f, "Configuration validation failed ({}): {}", field, reason)
            }
        }
    }
}

impl std::error::Error for TimerError {}
