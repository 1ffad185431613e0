use rtk_core::{Priority, Signal};
use thiserror::Error;

/// Rejected framework configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_active {0} outside 1..=63")]
    MaxActive(u8),
    #[error("max_signal {0} leaves no user signals")]
    NoUserSignals(u16),
    #[error("tick rate count {0} outside 1..=15")]
    TickRates(u8),
    #[error("{configured} event pools configured, at most {max} supported")]
    EventPools { configured: usize, max: usize },
}

/// A post that was refused. The event has already been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PostError {
    #[error("no active object at priority {0}")]
    NotRegistered(Priority),
    #[error("queue of priority {prio} refused {signal}")]
    QueueFull { prio: Priority, signal: Signal },
}
