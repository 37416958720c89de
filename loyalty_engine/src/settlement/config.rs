use std::{fmt::Display, str::FromStr, time::Duration};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

/// How the results of one tick are written to the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SettlementMode {
    /// Each order is settled in its own transaction. A failure only affects that order.
    #[default]
    PerOrder,
    /// All orders polled in a tick are settled in one transaction. A failure rolls back the lot.
    Batch,
}

impl FromStr for SettlementMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_order" | "per-order" | "order" => Ok(Self::PerOrder),
            "batch" => Ok(Self::Batch),
            s => Err(format!("Unknown settlement mode: {s}. Use 'per_order' or 'batch'.")),
        }
    }
}

impl Display for SettlementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementMode::PerOrder => write!(f, "per_order"),
            SettlementMode::Batch => write!(f, "batch"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Time between the start of one tick and the start of the next.
    pub interval: Duration,
    /// Maximum number of pending orders polled per tick.
    pub batch_size: usize,
    pub mode: SettlementMode,
    /// Delay before restarting the loop after its first panic. Doubles on every further panic.
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
            mode: SettlementMode::default(),
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl ReconcilerConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_mode(mut self, mode: SettlementMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max.max(initial);
        self
    }

    /// The delay that follows `current` in the restart backoff sequence.
    pub fn next_backoff(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_backoff)
    }
}
