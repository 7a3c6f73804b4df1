use thiserror::Error;

pub mod context;
pub mod fetch;
pub mod policy;

pub use context::{
    BackfillContext, BackfillState, ContextArena, PartitionHandle, UnavailableCause,
};
pub use fetch::{Fetched, PartitionAccess, SeekFrom};
pub use policy::{compute, evaluate_partition, evaluate_partition_with};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MedianError {
    #[error("window size must be odd: got {}", describe_size(.0))]
    InvalidWindowSize(Option<i64>),
}

impl MedianError {
    pub fn hint(&self) -> &'static str {
        match self {
            MedianError::InvalidWindowSize(_) => "make it a positive odd number",
        }
    }
}

fn describe_size(size: &Option<i64>) -> String {
    size.map(|v| v.to_string()).unwrap_or_else(|| "null".to_string())
}

/// validated window length: positive and odd
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize(usize);

impl WindowSize {
    pub fn new(size: Option<i64>) -> Result<Self, MedianError> {
        match size {
            Some(v) if v > 0 && v % 2 == 1 => usize::try_from(v)
                .map(WindowSize)
                .map_err(|_| MedianError::InvalidWindowSize(size)),
            _ => Err(MedianError::InvalidWindowSize(size)),
        }
    }

    pub fn get(&self) -> usize {
        self.0
    }

    /// rows before this index have no full trailing window
    pub fn backfill_end(&self) -> usize {
        self.0 - 1
    }
}
