//! Progress reporting shared by the operation drivers.

/// A point-in-time progress reading for a dump/program/erase run.
#[derive(Debug, Clone)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub message: Option<String>,
}

impl Progress {
    pub fn new(current: u64, total: u64) -> Self {
        Self {
            current,
            total,
            message: None,
        }
    }

    pub fn with_message(current: u64, total: u64, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: Some(message.into()),
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f64 / self.total as f64) * 100.0
        }
    }
}
