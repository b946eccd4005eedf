//! Bus bit timing (the DBC `BS_` section)

use serde::{Deserialize, Serialize};

/// Baud rate and controller timing registers of the bus.
///
/// A value object: an all-zero timing means the DBC carried a bare `BS_:`
/// line, which is the common case in modern databases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitTiming {
    /// Baud rate in bit/s
    pub baudrate: u64,
    /// Bit timing register 1
    pub btr1: u64,
    /// Bit timing register 2
    pub btr2: u64,
}

impl BitTiming {
    /// Create a new bit timing value
    pub fn new(baudrate: u64, btr1: u64, btr2: u64) -> Self {
        Self { baudrate, btr1, btr2 }
    }

    /// True if the DBC carried no timing information
    pub fn is_empty(&self) -> bool {
        self.baudrate == 0 && self.btr1 == 0 && self.btr2 == 0
    }
}
