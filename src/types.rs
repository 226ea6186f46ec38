// =============================================================================
// Shared types used across the trail channel
// =============================================================================

/// Which side of the channel a trail protects.
///
/// The long trail is a rising floor under price, the short trail a falling
/// ceiling above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// `+1.0` for long, `-1.0` for short.
    pub fn sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

/// Bar field read by the extreme-window helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    High,
    Low,
}
