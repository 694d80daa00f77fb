//! Fused proximity zone

use std::fmt;

/// Tri-state proximity classification derived from fused sensor inputs.
///
/// The derived ordering (Safe < Caution < Danger) is for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Zone {
    Safe,
    Caution,
    Danger,
}

impl Zone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Safe => "SAFE",
            Zone::Caution => "CAUTION",
            Zone::Danger => "DANGER",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
