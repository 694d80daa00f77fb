//! Actuator-side motion types

use std::fmt;

/// Direction of the next evasive turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    /// Steering sign: left negative, right positive
    #[inline]
    pub fn sign(&self) -> f64 {
        match self {
            TurnDirection::Left => -1.0,
            TurnDirection::Right => 1.0,
        }
    }

    /// The opposite direction
    #[inline]
    pub fn flipped(&self) -> Self {
        match self {
            TurnDirection::Left => TurnDirection::Right,
            TurnDirection::Right => TurnDirection::Left,
        }
    }
}

impl fmt::Display for TurnDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnDirection::Left => f.write_str("left"),
            TurnDirection::Right => f.write_str("right"),
        }
    }
}

/// Last throttle state commanded to the actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Motion {
    #[default]
    Stopped,
    Forward(u8),
    Backward(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_direction_flip() {
        assert_eq!(TurnDirection::Right.flipped(), TurnDirection::Left);
        assert_eq!(TurnDirection::Left.flipped().flipped(), TurnDirection::Left);
        assert_eq!(TurnDirection::Left.sign(), -1.0);
        assert_eq!(TurnDirection::Right.sign(), 1.0);
    }
}
