use std::{fmt, str::FromStr};

use thiserror::Error;

/// Horizontal side of the goal targeted by a shot or covered by a dive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Center,
    Right,
}

/// Vertical band of the goal targeted by a shot or covered by a dive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Height {
    Low,
    High,
}

/// One of the six discrete turn choices, encoded on the wire as `Direction-Height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Choice {
    pub direction: Direction,
    pub height: Height,
}

/// Error returned when a `Direction-Height` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid choice `{0}` (expected Left|Center|Right-Low|High)")]
pub struct ChoiceParseError(pub String);

impl Choice {
    /// Choice recorded on behalf of a player whose turn timed out.
    pub const AUTO: Choice = Choice {
        direction: Direction::Center,
        height: Height::Low,
    };

    pub const fn new(direction: Direction, height: Height) -> Self {
        Self { direction, height }
    }

    /// Every possible choice, in wire order.
    pub fn all() -> [Choice; 6] {
        use Direction::*;
        use Height::*;
        [
            Choice::new(Left, Low),
            Choice::new(Left, High),
            Choice::new(Center, Low),
            Choice::new(Center, High),
            Choice::new(Right, Low),
            Choice::new(Right, High),
        ]
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Direction::Left => "Left",
            Direction::Center => "Center",
            Direction::Right => "Right",
        };
        f.write_str(label)
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Height::Low => "Low",
            Height::High => "High",
        };
        f.write_str(label)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.direction, self.height)
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Direction::Left),
            "center" => Ok(Direction::Center),
            "right" => Ok(Direction::Right),
            _ => Err(()),
        }
    }
}

impl FromStr for Height {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Height::Low),
            "high" => Ok(Height::High),
            _ => Err(()),
        }
    }
}

impl FromStr for Choice {
    type Err = ChoiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ChoiceParseError(s.to_string());
        let (direction, height) = s.split_once('-').ok_or_else(invalid)?;
        Ok(Choice {
            direction: direction.parse().map_err(|_| invalid())?,
            height: height.parse().map_err(|_| invalid())?,
        })
    }
}
