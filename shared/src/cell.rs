//! Board coordinates and their wire key.
//!
//! The board is an unbounded integer grid stored sparsely. Every occupied
//! cell is keyed by the pairing `"x,y"`, which is what appears as the object
//! key of `board` in a serialized game. The pairing is order-sensitive and
//! parses back to exactly the pair that produced it.

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A single square on the unbounded board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: i64,
    pub y: i64,
}

impl Cell {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Steps `distance` cells along the direction `(dx, dy)`.
    ///
    /// Returns `None` when the step leaves the `i64` range.
    pub fn offset(self, dx: i64, dy: i64, distance: i64) -> Option<Self> {
        let x = self.x.checked_add(dx.checked_mul(distance)?)?;
        let y = self.y.checked_add(dy.checked_mul(distance)?)?;
        Some(Self { x, y })
    }

    pub fn to_pair(self) -> [i64; 2] {
        [self.x, self.y]
    }
}

impl From<[i64; 2]> for Cell {
    fn from(pair: [i64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<Cell> for [i64; 2] {
    fn from(cell: Cell) -> Self {
        cell.to_pair()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Error returned when a board key is not of the form `"x,y"`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid cell key '{0}'")]
pub struct CellParseError(pub String);

impl FromStr for Cell {
    type Err = CellParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| CellParseError(s.to_string()))?;
        let x = x.parse().map_err(|_| CellParseError(s.to_string()))?;
        let y = y.parse().map_err(|_| CellParseError(s.to_string()))?;
        Ok(Self { x, y })
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(de::Error::custom)
    }
}
