use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier of a roster entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = std::num::ParseIntError;

    /// Accepts plain integers and integral floats (`"4241457.0"`), which is
    /// how spreadsheet exports tend to render id columns.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_suffix(".0").unwrap_or(s);
        digits.parse::<u64>().map(EntityId)
    }
}

/// One roster row. Read-only input to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub position: String,
    pub team: String,
}

impl Entity {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        position: impl Into<String>,
        team: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId(id),
            name: name.into(),
            position: position.into(),
            team: team.into(),
        }
    }
}
