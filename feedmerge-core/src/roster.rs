//! Roster input — the entity list the pipeline enriches.
//!
//! The roster is a headered CSV with `id`, `name`, `position` and `team`
//! columns in any order. Spreadsheet-style headings (`Player ID`, `Name`,
//! `Position`, `NFL Team`) are accepted as aliases.

use crate::domain::{Entity, EntityId};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("read roster file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse roster CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("roster is missing a '{0}' column")]
    MissingColumn(&'static str),
}

const ID_ALIASES: [&str; 3] = ["id", "player id", "player_id"];
const NAME_ALIASES: [&str; 2] = ["name", "player name"];
const POSITION_ALIASES: [&str; 2] = ["position", "pos"];
const TEAM_ALIASES: [&str; 3] = ["team", "nfl team", "nfl_team"];

/// Ordered list of entities to process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    entities: Vec<Entity>,
}

impl Roster {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    /// Load a roster from a CSV file.
    pub fn from_csv_path(path: &Path) -> Result<Self, RosterError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Parse a roster from any CSV source.
    ///
    /// Rows whose id does not parse are skipped with a warning.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, RosterError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .collect();
        let find = |aliases: &[&str], name: &'static str| {
            headers
                .iter()
                .position(|h| aliases.contains(&h.as_str()))
                .ok_or(RosterError::MissingColumn(name))
        };
        let id_col = find(&ID_ALIASES[..], "id")?;
        let name_col = find(&NAME_ALIASES[..], "name")?;
        let position_col = find(&POSITION_ALIASES[..], "position")?;
        let team_col = find(&TEAM_ALIASES[..], "team")?;

        let mut entities = Vec::new();
        for (line, record) in rdr.records().enumerate() {
            let record = record?;
            let field = |col: usize| record.get(col).unwrap_or("").to_string();
            let raw_id = field(id_col);
            let Ok(id) = raw_id.parse::<EntityId>() else {
                warn!(row = line + 1, id = %raw_id, "skipping roster row with invalid id");
                continue;
            };
            entities.push(Entity {
                id,
                name: field(name_col),
                position: field(position_col),
                team: field(team_col),
            });
        }

        Ok(Self { entities })
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of distinct entity ids.
    pub fn unique_ids(&self) -> usize {
        self.entities
            .iter()
            .map(|e| e.id)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Sequential fixed-size batches in roster order. The last may be smaller.
    ///
    /// A `size` of zero is treated as one.
    pub fn batches(&self, size: usize) -> std::slice::Chunks<'_, Entity> {
        self.entities.chunks(size.max(1))
    }

    /// Number of batches [`Roster::batches`] yields for `size`.
    pub fn batch_count(&self, size: usize) -> usize {
        self.entities.len().div_ceil(size.max(1))
    }
}

impl From<Vec<Entity>> for Roster {
    fn from(entities: Vec<Entity>) -> Self {
        Self::new(entities)
    }
}
