use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::domain::LocationId;

/// Display names for enrollment locations, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationDirectory {
    names: HashMap<LocationId, String>,
}

#[derive(Debug, Deserialize)]
struct DirectoryEntry {
    id: LocationId,
    name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("failed to read location directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid location directory data: {0}")]
    Json(#[from] serde_json::Error),
}

impl LocationDirectory {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DirectoryError> {
        let entries: Vec<DirectoryEntry> = serde_json::from_reader(reader)?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.id, entry.name))
            .collect())
    }

    pub fn insert(&mut self, id: LocationId, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, id: &LocationId) -> Option<&str> {
        self.names.get(id).map(|name| name.trim()).filter(|name| !name.is_empty())
    }

    /// Name used in messages, falling back to the raw id for unknown locations.
    pub fn display_name(&self, id: &LocationId) -> String {
        match self.name(id) {
            Some(name) => name.to_string(),
            None => format!("location {id}"),
        }
    }
}

impl FromIterator<(LocationId, String)> for LocationDirectory {
    fn from_iter<T: IntoIterator<Item = (LocationId, String)>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_scheduler_location_listing() {
        let json = r#"[
            {"id": 5140, "name": "JFK International Global Entry EC", "shortName": "JFK", "timezoneData": "America/New_York"},
            {"id": "5446", "name": "San Francisco Global Entry Enrollment Center"}
        ]"#;

        let directory = LocationDirectory::from_reader(Cursor::new(json)).expect("directory loads");

        assert_eq!(directory.len(), 2);
        assert_eq!(
            directory.display_name(&LocationId::from(5140)),
            "JFK International Global Entry EC"
        );
        assert_eq!(
            directory.name(&LocationId::from(5446)),
            Some("San Francisco Global Entry Enrollment Center")
        );
    }

    #[test]
    fn unknown_locations_fall_back_to_the_id() {
        let directory = LocationDirectory::default();
        assert_eq!(directory.display_name(&LocationId::from(9)), "location 9");
    }

    #[test]
    fn malformed_listing_is_an_error() {
        let result = LocationDirectory::from_reader(Cursor::new(r#"{"id": 1}"#));
        assert!(matches!(result, Err(DirectoryError::Json(_))));
    }
}
