//! Positional layout of the roster spreadsheet, as configuration data.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::error::ImportError;

/// Where each participant field lives in a roster row (0-based columns)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub name: usize,
    pub birth_date: usize,
    pub age: usize,
    pub gender: usize,
    pub guardian: usize,
    pub phones: usize,
    pub address: usize,
    pub observations: usize,
    pub transport: usize,
    pub email: usize,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            name: 0,
            birth_date: 1,
            age: 2,
            gender: 3,
            guardian: 4,
            phones: 5,
            address: 6,
            observations: 7,
            transport: 8,
            email: 9,
        }
    }
}

impl ColumnMap {
    fn indices(&self) -> [usize; 10] {
        [
            self.name,
            self.birth_date,
            self.age,
            self.gender,
            self.guardian,
            self.phones,
            self.address,
            self.observations,
            self.transport,
            self.email,
        ]
    }
}

/// Roster layout: header offset, end-of-data marker and column map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportLayout {
    /// 0-based index of the first data row (row 7 in spreadsheet numbering)
    pub first_data_row: usize,
    /// Parsing stops at the first row whose first cell contains this text
    pub end_marker: String,
    pub columns: ColumnMap,
}

impl Default for ImportLayout {
    fn default() -> Self {
        Self {
            first_data_row: 6,
            end_marker: "Nombre de filles".to_string(),
            columns: ColumnMap::default(),
        }
    }
}

impl ImportLayout {
    /// Reject layouts that map two fields onto the same column
    pub fn validate(&self) -> Result<(), ImportError> {
        let indices = self.columns.indices();
        let distinct: HashSet<_> = indices.iter().collect();
        if distinct.len() != indices.len() {
            return Err(ImportError::Layout("two fields share the same column".to_string()));
        }
        if self.end_marker.trim().is_empty() {
            return Err(ImportError::Layout("end marker cannot be empty".to_string()));
        }
        Ok(())
    }
}
