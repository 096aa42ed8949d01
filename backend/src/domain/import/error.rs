use thiserror::Error;

/// File-level import failures. Nothing is imported when one of these occurs.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unable to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("Unable to read CSV file: {0}")]
    Csv(#[from] csv::Error),
    #[error("The file contains no sheet")]
    NoSheet,
    #[error("Invalid import layout: {0}")]
    Layout(String),
}

/// Why a single roster row was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowErrorKind {
    #[error("unreadable birth date '{0}'")]
    InvalidBirthDate(String),
    #[error("unreadable age '{0}'")]
    InvalidAge(String),
}

/// A rejected roster row
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {row}: {kind}")]
pub struct RowError {
    /// 1-based row number as shown by spreadsheet software
    pub row: usize,
    pub kind: RowErrorKind,
}
