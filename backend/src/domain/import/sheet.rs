//! Reads the first sheet of an uploaded file into plain rows of cells.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;
use std::io::Cursor;
use tracing::{debug, warn};

use super::error::ImportError;

/// A sheet cell reduced to what the roster parser needs
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Cell content as text; whole numbers lose their fractional part
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
        }
    }

    fn from_data(data: &Data) -> Self {
        match data {
            Data::String(text) => Cell::Text(text.clone()),
            Data::Float(value) => Cell::Number(*value),
            Data::Int(value) => Cell::Number(*value as f64),
            Data::Bool(value) => Cell::Text(value.to_string()),
            Data::DateTime(value) => Cell::Number(value.as_f64()),
            Data::DateTimeIso(text) | Data::DurationIso(text) => Cell::Text(text.clone()),
            _ => Cell::Empty,
        }
    }
}

pub type SheetRows = Vec<Vec<Cell>>;

/// Read the first sheet of `bytes`. CSV files are recognised by extension,
/// everything else goes through the workbook reader (xlsx, xls, ods).
pub fn read_sheet(bytes: &[u8], file_name: &str) -> Result<SheetRows, ImportError> {
    if file_name.to_lowercase().ends_with(".csv") {
        read_csv(bytes)
    } else {
        read_workbook(bytes)
    }
}

fn read_workbook(bytes: &[u8]) -> Result<SheetRows, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook.worksheet_range_at(0).ok_or(ImportError::NoSheet)??;

    // Ranges start at the first non-empty cell; pad so row and column
    // indices match the sheet
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows: SheetRows = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; start_col as usize];
        cells.extend(row.iter().map(Cell::from_data));
        rows.push(cells);
    }

    debug!("Read {} rows from workbook", rows.len());
    Ok(rows)
}

fn read_csv(bytes: &[u8]) -> Result<SheetRows, ImportError> {
    let text = decode_csv(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(sniff_delimiter(text.as_bytes()))
        .from_reader(text.as_bytes());

    let mut rows = SheetRows::new();
    for record in reader.records() {
        let record = record?;
        let cells = record
            .iter()
            .map(|field| {
                let text = field.trim();
                if text.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(text.to_string())
                }
            })
            .collect();
        rows.push(cells);
    }

    debug!("Read {} rows from CSV", rows.len());
    Ok(rows)
}

/// UTF-8 (with or without BOM), otherwise Windows-1252 as written by Excel's
/// "CSV (séparateur: point-virgule)" export
fn decode_csv(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            warn!("CSV file is not UTF-8, decoding it as Windows-1252");
            WINDOWS_1252.decode_without_bom_handling(bytes).0
        }
    }
}

/// French spreadsheet exports use `;`, everything else `,`
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_as_text() {
        assert_eq!(Cell::Number(12.0).as_text(), "12");
        assert_eq!(Cell::Number(1.5).as_text(), "1.5");
        assert_eq!(Cell::Text("abc".into()).as_text(), "abc");
        assert_eq!(Cell::Empty.as_text(), "");
        assert!(Cell::Text("   ".into()).is_empty());
    }

    #[test]
    fn test_read_semicolon_csv() {
        let csv = "Nom;Date;Age\nDUPONT Jean;12/05/2010;14\n;;\n";
        let rows = read_sheet(csv.as_bytes(), "roster.CSV").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], Cell::Text("DUPONT Jean".into()));
        assert_eq!(rows[1][2], Cell::Text("14".into()));
        assert_eq!(rows[2][0], Cell::Empty);
    }

    #[test]
    fn test_read_comma_csv_with_quotes() {
        let csv = "\"MARTIN Léa\",\"3 rue des Lilas, 69001 Lyon\"\n";
        let rows = read_sheet(csv.as_bytes(), "roster.csv").unwrap();
        assert_eq!(rows[0][1], Cell::Text("3 rue des Lilas, 69001 Lyon".into()));
    }

    #[test]
    fn test_garbage_workbook_is_an_error() {
        let result = read_sheet(b"definitely not a workbook", "roster.xlsx");
        assert!(matches!(result, Err(ImportError::Workbook(_))));
    }

    #[test]
    fn test_read_windows_1252_csv() {
        let bytes = b"LEF\xc8VRE H\xe9l\xe8ne;01/02/10\n";
        let rows = read_sheet(bytes, "roster.csv").unwrap();
        assert_eq!(rows[0][0], Cell::Text("LEFÈVRE Hélène".to_string()));
        assert_eq!(rows[0][1], Cell::Text("01/02/10".to_string()));
    }

    #[test]
    fn test_read_csv_strips_utf8_bom() {
        let bytes = "\u{feff}MOREAU Zoé;F\n".as_bytes();
        let rows = read_sheet(bytes, "roster.csv").unwrap();
        assert_eq!(rows[0][0], Cell::Text("MOREAU Zoé".to_string()));
    }
}
