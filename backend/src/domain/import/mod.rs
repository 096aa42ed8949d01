//! Roster spreadsheet import.
//!
//! A roster is a positional sheet: a fixed number of header rows, then one
//! participant per row until a summary line marks the end of the data. The
//! column positions are configuration ([`ImportLayout`]); the per-cell rules
//! live in [`cells`].

pub mod cells;
pub mod error;
pub mod layout;
pub mod roster;
pub mod sheet;

pub use error::{ImportError, RowError, RowErrorKind};
pub use layout::{ColumnMap, ImportLayout};
pub use roster::ImportReport;

use chrono::Local;
use tracing::info;

/// Read `bytes` (xlsx, xls, ods or csv, judged by `file_name`) and parse the
/// roster it contains. Row-level problems end up in the report; only an
/// unreadable file is an error.
pub fn parse_roster(bytes: &[u8], file_name: &str, layout: &ImportLayout) -> Result<ImportReport, ImportError> {
    layout.validate()?;
    let rows = sheet::read_sheet(bytes, file_name)?;
    let report = roster::parse_rows(&rows, layout, Local::now().date_naive());
    info!(
        "Parsed roster '{}': {} participants, {} rejected rows",
        file_name,
        report.participants.len(),
        report.rejected.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use shared::Gender;

    fn roster_workbook() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Liste des jeunes").unwrap();
        sheet.write_string(5, 0, "Nom Prénom").unwrap();

        sheet.write_string(6, 0, "LEROY Manon").unwrap();
        sheet.write_number(6, 1, 40179.0).unwrap();
        sheet.write_string(6, 3, "F").unwrap();
        sheet.write_string(6, 5, "Portable: 01.02.03.04.05").unwrap();
        sheet.write_string(6, 6, "8 allée des Pins 33000 Bordeaux").unwrap();

        sheet.write_string(7, 0, "GARCIA Hugo").unwrap();
        sheet.write_string(7, 1, "03/11/09").unwrap();
        sheet.write_number(7, 2, 14.0).unwrap();
        sheet.write_string(7, 3, "M").unwrap();
        sheet.write_string(7, 5, "0611223344").unwrap();

        sheet.write_string(8, 0, "Nombre de filles : 1").unwrap();
        sheet.write_string(9, 0, "FANTOME Non").unwrap();

        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_parse_xlsx_roster() {
        let bytes = roster_workbook();
        let report = parse_roster(&bytes, "jeunes.xlsx", &ImportLayout::default()).unwrap();

        assert!(report.rejected.is_empty());
        assert_eq!(report.participants.len(), 2);

        let manon = &report.participants[0];
        assert_eq!(manon.display_name(), "LEROY Manon");
        assert_eq!(manon.birth_date, chrono::NaiveDate::from_ymd_opt(2010, 1, 1));
        assert_eq!(manon.gender, Gender::Female);
        assert_eq!(manon.phone.as_deref(), Some("0102030405"));
        assert!(manon.remarks.as_deref().unwrap().contains("Portable: 01 02 03 04 05"));
        assert_eq!(manon.city.as_deref(), Some("Bordeaux"));

        let hugo = &report.participants[1];
        assert_eq!(hugo.birth_date, chrono::NaiveDate::from_ymd_opt(2009, 11, 3));
        assert_eq!(hugo.age, Some(14));
        assert_eq!(hugo.gender, Gender::Male);
    }

    #[test]
    fn test_parse_csv_roster() {
        let mut csv = String::new();
        for _ in 0..6 {
            csv.push_str("entête;;;;;;;;;\n");
        }
        csv.push_str("ROUX Inès;12/03/85;;F;M. Roux;06 11 22 33 44;;;;\n");
        let report = parse_roster(csv.as_bytes(), "jeunes.csv", &ImportLayout::default()).unwrap();

        assert_eq!(report.participants.len(), 1);
        let ines = &report.participants[0];
        assert_eq!(ines.birth_date, chrono::NaiveDate::from_ymd_opt(1985, 3, 12));
        assert_eq!(ines.guardian.as_deref(), Some("M. Roux"));
        assert_eq!(ines.phone.as_deref(), Some("0611223344"));
    }

    #[test]
    fn test_unreadable_file_fails_whole_import() {
        let result = parse_roster(b"\x00\x01garbage", "jeunes.xlsx", &ImportLayout::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_layout_rejected_before_reading() {
        let mut layout = ImportLayout::default();
        layout.end_marker = " ".into();
        let result = parse_roster(b"", "jeunes.csv", &layout);
        assert!(matches!(result, Err(ImportError::Layout(_))));
    }
}
