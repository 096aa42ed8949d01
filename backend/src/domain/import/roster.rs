//! Turns sheet rows into participants according to an [`ImportLayout`].

use chrono::NaiveDate;
use shared::{Gender, Participant};
use tracing::{debug, warn};

use super::cells::{
    extract_phones, join_remarks, parse_age, parse_birth_date, split_address, split_name,
};
use super::error::{RowError, RowErrorKind};
use super::layout::ImportLayout;
use super::sheet::{Cell, SheetRows};

/// Outcome of parsing a roster: the participants read and the rows refused
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub participants: Vec<Participant>,
    pub rejected: Vec<RowError>,
}

static EMPTY: Cell = Cell::Empty;

fn cell<'a>(row: &'a [Cell], index: usize) -> &'a Cell {
    row.get(index).unwrap_or(&EMPTY)
}

fn text(row: &[Cell], index: usize) -> Option<String> {
    let value = cell(row, index).as_text();
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Parse every data row. `today` is used to derive ages from birth dates.
pub fn parse_rows(rows: &SheetRows, layout: &ImportLayout, today: NaiveDate) -> ImportReport {
    let mut report = ImportReport::default();

    for (index, row) in rows.iter().enumerate().skip(layout.first_data_row) {
        let first = cell(row, 0).as_text();
        if first.contains(&layout.end_marker) {
            debug!("End marker found on row {}, stopping", index + 1);
            break;
        }

        if cell(row, layout.columns.name).is_empty() {
            continue;
        }

        match parse_row(row, layout, today) {
            Ok(participant) => report.participants.push(participant),
            Err(kind) => {
                let error = RowError { row: index + 1, kind };
                warn!("Rejected roster {}", error);
                report.rejected.push(error);
            }
        }
    }

    report
}

fn parse_row(row: &[Cell], layout: &ImportLayout, today: NaiveDate) -> Result<Participant, RowErrorKind> {
    let columns = &layout.columns;

    let (last_name, first_name) = split_name(&cell(row, columns.name).as_text());
    let birth_date = parse_birth_date(cell(row, columns.birth_date))?;
    let age = match parse_age(cell(row, columns.age))? {
        Some(age) => Some(age),
        None => birth_date.map(|birth| Participant::age_on(birth, today)),
    };

    let phones = text(row, columns.phones)
        .map(|raw| extract_phones(&raw))
        .unwrap_or_default();
    let address = text(row, columns.address)
        .map(|raw| split_address(&raw))
        .unwrap_or_default();
    let gender = text(row, columns.gender)
        .map(|raw| Gender::from_code(&raw))
        .unwrap_or_default();

    Ok(Participant {
        id: Participant::generate_id(),
        last_name,
        first_name,
        birth_date,
        age,
        gender,
        guardian: text(row, columns.guardian),
        phone: phones.primary,
        address: address.full,
        postal_code: address.postal_code,
        city: address.city,
        transport: text(row, columns.transport),
        email: text(row, columns.email),
        remarks: join_remarks(&[phones.remarks, text(row, columns.observations)]),
        ..Default::default()
    })
}
