use crate::error::{ReclassificationError, Result};
use crate::table::{Cell, Table, Workbook};
use csv::ReaderBuilder;
use log::{debug, info};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Reads one sheet from CSV. The first record is the header; every value is
/// kept as text via [`Cell::from_raw`].
pub fn read_table_csv<R: Read>(name: &str, reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut table = Table::new(name, headers);

    for record in rdr.records() {
        let record = record?;
        let mut row: Vec<Cell> = record.iter().map(Cell::from_raw).collect();
        // trailing separators produce extra empty cells
        while row.len() > table.columns().len() && row.last().is_some_and(Cell::is_empty) {
            row.pop();
        }
        table.push_row(row)?;
    }

    debug!("Read {} rows from sheet '{}'", table.row_count(), name);
    Ok(table)
}

/// Loads a workbook exported as one CSV file per sheet: every `*.csv` file in
/// `dir` becomes a sheet named after the file stem.
pub fn load_workbook_dir(dir: &Path) -> Result<Workbook> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    paths.sort();

    let mut workbook = Workbook::new();
    for path in paths {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let table = read_table_csv(name, File::open(&path)?)?;
        workbook.insert(table);
    }

    info!(
        "Loaded workbook from {} with sheets [{}]",
        dir.display(),
        workbook.sheet_names().join(", ")
    );
    Ok(workbook)
}

/// Loads every worksheet of an `.xlsx`/`.xls`/`.ods` file.
#[cfg(feature = "xlsx")]
pub fn load_workbook_xlsx(path: &Path) -> Result<Workbook> {
    use calamine::{open_workbook_auto, Reader};

    let mut source = open_workbook_auto(path)
        .map_err(|e| ReclassificationError::Workbook(format!("{}: {}", path.display(), e)))?;

    let mut workbook = Workbook::new();
    for name in source.sheet_names().to_vec() {
        let range = source
            .worksheet_range(&name)
            .map_err(|e| ReclassificationError::Workbook(format!("sheet '{}': {}", name, e)))?;

        let table = table_from_rows(&name, range.rows())?;
        workbook.insert(table);
    }

    info!(
        "Loaded workbook {} with sheets [{}]",
        path.display(),
        workbook.sheet_names().join(", ")
    );
    Ok(workbook)
}

/// Builds a sheet from spreadsheet rows, the first one being the header.
#[cfg(feature = "xlsx")]
pub fn table_from_rows<'a, I>(name: &str, rows: I) -> Result<Table>
where
    I: IntoIterator<Item = &'a [calamine::Data]>,
{
    let mut rows = rows.into_iter();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| c.to_string()).collect(),
        None => Vec::new(),
    };
    let mut table = Table::new(name, headers);

    for row in rows {
        table.push_row(row.iter().map(cell_from_data).collect())?;
    }
    Ok(table)
}

/// Numeric cells become numbers; string cells stay text so zero-padded codes
/// survive.
#[cfg(feature = "xlsx")]
fn cell_from_data(value: &calamine::Data) -> Cell {
    use calamine::Data;
    use rust_decimal::prelude::FromPrimitive;
    use rust_decimal::Decimal;

    match value {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(Decimal::from(*i)),
        Data::Float(f) => Decimal::from_f64(*f).map_or(Cell::Empty, Cell::Number),
        Data::String(s) => Cell::from_raw(s),
        other => Cell::from_raw(&other.to_string()),
    }
}

#[cfg(not(feature = "xlsx"))]
pub fn load_workbook_xlsx(path: &Path) -> Result<Workbook> {
    Err(ReclassificationError::Workbook(format!(
        "{}: spreadsheet support requires the `xlsx` feature",
        path.display()
    )))
}
