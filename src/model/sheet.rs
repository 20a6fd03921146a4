use serde::{Deserialize, Serialize};

use crate::error::AttendanceError;

/// A worksheet inside a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetTarget {
    pub spreadsheet: String,
    pub worksheet: String,
}

impl SheetTarget {
    pub fn new(spreadsheet: impl Into<String>, worksheet: impl Into<String>) -> Self {
        Self {
            spreadsheet: spreadsheet.into(),
            worksheet: worksheet.into(),
        }
    }
}

/// Snapshot of a worksheet: the header row and the data rows below it, in
/// sheet order. Cells are plain text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Rows as header-addressable records. Rows where every cell is blank are
    /// skipped; spreadsheets keep those around after manual edits.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows
            .iter()
            .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
            .map(move |cells| Record { sheet: self, cells })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    sheet: &'a Sheet,
    cells: &'a [String],
}

impl<'a> Record<'a> {
    /// Cell under `column`. `None` when the column does not exist; a row that
    /// is shorter than the header reads as empty.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.sheet.column_index(column)?;
        Some(self.cells.get(idx).map(|c| c.trim()).unwrap_or(""))
    }

    pub fn require(&self, column: &str) -> Result<&'a str, AttendanceError> {
        self.get(column)
            .ok_or_else(|| AttendanceError::Parse(format!("missing column '{}'", column)))
    }

    pub fn cell(&self, idx: usize) -> &'a str {
        self.cells.get(idx).map(|c| c.trim()).unwrap_or("")
    }
}
