use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::error::AttendanceError;
use crate::model::sheet::{Sheet, SheetTarget};
use crate::store::SheetStore;

#[derive(Default)]
pub struct MemorySheetStore {
    sheets: RwLock<HashMap<SheetTarget, Sheet>>,
    pub read_calls: AtomicU64,
    pub append_calls: AtomicU64,
    /// When set, every read and append fails with a transport error.
    pub offline: AtomicBool,
}

impl MemorySheetStore {
    #[cfg(test)]
    pub fn with_sheet(self, target: SheetTarget, sheet: Sheet) -> Self {
        if let Ok(mut sheets) = self.sheets.write() {
            sheets.insert(target, sheet);
        }
        self
    }

    fn check_online(&self) -> Result<(), AttendanceError> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(AttendanceError::Transport("store offline".to_string()));
        }
        Ok(())
    }
}

fn poisoned<T>(_: T) -> AttendanceError {
    AttendanceError::Transport("sheet store lock poisoned".to_string())
}

impl SheetStore for MemorySheetStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn read(&self, target: &SheetTarget) -> Result<Sheet, AttendanceError> {
        self.read_calls.fetch_add(1, Ordering::Relaxed);
        self.check_online()?;
        let sheets = self.sheets.read().map_err(poisoned)?;
        Ok(sheets.get(target).cloned().unwrap_or_default())
    }

    async fn append(&self, target: &SheetTarget, rows: &[Vec<String>]) -> Result<(), AttendanceError> {
        self.append_calls.fetch_add(1, Ordering::Relaxed);
        self.check_online()?;
        let mut sheets = self.sheets.write().map_err(poisoned)?;
        sheets
            .entry(target.clone())
            .or_default()
            .rows
            .extend(rows.iter().cloned());
        Ok(())
    }

    async fn ensure_header(&self, target: &SheetTarget, header: &[&str]) -> Result<(), AttendanceError> {
        self.check_online()?;
        let mut sheets = self.sheets.write().map_err(poisoned)?;
        let sheet = sheets.entry(target.clone()).or_default();
        if sheet.header.is_empty() {
            sheet.header = header.iter().map(|h| h.to_string()).collect();
        }
        Ok(())
    }
}
