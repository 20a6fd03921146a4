use crate::error::AttendanceError;
use crate::model::sheet::{Sheet, SheetTarget};

pub mod memory;
pub mod mysql;

pub use memory::MemorySheetStore;
pub use mysql::MySqlSheetStore;

/// Storage for worksheets. Reads return a full snapshot in sheet order and
/// appends add rows to the bottom; neither retries and neither deduplicates.
#[allow(async_fn_in_trait)]
pub trait SheetStore {
    fn backend_tag(&self) -> &'static str;

    async fn read(&self, target: &SheetTarget) -> Result<Sheet, AttendanceError>;

    async fn append(&self, target: &SheetTarget, rows: &[Vec<String>]) -> Result<(), AttendanceError>;

    /// Writes `header` if the worksheet has none yet. An existing header is
    /// left alone even when it differs.
    async fn ensure_header(&self, target: &SheetTarget, header: &[&str]) -> Result<(), AttendanceError>;
}

/// The configured store. MySQL in production, memory when no database is
/// configured and in tests.
pub enum SheetBackend {
    MySql(MySqlSheetStore),
    Memory(MemorySheetStore),
}

impl SheetStore for SheetBackend {
    fn backend_tag(&self) -> &'static str {
        match self {
            SheetBackend::MySql(s) => s.backend_tag(),
            SheetBackend::Memory(s) => s.backend_tag(),
        }
    }

    async fn read(&self, target: &SheetTarget) -> Result<Sheet, AttendanceError> {
        match self {
            SheetBackend::MySql(s) => s.read(target).await,
            SheetBackend::Memory(s) => s.read(target).await,
        }
    }

    async fn append(&self, target: &SheetTarget, rows: &[Vec<String>]) -> Result<(), AttendanceError> {
        match self {
            SheetBackend::MySql(s) => s.append(target, rows).await,
            SheetBackend::Memory(s) => s.append(target, rows).await,
        }
    }

    async fn ensure_header(&self, target: &SheetTarget, header: &[&str]) -> Result<(), AttendanceError> {
        match self {
            SheetBackend::MySql(s) => s.ensure_header(target, header).await,
            SheetBackend::Memory(s) => s.ensure_header(target, header).await,
        }
    }
}
