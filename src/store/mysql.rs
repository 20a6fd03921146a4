use futures_util::StreamExt;
use serde_json::Value;
use sqlx::{MySql, MySqlPool, QueryBuilder};

use crate::error::AttendanceError;
use crate::model::sheet::{Sheet, SheetTarget};
use crate::store::SheetStore;
use crate::utils::cells::cell_to_string;

/// Worksheets kept in two MySQL tables: one header per worksheet and an
/// append-only row table whose auto-increment id is the sheet order.
#[derive(Clone)]
pub struct MySqlSheetStore {
    pool: MySqlPool,
}

impl MySqlSheetStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn decode_cells(raw: &str) -> Result<Vec<String>, AttendanceError> {
    let cells: Vec<Value> = serde_json::from_str(raw)
        .map_err(|e| AttendanceError::Parse(format!("stored row is not a JSON array: {}", e)))?;
    Ok(cells.iter().map(cell_to_string).collect())
}

fn encode_cells<S: AsRef<str>>(cells: &[S]) -> String {
    Value::Array(
        cells
            .iter()
            .map(|c| Value::String(c.as_ref().to_string()))
            .collect(),
    )
    .to_string()
}

impl SheetStore for MySqlSheetStore {
    fn backend_tag(&self) -> &'static str {
        "mysql"
    }

    async fn read(&self, target: &SheetTarget) -> Result<Sheet, AttendanceError> {
        let header = sqlx::query_scalar::<_, String>(
            r#"
            SELECT header
            FROM sheet_headers
            WHERE spreadsheet = ? AND worksheet = ?
            "#,
        )
        .bind(&target.spreadsheet)
        .bind(&target.worksheet)
        .fetch_optional(&self.pool)
        .await?;

        let mut sheet = match header {
            Some(raw) => Sheet::new(decode_cells(&raw)?),
            None => Sheet::default(),
        };

        let mut stream = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT cells
            FROM sheet_rows
            WHERE spreadsheet = ? AND worksheet = ?
            ORDER BY id
            "#,
        )
        .bind(&target.spreadsheet)
        .bind(&target.worksheet)
        .fetch(&self.pool);

        while let Some(row) = stream.next().await {
            let (cells,) = row?;
            sheet.rows.push(decode_cells(&cells)?);
        }

        tracing::debug!(
            spreadsheet = %target.spreadsheet,
            worksheet = %target.worksheet,
            rows = sheet.rows.len(),
            "Worksheet read"
        );

        Ok(sheet)
    }

    async fn append(&self, target: &SheetTarget, rows: &[Vec<String>]) -> Result<(), AttendanceError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<MySql> =
            QueryBuilder::new("INSERT INTO sheet_rows (spreadsheet, worksheet, cells) ");
        builder.push_values(rows, |mut b, row| {
            b.push_bind(target.spreadsheet.clone())
                .push_bind(target.worksheet.clone())
                .push_bind(encode_cells(row));
        });

        let result = builder.build().execute(&self.pool).await?;

        tracing::info!(
            spreadsheet = %target.spreadsheet,
            worksheet = %target.worksheet,
            rows = result.rows_affected(),
            "Rows appended"
        );

        Ok(())
    }

    async fn ensure_header(&self, target: &SheetTarget, header: &[&str]) -> Result<(), AttendanceError> {
        sqlx::query(
            r#"
            INSERT IGNORE INTO sheet_headers (spreadsheet, worksheet, header)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&target.spreadsheet)
        .bind(&target.worksheet)
        .bind(encode_cells(header))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
