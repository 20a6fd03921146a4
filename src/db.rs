use sqlx::MySqlPool;

const CREATE_SHEET_HEADERS: &str = r#"
CREATE TABLE IF NOT EXISTS sheet_headers (
    spreadsheet VARCHAR(191) NOT NULL,
    worksheet   VARCHAR(191) NOT NULL,
    header      TEXT NOT NULL,
    PRIMARY KEY (spreadsheet, worksheet)
)
"#;

const CREATE_SHEET_ROWS: &str = r#"
CREATE TABLE IF NOT EXISTS sheet_rows (
    id          BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
    spreadsheet VARCHAR(191) NOT NULL,
    worksheet   VARCHAR(191) NOT NULL,
    cells       MEDIUMTEXT NOT NULL,
    appended_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    KEY idx_sheet_rows_target (spreadsheet, worksheet, id)
)
"#;

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPool::connect(database_url).await?;

    sqlx::query(CREATE_SHEET_HEADERS).execute(&pool).await?;
    sqlx::query(CREATE_SHEET_ROWS).execute(&pool).await?;

    Ok(pool)
}
