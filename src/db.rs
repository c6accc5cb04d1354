use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::error::{AnalyzerError, Result};
use crate::models::VisitRecord;
use crate::source;

fn unavailable(err: sqlx::Error) -> AnalyzerError {
    AnalyzerError::SourceUnavailable {
        source_name: "postgres".to_string(),
        reason: err.to_string(),
    }
}

pub async fn connect(database_url: &str) -> Result<PgPool> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(unavailable)
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Every stored visit, oldest import first. Dates stay as the text that was imported.
pub async fn fetch_visits(pool: &PgPool) -> Result<Vec<VisitRecord>> {
    let rows = sqlx::query(
        "SELECT site, visit_date FROM site_visit_recency.site_visits \
         ORDER BY imported_at, id",
    )
    .fetch_all(pool)
    .await
    .map_err(unavailable)?;

    let visits: Vec<VisitRecord> = rows
        .into_iter()
        .map(|row| VisitRecord::new(row.get::<String, _>("site"), row.get::<String, _>("visit_date")))
        .collect();

    info!(rows = visits.len(), "loaded visit records from postgres");
    Ok(visits)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let rows = source::read_keyed_csv_path(csv_path)?;
    let mut inserted = 0usize;

    for row in rows {
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO site_visit_recency.site_visits
            (id, site, visit_date, source_key)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(row.record.site.trim())
        .bind(&row.record.date)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    info!(inserted, path = %csv_path.display(), "imported visit records");
    Ok(inserted)
}
