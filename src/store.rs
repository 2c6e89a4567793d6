use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::telemetry::ReadingRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    OpMinutes,
    OpHours,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::OpMinutes => "op_minutes",
            MetricKind::OpHours => "op_hours",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertMode {
    /// Periodic passes merge into the day's existing figure.
    AddToExisting,
    /// Backfills keep whatever is already booked for the day.
    InsertOrSkip,
}

/// Fetches one device's readings for a time range, oldest first. A fetch
/// failure is logged and comes back as no data; callers skip the device for
/// the run instead of aborting the batch.
pub async fn fetch_device_readings(
    db: &PgPool,
    device_id: &str,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Vec<ReadingRow> {
    match query_readings(db, device_id, start, end).await {
        Ok(rows) => {
            tracing::debug!(device = %device_id, rows = rows.len(), "fetched readings");
            rows
        }
        Err(err) => {
            tracing::warn!(device = %device_id, "reading fetch failed, treating as no data: {err:#}");
            Vec::new()
        }
    }
}

async fn query_readings(
    db: &PgPool,
    device_id: &str,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Result<Vec<ReadingRow>> {
    let rows: Vec<ReadingRow> = match end {
        Some(end) => {
            sqlx::query_as(
                r#"
                SELECT sensor_readings, time
                FROM device_readings
                WHERE device_id = $1 AND time >= $2 AND time <= $3
                ORDER BY time ASC
                "#,
            )
            .bind(device_id)
            .bind(start)
            .bind(end)
            .fetch_all(db)
            .await
        }
        None => {
            sqlx::query_as(
                r#"
                SELECT sensor_readings, time
                FROM device_readings
                WHERE device_id = $1 AND time >= $2
                ORDER BY time ASC
                "#,
            )
            .bind(device_id)
            .bind(start)
            .fetch_all(db)
            .await
        }
    }
    .with_context(|| format!("failed to query readings for {device_id}"))?;
    Ok(rows)
}

/// Books one daily duration figure. The metrics table carries no unique key
/// over (device, kind, date), so this checks inside a transaction and either
/// updates, inserts, or leaves the existing row alone depending on `mode`.
/// Returns whether a row was written.
pub async fn upsert_daily_metric(
    db: &PgPool,
    device_id: &str,
    kind: MetricKind,
    date: NaiveDate,
    value: f64,
    mode: UpsertMode,
) -> Result<bool> {
    let mut tx = db
        .begin()
        .await
        .with_context(|| format!("failed to open metric transaction for {device_id}"))?;

    let existing: Option<(f64,)> = sqlx::query_as(
        r#"
        SELECT metric_data
        FROM machine_metrics
        WHERE device_id = $1 AND metric_type = $2 AND metric_date = $3
        LIMIT 1
        "#,
    )
    .bind(device_id)
    .bind(kind.as_str())
    .bind(date)
    .fetch_optional(&mut *tx)
    .await?;

    let written = match (existing, mode) {
        (Some((current,)), UpsertMode::AddToExisting) => {
            sqlx::query(
                r#"
                UPDATE machine_metrics
                SET metric_data = $1
                WHERE device_id = $2 AND metric_type = $3 AND metric_date = $4
                "#,
            )
            .bind(current + value)
            .bind(device_id)
            .bind(kind.as_str())
            .bind(date)
            .execute(&mut *tx)
            .await?;
            true
        }
        (Some(_), UpsertMode::InsertOrSkip) => {
            tracing::debug!(
                device = %device_id,
                kind = kind.as_str(),
                %date,
                "metric already booked, skipping"
            );
            false
        }
        (None, _) => {
            sqlx::query(
                r#"
                INSERT INTO machine_metrics (device_id, metric_type, metric_data, metric_date)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(device_id)
            .bind(kind.as_str())
            .bind(value)
            .bind(date)
            .execute(&mut *tx)
            .await?;
            true
        }
    };

    tx.commit()
        .await
        .with_context(|| format!("failed to commit metric for {device_id}"))?;
    Ok(written)
}
