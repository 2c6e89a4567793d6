use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::processor;
use crate::registry::DeviceRegistry;

/// Periodic metering loop. Ticks are handled serially on one task, so a slow
/// pass delays the next instead of overlapping it.
pub struct MeterService {
    db: PgPool,
    registry: DeviceRegistry,
    interval: Duration,
    lookback: ChronoDuration,
}

impl MeterService {
    pub fn new(
        db: PgPool,
        registry: DeviceRegistry,
        interval: Duration,
        lookback: ChronoDuration,
    ) -> Self {
        Self {
            db,
            registry,
            interval,
            lookback,
        }
    }

    pub fn start(self, cancel: CancellationToken) {
        let MeterService {
            db,
            registry,
            interval,
            lookback,
        } = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let batch = processor::meter_all_recent(&db, &registry, Utc::now(), lookback).await;
                        tracing::info!(
                            devices = batch.devices,
                            metered = batch.metered,
                            skipped = batch.skipped,
                            failed = batch.failed,
                            rows = batch.rows_written,
                            "metering pass complete"
                        );
                    }
                }
            }
        });
    }
}
