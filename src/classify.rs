use crate::ontime::StatePoint;
use crate::telemetry::{extract_channel_value, ChannelSelector, ReadingRow};

/// Symmetric vibration band around zero. Amplitudes inside the band read as
/// idle; excursions past either bound read as the machine running.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdBand {
    pub positive: f64,
    pub negative: f64,
}

impl ThresholdBand {
    pub fn symmetric(threshold: f64) -> Self {
        Self {
            positive: threshold,
            negative: -threshold,
        }
    }

    /// Missing values never read as running; NaN fails both comparisons.
    pub fn is_running(&self, value: Option<f64>) -> bool {
        match value {
            Some(v) => v > self.positive || v < self.negative,
            None => false,
        }
    }
}

pub fn classify_rows(
    rows: &[ReadingRow],
    channel: &ChannelSelector,
    band: ThresholdBand,
) -> Vec<StatePoint> {
    rows.iter()
        .map(|row| StatePoint {
            timestamp: row.time,
            running: band.is_running(extract_channel_value(&row.sensor_readings.0, channel)),
        })
        .collect()
}
