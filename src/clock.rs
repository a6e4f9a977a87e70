// Sensor-clock to wall-clock conversion

use chrono::Utc;

/// Fixed linear offset between the monotonic sensor clock and wall-clock
/// time, captured once when recording starts.
///
/// `wall_ms = base_wall_ms + round(sensor_ns / 1e6 - base_sensor_ms)`
///
/// The offset is never re-synced automatically, so the converted timestamps
/// accumulate skew against the real wall clock over long sessions as the two
/// clocks drift apart. Callers that care can invoke [`ClockOffset::resync`]
/// at a quiet moment; nothing in the pipeline does so on its own.
#[derive(Debug, Clone, Copy)]
pub struct ClockOffset {
    base_wall_ms: i64,
    base_sensor_ms: f64,
}

impl ClockOffset {
    pub fn new(base_wall_ms: i64, base_sensor_ns: i64) -> Self {
        Self {
            base_wall_ms,
            base_sensor_ms: base_sensor_ns as f64 / 1e6,
        }
    }

    /// Pair the current wall clock with the given sensor reading.
    pub fn capture(base_sensor_ns: i64) -> Self {
        Self::new(Utc::now().timestamp_millis(), base_sensor_ns)
    }

    /// Convert a sensor timestamp (ns) to wall-clock milliseconds.
    pub fn wall_clock_ms(&self, sensor_ns: i64) -> i64 {
        self.base_wall_ms + ((sensor_ns as f64 / 1e6) - self.base_sensor_ms).round() as i64
    }

    /// Convert a sensor timestamp expressed in seconds.
    pub fn wall_clock_ms_from_secs(&self, sensor_secs: f64) -> i64 {
        self.base_wall_ms + (sensor_secs * 1e3 - self.base_sensor_ms).round() as i64
    }

    /// Re-anchor the offset against a fresh sensor reading. Documented
    /// extension point for long sessions; not called automatically.
    pub fn resync(&mut self, sensor_now_ns: i64) {
        *self = Self::capture(sensor_now_ns);
    }
}
