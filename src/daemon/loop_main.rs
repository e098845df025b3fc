//! Monitor loop: sample two telemetry fields every tick and paint them on the panel.
//!
//! Lifecycle, single-threaded:
//! - **Starting**: the device is already open. Switch it to the monitoring
//!   configuration (cursor hidden). Failing here ends the session before any
//!   state needs restoring.
//! - **Running**: at the top of each tick, poll the [`StopToken`]. Then sample
//!   both fields, fit them to the panel width, `clear()`, and write
//!   `"<row0>\n<row1>\n"` in one call. The driver puts the first line
//!   written after a clear on the bottom row and scrolls it up when the
//!   second arrives, so this order leaves row0 on top. Sleep one interval.
//! - **Stopping**: restore the interactive configuration and hand the device
//!   back to the caller, still open.
//!
//! A failed clear or write is handled per [`TickErrorPolicy`].

#![allow(missing_docs)]

use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::core::config::{MonitorConfig, TickErrorPolicy};
use crate::core::errors::{LcdError, Result};
use crate::daemon::signals::StopToken;
use crate::device::protocol::{DisplayDevice, DisplayMode};
use crate::logger::jsonl::{ActivityLog, EventType, LogEntry, Severity};
use crate::render::compose_frame;
use crate::telemetry::{TelemetryCollector, TelemetryField};

/// Tunables for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOptions {
    /// Sleep between ticks.
    pub interval: Duration,
    pub on_device_error: TickErrorPolicy,
    /// End the session after this many ticks instead of waiting for a stop.
    pub max_ticks: Option<u64>,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}

impl MonitorOptions {
    #[must_use]
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            interval: config.interval(),
            on_device_error: config.on_device_error,
            max_ticks: None,
        }
    }
}

/// Why the loop stopped ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The stop token was tripped (signal or caller).
    #[default]
    Requested,
    /// `max_ticks` reached.
    TickLimit,
    /// A device error under [`TickErrorPolicy::Abort`].
    DeviceError,
}

impl StopReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "stop requested",
            Self::TickLimit => "tick limit reached",
            Self::DeviceError => "device error",
        }
    }
}

/// Counters for a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MonitorReport {
    /// Ticks started, successful or not.
    pub ticks: u64,
    /// Ticks whose clear and write both succeeded.
    pub frames_written: u64,
    pub device_errors: u64,
    pub stop_reason: StopReason,
}

/// One monitor session bound to a device and two row fields.
///
/// Pass `&mut dev` to keep ownership of the device; it is returned open.
pub struct MonitorLoop<D: DisplayDevice> {
    device: D,
    collector: TelemetryCollector,
    rows: [TelemetryField; 2],
    options: MonitorOptions,
    stop: StopToken,
    log: ActivityLog,
    device_label: Option<String>,
    config_hash: Option<String>,
}

impl<D: DisplayDevice> MonitorLoop<D> {
    #[must_use]
    pub fn new(
        device: D,
        collector: TelemetryCollector,
        rows: [TelemetryField; 2],
        options: MonitorOptions,
        stop: StopToken,
    ) -> Self {
        Self {
            device,
            collector,
            rows,
            options,
            stop,
            log: ActivityLog::disabled(),
            device_label: None,
            config_hash: None,
        }
    }

    /// Record session events to `log`.
    #[must_use]
    pub fn with_activity_log(mut self, log: ActivityLog) -> Self {
        self.log = log;
        self
    }

    /// Device path and config hash to stamp on the start event.
    #[must_use]
    pub fn with_session_labels(
        mut self,
        device: impl Into<String>,
        config_hash: Option<String>,
    ) -> Self {
        self.device_label = Some(device.into());
        self.config_hash = config_hash;
        self
    }

    /// Both rows as they would be written this instant.
    #[must_use]
    pub fn render_frame(&self) -> String {
        let top = self.collector.sample(&self.rows[0]);
        let bottom = self.collector.sample(&self.rows[1]);
        compose_frame(&top, &bottom)
    }

    /// Run the session to completion.
    ///
    /// The interactive configuration is restored whenever the monitoring one
    /// was applied, including after an aborting device error.
    pub fn run(mut self) -> Result<MonitorReport> {
        let started = Instant::now();
        self.enter_monitoring()?;

        let mut report = MonitorReport::default();
        let outcome = self.run_ticks(&mut report);

        let restored = self.device.configure(DisplayMode::Interactive.config());
        if let Err(e) = &restored {
            eprintln!("[LCD-MONITOR] failed to restore interactive display: {e}");
        }

        self.log_stop(&report, restored.as_ref().err());
        eprintln!(
            "[LCD-MONITOR] stopped: {} (ticks={}, frames={}, errors={}, elapsed={}s)",
            report.stop_reason.as_str(),
            report.ticks,
            report.frames_written,
            report.device_errors,
            started.elapsed().as_secs()
        );

        outcome?;
        restored?;
        Ok(report)
    }

    fn enter_monitoring(&mut self) -> Result<()> {
        if let Err(e) = self.device.configure(DisplayMode::Monitoring.config()) {
            let entry = LogEntry::new(EventType::MonitorStart, Severity::Error).with_error(&e);
            self.log.record(&self.label(entry));
            return Err(e);
        }
        let entry = LogEntry::new(EventType::MonitorStart, Severity::Info);
        self.log.record(&self.label(entry));
        Ok(())
    }

    fn run_ticks(&mut self, report: &mut MonitorReport) -> Result<()> {
        loop {
            if self.stop.is_stop_requested() {
                report.stop_reason = StopReason::Requested;
                return Ok(());
            }
            if self.tick_limit_reached(report) {
                report.stop_reason = StopReason::TickLimit;
                return Ok(());
            }

            report.ticks += 1;
            match self.tick() {
                Ok(()) => report.frames_written += 1,
                Err(e) => {
                    report.device_errors += 1;
                    self.log_tick_error(report.ticks, &e);
                    if self.options.on_device_error == TickErrorPolicy::Abort {
                        report.stop_reason = StopReason::DeviceError;
                        return Err(e);
                    }
                }
            }

            if !self.tick_limit_reached(report) {
                thread::sleep(self.options.interval);
            }
        }
    }

    fn tick(&mut self) -> Result<()> {
        let frame = self.render_frame();
        self.device.clear()?;
        self.device.write_text(&frame)
    }

    fn tick_limit_reached(&self, report: &MonitorReport) -> bool {
        self.options
            .max_ticks
            .is_some_and(|max| report.ticks >= max)
    }

    fn label(&self, mut entry: LogEntry) -> LogEntry {
        entry.device.clone_from(&self.device_label);
        entry.config_hash.clone_from(&self.config_hash);
        entry.fields = Some(self.rows.iter().map(|f| f.name().to_string()).collect());
        entry
    }

    fn log_tick_error(&mut self, tick: u64, err: &LcdError) {
        eprintln!("[LCD-MONITOR] tick {tick} failed: {err}");
        let mut entry = LogEntry::new(EventType::TickError, Severity::Warning).with_error(err);
        entry.ticks = Some(tick);
        self.log.record(&entry);
    }

    fn log_stop(&mut self, report: &MonitorReport, restore_error: Option<&LcdError>) {
        let severity = if restore_error.is_some() {
            Severity::Error
        } else {
            Severity::Info
        };
        let mut entry = LogEntry::new(EventType::MonitorStop, severity);
        if let Some(e) = restore_error {
            entry = entry.with_error(e);
        }
        entry.ticks = Some(report.ticks);
        entry.frames = Some(report.frames_written);
        entry.device_errors = Some(report.device_errors);
        entry.details = Some(report.stop_reason.as_str().to_string());
        self.log.record(&entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::DeviceOp;
    use crate::device::memory::{MemoryDevice, RecordedOp};

    fn fast(max_ticks: Option<u64>) -> MonitorOptions {
        MonitorOptions {
            interval: Duration::from_millis(2),
            on_device_error: TickErrorPolicy::Skip,
            max_ticks,
        }
    }

    fn literal_rows(top: &str, bottom: &str) -> [TelemetryField; 2] {
        [TelemetryField::parse(top), TelemetryField::parse(bottom)]
    }

    #[test]
    fn ticks_paint_rows_in_order() {
        let mut dev = MemoryDevice::new();
        let report = MonitorLoop::new(
            &mut dev,
            TelemetryCollector::default(),
            literal_rows("TOP ROW", "BOTTOM ROW"),
            fast(Some(2)),
            StopToken::new(),
        )
        .run()
        .unwrap();

        assert_eq!(report.ticks, 2);
        assert_eq!(report.frames_written, 2);
        assert_eq!(report.stop_reason, StopReason::TickLimit);

        let frame = b"TOP ROW         \nBOTTOM ROW      \n".to_vec();
        assert_eq!(
            dev.ops(),
            vec![
                RecordedOp::Configure(DisplayMode::Monitoring.config()),
                RecordedOp::Clear,
                RecordedOp::Write(frame.clone()),
                RecordedOp::Clear,
                RecordedOp::Write(frame),
                RecordedOp::Configure(DisplayMode::Interactive.config()),
            ]
        );
        assert_eq!(dev.peek().row_text(0), "TOP ROW         ");
        assert_eq!(dev.peek().row_text(1), "BOTTOM ROW      ");
    }

    #[test]
    fn stop_before_first_tick_still_restores() {
        let dev = MemoryDevice::new();
        let stop = StopToken::new();
        stop.request_stop();
        let report = MonitorLoop::new(
            dev.clone(),
            TelemetryCollector::default(),
            literal_rows("a", "b"),
            fast(None),
            stop,
        )
        .run()
        .unwrap();

        assert_eq!(report.ticks, 0);
        assert_eq!(report.stop_reason, StopReason::Requested);
        assert_eq!(
            dev.config_history(),
            vec![
                DisplayMode::Monitoring.config(),
                DisplayMode::Interactive.config()
            ]
        );
        assert_eq!(dev.count(DeviceOp::Clear), 0);
    }

    #[test]
    fn failed_start_does_not_tick_or_restore() {
        let dev = MemoryDevice::new();
        dev.fail_next(DeviceOp::Configure);
        let err = MonitorLoop::new(
            dev.clone(),
            TelemetryCollector::default(),
            literal_rows("a", "b"),
            fast(Some(3)),
            StopToken::new(),
        )
        .run()
        .unwrap_err();

        assert!(err.is_device_error());
        assert_eq!(dev.count(DeviceOp::Configure), 1);
        assert_eq!(dev.count(DeviceOp::Clear), 0);
        assert_eq!(dev.config(), DisplayMode::Interactive.config());
    }

    #[test]
    fn skip_policy_counts_and_continues() {
        let dev = MemoryDevice::new();
        dev.fail_next(DeviceOp::Clear);
        let report = MonitorLoop::new(
            dev.clone(),
            TelemetryCollector::default(),
            literal_rows("a", "b"),
            fast(Some(3)),
            StopToken::new(),
        )
        .run()
        .unwrap();

        assert_eq!(report.ticks, 3);
        assert_eq!(report.frames_written, 2);
        assert_eq!(report.device_errors, 1);
        // The failed tick issued its clear but never wrote.
        assert_eq!(dev.count(DeviceOp::Clear), 3);
        assert_eq!(dev.count(DeviceOp::Write), 2);
        assert_eq!(dev.config(), DisplayMode::Interactive.config());
    }

    #[test]
    fn abort_policy_stops_and_restores() {
        let dev = MemoryDevice::new();
        dev.fail_next(DeviceOp::Write);
        let mut options = fast(Some(5));
        options.on_device_error = TickErrorPolicy::Abort;

        let err = MonitorLoop::new(
            dev.clone(),
            TelemetryCollector::default(),
            literal_rows("a", "b"),
            options,
            StopToken::new(),
        )
        .run()
        .unwrap_err();

        assert!(matches!(
            err,
            LcdError::Device {
                op: DeviceOp::Write,
                ..
            }
        ));
        assert_eq!(dev.count(DeviceOp::Write), 1);
        assert_eq!(
            dev.config_history().last(),
            Some(&DisplayMode::Interactive.config())
        );
    }

    #[test]
    fn restore_failure_is_reported() {
        let inner = MemoryDevice::new();
        let stop = StopToken::new();
        stop.request_stop();
        let armed = FailSecondConfigure {
            inner: inner.clone(),
            seen: 0,
        };

        let err = MonitorLoop::new(
            armed,
            TelemetryCollector::default(),
            literal_rows("a", "b"),
            fast(None),
            stop,
        )
        .run()
        .unwrap_err();

        assert!(matches!(
            err,
            LcdError::Device {
                op: DeviceOp::Configure,
                ..
            }
        ));
        assert_eq!(inner.config(), DisplayMode::Monitoring.config());
    }

    /// Passes everything through but fails the second configure call.
    struct FailSecondConfigure {
        inner: MemoryDevice,
        seen: usize,
    }

    impl DisplayDevice for FailSecondConfigure {
        fn clear(&mut self) -> Result<()> {
            self.inner.clear()
        }

        fn configure(&mut self, cfg: crate::device::DisplayConfig) -> Result<()> {
            self.seen += 1;
            if self.seen == 2 {
                self.inner.fail_next(DeviceOp::Configure);
            }
            self.inner.configure(cfg)
        }

        fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
            self.inner.write_raw(bytes)
        }

        fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize> {
            self.inner.read_raw(buf)
        }
    }

    #[test]
    fn activity_log_records_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let log = ActivityLog::open(crate::logger::jsonl::ActivityLogConfig::new(&path));

        MonitorLoop::new(
            MemoryDevice::new(),
            TelemetryCollector::default(),
            literal_rows("ip", "HELLO"),
            fast(Some(1)),
            StopToken::new(),
        )
        .with_activity_log(log)
        .with_session_labels("/dev/lcdcontrol", Some("abc123".to_string()))
        .run()
        .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = raw
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "monitor_start");
        assert_eq!(lines[0]["device"], "/dev/lcdcontrol");
        assert_eq!(lines[0]["fields"][0], "ip");
        assert_eq!(lines[0]["fields"][1], "HELLO");
        assert_eq!(lines[1]["event"], "monitor_stop");
        assert_eq!(lines[1]["ticks"], 1);
        assert_eq!(lines[1]["details"], "tick limit reached");
    }
}
