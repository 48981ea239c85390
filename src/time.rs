//! Frame timing and the periodic frame report.
//!
//! # Example
//!
//! ```
//! use strange_attractor::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//! for valid_count in 0..250u32 {
//!     clock.tick(valid_count);
//! }
//! assert_eq!(clock.frame(), 250);
//! ```

use std::time::{Duration, Instant};

/// Frames between two reports.
pub const REPORT_INTERVAL: u64 = 100;

/// One periodic frame report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Frame the report was taken on.
    pub frame: u64,
    /// Average frames per second since the previous report.
    pub fps: f32,
    /// Valid points in the store at report time.
    pub valid_count: u32,
}

/// Counts frames and reports throughput every [`REPORT_INTERVAL`] frames.
#[derive(Debug)]
pub struct FrameClock {
    /// When the clock was created.
    start: Instant,
    /// When the last frame ended.
    last_frame: Instant,
    /// Time between the last two frames.
    delta: Duration,
    /// Total frames since start.
    frame_count: u64,
    /// Time of the last report.
    report_time: Instant,
    /// Most recent report.
    last_report: Option<FrameStats>,
}

impl FrameClock {
    /// Create a clock starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta: Duration::ZERO,
            frame_count: 0,
            report_time: now,
            last_report: None,
        }
    }

    /// Record the end of a frame. Call once per frame.
    ///
    /// Returns the report when this frame completes a reporting interval.
    pub fn tick(&mut self, valid_count: u32) -> Option<FrameStats> {
        let now = Instant::now();
        self.delta = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.frame_count += 1;

        if self.frame_count % REPORT_INTERVAL != 0 {
            return None;
        }

        let window = now.duration_since(self.report_time).as_secs_f32();
        let fps = if window > 0.0 {
            REPORT_INTERVAL as f32 / window
        } else {
            0.0
        };
        self.report_time = now;

        let stats = FrameStats {
            frame: self.frame_count,
            fps,
            valid_count,
        };
        log::info!("frame {}: {:.1} fps, {} points", stats.frame, stats.fps, valid_count);
        self.last_report = Some(stats);
        Some(stats)
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Time between the two most recent frames.
    #[inline]
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Time since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Frames per second at the last report, zero before the first one.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.last_report.map_or(0.0, |s| s.fps)
    }

    pub fn last_report(&self) -> Option<FrameStats> {
        self.last_report
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
