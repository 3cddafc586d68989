//! Tick timing statistics for tracking sessions.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Tick timing statistics
#[derive(Debug, Clone, Default)]
pub struct TickStats {
    /// Average tick time in milliseconds
    pub avg_ms: f64,
    /// Minimum tick time in milliseconds
    pub min_ms: f64,
    /// Maximum tick time in milliseconds
    pub max_ms: f64,
    /// 95th percentile tick time
    pub p95_ms: f64,
    /// 99th percentile tick time
    pub p99_ms: f64,
    /// Number of samples in the statistics
    pub sample_count: usize,
}

/// Per-session tick profiler.
///
/// Collects tick-to-tick durations in a bounded ring and computes
/// statistics over the recent window.
pub struct TickProfiler {
    /// Tick durations
    tick_times: VecDeque<Duration>,
    /// Maximum samples to keep (~5 seconds at 60 ticks/s)
    max_samples: usize,
    /// Last tick start time
    last_tick_start: Option<Instant>,
    /// Tick start times for rate calculation
    tick_starts: VecDeque<Instant>,
}

impl Default for TickProfiler {
    fn default() -> Self {
        Self::new()
    }
}

impl TickProfiler {
    pub fn new() -> Self {
        Self {
            tick_times: VecDeque::with_capacity(300),
            max_samples: 300,
            last_tick_start: None,
            tick_starts: VecDeque::with_capacity(300),
        }
    }

    /// Mark the beginning of a processed tick.
    pub fn begin_tick(&mut self) {
        let now = Instant::now();

        if let Some(start) = self.last_tick_start {
            let duration = now.duration_since(start);
            self.tick_times.push_back(duration);
            if self.tick_times.len() > self.max_samples {
                self.tick_times.pop_front();
            }
        }

        self.last_tick_start = Some(now);

        self.tick_starts.push_back(now);
        if self.tick_starts.len() > self.max_samples {
            self.tick_starts.pop_front();
        }
    }

    /// Get tick timing statistics over the recent window.
    pub fn stats(&self) -> TickStats {
        if self.tick_times.is_empty() {
            return TickStats::default();
        }

        let mut times: Vec<f64> = self
            .tick_times
            .iter()
            .map(|d| d.as_secs_f64() * 1000.0)
            .collect();
        times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let sum: f64 = times.iter().sum();
        let count = times.len() as f64;

        TickStats {
            avg_ms: sum / count,
            min_ms: times.first().copied().unwrap_or(0.0),
            max_ms: times.last().copied().unwrap_or(0.0),
            p95_ms: percentile(&times, 0.95),
            p99_ms: percentile(&times, 0.99),
            sample_count: times.len(),
        }
    }

    /// Current processed-tick rate from recent tick start times.
    pub fn ticks_per_second(&self) -> f64 {
        if self.tick_starts.len() < 2 {
            return 0.0;
        }

        let first = self.tick_starts.front().unwrap();
        let last = self.tick_starts.back().unwrap();
        let duration = last.duration_since(*first).as_secs_f64();

        if duration > 0.0 {
            (self.tick_starts.len() - 1) as f64 / duration
        } else {
            0.0
        }
    }
}

/// Calculate percentile from sorted array
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * p) as usize;
    sorted[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_profiler() {
        let mut profiler = TickProfiler::new();

        for _ in 0..10 {
            profiler.begin_tick();
            std::thread::sleep(Duration::from_millis(5));
        }

        let stats = profiler.stats();
        assert!(stats.avg_ms > 0.0);
        assert!(stats.sample_count > 0);
        assert!(profiler.ticks_per_second() > 0.0);
    }

    #[test]
    fn test_empty_profiler_stats() {
        let profiler = TickProfiler::new();
        let stats = profiler.stats();
        assert_eq!(stats.sample_count, 0);
        assert_eq!(profiler.ticks_per_second(), 0.0);
    }

    #[test]
    fn test_percentile() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert_eq!(percentile(&values, 0.5), 5.0); // Median
        assert_eq!(percentile(&values, 0.0), 1.0); // Min
        assert_eq!(percentile(&values, 1.0), 10.0); // Max
    }
}
