// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use serde::Serialize;
use std::time::{Duration, Instant};

/// Capture performance collected during a benchmark
#[derive(Debug, Clone, Serialize)]
pub struct CaptureMetrics {
    /// Frames captured
    pub frames_captured: u64,
    /// Captures that returned no frame within the timeout
    pub timeouts: u64,
    /// Total bytes delivered
    pub bytes_captured: u64,
    /// Total duration in milliseconds
    pub duration_ms: u64,
    /// Average throughput in frames per second
    pub throughput_fps: f64,
    /// Average bandwidth in megabits per second
    pub bandwidth_mbps: f64,
    /// Smallest frame in bytes
    pub frame_min_bytes: u64,
    /// Largest frame in bytes
    pub frame_max_bytes: u64,
    /// Minimum capture latency in microseconds
    pub latency_min_us: u64,
    /// Maximum capture latency in microseconds
    pub latency_max_us: u64,
    /// Average capture latency in microseconds
    pub latency_avg_us: u64,
    /// 50th percentile (median) capture latency in microseconds
    pub latency_p50_us: u64,
    /// 95th percentile capture latency in microseconds
    pub latency_p95_us: u64,
    /// 99th percentile capture latency in microseconds
    pub latency_p99_us: u64,
}

/// Collector for capture latency and frame sizes
pub struct MetricsCollector {
    start_time: Instant,
    latencies_us: Vec<u64>,
    bytes: u64,
    frame_min: Option<u64>,
    frame_max: u64,
    timeouts: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            latencies_us: Vec::new(),
            bytes: 0,
            frame_min: None,
            frame_max: 0,
            timeouts: 0,
        }
    }

    /// Record one captured frame
    pub fn record_frame(&mut self, latency: Duration, bytes: usize) {
        let bytes = bytes as u64;
        self.latencies_us.push(latency.as_micros() as u64);
        self.bytes += bytes;
        self.frame_min = Some(self.frame_min.map_or(bytes, |min| min.min(bytes)));
        self.frame_max = self.frame_max.max(bytes);
    }

    /// Record a capture that produced no frame
    pub fn record_timeout(&mut self) {
        self.timeouts += 1;
    }

    /// Finalize and calculate all metrics
    pub fn finalize(&mut self) -> CaptureMetrics {
        let duration = self.start_time.elapsed();
        let duration_ms = duration.as_millis() as u64;
        let duration_secs = duration.as_secs_f64();

        let frames_captured = self.latencies_us.len() as u64;

        let throughput_fps = if duration_secs > 0.0 {
            frames_captured as f64 / duration_secs
        } else {
            0.0
        };

        let bandwidth_mbps = if duration_secs > 0.0 {
            (self.bytes as f64 * 8.0) / (duration_secs * 1_000_000.0)
        } else {
            0.0
        };

        self.latencies_us.sort_unstable();
        let (min_us, max_us, avg_us) = match (self.latencies_us.first(), self.latencies_us.last()) {
            (Some(&min), Some(&max)) => {
                let sum: u64 = self.latencies_us.iter().sum();
                (min, max, sum / frames_captured)
            }
            _ => (0, 0, 0),
        };

        CaptureMetrics {
            frames_captured,
            timeouts: self.timeouts,
            bytes_captured: self.bytes,
            duration_ms,
            throughput_fps,
            bandwidth_mbps,
            frame_min_bytes: self.frame_min.unwrap_or(0),
            frame_max_bytes: self.frame_max,
            latency_min_us: min_us,
            latency_max_us: max_us,
            latency_avg_us: avg_us,
            latency_p50_us: self.percentile(50.0),
            latency_p95_us: self.percentile(95.0),
            latency_p99_us: self.percentile(99.0),
        }
    }

    /// Percentile of the latency samples; assumes they are sorted
    fn percentile(&self, p: f64) -> u64 {
        if self.latencies_us.is_empty() {
            return 0;
        }

        let len = self.latencies_us.len();
        let idx = ((p / 100.0) * (len - 1) as f64).round() as usize;
        self.latencies_us[idx.min(len - 1)]
    }

    /// Print metrics in human-readable format
    pub fn print_text(&mut self) {
        let metrics = self.finalize();
        println!("\n=== Capture Metrics ===");
        println!("Frames captured:   {}", metrics.frames_captured);
        println!("Timeouts:          {}", metrics.timeouts);
        println!(
            "Bytes captured:    {} ({:.2} MB)",
            metrics.bytes_captured,
            metrics.bytes_captured as f64 / 1_048_576.0
        );
        println!(
            "Duration:          {:.2} s",
            metrics.duration_ms as f64 / 1000.0
        );
        println!("Throughput:        {:.2} fps", metrics.throughput_fps);
        println!("Bandwidth:         {:.2} Mbps", metrics.bandwidth_mbps);

        if metrics.frames_captured > 0 {
            println!(
                "Frame size:        {} - {} bytes",
                metrics.frame_min_bytes, metrics.frame_max_bytes
            );
            println!("\nCapture Latency (µs):");
            println!("  Min:    {}", metrics.latency_min_us);
            println!("  Max:    {}", metrics.latency_max_us);
            println!("  Avg:    {}", metrics.latency_avg_us);
            println!("  P50:    {}", metrics.latency_p50_us);
            println!("  P95:    {}", metrics.latency_p95_us);
            println!("  P99:    {}", metrics.latency_p99_us);
        }
    }

    /// Print metrics in JSON format
    pub fn print_json(&mut self) -> Result<(), serde_json::Error> {
        let metrics = self.finalize();
        let json = serde_json::to_string_pretty(&metrics)?;
        println!("{}", json);
        Ok(())
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_calculation() {
        let mut collector = MetricsCollector::new();

        // 0, 10, 20, ..., 100 (11 values)
        for i in 0..=10 {
            collector.record_frame(Duration::from_micros(i * 10), 1000);
        }

        let metrics = collector.finalize();

        assert_eq!(metrics.latency_p50_us, 50);
        assert_eq!(metrics.latency_p95_us, 100);
        assert_eq!(metrics.latency_min_us, 0);
        assert_eq!(metrics.latency_max_us, 100);
        assert_eq!(metrics.latency_avg_us, 50);
    }

    #[test]
    fn test_frame_sizes_and_timeouts() {
        let mut collector = MetricsCollector::new();
        collector.record_frame(Duration::from_micros(10), 4000);
        collector.record_frame(Duration::from_micros(10), 2500);
        collector.record_frame(Duration::from_micros(10), 6100);
        collector.record_timeout();

        let metrics = collector.finalize();
        assert_eq!(metrics.frames_captured, 3);
        assert_eq!(metrics.timeouts, 1);
        assert_eq!(metrics.bytes_captured, 12_600);
        assert_eq!(metrics.frame_min_bytes, 2500);
        assert_eq!(metrics.frame_max_bytes, 6100);
    }

    #[test]
    fn test_throughput_calculation() {
        let mut collector = MetricsCollector::new();

        for _ in 0..30 {
            collector.record_frame(Duration::from_micros(1000), 100_000);
        }

        std::thread::sleep(Duration::from_millis(100));

        let metrics = collector.finalize();

        assert_eq!(metrics.frames_captured, 30);
        assert_eq!(metrics.bytes_captured, 3_000_000);

        // Roughly 300 fps (30 frames / 0.1 sec)
        assert!(metrics.throughput_fps > 200.0 && metrics.throughput_fps < 400.0);
    }

    #[test]
    fn test_empty_metrics() {
        let mut collector = MetricsCollector::new();
        let metrics = collector.finalize();

        assert_eq!(metrics.frames_captured, 0);
        assert_eq!(metrics.bytes_captured, 0);
        assert_eq!(metrics.frame_min_bytes, 0);
        assert_eq!(metrics.latency_min_us, 0);
        assert_eq!(metrics.latency_max_us, 0);
    }
}
