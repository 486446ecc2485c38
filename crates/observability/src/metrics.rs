//! 采集指标收集模块
//!
//! 基于 Record 收集和统计采集管线的运行指标。

use contracts::Record;
use metrics::{counter, gauge, histogram};

/// 每写入一条 Record 时调用此函数来记录指标。
///
/// # Example
///
/// ```ignore
/// use observability::record_record_written;
///
/// sink.write(&record).await?;
/// record_record_written(&record);
/// ```
pub fn record_record_written(record: &Record) {
    // Record 计数器
    counter!("touchrig_records_total").increment(1);

    // Record 时间戳 (用于检测停滞)
    gauge!("touchrig_last_record_timestamp").set(record.timestamp);

    // 本次新采样的帧数
    histogram!("touchrig_record_sampled_frames").record(record.sampled_count() as f64);

    // 缺失传感器
    let absent = record.absent_sensors();
    gauge!("touchrig_sensors_absent").set(absent.len() as f64);
    if !absent.is_empty() {
        counter!("touchrig_records_with_absent_sensors_total").increment(1);
        for sensor_id in absent {
            counter!(
                "touchrig_sensor_absent_total",
                "sensor_id" => sensor_id.as_str().to_string()
            )
            .increment(1);
        }
    }
}

/// 记录传感器原生帧接收
pub fn record_frame_received(sensor_id: &str, payload_kind: &str) {
    counter!(
        "touchrig_frames_received_total",
        "sensor_id" => sensor_id.to_string(),
        "payload_kind" => payload_kind.to_string()
    )
    .increment(1);
}

/// 记录抽取后转发到 group 的帧
pub fn record_frame_forwarded(sensor_id: &str) {
    counter!(
        "touchrig_frames_forwarded_total",
        "sensor_id" => sensor_id.to_string()
    )
    .increment(1);
}

/// 记录传感器失效
pub fn record_sensor_failed(sensor_id: &str) {
    counter!(
        "touchrig_sensor_failed_total",
        "sensor_id" => sensor_id.to_string()
    )
    .increment(1);
}

/// 记录存储写入延迟
pub fn record_store_latency_ms(latency_ms: f64) {
    histogram!("touchrig_store_write_latency_ms").record(latency_ms);
}

/// 采集指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct CaptureMetricsAggregator {
    /// 总 Record 数
    pub total_records: u64,

    /// 有缺失传感器的 Record 数
    pub records_with_absent: u64,

    /// 每 Record 新采样帧数统计
    pub sampled_stats: RunningStats,

    /// Record 间隔统计 (毫秒)
    pub interval_stats: RunningStats,

    /// 各传感器缺失次数
    pub absent_counts: std::collections::HashMap<String, u64>,

    last_timestamp: Option<f64>,
}

impl CaptureMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, record: &Record) {
        self.total_records += 1;
        self.sampled_stats.push(record.sampled_count() as f64);

        let absent = record.absent_sensors();
        if !absent.is_empty() {
            self.records_with_absent += 1;
            for sensor_id in absent {
                *self
                    .absent_counts
                    .entry(sensor_id.as_str().to_string())
                    .or_insert(0) += 1;
            }
        }

        if let Some(last) = self.last_timestamp {
            self.interval_stats.push((record.timestamp - last) * 1000.0);
        }
        self.last_timestamp = Some(record.timestamp);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_records: self.total_records,
            records_with_absent: self.records_with_absent,
            absent_rate: if self.total_records > 0 {
                self.records_with_absent as f64 / self.total_records as f64 * 100.0
            } else {
                0.0
            },
            sampled_frames: StatsSummary::from(&self.sampled_stats),
            record_interval_ms: StatsSummary::from(&self.interval_stats),
            sensor_absent_counts: self.absent_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_records: u64,
    pub records_with_absent: u64,
    pub absent_rate: f64,
    pub sampled_frames: StatsSummary,
    pub record_interval_ms: StatsSummary,
    pub sensor_absent_counts: std::collections::HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Capture Metrics Summary ===")?;
        writeln!(f, "Total records: {}", self.total_records)?;
        writeln!(
            f,
            "Records with absent sensors: {} ({:.2}%)",
            self.records_with_absent, self.absent_rate
        )?;
        writeln!(f, "Sampled frames per record: {}", self.sampled_frames)?;
        writeln!(f, "Record interval (ms): {}", self.record_interval_ms)?;

        if !self.sensor_absent_counts.is_empty() {
            writeln!(f, "Absent sensor counts:")?;
            for (sensor, count) in &self.sensor_absent_counts {
                writeln!(f, "  {}: {}", sensor, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{FrameEntry, PayloadSnapshot, SensorId};
    use std::collections::BTreeMap;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        stats.push(1.0);
        stats.push(2.0);
        stats.push(3.0);
        stats.push(4.0);
        stats.push(5.0);

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = CaptureMetricsAggregator::new();

        let mut frames = BTreeMap::new();
        frames.insert(SensorId::from("thumb"), FrameEntry::Absent);

        let record = Record {
            timestamp: 0.1,
            frames,
            payload: PayloadSnapshot::default(),
        };

        aggregator.update(&record);

        assert_eq!(aggregator.total_records, 1);
        assert_eq!(aggregator.records_with_absent, 1);
        assert_eq!(aggregator.absent_counts.get("thumb"), Some(&1));
    }

    #[test]
    fn test_interval_tracking() {
        let mut aggregator = CaptureMetricsAggregator::new();
        for i in 0..4 {
            let record = Record {
                timestamp: i as f64 * 0.1,
                frames: BTreeMap::new(),
                payload: PayloadSnapshot::default(),
            };
            aggregator.update(&record);
        }
        let summary = aggregator.summary();
        assert_eq!(summary.record_interval_ms.count, 3);
        assert!((summary.record_interval_ms.mean - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_summary_display() {
        let summary = MetricsSummary {
            total_records: 100,
            records_with_absent: 3,
            absent_rate: 3.0,
            sampled_frames: StatsSummary {
                count: 100,
                min: 0.0,
                max: 2.0,
                mean: 1.8,
                std_dev: 0.4,
            },
            record_interval_ms: StatsSummary::default(),
            sensor_absent_counts: Default::default(),
        };

        let output = format!("{}", summary);
        assert!(output.contains("Total records: 100"));
        assert!(output.contains("3.00%"));
    }
}
