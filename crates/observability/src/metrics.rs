//! 同步循环指标收集模块
//!
//! 记录节拍延迟、积压量、队列深度、样本接收/丢弃/拒绝以及输出端写入结果。

use std::collections::HashMap;

use contracts::{AlignedTuple, BufferStats, SourceIndex};
use metrics::{counter, gauge, histogram};

/// 记录一次节拍决策
///
/// 每次循环迭代调用：`delay_ms` 为本次睡眠时长，`backlog` 为所有队列样本总数。
pub fn record_pacing(delay_ms: f64, backlog: usize) {
    gauge!("stream_syncer_pacing_delay_ms").set(delay_ms);
    histogram!("stream_syncer_pacing_delay_ms_hist").record(delay_ms);
    gauge!("stream_syncer_backlog").set(backlog as f64);
}

/// 记录各数据源队列深度
pub fn record_queue_depths(stats: &BufferStats) {
    for (source, queue) in stats.queues.iter().enumerate() {
        gauge!(
            "stream_syncer_queue_depth",
            "source" => source.to_string()
        )
        .set(queue.depth as f64);
    }
}

/// 记录样本接收
pub fn record_samples_accepted(source: SourceIndex, count: usize) {
    counter!(
        "stream_syncer_samples_received_total",
        "source" => source.to_string()
    )
    .increment(count as u64);
}

/// 记录因队列溢出而丢弃的样本
pub fn record_samples_dropped(source: SourceIndex, count: usize) {
    counter!(
        "stream_syncer_samples_dropped_total",
        "source" => source.to_string()
    )
    .increment(count as u64);
}

/// 记录被拒绝的样本 (时间戳回退 / 队列已满 / 索引越界)
pub fn record_samples_rejected(source: SourceIndex, reason: &'static str) {
    counter!(
        "stream_syncer_samples_rejected_total",
        "source" => source.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// 记录输出端写入结果
pub fn record_sink_write(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "stream_syncer_sink_writes_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录静默数据源 (None = 从未产生数据)
pub fn record_source_silent(source: SourceIndex, silent_secs: Option<f64>) {
    gauge!(
        "stream_syncer_source_silent_seconds",
        "source" => source.to_string()
    )
    .set(silent_secs.unwrap_or(f64::INFINITY));
    counter!(
        "stream_syncer_source_silent_total",
        "source" => source.to_string()
    )
    .increment(1);
}

/// 同步循环指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct LoopMetricsAggregator {
    /// 发出的对齐元组数
    pub total_tuples: u64,

    /// 无数据可发的尝试次数
    pub empty_attempts: u64,

    /// 节拍延迟统计 (毫秒)
    pub delay_stats: RunningStats,

    /// 积压量统计
    pub backlog_stats: RunningStats,

    /// 元组内时间戳跨度统计
    pub spread_stats: RunningStats,

    /// 各数据源静默告警次数
    pub silent_counts: HashMap<SourceIndex, u64>,
}

impl LoopMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次节拍
    pub fn record_attempt(&mut self, delay_ms: f64, backlog: usize) {
        self.delay_stats.push(delay_ms);
        self.backlog_stats.push(backlog as f64);
    }

    /// 记录一次成功发出的元组
    pub fn record_tuple(&mut self, tuple: &AlignedTuple) {
        self.total_tuples += 1;
        self.spread_stats.push(tuple.timestamp_spread());
    }

    /// 记录一次空尝试
    pub fn record_empty(&mut self) {
        self.empty_attempts += 1;
    }

    /// 记录一次静默告警
    pub fn record_silent(&mut self, source: SourceIndex) {
        *self.silent_counts.entry(source).or_insert(0) += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let attempts = self.total_tuples + self.empty_attempts;
        MetricsSummary {
            total_tuples: self.total_tuples,
            empty_attempts: self.empty_attempts,
            hit_rate: if attempts > 0 {
                self.total_tuples as f64 / attempts as f64 * 100.0
            } else {
                0.0
            },
            delay_ms: StatsSummary::from(&self.delay_stats),
            backlog: StatsSummary::from(&self.backlog_stats),
            timestamp_spread: StatsSummary::from(&self.spread_stats),
            silent_counts: self.silent_counts.clone(),
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
    pub total_tuples: u64,
    pub empty_attempts: u64,
    pub hit_rate: f64,
    pub delay_ms: StatsSummary,
    pub backlog: StatsSummary,
    pub timestamp_spread: StatsSummary,
    pub silent_counts: HashMap<SourceIndex, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Sync Loop Summary ===")?;
        writeln!(f, "Tuples emitted: {}", self.total_tuples)?;
        writeln!(
            f,
            "Empty attempts: {} (hit rate {:.2}%)",
            self.empty_attempts, self.hit_rate
        )?;
        writeln!(f, "Pacing delay (ms): {}", self.delay_ms)?;
        writeln!(f, "Backlog: {}", self.backlog)?;
        writeln!(f, "Timestamp spread: {}", self.timestamp_spread)?;

        if !self.silent_counts.is_empty() {
            let mut sources: Vec<_> = self.silent_counts.iter().collect();
            sources.sort();
            writeln!(f, "Silent source warnings:")?;
            for (source, count) in sources {
                writeln!(f, "  source {}: {}", source, count)?;
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
            return write!(f, "N/A");
        }
        write!(
            f,
            "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
            self.min, self.max, self.mean, self.std_dev, self.count
        )
    }
}

/// 在线统计计算器 (Welford 算法)
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
            (self.min, self.max, self.mean, self.m2) = (value, value, value, 0.0);
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Sample;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 8);
        assert!((stats.mean() - 5.0).abs() < 1e-10);
        assert!((stats.min() - 2.0).abs() < 1e-10);
        assert!((stats.max() - 9.0).abs() < 1e-10);
        assert!((stats.variance() - 32.0 / 7.0).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_summary() {
        let mut aggregator = LoopMetricsAggregator::new();
        aggregator.record_attempt(10.0, 400);
        aggregator.record_attempt(9.5, 1200);
        aggregator.record_empty();
        aggregator.record_tuple(&AlignedTuple::from_samples(
            1,
            &[Sample::new(0.0, 1.0), Sample::new(2.0, 1.0)],
        ));
        aggregator.record_silent(2);

        let summary = aggregator.summary();
        assert_eq!(summary.total_tuples, 1);
        assert_eq!(summary.empty_attempts, 1);
        assert!((summary.hit_rate - 50.0).abs() < 1e-10);
        assert_eq!(summary.delay_ms.count, 2);
        assert!((summary.timestamp_spread.max - 2.0).abs() < 1e-10);
        assert_eq!(summary.silent_counts.get(&2), Some(&1));

        aggregator.reset();
        assert_eq!(aggregator.summary().total_tuples, 0);
    }

    #[test]
    fn test_summary_display() {
        let summary = MetricsSummary {
            total_tuples: 100,
            empty_attempts: 25,
            hit_rate: 80.0,
            delay_ms: StatsSummary {
                count: 125,
                min: 1.0,
                max: 50.0,
                mean: 12.0,
                std_dev: 4.0,
            },
            silent_counts: HashMap::from([(1, 3)]),
            ..Default::default()
        };

        let output = format!("{}", summary);
        assert!(output.contains("Tuples emitted: 100"));
        assert!(output.contains("80.00%"));
        assert!(output.contains("Backlog: N/A"));
        assert!(output.contains("source 1: 3"));
    }
}
