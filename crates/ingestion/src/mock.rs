//! Mock 数据源
//!
//! 无真实数据采集端时使用：在独立线程中按固定采样率生成正弦 + 噪声信号。

use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{Sample, SampleBatchCallback, SampleSource};
use rand::Rng;
use tracing::{debug, trace, warn};

/// Mock 数据源配置
#[derive(Debug, Clone)]
pub struct MockSourceConfig {
    /// 数据源 ID
    pub source_id: String,

    /// 采样率 (Hz)，决定时间戳间隔
    pub sample_rate_hz: f64,

    /// 每批样本数
    pub batch_size: usize,

    /// 正弦幅值
    pub amplitude: f64,

    /// 正弦频率 (Hz)
    pub signal_hz: f64,

    /// 均匀噪声幅值
    pub noise: f64,

    /// 首个样本时间戳 (毫秒)
    pub start_timestamp_ms: f64,

    /// 样本总数上限 (None = 无限)
    pub max_samples: Option<u64>,

    /// 是否按实时节奏发送 (false = 尽快发送)
    pub realtime: bool,
}

impl Default for MockSourceConfig {
    fn default() -> Self {
        Self {
            source_id: "mock_source".to_string(),
            sample_rate_hz: 100.0,
            batch_size: 10,
            amplitude: 1.0,
            signal_hz: 1.0,
            noise: 0.05,
            start_timestamp_ms: 0.0,
            max_samples: None,
            realtime: true,
        }
    }
}

impl MockSourceConfig {
    /// 每批之间的间隔；采样率非正或间隔超出 `Duration` 范围时为 None
    fn batch_interval(&self) -> Option<Duration> {
        if !(self.sample_rate_hz > 0.0) {
            return None;
        }
        Duration::try_from_secs_f64(self.batch_size.max(1) as f64 / self.sample_rate_hz).ok()
    }

    /// 第 `n` 个样本
    fn sample_at(&self, n: u64, rng: &mut impl Rng) -> Sample {
        let period_ms = 1000.0 / self.sample_rate_hz;
        let timestamp = self.start_timestamp_ms + n as f64 * period_ms;
        let mut value = self.amplitude * (TAU * self.signal_hz * timestamp / 1000.0).sin();
        if self.noise > 0.0 {
            value += rng.random_range(-self.noise..=self.noise);
        }
        Sample::new(timestamp, value)
    }
}

/// 生产线程退出（包括 panic）时清除运行标志
struct ListeningGuard(Arc<AtomicBool>);

impl Drop for ListeningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Mock 数据源
pub struct MockSampleSource {
    config: MockSourceConfig,
    running: Arc<AtomicBool>,
}

impl MockSampleSource {
    /// 创建新的 Mock 数据源
    pub fn new(config: MockSourceConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 实时正弦源
    pub fn sine(source_id: &str, sample_rate_hz: f64) -> Self {
        Self::new(MockSourceConfig {
            source_id: source_id.to_string(),
            sample_rate_hz,
            ..Default::default()
        })
    }

    /// 一次性产生 `count` 个样本后停止（不按实时节奏）
    pub fn finite(source_id: &str, count: u64) -> Self {
        Self::new(MockSourceConfig {
            source_id: source_id.to_string(),
            max_samples: Some(count),
            realtime: false,
            noise: 0.0,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &MockSourceConfig {
        &self.config
    }
}

impl SampleSource for MockSampleSource {
    fn source_id(&self) -> &str {
        &self.config.source_id
    }

    fn listen(&self, callback: SampleBatchCallback) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let config = self.config.clone();
        let running = self.running.clone();

        std::thread::spawn(move || {
            let _listening = ListeningGuard(running.clone());
            let Some(batch_interval) = config.batch_interval() else {
                warn!(
                    source_id = %config.source_id,
                    sample_rate_hz = config.sample_rate_hz,
                    "invalid sample rate, mock sample source not started"
                );
                return;
            };

            let mut rng = rand::rng();
            let batch_size = config.batch_size.max(1);
            let mut produced: u64 = 0;

            debug!(
                source_id = %config.source_id,
                sample_rate_hz = config.sample_rate_hz,
                batch_size,
                "mock sample source started"
            );

            while running.load(Ordering::Relaxed) {
                let remaining = config
                    .max_samples
                    .map_or(batch_size as u64, |max| max.saturating_sub(produced));
                if remaining == 0 {
                    break;
                }

                let len = remaining.min(batch_size as u64);
                let batch: Vec<Sample> = (produced..produced + len)
                    .map(|n| config.sample_at(n, &mut rng))
                    .collect();
                produced += len;

                trace!(source_id = %config.source_id, produced, "mock batch sent");
                callback(batch);

                if config.realtime {
                    std::thread::sleep(batch_interval);
                }
            }

            debug!(source_id = %config.source_id, produced, "mock sample source stopped");
        });
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_listening(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
