//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（Mock 数据源 -> 同步器 -> Sink）
//! - 健康检查与关停行为

#[cfg(test)]
mod contract_tests {
    use contracts::{AlignedTuple, Sample, SyncerConfig, TupleSink};

    /// 省略 version 的配置取默认版本，且序列化后可原样读回
    #[test]
    fn test_config_version_defaults_and_round_trips() {
        use config_loader::{ConfigFormat, ConfigLoader};
        use contracts::ConfigVersion;

        let config =
            ConfigLoader::load_from_str(r#"{ "sources": [{ "id": "HHZ" }] }"#, ConfigFormat::Json)
                .unwrap();
        assert_eq!(config.version, ConfigVersion::default());
        assert_eq!(config.version, ConfigVersion::V1);

        let json = ConfigLoader::to_json(&config).unwrap();
        assert!(json.contains(r#""version": "V1""#), "{json}");
        let reloaded = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(reloaded.version, ConfigVersion::V1);
    }

    /// AlignedTuple 的序列化格式即 sink 的输出格式
    #[tokio::test]
    async fn test_aligned_tuple_wire_shape() {
        let tuple =
            AlignedTuple::from_samples(3, &[Sample::new(10.0, 1.5), Sample::new(10.0, -2.0)]);

        let mut sink = sinks::JsonLinesSink::new("json", Vec::new());
        sink.write(&tuple).await.unwrap();
        sink.flush().await.unwrap();
        let bytes = sink.into_inner().unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "{\"tuple_id\":3,\"timestamps\":[10.0,10.0],\"values\":[1.5,-2.0]}\n"
        );
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = SyncerConfig::with_sources(["HHE", "HHN", "HHZ"]);
        let text = config_loader::ConfigLoader::to_toml(&config).unwrap();
        let loaded =
            config_loader::ConfigLoader::load_from_str(&text, config_loader::ConfigFormat::Toml)
                .unwrap();
        assert_eq!(loaded.source_count(), 3);
        assert_eq!(loaded.sources[2].id, "HHZ");
        assert_eq!(loaded.pacing.high_watermark, config.pacing.high_watermark);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use contracts::{
        ContractError, HealthConfig, PacingConfig, Sample, SampleFeed, SyncerConfig,
    };
    use ingestion::{
        ExitReason, IngestionLoop, LoopLimits, MockSampleSource, MockSourceConfig, ProducerSet,
        QueueFeed,
    };
    use sinks::ChannelSink;
    use sync_engine::{PacingController, Synchronizer};

    fn fast_pacing() -> PacingConfig {
        PacingConfig {
            initial_delay_ms: 1.0,
            min_delay_ms: 0.5,
            max_delay_ms: 5.0,
            ..Default::default()
        }
    }

    /// 等待同步器积压达到 `target`
    async fn wait_for_backlog(synchronizer: &Synchronizer, target: usize) {
        let wait = async {
            while synchronizer.backlog() < target {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .expect("producers did not deliver in time");
    }

    /// End-to-end test: MockSampleSource -> Synchronizer -> ChannelSink
    ///
    /// 三个数据源分别产生 5/5/3 个样本：
    /// 1. 恰好输出 3 个对齐元组
    /// 2. 第 k 个元组由每个数据源的第 k 个样本组成
    /// 3. 剩余样本在关停时被丢弃
    #[tokio::test]
    async fn test_e2e_finite_sources() {
        let config = SyncerConfig::with_sources(["HHE", "HHN", "HHZ"]);
        let (sink, mut rx) = ChannelSink::new("chan", 64);
        let ingestion_loop = IngestionLoop::from_config(&config, sink)
            .unwrap()
            .with_limits(LoopLimits::drain_available());

        let mut producers =
            ProducerSet::new(QueueFeed::from_synchronizer(ingestion_loop.synchronizer()));
        for (index, count) in [5u64, 5, 3].into_iter().enumerate() {
            let source = MockSampleSource::finite(&config.sources[index].id, count);
            producers.register(index, Box::new(source)).unwrap();
        }
        producers.start_all();
        wait_for_backlog(ingestion_loop.synchronizer(), 13).await;

        let stats = ingestion_loop.spawn().await.unwrap();
        producers.stop_all();

        assert_eq!(stats.exit_reason, ExitReason::Starved);
        assert_eq!(stats.tuples_emitted, 3);
        assert_eq!(stats.tuples_written, 3);
        assert_eq!(stats.leftover_depths, vec![2, 2, 0]);
        assert_eq!(stats.discarded_on_shutdown, 4);
        assert_eq!(producers.metrics().snapshot().samples_received, 13);

        let mut tuples = Vec::new();
        while let Some(tuple) = rx.recv().await {
            tuples.push(tuple);
        }
        assert_eq!(tuples.len(), 3);
        for (k, tuple) in tuples.iter().enumerate() {
            assert_eq!(tuple.tuple_id, k as u64 + 1);
            assert_eq!(tuple.len(), 3);
            // 100 Hz -> 10 ms 间隔
            assert!(tuple.timestamps.iter().all(|&t| t == k as f64 * 10.0));
            assert_eq!(tuple.timestamp_spread(), 0.0);
        }
    }

    /// 实时数据源：取消后循环退出，且输出元组保持有序对齐
    #[tokio::test]
    async fn test_e2e_realtime_cancellation() {
        let config = SyncerConfig {
            pacing: fast_pacing(),
            ..SyncerConfig::with_sources(["a", "b", "c"])
        };
        let (sink, mut rx) = ChannelSink::new("chan", 10_000);
        let ingestion_loop = IngestionLoop::from_config(&config, sink).unwrap();
        let shutdown = ingestion_loop.shutdown_signal();

        let mut producers =
            ProducerSet::new(QueueFeed::from_synchronizer(ingestion_loop.synchronizer()));
        for (index, source) in config.sources.iter().enumerate() {
            let mock = MockSampleSource::new(MockSourceConfig {
                source_id: source.id.clone(),
                sample_rate_hz: 500.0,
                batch_size: 5,
                ..Default::default()
            });
            producers.register(index, Box::new(mock)).unwrap();
        }
        producers.start_all();

        let handle = ingestion_loop.spawn();
        tokio::time::sleep(Duration::from_millis(300)).await;
        shutdown.trigger();
        let stats = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("loop did not stop after cancellation")
            .unwrap();
        producers.stop_all();

        assert_eq!(stats.exit_reason, ExitReason::Cancelled);
        assert!(stats.tuples_emitted > 0);
        assert_eq!(stats.tuples_written, stats.tuples_emitted);
        assert_eq!(stats.sink_errors, 0);

        let mut expected_id = 1;
        while let Some(tuple) = rx.recv().await {
            assert_eq!(tuple.tuple_id, expected_id);
            // 同采样率、同起点 -> 每个元组内时间戳一致
            assert_eq!(tuple.timestamp_spread(), 0.0);
            expected_id += 1;
        }
        assert_eq!(expected_id - 1, stats.tuples_emitted);
    }

    /// 一个数据源从不产生数据：无元组输出，健康检查持续告警
    #[tokio::test]
    async fn test_e2e_silent_source_reported() {
        let config = SyncerConfig {
            pacing: fast_pacing(),
            health: HealthConfig {
                silence_timeout_s: 0.15,
                check_interval_ms: 20,
            },
            ..SyncerConfig::with_sources(["live", "muted"])
        };
        let (sink, _rx) = ChannelSink::new("chan", 16);
        let ingestion_loop = IngestionLoop::from_config(&config, sink).unwrap();
        let shutdown = ingestion_loop.shutdown_signal();

        let mut producers =
            ProducerSet::new(QueueFeed::from_synchronizer(ingestion_loop.synchronizer()));
        producers
            .register(0, Box::new(MockSampleSource::sine("live", 200.0)))
            .unwrap();
        assert_eq!(producers.unregistered(), vec![1]);
        producers.start_all();

        let handle = ingestion_loop.spawn();
        tokio::time::sleep(Duration::from_millis(400)).await;
        shutdown.trigger();
        let stats = handle.await.unwrap();
        producers.stop_all();

        assert_eq!(stats.tuples_emitted, 0);
        assert!(stats.silent_warnings > 0);
        assert!(stats.summary.silent_counts.get(&1).copied().unwrap_or(0) > 0);
        assert!(stats.summary.silent_counts.get(&0).is_none());
        assert!(stats.leftover_depths[0] > 0);
        assert_eq!(stats.leftover_depths[1], 0);
    }

    /// 配置文件 -> 循环
    #[tokio::test]
    async fn test_e2e_from_toml_config() {
        let toml = r#"
            [[sources]]
            id = "HHE"

            [[sources]]
            id = "HHN"
            title = "North"

            [pacing]
            initial_delay_ms = 1.0
            min_delay_ms = 0.5
            max_delay_ms = 2.0

            [queue]
            capacity = 4
            overflow_policy = "drop_oldest"
        "#;
        let config =
            config_loader::ConfigLoader::load_from_str(toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        assert_eq!(config.queue.capacity, 4);

        let (sink, mut rx) = ChannelSink::new("chan", 16);
        let ingestion_loop = IngestionLoop::from_config(&config, sink)
            .unwrap()
            .with_limits(LoopLimits::drain_available());

        let feed = QueueFeed::from_synchronizer(ingestion_loop.synchronizer());
        let batch: Vec<Sample> = (0..6).map(|i| Sample::new(i as f64, i as f64)).collect();
        // 容量 4，drop_oldest：保留最新 4 个
        assert_eq!(feed.on_samples(0, &batch).unwrap(), 6);
        assert_eq!(feed.on_samples(1, &batch[..2]).unwrap(), 2);
        assert_eq!(feed.metrics().snapshot().samples_dropped, 2);

        let stats = ingestion_loop.run().await;
        assert_eq!(stats.tuples_emitted, 2);
        assert_eq!(stats.leftover_depths, vec![2, 0]);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.values, vec![2.0, 0.0]);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.values, vec![3.0, 1.0]);
    }

    /// 时间戳回退与越界的数据源被拒绝，已接受的样本不受影响
    #[test]
    fn test_feed_rejects_bad_input() {
        let config = SyncerConfig::with_sources(["a", "b"]);
        let synchronizer = Synchronizer::new(config.source_count(), &config.queue).unwrap();
        let feed = QueueFeed::from_synchronizer(&synchronizer);

        let err = feed
            .on_samples(0, &[Sample::new(10.0, 0.0), Sample::new(5.0, 0.0)])
            .unwrap_err();
        assert!(matches!(
            err,
            ContractError::NonMonotonicTimestamp {
                source_index: 0,
                ..
            }
        ));
        assert_eq!(synchronizer.queue(0).unwrap().len(), 1);

        let err = feed.on_samples(2, &[Sample::new(0.0, 0.0)]).unwrap_err();
        assert!(matches!(err, ContractError::SourceOutOfRange { .. }));
        assert_eq!(feed.metrics().snapshot().samples_rejected, 2);
    }

    /// 积压持续高于高水位：延迟收敛到下限；清空后回升
    #[test]
    fn test_pacing_follows_backlog() {
        let mut pacing = PacingController::new(PacingConfig::default());
        for _ in 0..200 {
            pacing.update(5_000);
        }
        assert_eq!(pacing.current_delay_ms(), 1.0);

        for _ in 0..200 {
            pacing.update(0);
        }
        assert_eq!(pacing.current_delay_ms(), 50.0);
    }
}
