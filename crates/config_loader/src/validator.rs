//! 配置校验模块
//!
//! 校验规则：
//! - 至少一个数据源，source id 非空且唯一
//! - 0 < min_delay_ms <= max_delay_ms <= 1 小时，initial_delay_ms 为正有限值
//! - low_watermark <= high_watermark
//! - 0 < decay_factor <= 1，recovery_factor >= 1
//! - 队列容量 > 0
//! - silence_timeout_s > 0
//! - sink 必填字段齐全

use std::collections::HashSet;

use contracts::{ContractError, SinkType, SyncerConfig};

/// 节拍延迟上限 (毫秒)
pub const MAX_DELAY_LIMIT_MS: f64 = 3_600_000.0;

/// 校验 SyncerConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &SyncerConfig) -> Result<(), ContractError> {
    validate_sources(config)?;
    validate_pacing(config)?;
    validate_queue(config)?;
    validate_health(config)?;
    validate_sink(config)?;
    Ok(())
}

/// 校验数据源列表
fn validate_sources(config: &SyncerConfig) -> Result<(), ContractError> {
    if config.sources.is_empty() {
        return Err(ContractError::config_validation(
            "sources",
            "at least one source is required",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, source) in config.sources.iter().enumerate() {
        if source.id.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("sources[{idx}].id"),
                "source id cannot be empty",
            ));
        }
        if !seen.insert(&source.id) {
            return Err(ContractError::config_validation(
                format!("sources[id={}]", source.id),
                "duplicate source id",
            ));
        }
    }
    Ok(())
}

/// 校验节拍参数
fn validate_pacing(config: &SyncerConfig) -> Result<(), ContractError> {
    let pacing = &config.pacing;

    // NaN 不满足 > 0，同样被拒绝
    if !(pacing.min_delay_ms > 0.0) {
        return Err(ContractError::config_validation(
            "pacing.min_delay_ms",
            format!("min_delay_ms must be > 0, got {}", pacing.min_delay_ms),
        ));
    }
    if !(pacing.max_delay_ms.is_finite() && pacing.min_delay_ms <= pacing.max_delay_ms) {
        return Err(ContractError::config_validation(
            "pacing.min_delay_ms / pacing.max_delay_ms",
            format!(
                "min_delay_ms ({}) must be <= max_delay_ms ({})",
                pacing.min_delay_ms, pacing.max_delay_ms
            ),
        ));
    }
    if !(pacing.initial_delay_ms.is_finite() && pacing.initial_delay_ms > 0.0) {
        return Err(ContractError::config_validation(
            "pacing.initial_delay_ms",
            format!(
                "initial_delay_ms must be finite and > 0, got {}",
                pacing.initial_delay_ms
            ),
        ));
    }
    if pacing.max_delay_ms > MAX_DELAY_LIMIT_MS {
        return Err(ContractError::config_validation(
            "pacing.max_delay_ms",
            format!(
                "max_delay_ms must be <= {MAX_DELAY_LIMIT_MS}, got {}",
                pacing.max_delay_ms
            ),
        ));
    }
    if pacing.low_watermark > pacing.high_watermark {
        return Err(ContractError::config_validation(
            "pacing.low_watermark / pacing.high_watermark",
            format!(
                "low_watermark ({}) must be <= high_watermark ({})",
                pacing.low_watermark, pacing.high_watermark
            ),
        ));
    }
    if !(pacing.decay_factor > 0.0 && pacing.decay_factor <= 1.0) {
        return Err(ContractError::config_validation(
            "pacing.decay_factor",
            format!("decay_factor must be in (0, 1], got {}", pacing.decay_factor),
        ));
    }
    if !(pacing.recovery_factor.is_finite() && pacing.recovery_factor >= 1.0) {
        return Err(ContractError::config_validation(
            "pacing.recovery_factor",
            format!(
                "recovery_factor must be >= 1, got {}",
                pacing.recovery_factor
            ),
        ));
    }
    Ok(())
}

/// 校验队列配置
fn validate_queue(config: &SyncerConfig) -> Result<(), ContractError> {
    if config.queue.capacity == 0 {
        return Err(ContractError::config_validation(
            "queue.capacity",
            "capacity must be > 0",
        ));
    }
    Ok(())
}

/// 校验健康检查配置
fn validate_health(config: &SyncerConfig) -> Result<(), ContractError> {
    let health = &config.health;
    if !(health.silence_timeout_s.is_finite() && health.silence_timeout_s > 0.0) {
        return Err(ContractError::config_validation(
            "health.silence_timeout_s",
            format!(
                "silence_timeout_s must be > 0, got {}",
                health.silence_timeout_s
            ),
        ));
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sink(config: &SyncerConfig) -> Result<(), ContractError> {
    let sink = &config.sink;
    if sink.name.is_empty() {
        return Err(ContractError::config_validation(
            "sink.name",
            "sink name cannot be empty",
        ));
    }
    if sink.sink_type == SinkType::File && sink.path.is_none() {
        return Err(ContractError::config_validation(
            "sink.path",
            "file sink requires a path",
        ));
    }
    Ok(())
}
