//! Ingestion 错误类型

use contracts::{ContractError, SourceIndex};
use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 数据源索引超出同步器的源数量
    #[error("source index {source_index} out of range (source count {source_count})")]
    SourceOutOfRange {
        /// 数据源索引
        source_index: SourceIndex,
        /// 已配置的源数量
        source_count: usize,
    },

    /// 该索引已注册过数据源
    #[error("source {source_index} is already registered ({source_id})")]
    AlreadyRegistered {
        /// 数据源索引
        source_index: SourceIndex,
        /// 已注册的数据源 ID
        source_id: String,
    },

    /// 底层契约错误 (配置 / 队列 / 输出端)
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
