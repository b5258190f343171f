//! # Sinks
//!
//! 对齐元组输出端。
//!
//! 负责：
//! - 消费 `AlignedTuple`
//! - 日志 / JSON lines (stdout 或文件) / 进程内通道
//! - 根据 `SinkConfig` 创建输出端

mod channel;
mod configured;
mod json_lines;
mod log;

pub use channel::ChannelSink;
pub use configured::{create_sink, ConfiguredSink};
pub use contracts::{AlignedTuple, TupleSink};
pub use json_lines::{FileSink, JsonLinesSink, StdoutSink};
pub use log::LogSink;
