//! 数据源适配器
//!
//! 将 `SampleSource` 的回调桥接到对应数据源的 `SourceWriter`。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{SampleBatchCallback, SampleSource, SourceIndex};
use tracing::{debug, trace};

use crate::feed::SourceWriter;

/// 数据源适配器
///
/// 持有一个 `SampleSource` 和写入目标队列的 `SourceWriter`。
/// 停止后到达的批次会被忽略。
pub struct SourceAdapter {
    source: Box<dyn SampleSource>,
    writer: SourceWriter,
    listening: Arc<AtomicBool>,
}

impl SourceAdapter {
    /// 创建新的适配器
    pub fn new(source: Box<dyn SampleSource>, writer: SourceWriter) -> Self {
        Self {
            source,
            writer,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn source_id(&self) -> &str {
        self.source.source_id()
    }

    pub fn source_index(&self) -> SourceIndex {
        self.writer.source_index()
    }

    /// 开始监听数据源（重复调用无效果）
    pub fn start(&self) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let source_id = self.source.source_id().to_string();
        let writer = self.writer.clone();
        let listening = self.listening.clone();

        debug!(
            source_id = %source_id,
            source = writer.source_index(),
            "starting source adapter"
        );

        let callback: SampleBatchCallback = Arc::new(move |batch| {
            if !listening.load(Ordering::Relaxed) {
                return;
            }

            trace!(source_id = %source_id, len = batch.len(), "adapter received batch");
            // 拒绝已在 writer 中记录日志和计数
            let _ = writer.push_batch(&batch);
        });

        self.source.listen(callback);
    }

    /// 停止监听
    pub fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(source_id = %self.source.source_id(), "stopping source adapter");
            self.source.stop();
        }
    }

    /// 适配器是否处于监听状态
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }

    /// 底层数据源是否仍在产生数据
    pub fn is_source_active(&self) -> bool {
        self.source.is_listening()
    }
}
