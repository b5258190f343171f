//! Pipeline statistics and metrics.

use std::time::Duration;

use ingestion::{LoopStats, MetricsSnapshot};

/// Statistics from a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Number of sources with a producer attached
    pub active_sources: usize,

    /// Source ids, in source order
    pub source_ids: Vec<String>,

    /// Producer-side counters
    pub ingestion: MetricsSnapshot,

    /// Loop report
    pub loop_stats: LoopStats,
}

impl PipelineStats {
    /// Aligned tuples per second
    pub fn tuples_per_second(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.loop_stats.tuples_emitted as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of stored samples that ended up in a tuple, as percentage
    pub fn consumption_rate(&self) -> f64 {
        let stored = self.ingestion.samples_received;
        if stored > 0 {
            let consumed = self.loop_stats.tuples_emitted * self.source_ids.len() as u64;
            (consumed as f64 / stored as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        let loop_stats = &self.loop_stats;
        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Exit reason: {:?}", loop_stats.exit_reason);
        println!("   ├─ Tuples emitted: {}", loop_stats.tuples_emitted);
        println!("   ├─ Tuples written: {}", loop_stats.tuples_written);
        println!("   ├─ Sink errors: {}", loop_stats.sink_errors);
        println!("   ├─ Tuples/s: {:.2}", self.tuples_per_second());
        println!("   └─ Active sources: {}/{}", self.active_sources, self.source_ids.len());

        println!("\n📥 Ingestion");
        println!("   ├─ Samples received: {}", self.ingestion.samples_received);
        println!("   ├─ Samples dropped: {}", self.ingestion.samples_dropped);
        println!("   ├─ Samples rejected: {}", self.ingestion.samples_rejected);
        println!("   ├─ Consumed: {:.2}%", self.consumption_rate());
        println!(
            "   └─ Discarded on shutdown: {}",
            loop_stats.discarded_on_shutdown
        );

        println!("\n📦 Leftover per source");
        for (i, (id, depth)) in self
            .source_ids
            .iter()
            .zip(&loop_stats.leftover_depths)
            .enumerate()
        {
            let prefix = if i + 1 == self.source_ids.len() { "└─" } else { "├─" };
            println!("   {} {}: {}", prefix, id, depth);
        }

        println!("\n📈 {}", loop_stats.summary);
    }
}
