//! JsonLinesSink - one JSON object per tuple, newline separated

use std::path::Path;

use contracts::{AlignedTuple, ContractError, TupleSink};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter, Stdout};
use tracing::{debug, instrument};

/// JSON-lines sink on stdout
pub type StdoutSink = JsonLinesSink<Stdout>;

/// JSON-lines sink appending to a file
pub type FileSink = JsonLinesSink<File>;

/// Sink that serializes each tuple as a JSON line into any async writer
pub struct JsonLinesSink<W: AsyncWrite + Unpin + Send> {
    name: String,
    writer: Option<BufWriter<W>>,
    line: Vec<u8>,
    written: u64,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesSink<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer: Some(BufWriter::new(writer)),
            line: Vec::with_capacity(256),
            written: 0,
        }
    }

    /// Lines written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Give back the underlying writer (`None` once closed)
    pub fn into_inner(self) -> Option<W> {
        self.writer.map(BufWriter::into_inner)
    }

    fn closed(&self) -> ContractError {
        ContractError::SinkClosed {
            sink_name: self.name.clone(),
        }
    }

    fn io_error(&self, e: std::io::Error) -> ContractError {
        ContractError::sink_write(&self.name, e.to_string())
    }
}

impl JsonLinesSink<Stdout> {
    /// JSON lines on the process stdout
    pub fn stdout(name: impl Into<String>) -> Self {
        Self::new(name, tokio::io::stdout())
    }
}

impl JsonLinesSink<File> {
    /// Open `path` for appending, creating it if needed
    pub async fn create(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, ContractError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        debug!(path = %path.display(), "json lines file opened");
        Ok(Self::new(name, file))
    }
}

impl<W: AsyncWrite + Unpin + Send> TupleSink for JsonLinesSink<W> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "json_lines_sink_write",
        level = "trace",
        skip(self, tuple),
        fields(sink = %self.name, tuple_id = tuple.tuple_id)
    )]
    async fn write(&mut self, tuple: &AlignedTuple) -> Result<(), ContractError> {
        self.line.clear();
        serde_json::to_writer(&mut self.line, tuple)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        self.line.push(b'\n');

        let Some(writer) = self.writer.as_mut() else {
            return Err(self.closed());
        };
        if let Err(e) = writer.write_all(&self.line).await {
            return Err(self.io_error(e));
        }
        self.written += 1;
        Ok(())
    }

    #[instrument(name = "json_lines_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        if let Err(e) = writer.flush().await {
            return Err(self.io_error(e));
        }
        Ok(())
    }

    #[instrument(name = "json_lines_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush().await?;
        debug!(sink = %self.name, written = self.written, "JsonLinesSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Sample;

    fn tuple(id: u64) -> AlignedTuple {
        AlignedTuple::from_samples(id, &[Sample::new(1.0, 0.5), Sample::new(1.5, -0.5)])
    }

    #[tokio::test]
    async fn test_writes_one_line_per_tuple() {
        let mut sink = JsonLinesSink::new("mem", Vec::new());
        sink.write(&tuple(1)).await.unwrap();
        sink.write(&tuple(2)).await.unwrap();
        sink.close().await.unwrap();
        assert_eq!(sink.written(), 2);

        let bytes = sink.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: AlignedTuple = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed, tuple(2));
    }

    #[tokio::test]
    async fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("tuples.jsonl");

        let mut sink = FileSink::create("file", &path).await.unwrap();
        sink.write(&tuple(1)).await.unwrap();
        sink.close().await.unwrap();

        let mut sink = FileSink::create("file", &path).await.unwrap();
        sink.write(&tuple(2)).await.unwrap();
        sink.close().await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with(r#"{"tuple_id":1,"#));
    }
}
