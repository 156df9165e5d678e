//! Batch-writing output sinks.
//!
//! Documents are handed over one collection batch at a time. The file sink
//! keeps one buffered writer per collection, opened lazily on first write.

use crate::error::{Error, Result};
use ahash::AHashMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;

/// Destination for transformed documents.
pub trait DocumentSink {
    fn write_batch(&mut self, collection: &str, docs: &[Value]) -> Result<()>;

    /// Flush everything written so far.
    fn finish(&mut self) -> Result<()>;

    /// Documents accepted per collection.
    fn counts(&self) -> BTreeMap<String, usize>;
}

/// Serialize `docs` and write them to `sink` in batches of `batch_size`.
/// Returns the number of documents written.
pub fn write_collection<T, I>(
    sink: &mut dyn DocumentSink,
    collection: &str,
    docs: I,
    batch_size: usize,
) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let batch_size = batch_size.max(1);
    let mut batch = Vec::with_capacity(batch_size);
    let mut written = 0;

    for doc in docs {
        let value = serde_json::to_value(&doc).map_err(|e| Error::Sink {
            collection: collection.to_string(),
            source: std::io::Error::from(e),
        })?;
        batch.push(value);
        if batch.len() >= batch_size {
            sink.write_batch(collection, &batch)?;
            written += batch.len();
            batch.clear();
        }
    }
    if !batch.is_empty() {
        sink.write_batch(collection, &batch)?;
        written += batch.len();
    }

    debug!(collection, written, "collection written");
    Ok(written)
}

struct CollectionWriter {
    writer: BufWriter<File>,
    count: usize,
}

impl CollectionWriter {
    fn new(filename: &Path) -> std::io::Result<Self> {
        let file = File::create(filename)?;
        Ok(Self {
            writer: BufWriter::with_capacity(WRITER_BUFFER_SIZE, file),
            count: 0,
        })
    }

    fn write_batch(&mut self, docs: &[Value]) -> std::io::Result<()> {
        for doc in docs {
            serde_json::to_writer(&mut self.writer, doc)?;
            self.writer.write_all(b"\n")?;
        }
        self.count += docs.len();
        self.writer.flush()
    }
}

/// One `<collection>.jsonl` file per collection under a directory.
pub struct JsonlSink {
    output_dir: PathBuf,
    writers: AHashMap<String, CollectionWriter>,
}

impl JsonlSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|source| Error::Sink {
            collection: output_dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            output_dir,
            writers: AHashMap::new(),
        })
    }

    pub fn path_for(&self, collection: &str) -> PathBuf {
        self.output_dir.join(format!("{}.jsonl", collection))
    }

    fn writer(&mut self, collection: &str) -> std::io::Result<&mut CollectionWriter> {
        use std::collections::hash_map::Entry;

        match self.writers.entry(collection.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let filename = self.output_dir.join(format!("{}.jsonl", collection));
                Ok(entry.insert(CollectionWriter::new(&filename)?))
            }
        }
    }
}

impl DocumentSink for JsonlSink {
    fn write_batch(&mut self, collection: &str, docs: &[Value]) -> Result<()> {
        let sink_err = |source| Error::Sink {
            collection: collection.to_string(),
            source,
        };
        self.writer(collection)
            .map_err(sink_err)?
            .write_batch(docs)
            .map_err(sink_err)
    }

    fn finish(&mut self) -> Result<()> {
        for (collection, writer) in self.writers.iter_mut() {
            writer.writer.flush().map_err(|source| Error::Sink {
                collection: collection.clone(),
                source,
            })?;
        }
        Ok(())
    }

    fn counts(&self) -> BTreeMap<String, usize> {
        self.writers
            .iter()
            .map(|(name, w)| (name.clone(), w.count))
            .collect()
    }
}

/// Keeps every document in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub collections: BTreeMap<String, Vec<Value>>,
    pub batches: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn docs(&self, collection: &str) -> &[Value] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl DocumentSink for MemorySink {
    fn write_batch(&mut self, collection: &str, docs: &[Value]) -> Result<()> {
        self.batches += 1;
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend_from_slice(docs);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    fn counts(&self) -> BTreeMap<String, usize> {
        self.collections
            .iter()
            .map(|(name, docs)| (name.clone(), docs.len()))
            .collect()
    }
}

/// Counts documents and discards them (dry runs).
#[derive(Debug, Default)]
pub struct CountingSink {
    counts: BTreeMap<String, usize>,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentSink for CountingSink {
    fn write_batch(&mut self, collection: &str, docs: &[Value]) -> Result<()> {
        *self.counts.entry(collection.to_string()).or_default() += docs.len();
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    fn counts(&self) -> BTreeMap<String, usize> {
        self.counts.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_write_collection_batches() {
        let mut sink = MemorySink::new();
        let docs = (0..7).map(|i| json!({ "n": i }));
        let written = write_collection(&mut sink, "nums", docs, 3).unwrap();
        assert_eq!(written, 7);
        assert_eq!(sink.batches, 3);
        assert_eq!(sink.docs("nums")[6]["n"], 6);
    }

    #[test]
    fn test_jsonl_sink_writes_lines() {
        let dir = TempDir::new().unwrap();
        let mut sink = JsonlSink::new(dir.path().join("out")).unwrap();
        sink.write_batch("users", &[json!({"a": 1}), json!({"a": 2})])
            .unwrap();
        sink.write_batch("users", &[json!({"a": 3})]).unwrap();
        sink.finish().unwrap();

        let text = fs::read_to_string(sink.path_for("users")).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines, vec![r#"{"a":1}"#, r#"{"a":2}"#, r#"{"a":3}"#]);
        assert_eq!(sink.counts()["users"], 3);
        assert!(!sink.path_for("plans").exists());
    }

    #[test]
    fn test_counting_sink() {
        let mut sink = CountingSink::new();
        write_collection(&mut sink, "a", vec![json!(1), json!(2)], 500).unwrap();
        assert_eq!(sink.counts()["a"], 2);
    }
}
