//! Multi-stream output sinks for graph serialization.
//!
//! `TripleStore::write` produces one document per named graph. The sink
//! hands out one named stream at a time; the returned writer is dropped
//! (and with it flushed and closed) before the next stream is requested,
//! so at most one output resource is open during a serialization pass.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

/// Destination for serialized graphs: one named output stream per graph.
pub trait OutputSink {
    fn open<'a>(&'a mut self, name: &str) -> io::Result<Box<dyn Write + 'a>>;
}

/// Writes each graph to `<dir>/<name>`.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl OutputSink for DirectorySink {
    fn open<'a>(&'a mut self, name: &str) -> io::Result<Box<dyn Write + 'a>> {
        // Unbuffered: write errors must reach the serializer, not a drop.
        let file = File::create(self.dir.join(name))?;
        Ok(Box::new(file))
    }
}

/// Collects every stream in memory, in open order. Meant for tests and
/// diagnostics.
#[derive(Debug, Default)]
pub struct MemorySink {
    streams: Vec<(String, Vec<u8>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream names in the order they were opened.
    pub fn names(&self) -> Vec<&str> {
        self.streams.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Bytes of the first stream written under `name`.
    pub fn contents(&self, name: &str) -> Option<&[u8]> {
        self.streams
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b.as_slice())
    }
}

impl OutputSink for MemorySink {
    fn open<'a>(&'a mut self, name: &str) -> io::Result<Box<dyn Write + 'a>> {
        let index = self.streams.len();
        self.streams.push((name.to_string(), Vec::new()));
        Ok(Box::new(&mut self.streams[index].1))
    }
}
