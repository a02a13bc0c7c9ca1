//! Follows the chat log from a background thread.
//!
//! The tailer owns the file and pushes complete lines into a [`LineQueue`];
//! the tick loop pops them from the front at its own pace.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};

const BOM: char = '\u{feff}';

/// Decodes one raw line, without its terminator or a leading byte order mark.
///
/// Returns `None` for blank lines and for bytes that are not UTF-8.
pub fn decode_line(raw: &[u8]) -> Option<&str> {
    match std::str::from_utf8(raw) {
        Ok(line) => {
            let line = line.trim_start_matches(BOM).trim_end_matches(['\r', '\n']);
            (!line.is_empty()).then_some(line)
        }
        Err(e) => {
            tracing::debug!(error = %e, "skipping undecodable line");
            None
        }
    }
}

/// Lines read but not yet processed.
#[derive(Debug, Default)]
pub struct LineQueue {
    lines: Mutex<VecDeque<String>>,
}

impl LineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, line: String) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(line);
    }

    /// Removes up to `max` lines from the front.
    pub fn drain(&self, max: usize) -> Vec<String> {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        let take = max.min(lines.len());
        lines.drain(..take).collect()
    }

    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle to the background reader. Dropping it stops the thread.
#[derive(Debug)]
pub struct LogTailer {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl LogTailer {
    /// Opens `path` and starts following it.
    ///
    /// Reading starts at the current end of the file unless `from_start` is
    /// set. The thread checks for new data every `poll`.
    pub fn spawn(
        path: &Path,
        from_start: bool,
        poll: Duration,
        queue: Arc<LineQueue>,
    ) -> Result<Self> {
        let mut file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let offset = if from_start {
            0
        } else {
            file.seek(SeekFrom::End(0))
                .with_context(|| format!("failed to seek {}", path.display()))?
        };
        tracing::info!(path = %path.display(), offset, "following chat log");

        let stop = Arc::new(AtomicBool::new(false));
        let follower = Follower {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            offset,
            pending: Vec::new(),
            queue,
        };
        let flag = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("log-tailer".to_string())
            .spawn(move || follower.run(&flag, poll))
            .context("failed to spawn log tailer")?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Stops the thread and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("log tailer thread panicked");
            }
        }
    }
}

impl Drop for LogTailer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Follower {
    path: PathBuf,
    reader: BufReader<File>,
    offset: u64,
    /// Bytes of a line whose terminator has not been written yet.
    pending: Vec<u8>,
    queue: Arc<LineQueue>,
}

impl Follower {
    fn run(mut self, stop: &AtomicBool, poll: Duration) {
        while !stop.load(Ordering::Relaxed) {
            match self.read_available() {
                Ok(0) => std::thread::sleep(poll),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "failed to read chat log");
                    std::thread::sleep(poll);
                }
            }
        }
        tracing::debug!("log tailer stopped");
    }

    /// Reads every complete line currently in the file. Returns how many
    /// lines were read.
    fn read_available(&mut self) -> std::io::Result<usize> {
        let len = std::fs::metadata(&self.path)?.len();
        if len < self.offset {
            tracing::info!(path = %self.path.display(), "chat log truncated, reading from start");
            self.offset = self.reader.seek(SeekFrom::Start(0))?;
            self.pending.clear();
        }

        let mut lines = 0;
        loop {
            let read = self.reader.read_until(b'\n', &mut self.pending)?;
            if read == 0 {
                return Ok(lines);
            }
            self.offset += read as u64;
            if self.pending.last() != Some(&b'\n') {
                // Partial line; the rest arrives with a later write.
                return Ok(lines);
            }
            lines += 1;
            if let Some(line) = decode_line(&self.pending) {
                self.queue.push(line.to_string());
            }
            self.pending.clear();
        }
    }
}
