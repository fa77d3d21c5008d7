//! Append-only event log
//!
//! One JSON record per line, append-only: a line once written is never
//! edited or removed. The log is the sole source of truth for state
//! reconstruction after a restart.
//!
//! Appends serialize through an internal lock; file reads open the log
//! independently, so a query sees a consistent snapshot of everything
//! appended before it started without ever blocking the append path.
//!
//! Deployments that opt out of durable storage (`eventLog: null`) get a
//! memory-backed log instead: the same interface, queryable over HTTP for
//! the process lifetime, empty again after a restart.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::data::{EventKind, PersistedEvent};
use ge_error::{GarageError, Result};

enum Backend {
    File {
        path: PathBuf,
        appender: Mutex<File>,
    },
    Memory(Mutex<Vec<PersistedEvent>>),
}

/// Durable, ordered, append-only store of sensor and state events
pub struct EventLog {
    backend: Backend,
}

impl EventLog {
    /// Open (or create) the log at `path`, creating parent directories
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| GarageError::FileWrite {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }
        let appender = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| GarageError::FileWrite {
                path: path.clone(),
                source: e,
            })?;
        debug!("Event log open at {:?}", path);
        Ok(Self {
            backend: Backend::File {
                path,
                appender: Mutex::new(appender),
            },
        })
    }

    /// A log with no durable storage; records live until the process exits
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(Vec::new())),
        }
    }

    /// Backing file, if this log has one
    pub fn path(&self) -> Option<&Path> {
        match &self.backend {
            Backend::File { path, .. } => Some(path),
            Backend::Memory(_) => None,
        }
    }

    /// Append one record and flush it to the OS.
    ///
    /// A failure here is recoverable for the caller: the in-memory state
    /// transition has already happened and is not rolled back.
    pub fn append(&self, event: &PersistedEvent) -> Result<()> {
        match &self.backend {
            Backend::File { path, appender } => {
                let line = serde_json::to_string(event)?;
                let mut file = appender.lock();
                writeln!(file, "{}", line).map_err(|e| GarageError::FileWrite {
                    path: path.clone(),
                    source: e,
                })?;
                file.flush().map_err(|e| GarageError::FileWrite {
                    path: path.clone(),
                    source: e,
                })
            }
            Backend::Memory(events) => {
                events.lock().push(event.clone());
                Ok(())
            }
        }
    }

    /// Read the last `n` records, oldest first, optionally filtered by kind.
    ///
    /// `n == 0` means no limit (the whole log). Malformed or partially
    /// written lines are skipped individually; they never abort the read.
    pub fn read_last(&self, n: usize, filter: Option<EventKind>) -> Result<Vec<PersistedEvent>> {
        let mut events = match &self.backend {
            Backend::File { path, .. } => Self::read_file(path, filter)?,
            Backend::Memory(events) => events
                .lock()
                .iter()
                .filter(|event| filter.map_or(true, |kind| event.kind == kind))
                .cloned()
                .collect(),
        };
        if n > 0 && events.len() > n {
            events.drain(..events.len() - n);
        }
        Ok(events)
    }

    /// The most recent `state` record, if any. Used at startup to seed the
    /// inference engine; an empty log seeds `Unknown`.
    pub fn last_state(&self) -> Result<Option<PersistedEvent>> {
        Ok(self.read_last(1, Some(EventKind::State))?.pop())
    }

    fn read_file(path: &Path, filter: Option<EventKind>) -> Result<Vec<PersistedEvent>> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(GarageError::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let mut events = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| GarageError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<PersistedEvent>(&line) {
                Ok(event) => {
                    if filter.map_or(true, |kind| event.kind == kind) {
                        events.push(event);
                    }
                }
                Err(e) => {
                    warn!(line = index + 1, error = %e, "Skipping malformed event log line");
                }
            }
        }
        Ok(events)
    }
}
