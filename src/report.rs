//! Event sink passed into the materializer, generator, and git helpers.

use std::fmt;
use std::time::Duration;

use camino::Utf8PathBuf;
#[cfg(test)]
use camino::Utf8Path;
use tracing::{error, info, warn};

use crate::error::{GitError, NodeError, SchemaError};

#[derive(Debug)]
pub enum Event {
    DirectoryCreated(Utf8PathBuf),
    FileCreated(Utf8PathBuf),
    NodeFailed(NodeError),
    SchemaRejected(SchemaError),
    Phase(PhaseTiming),
    ToolFailed(GitError),
    Notice(String),
}

pub trait Reporter {
    fn record(&mut self, event: Event);

    fn notice(&mut self, message: &str) {
        self.record(Event::Notice(message.to_owned()));
    }
}

/// Elapsed wall-clock time for one bulk phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseTiming {
    pub label: &'static str,
    pub count: usize,
    pub elapsed: Duration,
}

impl PhaseTiming {
    /// Per-item time; `None` when the phase produced nothing.
    pub fn average(&self) -> Option<Duration> {
        if self.count == 0 {
            return None;
        }
        let nanos = self.elapsed.as_nanos() / self.count as u128;
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }
}

impl fmt::Display for PhaseTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} items in {:.2?} (avg ",
            self.label, self.count, self.elapsed
        )?;
        match self.average() {
            Some(avg) => write!(f, "{:.2?})", avg),
            None => f.write_str("n/a)"),
        }
    }
}

/// Forwards events to the global `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingReporter {
    failures: usize,
}

impl TracingReporter {
    pub fn failures(&self) -> usize {
        self.failures
    }
}

impl Reporter for TracingReporter {
    fn record(&mut self, event: Event) {
        match event {
            Event::DirectoryCreated(path) => info!("[Creating dir] {}", path),
            Event::FileCreated(path) => info!("[Creating file] {}", path),
            Event::NodeFailed(err) => {
                self.failures += 1;
                error!("{err}");
            }
            Event::SchemaRejected(err) => {
                self.failures += 1;
                error!("{err}");
            }
            Event::Phase(timing) => info!("{timing}"),
            Event::ToolFailed(err) => warn!("{err}"),
            Event::Notice(message) => info!("{message}"),
        }
    }
}

/// Keeps every event in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryReporter {
    pub events: Vec<Event>,
}

#[cfg(test)]
impl MemoryReporter {
    pub fn created(&self) -> Vec<&Utf8Path> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::DirectoryCreated(path) | Event::FileCreated(path) => Some(path.as_path()),
                _ => None,
            })
            .collect()
    }

    pub fn node_failures(&self) -> Vec<&NodeError> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::NodeFailed(err) => Some(err),
                _ => None,
            })
            .collect()
    }

    pub fn schema_failures(&self) -> Vec<&SchemaError> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::SchemaRejected(err) => Some(err),
                _ => None,
            })
            .collect()
    }

    pub fn phases(&self) -> Vec<&PhaseTiming> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Phase(timing) => Some(timing),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl Reporter for MemoryReporter {
    fn record(&mut self, event: Event) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_is_none_for_empty_phase() {
        let timing = PhaseTiming {
            label: "make files",
            count: 0,
            elapsed: Duration::from_millis(3),
        };
        assert_eq!(timing.average(), None);
        assert!(timing.to_string().ends_with("(avg n/a)"));
    }

    #[test]
    fn average_divides_elapsed_by_count() {
        let timing = PhaseTiming {
            label: "make directories",
            count: 4,
            elapsed: Duration::from_millis(8),
        };
        assert_eq!(timing.average(), Some(Duration::from_millis(2)));
    }

    #[test]
    fn huge_counts_still_average() {
        let timing = PhaseTiming {
            label: "make files",
            count: usize::MAX,
            elapsed: Duration::from_secs(1),
        };
        assert_eq!(timing.average(), Some(Duration::ZERO));
    }

    #[test]
    fn tracing_reporter_counts_failures_only() {
        let mut reporter = TracingReporter::default();
        reporter.record(Event::FileCreated("a/b".into()));
        reporter.notice("hello");
        reporter.record(Event::SchemaRejected(SchemaError::AmbiguousRoot { count: 2 }));
        assert_eq!(reporter.failures(), 1);
    }
}
