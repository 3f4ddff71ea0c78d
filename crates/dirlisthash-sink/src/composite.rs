//! Fan-out over several sinks.

use std::path::Path;

use dirlisthash_core::{OutputFormat, OutputTarget, Record, RunConfig};
use tracing::{debug, warn};

use crate::error::SinkError;
use crate::sink::{RecordSink, open_sink};

/// Forwards every record to an ordered list of sinks.
///
/// Opening tolerates individual failures as long as one sink opens; the
/// failures are kept for the run outcome. Writing stops at the first
/// failing sink. Closing closes every sink and reports all failures.
pub struct CompositeSink {
    sinks: Vec<Box<dyn RecordSink>>,
    open_failures: Vec<SinkError>,
}

impl CompositeSink {
    /// Wrap already-opened sinks.
    pub fn new(sinks: Vec<Box<dyn RecordSink>>) -> Self {
        Self {
            sinks,
            open_failures: Vec::new(),
        }
    }

    /// Open a sink for each target.
    ///
    /// Fails only when no target could be opened.
    pub fn open(targets: &[OutputTarget], config: &RunConfig) -> Result<Self, SinkError> {
        let mut sinks = Vec::with_capacity(targets.len());
        let mut open_failures = Vec::new();

        for target in targets {
            match open_sink(target, config) {
                Ok(sink) => sinks.push(sink),
                Err(e) => {
                    warn!("{e}");
                    open_failures.push(e);
                }
            }
        }

        if sinks.is_empty() {
            return Err(SinkError::from_many(open_failures).unwrap_or_else(|| {
                SinkError::unavailable(
                    OutputFormat::Tabular,
                    Path::new(""),
                    std::io::Error::other("no output destinations"),
                )
            }));
        }

        debug!(
            opened = sinks.len(),
            failed = open_failures.len(),
            "opened outputs"
        );

        Ok(Self {
            sinks,
            open_failures,
        })
    }

    /// Number of open sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Check if there are no sinks.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Failures from targets that could not be opened.
    pub fn open_failures(&self) -> &[SinkError] {
        &self.open_failures
    }

    /// Take the open failures, leaving none behind.
    pub fn take_open_failures(&mut self) -> Vec<SinkError> {
        std::mem::take(&mut self.open_failures)
    }
}

impl RecordSink for CompositeSink {
    fn format(&self) -> OutputFormat {
        self.sinks
            .first()
            .map_or(OutputFormat::Tabular, |sink| sink.format())
    }

    fn destination(&self) -> &Path {
        self.sinks
            .first()
            .map_or(Path::new(""), |sink| sink.destination())
    }

    fn write(&mut self, record: &Record) -> Result<(), SinkError> {
        for sink in &mut self.sinks {
            sink.write(record)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let failures: Vec<SinkError> = self
            .sinks
            .iter_mut()
            .filter_map(|sink| sink.close().err())
            .collect();
        match SinkError::from_many(failures) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirlisthash_core::Timestamps;
    use std::sync::{Arc, Mutex};

    /// Records calls; fails on the configured operation.
    struct ScriptedSink {
        log: Arc<Mutex<Vec<String>>>,
        label: &'static str,
        fail_write: bool,
        fail_close: bool,
    }

    impl ScriptedSink {
        fn boxed(
            log: &Arc<Mutex<Vec<String>>>,
            label: &'static str,
            fail_write: bool,
            fail_close: bool,
        ) -> Box<dyn RecordSink> {
            Box::new(Self {
                log: Arc::clone(log),
                label,
                fail_write,
                fail_close,
            })
        }
    }

    impl RecordSink for ScriptedSink {
        fn format(&self) -> OutputFormat {
            OutputFormat::Tabular
        }

        fn destination(&self) -> &Path {
            Path::new(self.label)
        }

        fn write(&mut self, _record: &Record) -> Result<(), SinkError> {
            self.log.lock().unwrap().push(format!("write {}", self.label));
            if self.fail_write {
                return Err(SinkError::write(
                    self.format(),
                    self.destination(),
                    std::io::Error::other("disk full"),
                ));
            }
            Ok(())
        }

        fn close(&mut self) -> Result<(), SinkError> {
            self.log.lock().unwrap().push(format!("close {}", self.label));
            if self.fail_close {
                return Err(SinkError::close(
                    self.format(),
                    self.destination(),
                    std::io::Error::other("flush failed"),
                ));
            }
            Ok(())
        }
    }

    fn record() -> Record {
        Record::new_directory("/d", "d", Timestamps::default())
    }

    #[test]
    fn test_write_fans_out_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut composite = CompositeSink::new(vec![
            ScriptedSink::boxed(&log, "a", false, false),
            ScriptedSink::boxed(&log, "b", false, false),
        ]);

        composite.write(&record()).unwrap();
        composite.close().unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["write a", "write b", "close a", "close b"]
        );
    }

    #[test]
    fn test_write_failure_is_returned() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut composite = CompositeSink::new(vec![
            ScriptedSink::boxed(&log, "a", true, false),
            ScriptedSink::boxed(&log, "b", false, false),
        ]);

        let err = composite.write(&record()).unwrap_err();
        assert!(matches!(err, SinkError::Write { .. }));
        assert_eq!(*log.lock().unwrap(), vec!["write a"]);
    }

    #[test]
    fn test_close_collects_every_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut composite = CompositeSink::new(vec![
            ScriptedSink::boxed(&log, "a", false, true),
            ScriptedSink::boxed(&log, "b", false, false),
            ScriptedSink::boxed(&log, "c", false, true),
        ]);

        let err = composite.close().unwrap_err();
        let failures = err.into_failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[1].destination(), Some(Path::new("c")));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["close a", "close b", "close c"]
        );
    }

    #[test]
    fn test_open_with_no_targets_fails() {
        let config = RunConfig::new("/data");
        assert!(CompositeSink::open(&[], &config).is_err());
    }
}
