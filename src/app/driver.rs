// ErrWarden - app/driver.rs
//
// Cycle driver: the polling loop that owns the pipeline context.
//
// One cycle:
//   Reading     drain the source (read, and in truncate mode, truncate)
//   Parsing     grammar matches -> assembled entries
//   Filtering   fresh ignore-list snapshot -> forwarded entries
//   Dispatching each entry, in order, to the store and notification fan-out
//   Sleeping    fixed interval
//
// There is no per-cycle recovery. Any error ends the loop and is handed back
// to the caller, which reports it through the same store and exits. A
// pipeline that keeps running after a failed read or write would lose
// records without anyone noticing.
//
// Single-threaded by construction: the only cross-process concern is the
// instance lock, taken before the driver is built.

use crate::app::sink::{EntrySink, SinkRecord};
use crate::core::grammar::LogGrammar;
use crate::core::model::LogEntry;
use crate::core::pipeline::{self, PipelineOutput};
use crate::core::suppression::IgnoreList;
use crate::platform::fs::SourceDrain;
use crate::util::constants;
use crate::util::error::{ErrWardenError, Result};
use std::convert::Infallible;
use std::time::Duration;

/// Counters for one completed cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub bytes_read: usize,
    pub matched_lines: usize,
    pub assembled: usize,
    pub suppressed: usize,
    pub dispatched: usize,
}

/// Pipeline context owned by the polling loop.
pub struct CycleDriver<I: IgnoreList, S: EntrySink> {
    drain: SourceDrain,
    grammar: LogGrammar,
    ignore_list: I,
    sink: S,
    hostname: String,
    poll_interval: Duration,
}

impl<I: IgnoreList, S: EntrySink> CycleDriver<I, S> {
    pub fn new(
        drain: SourceDrain,
        grammar: LogGrammar,
        ignore_list: I,
        sink: S,
        hostname: String,
        poll_interval: Duration,
    ) -> Self {
        Self {
            drain,
            grammar,
            ignore_list,
            sink,
            hostname,
            poll_interval,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run one Reading -> Dispatching pass (no sleep).
    pub fn run_cycle(&mut self) -> Result<CycleReport> {
        let content = self.drain.drain()?;
        let suppression = self.ignore_list.load()?;

        let PipelineOutput {
            matched_lines,
            assembled,
            suppressed,
            entries,
        } = pipeline::process_blob(&content, &self.grammar, &suppression)?;

        if suppressed > 0 {
            tracing::debug!(suppressed, "Dropped acknowledged entries");
        }

        for entry in &entries {
            self.dispatch(entry)?;
        }

        Ok(CycleReport {
            bytes_read: content.len(),
            matched_lines,
            assembled,
            suppressed,
            dispatched: entries.len(),
        })
    }

    /// Poll forever. Only returns on a fatal error.
    pub fn run(&mut self) -> Result<Infallible> {
        tracing::info!(
            source = %self.drain.path().display(),
            drain_mode = %self.drain.mode(),
            grammar = %self.grammar.id,
            interval_ms = self.poll_interval.as_millis() as u64,
            "Cycle driver started"
        );

        loop {
            let report = self.run_cycle()?;
            if report.dispatched > 0 || report.suppressed > 0 {
                tracing::debug!(?report, "Cycle complete");
            }
            std::thread::sleep(self.poll_interval);
        }
    }

    fn dispatch(&mut self, entry: &LogEntry) -> Result<()> {
        tracing::info!(
            target: constants::FORWARDED_LOG_TARGET,
            occurred_at = %entry.occurred_at,
            client = %entry.client_address,
            message = %entry.message,
            "Forwarding error"
        );
        let record = SinkRecord::from_entry(entry, &self.hostname, self.drain.path());
        self.sink.record(&record)?;
        self.sink.notify(&entry.message)?;
        Ok(())
    }

    /// Best-effort: write `err` into the store as a self-describing record.
    ///
    /// A failure here is only logged; the caller is already exiting.
    pub fn report_fatal(&mut self, err: &ErrWardenError) {
        report_fatal_to(&mut self.sink, &self.hostname, err);
    }
}

/// Pass `result` through, writing its error into `sink` first.
///
/// For startup steps that run after the store is open but before a
/// `CycleDriver` exists.
pub fn reported<T, E, S>(
    result: std::result::Result<T, E>,
    sink: &mut S,
    hostname: &str,
) -> Result<T>
where
    E: Into<ErrWardenError>,
    S: EntrySink,
{
    result.map_err(|e| {
        let err = e.into();
        report_fatal_to(sink, hostname, &err);
        err
    })
}

/// Write `err` into `sink` as a self-describing record, logging any failure.
pub fn report_fatal_to<S: EntrySink>(sink: &mut S, hostname: &str, err: &ErrWardenError) {
    let description = err.to_string();
    let occurred_at = chrono::Local::now()
        .format(constants::OCCURRED_AT_FORMAT)
        .to_string();
    let record = SinkRecord::self_report(&description, hostname, occurred_at);

    let result = sink.record(&record).and_then(|()| sink.notify(&description));
    if let Err(e) = result {
        tracing::error!(error = %e, "Could not write fatal error to the store");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Fingerprint, SuppressionSet};
    use crate::platform::fs::DrainMode;
    use crate::util::error::{ConfigError, IgnoreListError, SinkError};
    use std::cell::RefCell;
    use std::path::Path;

    #[derive(Default)]
    struct MemorySink {
        records: Vec<SinkRecord>,
        notifications: Vec<String>,
        fail: bool,
    }

    impl EntrySink for MemorySink {
        fn record(&mut self, record: &SinkRecord) -> std::result::Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Io {
                    path: "memory".into(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "store down"),
                });
            }
            self.records.push(record.clone());
            Ok(())
        }

        fn notify(&mut self, description: &str) -> std::result::Result<(), SinkError> {
            self.notifications.push(description.to_string());
            Ok(())
        }
    }

    /// Ignore list whose contents the test can change between cycles.
    #[derive(Default)]
    struct SharedIgnoreList(RefCell<Vec<Fingerprint>>);

    impl IgnoreList for &SharedIgnoreList {
        fn load(&self) -> std::result::Result<SuppressionSet, IgnoreListError> {
            Ok(self.0.borrow().iter().copied().collect())
        }
    }

    const BLOB: &str = "[Tue Jan 2 03:04:05.000000 2024] [error] [core] [client 10.0.0.1:443] AH001 Something broke\n\
                        [Tue Jan 2 03:04:05.000000 2024] [error] [core] [client 10.0.0.1:443] AH001  Stack trace: at foo\n";

    fn driver_for<'a>(
        path: &Path,
        ignore: &'a SharedIgnoreList,
    ) -> CycleDriver<&'a SharedIgnoreList, MemorySink> {
        CycleDriver::new(
            SourceDrain::new(path.to_path_buf(), DrainMode::Truncate),
            LogGrammar::apache_error(),
            ignore,
            MemorySink::default(),
            "web01".to_string(),
            Duration::from_millis(1),
        )
    }

    #[test]
    fn test_cycle_forwards_and_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("error.log");
        std::fs::write(&path, BLOB).unwrap();
        let ignore = SharedIgnoreList::default();
        let mut driver = driver_for(&path, &ignore);

        let report = driver.run_cycle().unwrap();

        assert_eq!(report.dispatched, 1);
        assert_eq!(report.matched_lines, 2);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
        let sink = driver.sink();
        assert_eq!(sink.records.len(), 1);
        assert_eq!(
            sink.records[0].escaped_message,
            "<pre>AH001 Something broke\n Stack trace: at foo</pre>"
        );
        assert_eq!(sink.records[0].occurred_at, "2024-01-02 03:04:05.000000");
        assert_eq!(sink.notifications, vec!["AH001 Something broke\n Stack trace: at foo"]);
    }

    #[test]
    fn test_acknowledged_error_is_not_forwarded_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("error.log");
        let ignore = SharedIgnoreList::default();
        let mut driver = driver_for(&path, &ignore);

        std::fs::write(&path, BLOB).unwrap();
        driver.run_cycle().unwrap();
        let fp = driver.sink().records[0].fingerprint;
        ignore.0.borrow_mut().push(fp);

        std::fs::write(&path, BLOB).unwrap();
        let report = driver.run_cycle().unwrap();

        assert_eq!(report.dispatched, 0);
        assert_eq!(report.suppressed, 1);
        assert_eq!(driver.sink().records.len(), 1);
    }

    #[test]
    fn test_empty_source_never_touches_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("error.log");
        std::fs::write(&path, "").unwrap();
        let ignore = SharedIgnoreList::default();
        let mut driver = driver_for(&path, &ignore);

        let report = driver.run_cycle().unwrap();

        assert_eq!(report, CycleReport::default());
        assert!(driver.sink().records.is_empty());
        assert!(driver.sink().notifications.is_empty());
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let ignore = SharedIgnoreList::default();
        let mut driver = driver_for(&dir.path().join("absent.log"), &ignore);

        assert!(matches!(driver.run_cycle(), Err(ErrWardenError::Source(_))));
        assert!(matches!(driver.run(), Err(ErrWardenError::Source(_))));
    }

    #[test]
    fn test_sink_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("error.log");
        std::fs::write(&path, BLOB).unwrap();
        let ignore = SharedIgnoreList::default();
        let mut driver = driver_for(&path, &ignore);
        driver.sink.fail = true;

        assert!(matches!(driver.run_cycle(), Err(ErrWardenError::Sink(_))));
    }

    #[test]
    fn test_report_fatal_writes_self_describing_record() {
        let dir = tempfile::tempdir().unwrap();
        let ignore = SharedIgnoreList::default();
        let mut driver = driver_for(&dir.path().join("absent.log"), &ignore);

        let err = driver.run_cycle().unwrap_err();
        driver.report_fatal(&err);

        let sink = driver.sink();
        assert_eq!(sink.records.len(), 1);
        assert_eq!(sink.records[0].meta, "web01\nerrwarden");
        assert!(sink.records[0].client_address.is_none());
        assert!(sink.records[0].escaped_message.contains("absent.log"));
        assert_eq!(sink.notifications.len(), 1);
    }

    #[test]
    fn test_reported_writes_startup_failure_to_sink() {
        let mut sink = MemorySink::default();
        let failed: std::result::Result<String, ConfigError> = Err(ConfigError::Hostname {
            source: std::io::Error::new(std::io::ErrorKind::Other, "uname failed"),
        });

        let result = reported(failed, &mut sink, "");

        assert!(matches!(result, Err(ErrWardenError::Config(_))));
        assert_eq!(sink.records.len(), 1);
        assert_eq!(sink.records[0].meta, "\nerrwarden");
        assert!(sink.records[0].escaped_message.contains("uname failed"));
        assert_eq!(sink.notifications.len(), 1);
    }

    #[test]
    fn test_reported_passes_success_through() {
        let mut sink = MemorySink::default();
        let ok: std::result::Result<u8, ConfigError> = Ok(7);

        assert_eq!(reported(ok, &mut sink, "web01").unwrap(), 7);
        assert!(sink.records.is_empty());
    }
}
