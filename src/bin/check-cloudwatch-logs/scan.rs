//! The incremental scan loop
//!
//! Each run picks up where the previous one left off: load the cursor for
//! this invocation, page through `FilterLogEvents` from its window start,
//! and persist a new cursor when pagination was in play. Fresh runs (no
//! usable cursor) look back over a short window instead of the full stream.

use std::fmt;
use std::thread::sleep;
use std::time::Duration;

use chrono::Utc;
use derive_more::From;

use crate::cloudwatch::{
    CloudWatchError, CloudWatchLogs, FilterLogEventsRequest, FilteredLogEvent,
};
use crate::state::{CursorStore, ScanCursor, StateError};

/// A persisted cursor whose window start is older than this is discarded in
/// favor of a fresh window.
const CURSOR_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// How far back a scan looks when there is no usable cursor.
const FRESH_WINDOW: Duration = Duration::from_secs(60);

/// Courtesy pause between dependent page fetches.
const PAGE_PAUSE: Duration = Duration::from_millis(250);

#[derive(Debug, From)]
pub(crate) enum ScanError {
    /// The query failed part way through pagination
    CloudWatch(CloudWatchError),
    /// The cursor could not be read or written
    State(StateError),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanError::CloudWatch(e) => write!(f, "{}", e),
            ScanError::State(e) => write!(f, "{}", e),
        }
    }
}

pub(crate) struct LogScanner<'a> {
    service: &'a dyn CloudWatchLogs,
    store: &'a CursorStore,
    log_group_name: &'a str,
    pattern: &'a str,
}

impl<'a> LogScanner<'a> {
    pub fn new(
        service: &'a dyn CloudWatchLogs,
        store: &'a CursorStore,
        log_group_name: &'a str,
        pattern: &'a str,
    ) -> LogScanner<'a> {
        LogScanner {
            service,
            store,
            log_group_name,
            pattern,
        }
    }

    /// Collect every event matching the pattern since the last checkpoint.
    ///
    /// The new cursor is only written when this run held a continuation
    /// token as the loop ended, either one returned by the API or one
    /// resumed from state whose first page turned out to be final. A
    /// single-page run with no resumed token leaves existing state alone,
    /// so the next run starts another fresh window.
    pub fn scan(&self) -> Result<Vec<FilteredLogEvent>, ScanError> {
        // Second-resolution now, like the window arithmetic everywhere else.
        let now_ms = Utc::now().timestamp() * 1000;

        let mut next_token = None;
        let mut resumed_start = None;
        if let Some(cursor) = self.store.load()? {
            if let Some(saved_start) = cursor.start_time {
                if saved_start > now_ms - CURSOR_MAX_AGE.as_millis() as i64 {
                    next_token = cursor.next_token;
                    resumed_start = Some(saved_start);
                }
            }
        }
        let mut window_start =
            resumed_start.unwrap_or(now_ms - FRESH_WINDOW.as_millis() as i64);

        let mut events = Vec::new();
        loop {
            let response = self.service.filter_log_events(&FilterLogEventsRequest {
                log_group_name: self.log_group_name.to_owned(),
                filter_pattern: self.pattern.to_owned(),
                start_time: Some(window_start),
                next_token: next_token.clone(),
            })?;
            for event in response.events {
                if event.timestamp + 1 > window_start {
                    window_start = event.timestamp + 1;
                }
                events.push(event);
            }
            match response.next_token {
                Some(token) => {
                    next_token = Some(token);
                    sleep(PAGE_PAUSE);
                }
                None => break,
            }
        }

        if next_token.is_some() {
            self.store.save(&ScanCursor {
                next_token,
                start_time: Some(window_start),
            })?;
        }
        Ok(events)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::fs;

    use tempfile::TempDir;

    use crate::cloudwatch::ApiError;
    use crate::test::{page, FakeCloudWatchLogs};

    fn now_ms() -> i64 {
        Utc::now().timestamp() * 1000
    }

    fn store(dir: &TempDir) -> CursorStore {
        CursorStore::new(dir.path(), "sample-0123abcd.json")
    }

    #[test]
    fn fresh_scans_use_a_short_window_and_leave_no_state() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let service = FakeCloudWatchLogs::new(vec![Ok(page(
            &[("ERROR one\n", 1_500_000_000_000)],
            None,
        ))]);

        let before = now_ms();
        let events = LogScanner::new(&service, &store, "sample", "ERROR")
            .scan()
            .unwrap();
        let after = now_ms();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "ERROR one\n");
        assert!(!store.path().exists(), "single-page scans must not checkpoint");

        let requests = service.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].log_group_name, "sample");
        assert_eq!(requests[0].filter_pattern, "ERROR");
        assert_eq!(requests[0].next_token, None);
        let window_start = requests[0].start_time.unwrap();
        assert!(window_start >= before - 60_000 && window_start <= after - 60_000);
    }

    #[test]
    fn resumed_cursors_reuse_token_and_window_start() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let saved_start = now_ms() - 10_000;
        store
            .save(&ScanCursor {
                next_token: Some("resume-token".to_owned()),
                start_time: Some(saved_start),
            })
            .unwrap();
        let service = FakeCloudWatchLogs::new(vec![
            Ok(page(
                &[("ERROR one\n", saved_start + 1_000)],
                Some("page-2"),
            )),
            Ok(page(&[("ERROR two\n", saved_start + 2_000)], None)),
        ]);

        let events = LogScanner::new(&service, &store, "sample", "ERROR")
            .scan()
            .unwrap();
        assert_eq!(events.len(), 2);

        let requests = service.requests.borrow();
        assert_eq!(requests[0].next_token, Some("resume-token".to_owned()));
        assert_eq!(requests[0].start_time, Some(saved_start));
        assert_eq!(requests[1].next_token, Some("page-2".to_owned()));

        // Persisted token is the one used for the final page fetch.
        assert_eq!(
            store.load().unwrap(),
            Some(ScanCursor {
                next_token: Some("page-2".to_owned()),
                start_time: Some(saved_start + 2_001),
            })
        );
    }

    #[test]
    fn a_resumed_token_is_saved_back_even_when_the_first_page_is_final() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let saved_start = now_ms() - 10_000;
        store
            .save(&ScanCursor {
                next_token: Some("resume-token".to_owned()),
                start_time: Some(saved_start),
            })
            .unwrap();
        let service = FakeCloudWatchLogs::new(vec![Ok(page(
            &[("ERROR one\n", saved_start + 5_000)],
            None,
        ))]);

        LogScanner::new(&service, &store, "sample", "ERROR")
            .scan()
            .unwrap();

        assert_eq!(
            store.load().unwrap(),
            Some(ScanCursor {
                next_token: Some("resume-token".to_owned()),
                start_time: Some(saved_start + 5_001),
            })
        );
    }

    #[test]
    fn stale_cursors_are_discarded_and_left_untouched() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let stale = ScanCursor {
            next_token: Some("stale-token".to_owned()),
            start_time: Some(now_ms() - 2 * 3_600_000),
        };
        store.save(&stale).unwrap();
        let service = FakeCloudWatchLogs::new(vec![Ok(page(&[], None))]);

        let before = now_ms();
        let events = LogScanner::new(&service, &store, "sample", "ERROR")
            .scan()
            .unwrap();
        let after = now_ms();

        assert!(events.is_empty());
        let requests = service.requests.borrow();
        assert_eq!(requests[0].next_token, None, "stale pagination must not resume");
        let window_start = requests[0].start_time.unwrap();
        assert!(window_start >= before - 60_000 && window_start <= after - 60_000);
        assert_eq!(store.load().unwrap(), Some(stale));
    }

    #[test]
    fn multi_page_scans_persist_the_advanced_cursor() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        // Event timestamps sit past the fresh window so they pull it forward.
        let base = now_ms();
        let service = FakeCloudWatchLogs::new(vec![
            Ok(page(&[("ERROR one\n", base + 1_000)], Some("page-2"))),
            Ok(page(&[("ERROR two\n", base + 3_000)], None)),
        ]);

        let events = LogScanner::new(&service, &store, "sample", "ERROR")
            .scan()
            .unwrap();
        assert_eq!(
            events.iter().map(|e| e.message.as_str()).collect::<Vec<_>>(),
            vec!["ERROR one\n", "ERROR two\n"]
        );

        let requests = service.requests.borrow();
        assert_eq!(requests[1].start_time, Some(base + 1_001));
        assert_eq!(requests[1].next_token, Some("page-2".to_owned()));
        assert_eq!(
            store.load().unwrap(),
            Some(ScanCursor {
                next_token: Some("page-2".to_owned()),
                start_time: Some(base + 3_001),
            })
        );
    }

    #[test]
    fn window_start_advances_to_the_newest_event_seen() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        // Pages can arrive out of timestamp order; an older trailing event
        // must not pull the window back behind the newest one.
        let base = now_ms();
        let service = FakeCloudWatchLogs::new(vec![
            Ok(page(
                &[("ERROR new\n", base + 5_000), ("ERROR old\n", base + 2_000)],
                Some("page-2"),
            )),
            Ok(page(&[], None)),
        ]);

        LogScanner::new(&service, &store, "sample", "ERROR")
            .scan()
            .unwrap();

        let requests = service.requests.borrow();
        assert_eq!(requests[1].start_time, Some(base + 5_001));
        assert_eq!(
            store.load().unwrap(),
            Some(ScanCursor {
                next_token: Some("page-2".to_owned()),
                start_time: Some(base + 5_001),
            })
        );
    }

    #[test]
    fn query_failures_abort_without_writing_state() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let service = FakeCloudWatchLogs::new(vec![
            Ok(page(&[("ERROR one\n", 1_000)], Some("page-2"))),
            Err(CloudWatchError::Api(ApiError {
                status: 400,
                kind: "ThrottlingException".to_owned(),
                message: "Rate exceeded".to_owned(),
            })),
        ]);

        let err = LogScanner::new(&service, &store, "sample", "ERROR")
            .scan()
            .unwrap_err();
        assert!(err.to_string().contains("ThrottlingException"));
        assert!(!store.path().exists(), "no partial cursor after a failed scan");
    }

    #[cfg(unix)]
    #[test]
    fn cursor_write_failures_fail_the_run_after_a_clean_scan() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        // The state file is a symlink into a directory that does not exist:
        // loading sees no file, saving cannot write one.
        symlink(dir.path().join("gone").join("cursor.json"), store.path()).unwrap();
        let base = now_ms();
        let service = FakeCloudWatchLogs::new(vec![
            Ok(page(&[("ERROR one\n", base + 1_000)], Some("page-2"))),
            Ok(page(&[], None)),
        ]);

        let err = LogScanner::new(&service, &store, "sample", "ERROR")
            .scan()
            .unwrap_err();
        assert!(matches!(err, ScanError::State(StateError::Write { .. })));
        assert_eq!(
            service.requests.borrow().len(),
            2,
            "every page was fetched before the write failed"
        );
    }

    #[test]
    fn corrupt_state_aborts_before_any_query() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), b"{ not json").unwrap();
        let service = FakeCloudWatchLogs::new(vec![]);

        let err = LogScanner::new(&service, &store, "sample", "ERROR")
            .scan()
            .unwrap_err();
        assert!(matches!(err, ScanError::State(StateError::Corrupt { .. })));
        assert!(service.requests.borrow().is_empty());
    }
}
