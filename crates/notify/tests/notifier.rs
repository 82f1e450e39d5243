//! Integration tests for the notifier's summary-sniffing contract.

use std::sync::Mutex;

use assert_matches::assert_matches;
use async_trait::async_trait;
use dbhealth_core::alert::{AlertLine, Severity};
use dbhealth_core::artifact::RunStamp;
use dbhealth_core::summary::RunSummary;
use dbhealth_notify::notifier::ALERT_SUBJECT;
use dbhealth_notify::{
    inspect_latest, notify_latest, AlertSender, EmailError, Inspection, NotifyError, NotifyOutcome,
};
use dbhealth_store::{ReportDir, RunWriter, StoreError};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

#[async_trait]
impl AlertSender for RecordingSender {
    async fn send(&self, subject: &str, body: &str) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError::Build("relay refused connection".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}

fn write_summary(reports: &ReportDir, raw_stamp: &str, alerts: Vec<AlertLine>) {
    let stamp = RunStamp::parse(raw_stamp).expect("valid stamp");
    let mut writer = RunWriter::create(reports.clone(), stamp.clone()).expect("create writer");
    writer
        .write_summary(&RunSummary::new(stamp, alerts))
        .expect("write summary");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_summary_is_a_clean_no_op() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let sender = RecordingSender::default();

    let outcome = notify_latest(&ReportDir::new(dir.path()), &sender)
        .await
        .expect("no-op");

    assert_eq!(outcome, NotifyOutcome::NoSummary);
    assert!(sender.sent.lock().unwrap().is_empty());
}

#[test]
fn inspection_needs_no_mail_configuration() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let reports = ReportDir::new(dir.path());

    assert_eq!(inspect_latest(&reports).expect("no-op"), Inspection::NoSummary);

    write_summary(&reports, "20261016_110000", vec![]);
    assert_matches!(inspect_latest(&reports), Ok(Inspection::NoAlert { .. }));

    write_summary(
        &reports,
        "20261016_120000",
        vec![AlertLine::new(Severity::Crit, "Active sessions 150")],
    );
    assert_matches!(
        inspect_latest(&reports),
        Ok(Inspection::Alert { summary, body })
            if summary.ends_with("20261016_120000_summary.csv")
                && body.contains("CRIT: Active sessions 150")
    );
}

#[tokio::test]
async fn zero_alert_summary_sends_nothing() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let reports = ReportDir::new(dir.path());
    write_summary(&reports, "20261016_110000", vec![]);
    let sender = RecordingSender::default();

    let outcome = notify_latest(&reports, &sender).await.expect("no alert");

    assert_matches!(outcome, NotifyOutcome::NoAlert { .. });
    assert!(sender.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn alert_body_is_full_summary_text() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let reports = ReportDir::new(dir.path());
    write_summary(
        &reports,
        "20261016_110000",
        vec![AlertLine::new(Severity::Warn, "Active sessions 60")],
    );
    let sender = RecordingSender::default();

    let outcome = notify_latest(&reports, &sender).await.expect("sent");

    assert_matches!(outcome, NotifyOutcome::Sent { .. });
    let sent = sender.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, ALERT_SUBJECT);
    assert_eq!(
        sent[0].1,
        "metric,value\nalerts_count,1\nalert,WARN: Active sessions 60\n"
    );
}

#[tokio::test]
async fn only_the_latest_summary_counts() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let reports = ReportDir::new(dir.path());
    write_summary(
        &reports,
        "20261016_100000",
        vec![AlertLine::new(Severity::Crit, "Tablespace usage 99%")],
    );
    write_summary(&reports, "20261016_110000", vec![]);
    let sender = RecordingSender::default();

    let outcome = notify_latest(&reports, &sender).await.expect("no alert");

    assert_matches!(outcome, NotifyOutcome::NoAlert { summary } if summary.ends_with("20261016_110000_summary.csv"));
}

#[tokio::test]
async fn detection_matches_alert_count() {
    let cases = [
        vec![],
        vec![AlertLine::new(Severity::Warn, "Active sessions 55")],
        vec![
            AlertLine::new(Severity::Crit, "Tablespace usage 97%"),
            AlertLine::new(Severity::Crit, "Avg top SQL elapsed 8000 ms"),
        ],
    ];

    for alerts in cases {
        let dir = tempfile::tempdir().expect("create temp dir");
        let reports = ReportDir::new(dir.path());
        let expect_alert = !alerts.is_empty();
        write_summary(&reports, "20261016_120000", alerts);
        let sender = RecordingSender::default();

        let outcome = notify_latest(&reports, &sender).await.expect("notify");

        assert_eq!(matches!(outcome, NotifyOutcome::Sent { .. }), expect_alert);
    }
}

#[tokio::test]
async fn delivery_failure_is_fatal() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let reports = ReportDir::new(dir.path());
    write_summary(
        &reports,
        "20261016_110000",
        vec![AlertLine::new(Severity::Crit, "Active sessions 300")],
    );
    let sender = RecordingSender {
        fail: true,
        ..Default::default()
    };

    let err = notify_latest(&reports, &sender).await.unwrap_err();
    assert_matches!(err, NotifyError::Delivery(_));
}

#[tokio::test]
async fn malformed_summary_name_is_fatal() {
    let dir = tempfile::tempdir().expect("create temp dir");
    std::fs::write(
        dir.path().join("latest_summary.csv"),
        "metric,value\nalerts_count,1\nalert,CRIT: x\n",
    )
    .expect("write fixture");
    let sender = RecordingSender::default();

    let err = notify_latest(&ReportDir::new(dir.path()), &sender)
        .await
        .unwrap_err();

    assert_matches!(err, NotifyError::Store(StoreError::MalformedArtifact { .. }));
}
