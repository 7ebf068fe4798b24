//! Integration tests for a full audit run against an in-memory source.

use std::collections::HashMap;
use std::sync::Mutex;

use ghameter_core::{
    enforce, run_audit, AlarmLimits, AlarmState, BillingPeriod, BillingPeriodSource,
    BillingSnapshot, BillingSource, CoreError, InclusionPolicy, OutputSink, RepositoryLister,
    RepositoryUsage, UsageByOs, WorkflowUsage, WorkflowUsageSource,
};

#[derive(Debug, thiserror::Error)]
#[error("transport failed for {0}")]
struct TransportError(String);

struct FakeSource {
    repos: Vec<(String, Vec<WorkflowUsage>)>,
    billing: BillingSnapshot,
    days_left: i64,
    failing_repo: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeSource {
    fn new(billing: BillingSnapshot) -> Self {
        Self {
            repos: Vec::new(),
            billing,
            days_left: 12,
            failing_repo: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn repo(mut self, name: &str, workflows: &[(&str, UsageByOs)]) -> Self {
        self.repos.push((
            name.to_string(),
            workflows
                .iter()
                .map(|(n, u)| WorkflowUsage::new(*n, *u))
                .collect(),
        ));
        self
    }
}

impl RepositoryLister for FakeSource {
    async fn list_repositories(&self, _org: &str) -> Result<Vec<String>, CoreError> {
        Ok(self.repos.iter().map(|(n, _)| n.clone()).collect())
    }
}

impl BillingPeriodSource for FakeSource {
    async fn billing_period(&self, _org: &str) -> Result<BillingPeriod, CoreError> {
        Ok(BillingPeriod {
            days_left: self.days_left,
        })
    }
}

impl WorkflowUsageSource for FakeSource {
    async fn repository_usage(&self, _org: &str, repo: &str) -> Result<RepositoryUsage, CoreError> {
        self.calls.lock().unwrap().push(repo.to_string());
        if self.failing_repo.as_deref() == Some(repo) {
            return Err(CoreError::upstream(TransportError(repo.to_string())));
        }
        let workflows = self
            .repos
            .iter()
            .find(|(n, _)| n == repo)
            .map(|(_, w)| w.clone())
            .unwrap_or_default();
        RepositoryUsage::from_workflows(repo, workflows)
    }
}

impl BillingSource for FakeSource {
    async fn billing_snapshot(&self, _org: &str) -> Result<BillingSnapshot, CoreError> {
        Ok(self.billing)
    }
}

#[derive(Default)]
struct MapSink(HashMap<String, String>);

impl OutputSink for MapSink {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), CoreError> {
        self.0.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

fn billing(included: i64, used: i64, paid: i64, breakdown: UsageByOs) -> BillingSnapshot {
    BillingSnapshot {
        included_minutes: included,
        total_minutes_used: used,
        total_paid_minutes_used: paid,
        minutes_used_breakdown: breakdown,
    }
}

#[tokio::test]
async fn test_audit_skips_empty_repos_but_keeps_totals() {
    let source = FakeSource::new(billing(2000, 10, 0, UsageByOs::new(10, 0, 0)))
        .repo("A", &[("build", UsageByOs::new(10, 0, 0))])
        .repo("B", &[]);

    let report = run_audit(
        &source,
        "acme",
        InclusionPolicy {
            skip_repos_without_usage: true,
        },
    )
    .await
    .unwrap();

    let names: Vec<&str> = report
        .usage
        .repositories
        .iter()
        .map(RepositoryUsage::name)
        .collect();
    assert_eq!(names, vec!["A"]);
    assert_eq!(report.usage.totals, UsageByOs::new(10, 0, 0));
    assert_eq!(report.usage.repositories_processed, 2);
    assert_eq!(report.period.days_left, 12);
    assert_eq!(report.reconciled.remaining_minutes, 1990);
    assert!(report.reconciled.drift.is_balanced());
}

#[tokio::test]
async fn test_audit_processes_repos_in_lister_order() {
    let source = FakeSource::new(billing(2000, 0, 0, UsageByOs::zero()))
        .repo("zeta", &[])
        .repo("alpha", &[("ci", UsageByOs::new(1, 0, 0))])
        .repo("mid", &[]);

    let report = run_audit(&source, "acme", InclusionPolicy::default())
        .await
        .unwrap();

    assert_eq!(*source.calls.lock().unwrap(), vec!["zeta", "alpha", "mid"]);
    let names: Vec<&str> = report
        .usage
        .repositories
        .iter()
        .map(RepositoryUsage::name)
        .collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
}

#[tokio::test]
async fn test_upstream_error_stops_the_run() {
    let mut source = FakeSource::new(billing(2000, 0, 0, UsageByOs::zero()))
        .repo("one", &[])
        .repo("two", &[])
        .repo("three", &[]);
    source.failing_repo = Some("two".to_string());

    let err = run_audit(&source, "acme", InclusionPolicy::default())
        .await
        .unwrap_err();

    match err {
        CoreError::Upstream(inner) => {
            assert!(inner.downcast_ref::<TransportError>().is_some());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(*source.calls.lock().unwrap(), vec!["one", "two"]);
}

#[tokio::test]
async fn test_remaining_minutes_alarm_end_to_end() {
    let source = FakeSource::new(billing(2000, 1995, 0, UsageByOs::new(1995, 0, 0)))
        .repo("api", &[("ci", UsageByOs::new(1995, 0, 0))]);

    let report = run_audit(&source, "acme", InclusionPolicy::default())
        .await
        .unwrap();
    let state = report.evaluate(&AlarmLimits {
        paid_usage_limit: 0,
        remaining_minutes_threshold: 10,
    });
    assert!(matches!(
        state,
        AlarmState::RemainingMinutesThresholdBreached {
            remaining_minutes: 5,
            ..
        }
    ));

    let mut sink = MapSink::default();
    let err = enforce(state, &mut sink).unwrap_err();
    assert!(err.is_threshold_breach());
    assert!(sink.0["failure-reason"].contains("you have 5 left"));
}

#[tokio::test]
async fn test_paid_alarm_wins_end_to_end() {
    let source = FakeSource::new(billing(2000, 2050, 50, UsageByOs::new(2050, 0, 0)))
        .repo("api", &[("ci", UsageByOs::new(2050, 0, 0))]);

    let report = run_audit(&source, "acme", InclusionPolicy::default())
        .await
        .unwrap();
    let state = report.evaluate(&AlarmLimits {
        paid_usage_limit: 20,
        remaining_minutes_threshold: 100,
    });

    let mut sink = MapSink::default();
    let err = enforce(state, &mut sink).unwrap_err();
    assert!(matches!(
        err,
        CoreError::PaidMinutesThresholdBreached {
            limit: 20,
            paid_minutes: 50
        }
    ));
    assert!(sink.0["failure-reason"].contains("limit of 20 paid minutes"));
}
