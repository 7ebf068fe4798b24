//! HTTP-level tests for the GitHub client against a mock server.

use ghameter_core::{run_audit, CoreError, InclusionPolicy, UsageByOs};
use ghameter_fetch::{FetchError, GitHubClient, RetryStrategy};
use httpmock::prelude::*;
use serde_json::json;

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::with_base_url(&server.base_url(), "test-token")
        .unwrap()
        .with_retry_strategy(RetryStrategy::new(2).with_base_delay(0))
}

#[tokio::test]
async fn lists_repositories_across_pages() {
    let server = MockServer::start_async().await;

    let first = server.mock(|when, then| {
        when.method(GET)
            .path("/orgs/acme/repos")
            .query_param("sort", "full_name")
            .query_param("per_page", "100")
            .header("authorization", "Bearer test-token")
            .header("x-github-api-version", "2022-11-28");
        then.status(200)
            .header(
                "link",
                format!(
                    r#"<{}>; rel="next", <{}>; rel="last""#,
                    server.url("/orgs/acme/repos?page=2"),
                    server.url("/orgs/acme/repos?page=2")
                ),
            )
            .json_body(json!([{"name": "api"}, {"name": "billing"}]));
    });

    let second = server.mock(|when, then| {
        when.method(GET)
            .path("/orgs/acme/repos")
            .query_param("page", "2");
        then.status(200)
            .json_body(json!([{"name": "web"}]));
    });

    let names = client(&server)
        .fetch_repository_names("acme")
        .await
        .unwrap();

    assert_eq!(names, vec!["api", "billing", "web"]);
    first.assert();
    second.assert();
}

#[tokio::test]
async fn pagination_loop_is_an_error() {
    let server = MockServer::start_async().await;

    let first = server.mock(|when, then| {
        when.method(GET)
            .path("/orgs/acme/repos")
            .query_param("per_page", "100");
        then.status(200)
            .header(
                "link",
                format!(r#"<{}>; rel="next""#, server.url("/orgs/acme/repos?page=2")),
            )
            .json_body(json!([{"name": "api"}]));
    });

    let second = server.mock(|when, then| {
        when.method(GET)
            .path("/orgs/acme/repos")
            .query_param("page", "2");
        then.status(200)
            .header(
                "link",
                format!(r#"<{}>; rel="next""#, server.url("/orgs/acme/repos?page=2")),
            )
            .json_body(json!([{"name": "web"}]));
    });

    let err = client(&server)
        .fetch_repository_names("acme")
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::InvalidResponse(ref m) if m.contains("loops back")));
    first.assert();
    second.assert_hits(1);
}

#[tokio::test]
async fn collects_workflow_usage_for_repository() {
    let server = MockServer::start_async().await;

    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/api/actions/workflows");
        then.status(200).json_body(json!({
            "total_count": 2,
            "workflows": [
                {"id": 11, "name": "build", "path": ".github/workflows/build.yml", "state": "active"},
                {"id": 12, "name": "release", "path": ".github/workflows/release.yml", "state": "active"}
            ]
        }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/repos/acme/api/actions/workflows/11/timing");
        then.status(200).json_body(json!({
            "billable": {"UBUNTU": {"total_ms": 180000, "jobs": 2}}
        }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/repos/acme/api/actions/workflows/12/timing");
        then.status(200).json_body(json!({
            "billable": {
                "UBUNTU": {"total_ms": 240000, "jobs": 1},
                "MACOS": {"total_ms": 30000, "jobs": 1}
            }
        }));
    });

    let repo = client(&server)
        .fetch_repository_usage("acme", "api")
        .await
        .unwrap();

    assert_eq!(repo.name(), "api");
    assert_eq!(repo.usage(), UsageByOs::new(7, 1, 0));
    let names: Vec<&str> = repo.actions().iter().map(|w| w.name()).collect();
    assert_eq!(names, vec!["build", "release"]);
}

#[tokio::test]
async fn repository_usage_is_all_or_nothing() {
    let server = MockServer::start_async().await;

    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/api/actions/workflows");
        then.status(200).json_body(json!({
            "total_count": 2,
            "workflows": [{"id": 1, "name": "ok"}, {"id": 2, "name": "broken"}]
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/api/actions/workflows/1/timing");
        then.status(200)
            .json_body(json!({"billable": {"UBUNTU": {"total_ms": 60000}}}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/api/actions/workflows/2/timing");
        then.status(404).json_body(json!({"message": "Not Found"}));
    });

    let err = client(&server)
        .fetch_repository_usage("acme", "api")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::NotFound(_)));
}

#[tokio::test]
async fn retries_server_errors_then_gives_up() {
    let server = MockServer::start_async().await;

    let billing = server.mock(|when, then| {
        when.method(GET).path("/orgs/acme/settings/billing/actions");
        then.status(502).body("bad gateway");
    });

    let err = client(&server)
        .fetch_billing_snapshot("acme")
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::InvalidResponse(_)));
    billing.assert_hits(2);
}

#[tokio::test]
async fn rate_limit_is_reported_after_retries() {
    let server = MockServer::start_async().await;

    let limited = server.mock(|when, then| {
        when.method(GET).path("/orgs/acme/repos");
        then.status(429).header("retry-after", "0");
    });

    let err = client(&server)
        .fetch_repository_names("acme")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FetchError::RateLimited {
            retry_after: Some(0)
        }
    ));
    limited.assert_hits(2);
}

#[tokio::test]
async fn missing_billing_scope_is_an_auth_error() {
    let server = MockServer::start_async().await;

    server.mock(|when, then| {
        when.method(GET).path("/orgs/acme/settings/billing/actions");
        then.status(403)
            .json_body(json!({"message": "Must have admin rights to Repository."}));
    });

    let err = client(&server)
        .fetch_billing_snapshot("acme")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::AuthenticationFailed(_)));
}

#[tokio::test]
async fn full_audit_through_github_client() {
    let server = MockServer::start_async().await;

    server.mock(|when, then| {
        when.method(GET).path("/orgs/acme/repos");
        then.status(200)
            .json_body(json!([{"name": "api"}, {"name": "docs"}]));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/orgs/acme/settings/billing/shared-storage");
        then.status(200).json_body(json!({
            "days_left_in_billing_cycle": 9,
            "estimated_paid_storage_for_month": 0,
            "estimated_storage_for_month": 1
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/api/actions/workflows");
        then.status(200).json_body(json!({
            "total_count": 1,
            "workflows": [{"id": 5, "name": "ci"}]
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/api/actions/workflows/5/timing");
        then.status(200).json_body(json!({
            "billable": {"UBUNTU": {"total_ms": 600000}, "WINDOWS": {"total_ms": 120000}}
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/docs/actions/workflows");
        then.status(200)
            .json_body(json!({"total_count": 0, "workflows": []}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/orgs/acme/settings/billing/actions");
        then.status(200).json_body(json!({
            "total_minutes_used": 12,
            "total_paid_minutes_used": 0,
            "included_minutes": 2000,
            "minutes_used_breakdown": {"UBUNTU": 10, "MACOS": 0, "WINDOWS": 2}
        }));
    });

    let report = run_audit(
        &client(&server),
        "acme",
        InclusionPolicy {
            skip_repos_without_usage: true,
        },
    )
    .await
    .unwrap();

    assert_eq!(report.usage.totals, UsageByOs::new(10, 0, 2));
    assert_eq!(report.usage.repositories.len(), 1);
    assert_eq!(report.usage.repositories_processed, 2);
    assert_eq!(report.period.days_left, 9);
    assert_eq!(report.reconciled.remaining_minutes, 1988);
    assert!(report.reconciled.drift.is_balanced());
}

#[tokio::test]
async fn audit_surfaces_upstream_errors_unchanged() {
    let server = MockServer::start_async().await;

    server.mock(|when, then| {
        when.method(GET).path("/orgs/ghost/repos");
        then.status(404).json_body(json!({"message": "Not Found"}));
    });

    let err = run_audit(&client(&server), "ghost", InclusionPolicy::default())
        .await
        .unwrap_err();

    match err {
        CoreError::Upstream(inner) => {
            assert!(matches!(
                inner.downcast_ref::<FetchError>(),
                Some(FetchError::NotFound(_))
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
}
