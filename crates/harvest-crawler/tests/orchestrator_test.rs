//! Job lifecycle against a fake browser.

mod common;

use common::{fast_settings, links, FakeLauncher, FakeWeb, RecordingCapture};
use harvest_core::{JobId, JobStatus, PageStatus, PageVisit};
use harvest_crawler::{
    CrawlError, CrawlSettings, DatabaseSink, JobOrchestrator, MemorySink, ProgressSink,
};
use harvest_db::Database;
use std::sync::Arc;
use std::time::Duration;

fn orchestrator(
    launcher: FakeLauncher,
    sink: Arc<dyn ProgressSink>,
    settings: CrawlSettings,
) -> JobOrchestrator {
    JobOrchestrator::new(
        Arc::new(launcher),
        Arc::new(RecordingCapture::default()),
        sink,
        settings,
    )
}

fn seeds(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|url| (*url).to_string()).collect()
}

fn seed_row<'a>(visits: &'a [PageVisit], seed: &str) -> &'a PageVisit {
    visits
        .iter()
        .find(|v| v.is_seed() && v.url == seed)
        .unwrap_or_else(|| panic!("no seed row for {seed}"))
}

async fn wait_for_seed_status(
    sink: &dyn ProgressSink,
    job_id: &JobId,
    seed: &str,
    status: PageStatus,
) {
    for _ in 0..200 {
        let visits = sink.page_visits(job_id).await.unwrap();
        if visits
            .iter()
            .any(|v| v.is_seed() && v.url == seed && v.status == status)
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{seed} never reached {status}");
}

#[tokio::test]
async fn test_failed_site_does_not_fail_job() {
    let web = Arc::new(
        FakeWeb::new()
            .page("https://a.com", "<p>a@a.com</p>")
            .page("https://c.com", "<p>c@c.com</p>"),
    );
    let sink = Arc::new(MemorySink::new());
    let handle = orchestrator(FakeLauncher::new(web.clone()), sink.clone(), fast_settings())
        .submit(seeds(&["https://a.com", "https://b.com", "https://c.com"]))
        .await
        .unwrap();
    let job_id = handle.job_id().clone();

    let outcome = handle.wait().await.unwrap();
    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(
        outcome.results.keys().collect::<Vec<_>>(),
        vec!["https://a.com", "https://c.com"]
    );
    assert_eq!(outcome.results["https://a.com"].emails, vec!["a@a.com"]);

    let job = sink.get_job(&job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.completed_at.is_some());
    assert_eq!(job.results, Some(outcome.results));

    let visits = sink.page_visits(&job_id).await.unwrap();
    let failed = seed_row(&visits, "https://b.com");
    assert_eq!(failed.status, PageStatus::Failed);
    assert!(failed.message.as_deref().unwrap().contains("unreachable"));
    assert_eq!(seed_row(&visits, "https://a.com").status, PageStatus::Completed);
    assert_eq!(
        seed_row(&visits, "https://a.com").message.as_deref(),
        Some("1 pages fetched, 0 failed")
    );
    assert_eq!(web.shutdowns(), 1);
}

#[tokio::test]
async fn test_context_failure_isolated_per_site() {
    let web = Arc::new(
        FakeWeb::new()
            .page("https://a.com", "<p>a@a.com</p>")
            .failing_contexts(),
    );
    let sink = Arc::new(MemorySink::new());
    let handle = orchestrator(FakeLauncher::new(web.clone()), sink.clone(), fast_settings())
        .submit(seeds(&["https://a.com", "https://b.com"]))
        .await
        .unwrap();
    let job_id = handle.job_id().clone();

    let outcome = handle.wait().await.unwrap();
    assert_eq!(outcome.status, JobStatus::Completed);
    assert!(outcome.results.is_empty());
    assert!(web.fetches().is_empty());

    let visits = sink.page_visits(&job_id).await.unwrap();
    assert_eq!(visits.len(), 2);
    assert!(visits.iter().all(|v| v.status == PageStatus::Failed));
    assert_eq!(web.shutdowns(), 1);
}

#[tokio::test]
async fn test_launch_failure_attempts_no_site() {
    let web = Arc::new(FakeWeb::new().page("https://a.com", "<p>a@a.com</p>"));
    let sink = Arc::new(MemorySink::new());
    let handle = orchestrator(FakeLauncher::broken(web.clone()), sink.clone(), fast_settings())
        .submit(seeds(&["https://a.com"]))
        .await
        .unwrap();
    let job_id = handle.job_id().clone();

    assert!(matches!(handle.wait().await, Err(CrawlError::JobInit(_))));
    assert!(web.fetches().is_empty());
    assert_eq!(web.shutdowns(), 0);

    let job = sink.get_job(&job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_message.unwrap().contains("no browser binary"));
}

#[tokio::test]
async fn test_seed_reached_from_another_seed_keeps_its_row() {
    let web = Arc::new(
        FakeWeb::new()
            .page("https://acme.com/contact", "<p>sales@acme.com</p>")
            .page("https://acme.com", &links(&["/contact", "/about"]))
            .page("https://acme.com/about", &links(&[])),
    );
    let sink = Arc::new(MemorySink::new());
    let handle = orchestrator(FakeLauncher::new(web.clone()), sink.clone(), fast_settings())
        .with_max_concurrent_sites(1)
        .submit(seeds(&["https://acme.com/contact", "https://acme.com"]))
        .await
        .unwrap();
    let job_id = handle.job_id().clone();

    let outcome = handle.wait().await.unwrap();
    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.results["https://acme.com"].emails, vec!["sales@acme.com"]);

    let visits = sink.page_visits(&job_id).await.unwrap();
    let contact_rows: Vec<_> = visits
        .iter()
        .filter(|v| v.url == "https://acme.com/contact")
        .collect();
    assert_eq!(contact_rows.len(), 1);
    assert!(contact_rows[0].is_seed());
    assert_eq!(contact_rows[0].status, PageStatus::Completed);
    assert_eq!(
        contact_rows[0].message.as_deref(),
        Some("1 pages fetched, 0 failed")
    );

    let about = visits
        .iter()
        .find(|v| v.url == "https://acme.com/about")
        .expect("sub-page row");
    assert_eq!(about.seed_url, "https://acme.com");
}

#[tokio::test]
async fn test_cancel_keeps_finished_sites() {
    let web = Arc::new(
        FakeWeb::new()
            .page("https://a.com", "<p>a@a.com</p>")
            .hanging("https://slow.com"),
    );
    let sink = Arc::new(MemorySink::new());
    let settings = CrawlSettings {
        navigate_timeout: Duration::from_secs(60),
        ..fast_settings()
    };
    let handle = orchestrator(FakeLauncher::new(web.clone()), sink.clone(), settings)
        .submit(seeds(&["https://a.com", "https://slow.com"]))
        .await
        .unwrap();
    let job_id = handle.job_id().clone();

    wait_for_seed_status(sink.as_ref(), &job_id, "https://a.com", PageStatus::Completed).await;
    handle.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("job stops after cancel")
        .unwrap();
    assert_eq!(outcome.status, JobStatus::Cancelled);
    assert!(outcome.results.contains_key("https://a.com"));
    assert!(!outcome.results.contains_key("https://slow.com"));

    let job = sink.get_job(&job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert!(job.completed_at.is_some());

    let visits = sink.page_visits(&job_id).await.unwrap();
    let cancelled = seed_row(&visits, "https://slow.com");
    assert_eq!(cancelled.status, PageStatus::Failed);
    assert_eq!(cancelled.message.as_deref(), Some("cancelled"));
    assert_eq!(web.shutdowns(), 1);
}

#[tokio::test]
async fn test_concurrent_sites_bounded() {
    let urls: Vec<String> = (0..6).map(|i| format!("https://site{i}.com")).collect();
    let mut web = FakeWeb::new().with_fetch_delay(Duration::from_millis(30));
    for url in &urls {
        web = web.page(url, &links(&[]));
    }
    let web = Arc::new(web);
    let sink = Arc::new(MemorySink::new());

    let outcome = orchestrator(FakeLauncher::new(web.clone()), sink, fast_settings())
        .with_max_concurrent_sites(2)
        .submit(urls)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 6);
    assert_eq!(web.contexts_opened(), 6);
    assert!(web.peak_contexts() <= 2);
    assert!(web.peak_contexts() >= 1);
}

#[tokio::test]
async fn test_database_sink_end_to_end() {
    let web = Arc::new(
        FakeWeb::new()
            .page(
                "https://acme.com",
                r#"<a href="/contact">Contact</a><a href="https://instagram.com/acme">IG</a>"#,
            )
            .page("https://acme.com/contact", "<p>hello [at] acme [dot] com</p>"),
    );
    let db = Database::open(":memory:", 1).await.unwrap();
    let sink: Arc<dyn ProgressSink> = Arc::new(DatabaseSink::new(db));

    let handle = orchestrator(FakeLauncher::new(web), sink.clone(), fast_settings())
        .submit(seeds(&["https://acme.com"]))
        .await
        .unwrap();
    let job_id = handle.job_id().clone();
    handle.wait().await.unwrap();

    let job = sink.get_job(&job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    let result = &job.results.unwrap()["https://acme.com"];
    assert_eq!(result.emails, vec!["hello@acme.com"]);
    assert_eq!(result.instagram, vec!["https://instagram.com/acme"]);

    let visits = sink.page_visits(&job_id).await.unwrap();
    assert_eq!(visits.len(), 2);
    assert!(visits.iter().all(|v| v.status == PageStatus::Completed));
}
