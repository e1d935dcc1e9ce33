mod common;

use anyhow::Result;
use async_trait::async_trait;
use common::{MemoryStore, RecordingEmbedder, faq};
use faq_sync::Reconciler;
use faq_sync::feed::FaqSource;
use faq_sync::scheduler::run_periodic;
use faq_sync::types::FaqRecord;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;
use tokio::time::{Duration, sleep, timeout};

/// Feed that takes a while to answer, so a pass can be caught mid-flight.
struct SlowFeed {
    delay: Duration,
    started: AtomicUsize,
}

#[async_trait]
impl FaqSource for SlowFeed {
    async fn fetch_faqs(&self) -> Result<Vec<FaqRecord>> {
        self.started.fetch_add(1, Ordering::SeqCst);
        sleep(self.delay).await;
        Ok(vec![
            faq("t1", "general_info", "How do I register", "portal"),
            faq("t2", "billing", "Can I pay later", "yes"),
        ])
    }
}

fn setup(delay: Duration) -> (Arc<SlowFeed>, Arc<MemoryStore>, Arc<Reconciler>) {
    let feed = Arc::new(SlowFeed {
        delay,
        started: AtomicUsize::new(0),
    });
    let store = Arc::new(MemoryStore::new());
    let reconciler = Arc::new(Reconciler::new(
        feed.clone(),
        Arc::new(RecordingEmbedder::new()),
        store.clone(),
    ));
    (feed, store, reconciler)
}

#[tokio::test]
async fn test_shutdown_between_passes_stops_promptly() {
    let (feed, _store, reconciler) = setup(Duration::ZERO);
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(run_periodic(reconciler, Duration::from_secs(3600), rx));

    sleep(Duration::from_millis(20)).await;
    tx.send(true).unwrap();

    timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();
    assert_eq!(feed.started.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_running_pass_finishes_before_stop() {
    let (feed, store, reconciler) = setup(Duration::from_millis(300));
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(run_periodic(reconciler, Duration::from_millis(10), rx));

    timeout(Duration::from_secs(5), async {
        while feed.started.load(Ordering::SeqCst) == 0 {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("scheduled pass never started");

    tx.send(true).unwrap();
    timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();

    assert_eq!(feed.started.load(Ordering::SeqCst), 1);
    assert_eq!(store.records().len(), 2);
}

#[tokio::test]
async fn test_dropped_sender_stops_the_loop() {
    let (_feed, _store, reconciler) = setup(Duration::ZERO);
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(run_periodic(reconciler, Duration::from_secs(3600), rx));

    drop(tx);

    timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();
}
