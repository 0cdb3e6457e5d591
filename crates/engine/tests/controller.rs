use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use engine::{
    FilterValue, ListController, ListError, ListSource, LoadStatus, Page, Poller, Query,
    RemoteError,
};

#[derive(Clone, Debug, PartialEq)]
struct Row {
    id: u32,
}

type Reply = oneshot::Sender<Result<Page<Row>, RemoteError>>;

/// Parks every fetch until the test answers it.
struct GatedSource {
    requests: mpsc::UnboundedSender<(Query, Reply)>,
}

#[async_trait]
impl ListSource<Row> for GatedSource {
    async fn fetch(&self, query: &Query) -> Result<Page<Row>, RemoteError> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send((query.clone(), tx))
            .map_err(|_| RemoteError::Transport("test harness gone".to_string()))?;
        rx.await
            .unwrap_or_else(|_| Err(RemoteError::Transport("reply dropped".to_string())))
    }
}

fn gated() -> (
    ListController<Row>,
    mpsc::UnboundedReceiver<(Query, Reply)>,
) {
    let (requests, rx) = mpsc::unbounded_channel();
    let controller = ListController::new(Arc::new(GatedSource { requests }), 10);
    (controller, rx)
}

fn page(ids: &[u32], total_pages: u32, current_page: u32) -> Page<Row> {
    Page {
        items: ids.iter().map(|&id| Row { id }).collect(),
        total_count: ids.len() as u64,
        current_page,
        total_pages,
        has_next: current_page < total_pages,
        has_previous: current_page > 1,
    }
}

fn ids(controller: &ListController<Row>) -> Vec<u32> {
    controller
        .result()
        .map(|page| page.items.iter().map(|row| row.id).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn late_response_for_old_query_is_discarded() {
    let (controller, mut requests) = gated();

    let first = controller
        .set_filter("status", Some("active".into()))
        .unwrap();
    let (old_query, old_reply) = requests.recv().await.unwrap();

    let second = controller.set_page(2).unwrap();
    let (new_query, new_reply) = requests.recv().await.unwrap();
    assert_eq!(new_query.page_number(), 2);
    assert_eq!(new_query.filters(), old_query.filters());

    new_reply.send(Ok(page(&[11, 12], 2, 2))).unwrap();
    second.await.unwrap();
    assert_eq!(ids(&controller), [11, 12]);

    old_reply.send(Ok(page(&[1, 2], 2, 1))).unwrap();
    first.await.unwrap();
    assert_eq!(ids(&controller), [11, 12]);
    assert!(matches!(controller.status(), LoadStatus::Succeeded(_)));
    assert_eq!(controller.generation(), 2);
}

#[tokio::test]
async fn early_response_for_old_query_is_not_shown_as_final() {
    let (controller, mut requests) = gated();

    let first = controller.set_filter("search", Some("ada".into())).unwrap();
    let (_, first_reply) = requests.recv().await.unwrap();
    let second = controller.set_filter("search", Some("obi".into())).unwrap();
    let (second_query, second_reply) = requests.recv().await.unwrap();

    first_reply.send(Ok(page(&[1], 1, 1))).unwrap();
    first.await.unwrap();
    // The newer query is still loading.
    assert!(controller.status().is_loading());
    assert!(controller.result().is_none());

    second_reply.send(Ok(page(&[2], 1, 1))).unwrap();
    second.await.unwrap();
    assert_eq!(ids(&controller), [2]);
    assert_eq!(
        second_query.filter("search"),
        Some(&FilterValue::from("obi"))
    );
}

#[tokio::test]
async fn failure_keeps_previous_page_visible() {
    let (controller, mut requests) = gated();

    let handle = controller.refresh().unwrap();
    let (_, reply) = requests.recv().await.unwrap();
    reply.send(Ok(page(&[1, 2, 3], 1, 1))).unwrap();
    handle.await.unwrap();

    let handle = controller.refresh().unwrap();
    assert!(controller.status().is_loading());
    assert_eq!(ids(&controller), [1, 2, 3]);

    let (_, reply) = requests.recv().await.unwrap();
    reply
        .send(Err(RemoteError::Server("Database timeout".to_string())))
        .unwrap();
    handle.await.unwrap();

    assert_eq!(controller.error().as_deref(), Some("Database timeout"));
    assert_eq!(ids(&controller), [1, 2, 3]);
    // Nothing is retried behind the operator's back.
    assert!(requests.try_recv().is_err());
}

#[tokio::test]
async fn refresh_reissues_identical_query() {
    let (controller, mut requests) = gated();

    let handle = controller
        .set_filter("status", Some("active".into()))
        .unwrap();
    let (first, reply) = requests.recv().await.unwrap();
    reply.send(Ok(page(&[1], 3, 1))).unwrap();
    handle.await.unwrap();

    let handle = controller.set_page(3).unwrap();
    let (_, reply) = requests.recv().await.unwrap();
    reply.send(Ok(page(&[7], 3, 3))).unwrap();
    handle.await.unwrap();

    let handle = controller.refresh().unwrap();
    let (refreshed, reply) = requests.recv().await.unwrap();
    reply.send(Ok(page(&[7], 3, 3))).unwrap();
    handle.await.unwrap();

    assert_eq!(refreshed.page_number(), 3);
    assert_eq!(refreshed.filters(), first.filters());
    assert_eq!(refreshed, controller.query());
}

#[tokio::test]
async fn blank_and_missing_filter_values_both_remove_the_key() {
    let (controller, mut requests) = gated();

    controller
        .set_filter("status", Some("active".into()))
        .unwrap();
    requests.recv().await.unwrap();

    controller.set_filter("status", Some("".into())).unwrap();
    let (blank, _) = requests.recv().await.unwrap();
    controller
        .set_filter("status", Some("active".into()))
        .unwrap();
    requests.recv().await.unwrap();
    controller.set_filter("status", None).unwrap();
    let (missing, _) = requests.recv().await.unwrap();

    assert_eq!(blank.params(), missing.params());
    assert!(blank.params().iter().all(|(key, _)| key != "status"));
}

#[tokio::test]
async fn set_page_is_bounded_by_last_result() {
    let (controller, mut requests) = gated();

    // Nothing known yet: any page from 1 is accepted.
    let handle = controller.set_page(2).unwrap();
    let (_, reply) = requests.recv().await.unwrap();
    reply.send(Ok(page(&[4], 3, 2))).unwrap();
    handle.await.unwrap();

    assert_eq!(
        controller.set_page(4).unwrap_err(),
        ListError::PageOutOfRange {
            requested: 4,
            total_pages: 3
        }
    );
    assert!(matches!(
        controller.set_page(0),
        Err(ListError::PageOutOfRange { requested: 0, .. })
    ));
    assert_eq!(controller.set_page_size(0).unwrap_err(), ListError::InvalidPageSize);
    // Rejected intents do not issue anything.
    assert!(requests.try_recv().is_err());
    assert_eq!(controller.query().page_number(), 2);
}

#[tokio::test]
async fn next_and_previous_follow_page_flags() {
    let (controller, mut requests) = gated();
    assert!(controller.next_page().is_none());

    let handle = controller.refresh().unwrap();
    let (_, reply) = requests.recv().await.unwrap();
    reply.send(Ok(page(&[1], 2, 1))).unwrap();
    handle.await.unwrap();
    assert!(controller.previous_page().is_none());

    let handle = controller.next_page().unwrap().unwrap();
    let (query, reply) = requests.recv().await.unwrap();
    assert_eq!(query.page_number(), 2);
    reply.send(Ok(page(&[2], 2, 2))).unwrap();
    handle.await.unwrap();

    assert!(controller.next_page().is_none());
    let handle = controller.previous_page().unwrap().unwrap();
    let (query, _reply) = requests.recv().await.unwrap();
    assert_eq!(query.page_number(), 1);
    drop(handle);
}

#[tokio::test]
async fn reset_restores_defaults() {
    let (controller, mut requests) = gated();

    controller
        .set_filter("status", Some("active".into()))
        .unwrap();
    requests.recv().await.unwrap();
    controller.set_page_size(50).unwrap();
    requests.recv().await.unwrap();

    controller.reset().unwrap();
    let (query, _) = requests.recv().await.unwrap();
    assert_eq!(query, Query::new(10));
}

#[tokio::test]
async fn three_active_items_end_to_end() {
    let (controller, mut requests) = gated();
    let changes = controller.subscribe();
    assert!(matches!(controller.status(), LoadStatus::Idle));

    let handle = controller
        .set_filter("status", Some("active".into()))
        .unwrap();
    let (query, reply) = requests.recv().await.unwrap();
    assert_eq!(
        query.params(),
        [
            ("pageNumber".to_string(), "1".to_string()),
            ("pageSize".to_string(), "10".to_string()),
            ("status".to_string(), "active".to_string()),
        ]
    );

    reply
        .send(Ok(Page {
            items: vec![Row { id: 1 }, Row { id: 2 }, Row { id: 3 }],
            total_count: 3,
            current_page: 1,
            total_pages: 1,
            has_next: false,
            has_previous: false,
        }))
        .unwrap();
    handle.await.unwrap();

    assert!(changes.has_changed().unwrap());
    let LoadStatus::Succeeded(result) = controller.status() else {
        panic!("expected a settled page");
    };
    assert_eq!(result.items, [Row { id: 1 }, Row { id: 2 }, Row { id: 3 }]);
    assert_eq!(result.total_count, 3);
}

#[tokio::test]
async fn closed_controller_ignores_late_responses() {
    let (controller, mut requests) = gated();

    let handle = controller.refresh().unwrap();
    let (_, reply) = requests.recv().await.unwrap();
    controller.close();

    let _ = reply.send(Ok(page(&[1], 1, 1)));
    assert!(handle.await.unwrap_err().is_cancelled());
    assert!(controller.result().is_none());
    assert!(controller.is_closed());
    assert_eq!(controller.refresh().unwrap_err(), ListError::Closed);
}

struct CountingSource {
    fetches: AtomicUsize,
}

#[async_trait]
impl ListSource<Row> for CountingSource {
    async fn fetch(&self, query: &Query) -> Result<Page<Row>, RemoteError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(page(&[1], 1, query.page_number()))
    }
}

#[tokio::test(start_paused = true)]
async fn poller_refreshes_until_controller_closes() {
    let source = Arc::new(CountingSource {
        fetches: AtomicUsize::new(0),
    });
    let controller = ListController::new(source.clone(), 10);
    let poller = Poller::start(controller.clone(), Duration::from_secs(30));

    tokio::time::sleep(Duration::from_secs(95)).await;
    assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
    assert!(poller.is_running());

    controller.close();
    tokio::time::sleep(Duration::from_secs(35)).await;
    assert!(!poller.is_running());
    assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn dropping_poller_stops_refreshing() {
    let source = Arc::new(CountingSource {
        fetches: AtomicUsize::new(0),
    });
    let controller = ListController::new(source.clone(), 10);

    let poller = Poller::start(controller.clone(), Duration::from_secs(10));
    tokio::time::sleep(Duration::from_secs(15)).await;
    drop(poller);
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
}
