//! Live lists over the in-memory chain: first page, live merge, paging,
//! filter changes and failures.

use crate::fixtures::{eventually, extrinsic, inherent, init_test_logging, seed_chain, wait_for, within};
use ex_02_live_list::{
    CallFilter, EventFilter, FetchError, ListError, ListFailure, ListStatus, LiveListApi,
    LiveListConfig, LiveListController, SubscriptionError,
};
use shared_bus::InMemoryChain;
use shared_types::entities::{BlockNumber, EntityKind, Event, Extrinsic, NetworkId, PageKey};
use shared_types::errors::TransportError;
use shared_types::ordering::Sequenced;
use std::sync::Arc;
use std::time::Duration;

type ExtrinsicList = LiveListController<Extrinsic, InMemoryChain>;

fn config(list_size: usize, page_size: usize) -> LiveListConfig {
    LiveListConfig {
        list_size,
        page_size,
    }
}

fn blocks<T: Sequenced>(items: &[T]) -> Vec<BlockNumber> {
    items.iter().map(Sequenced::block_number).collect()
}

fn setup(blocks: BlockNumber, list_size: usize, page_size: usize) -> (Arc<InMemoryChain>, NetworkId, ExtrinsicList) {
    init_test_logging();
    let chain = Arc::new(InMemoryChain::new());
    let net = NetworkId::new("polkadot");
    seed_chain(&chain, &net, blocks);
    let list = LiveListController::new(EntityKind::Extrinsic, config(list_size, page_size), chain.clone())
        .expect("valid config");
    (chain, net, list)
}

#[tokio::test]
async fn test_inherent_list_first_page_live_items_and_paging() {
    let (chain, net, list) = setup(6, 4, 2);
    list.start(net.clone(), CallFilter::inherents().to_filters()).unwrap();

    let mut rx = list.subscribe();
    let snapshot = wait_for(&mut rx, |s| !s.loading && s.items.len() == 2).await;
    assert_eq!(blocks(&snapshot.items), vec![6, 5]);
    assert!(snapshot.items.iter().all(Extrinsic::is_inherent));
    eventually(|| chain.active_feeds() == 1).await;

    // Live: the signed transfer does not match the inherent filter.
    chain.push_extrinsic(&net, inherent(7, 0));
    chain.push_extrinsic(&net, extrinsic(7, 1, 1, "balances", "transfer"));
    let snapshot = wait_for(&mut rx, |s| s.items.len() == 3).await;
    assert_eq!(blocks(&snapshot.items), vec![7, 6, 5]);

    // The offset shifted by one: the next page overlaps the first.
    let key = snapshot.next_page_key.clone().expect("more history");
    let page = within(list.fetch_next_page(key)).await.unwrap();
    assert_eq!(blocks(&page.objects), vec![5, 4]);
    assert_eq!(blocks(&list.items()), vec![7, 6, 5, 4]);

    // Full list: older history is returned but not listed.
    let page = within(list.load_more()).await.unwrap();
    assert_eq!(blocks(&page.objects), vec![3, 2]);
    assert_eq!(blocks(&list.items()), vec![7, 6, 5, 4]);

    // A new live item evicts the lowest ranked one.
    chain.push_extrinsic(&net, inherent(8, 0));
    let snapshot = wait_for(&mut rx, |s| s.items.first().map(|e| e.block_number) == Some(8)).await;
    assert_eq!(blocks(&snapshot.items), vec![8, 7, 6, 5]);

    list.stop();
    eventually(|| chain.active_feeds() == 0).await;
}

#[tokio::test]
async fn test_filter_change_replaces_results() {
    let (chain, net, list) = setup(4, 10, 10);
    list.start(net.clone(), CallFilter::signed_extrinsics().to_filters()).unwrap();

    let mut rx = list.subscribe();
    let snapshot = wait_for(&mut rx, |s| !s.loading && s.items.len() == 4).await;
    assert!(snapshot.items.iter().all(|e| e.signed == 1));

    let mut selection = CallFilter::inherents();
    selection.set_pallet(Some("timestamp".to_string()));
    let generation = list.on_filters_changed(selection.to_filters()).unwrap();

    let snapshot = wait_for(&mut rx, |s| {
        s.generation == generation && !s.loading && s.items.len() == 4
    })
    .await;
    assert!(snapshot.items.iter().all(|e| e.call_module == "timestamp"));
    assert_eq!(list.filters(), selection.to_filters());
    eventually(|| chain.active_feeds() == 1).await;
}

#[tokio::test]
async fn test_event_list_with_pallet_filter() {
    init_test_logging();
    let chain = Arc::new(InMemoryChain::new());
    let net = NetworkId::new("kusama");
    seed_chain(&chain, &net, 3);

    let list: LiveListController<Event, InMemoryChain> =
        LiveListController::new(EntityKind::Event, config(10, 10), chain.clone()).unwrap();
    let filter = EventFilter::all().with_pallet("balances");
    list.start(net.clone(), filter.to_filters()).unwrap();

    let mut rx = list.subscribe();
    let snapshot = wait_for(&mut rx, |s| !s.loading && s.items.len() == 3).await;
    assert!(snapshot.items.iter().all(|e| e.event_module == "balances"));
    assert_eq!(blocks(&snapshot.items), vec![3, 2, 1]);
}

#[tokio::test]
async fn test_fetch_failure_makes_list_inactive_until_restart() {
    let (chain, net, list) = setup(3, 10, 10);
    let cause = TransportError::Rpc("503".to_string());
    chain.fail_fetches(Some(cause.clone()));
    list.start(net.clone(), CallFilter::inherents().to_filters()).unwrap();

    let mut rx = list.subscribe();
    let snapshot = wait_for(&mut rx, |s| matches!(s.status, ListStatus::Inactive(_))).await;
    assert_eq!(
        snapshot.status,
        ListStatus::Inactive(ListFailure::Fetch(FetchError {
            page_key: None,
            cause,
        }))
    );
    eventually(|| chain.active_feeds() == 0).await;
    assert!(matches!(
        list.fetch_next_page(PageKey::new("1")).await,
        Err(ListError::Inactive(_))
    ));

    chain.fail_fetches(None);
    let generation = list.on_filters_changed(CallFilter::inherents().to_filters()).unwrap();
    let snapshot = wait_for(&mut rx, |s| s.generation == generation && !s.loading && s.status.is_active()).await;
    assert_eq!(blocks(&snapshot.items), vec![3, 2, 1]);
}

#[tokio::test]
async fn test_dropped_feed_makes_list_inactive_and_keeps_items() {
    let (chain, net, list) = setup(3, 10, 10);
    list.start(net.clone(), CallFilter::inherents().to_filters()).unwrap();

    let mut rx = list.subscribe();
    wait_for(&mut rx, |s| !s.loading && s.items.len() == 3).await;
    eventually(|| chain.active_feeds() == 1).await;

    chain.drop_feeds(&net, "ws reset");
    let snapshot = wait_for(&mut rx, |s| matches!(s.status, ListStatus::Inactive(_))).await;
    assert_eq!(
        snapshot.status,
        ListStatus::Inactive(ListFailure::Subscription(SubscriptionError::Dropped(
            TransportError::Disconnected("ws reset".to_string())
        )))
    );
    assert_eq!(snapshot.items.len(), 3);
    eventually(|| chain.active_feeds() == 0).await;

    list.start(net, CallFilter::inherents().to_filters()).unwrap();
    eventually(|| chain.active_feeds() == 1).await;
    assert!(list.status().is_active());
}

#[tokio::test]
async fn test_page_in_flight_is_superseded_by_filter_change() {
    let (chain, net, list) = setup(6, 10, 2);
    let list = Arc::new(list);
    list.start(net, CallFilter::inherents().to_filters()).unwrap();

    let mut rx = list.subscribe();
    let snapshot = wait_for(&mut rx, |s| !s.loading && s.next_page_key.is_some()).await;
    let key = snapshot.next_page_key.clone().unwrap();

    chain.set_fetch_delay(Some(Duration::from_millis(100)));
    let pending = {
        let list = list.clone();
        tokio::spawn(async move { list.fetch_next_page(key).await })
    };
    eventually(|| list.is_loading()).await;

    list.on_filters_changed(CallFilter::signed_extrinsics().to_filters())
        .unwrap();
    let result = within(pending).await.unwrap();
    assert_eq!(result, Err(ListError::Superseded));

    chain.set_fetch_delay(None);
    let snapshot = wait_for(&mut rx, |s| !s.loading && !s.items.is_empty()).await;
    assert!(snapshot.items.iter().all(|e| e.signed == 1));
}
