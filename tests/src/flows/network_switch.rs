//! Lists and watchers following the network context.

use crate::fixtures::{eventually, init_test_logging, seed_chain, wait_for};
use ex_01_network_context::NetworkContext;
use ex_02_live_list::{
    follow_network, CallFilter, ListStatus, LiveListApi, LiveListConfig, LiveListController,
};
use shared_bus::InMemoryChain;
use shared_types::entities::{EntityKind, Extrinsic, NetworkId};
use std::sync::Arc;
use std::time::Duration;

fn two_networks() -> Arc<InMemoryChain> {
    init_test_logging();
    let chain = Arc::new(InMemoryChain::new());
    seed_chain(&chain, &NetworkId::new("polkadot"), 5);
    seed_chain(&chain, &NetworkId::new("kusama"), 3);
    chain
}

#[tokio::test]
async fn test_list_follows_network_and_resets_filters() {
    let chain = two_networks();
    let context = NetworkContext::new();
    let defaults = CallFilter::inherents().to_filters();
    let list: Arc<LiveListController<Extrinsic, InMemoryChain>> = Arc::new(
        LiveListController::new(EntityKind::Extrinsic, LiveListConfig::default(), chain.clone())
            .unwrap(),
    );
    let binding = follow_network(list.clone(), context.subscribe(), defaults.clone());

    // Gate: nothing happens before a network is selected.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(list.status(), ListStatus::Idle);
    assert_eq!(chain.fetch_calls(), 0);

    let mut rx = list.subscribe();
    context.set_network("polkadot");
    let snapshot = wait_for(&mut rx, |s| {
        s.network == Some(NetworkId::new("polkadot")) && !s.loading && s.items.len() == 5
    })
    .await;
    assert!(snapshot.items.iter().all(Extrinsic::is_inherent));

    // The user narrows the filters, then switches network.
    let narrowed = CallFilter::inherents().with_pallet("staking").to_filters();
    list.on_filters_changed(narrowed).unwrap();
    wait_for(&mut rx, |s| !s.loading && s.items.is_empty()).await;

    context.set_network("kusama");
    let snapshot = wait_for(&mut rx, |s| {
        s.network == Some(NetworkId::new("kusama")) && !s.loading && s.items.len() == 3
    })
    .await;
    assert_eq!(snapshot.filters, defaults);
    eventually(|| chain.active_feeds() == 1).await;

    context.clear();
    wait_for(&mut rx, |s| s.status == ListStatus::Stopped).await;
    eventually(|| chain.active_feeds() == 0).await;

    drop(binding);
}

#[tokio::test]
async fn test_binding_ends_with_context() {
    let chain = two_networks();
    let context = NetworkContext::with_network("polkadot");
    let list = Arc::new(
        LiveListController::<Extrinsic, _>::new(
            EntityKind::Extrinsic,
            LiveListConfig::default(),
            chain.clone(),
        )
        .unwrap(),
    );
    let binding = follow_network(list.clone(), context.subscribe(), CallFilter::inherents().to_filters());

    let mut rx = list.subscribe();
    wait_for(&mut rx, |s| !s.loading && s.items.len() == 5).await;

    drop(context);
    eventually(|| binding.is_finished()).await;
    // The list keeps running on its last network.
    assert!(list.status().is_active());
    assert_eq!(list.items().len(), 5);
}
