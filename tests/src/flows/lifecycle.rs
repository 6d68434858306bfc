//! Resource accounting: no live feed outlives its owner.

use crate::fixtures::{eventually, init_test_logging, seed_chain, wait_for};
use ex_01_network_context::NetworkContext;
use ex_02_live_list::{follow_network, CallFilter, LiveListApi, LiveListConfig, LiveListController};
use ex_03_block_watcher::{BlockWatcherApi, FinalizationWatcher, WatcherConfig};
use shared_bus::InMemoryChain;
use shared_types::entities::{EntityKind, Event, Extrinsic, FilterSet, NetworkId};
use std::sync::Arc;

#[tokio::test]
async fn test_no_feed_outlives_its_owner() {
    init_test_logging();
    let chain = Arc::new(InMemoryChain::new());
    let net = NetworkId::new("polkadot");
    seed_chain(&chain, &net, 10);
    chain.put_block(&net, crate::fixtures::block(11, false));

    for round in 0..6 {
        let extrinsics = LiveListController::<Extrinsic, _>::new(
            EntityKind::Extrinsic,
            LiveListConfig::default(),
            chain.clone(),
        )
        .unwrap();
        let events = LiveListController::<Event, _>::new(
            EntityKind::Event,
            LiveListConfig::default(),
            chain.clone(),
        )
        .unwrap();
        let watcher =
            FinalizationWatcher::new(11, WatcherConfig::default(), chain.clone()).unwrap();

        extrinsics.start(net.clone(), CallFilter::inherents().to_filters()).unwrap();
        events.start(net.clone(), FilterSet::new()).unwrap();
        watcher.start(net.clone()).unwrap();
        eventually(|| chain.active_feeds() == 4).await;

        // Alternate explicit stop and plain drop.
        if round % 2 == 0 {
            extrinsics.stop();
            events.stop();
            watcher.stop();
        }
        drop((extrinsics, events, watcher));
        eventually(|| chain.active_feeds() == 0).await;
    }
}

#[tokio::test]
async fn test_dropping_binding_and_list_releases_feed() {
    init_test_logging();
    let chain = Arc::new(InMemoryChain::new());
    let net = NetworkId::new("kusama");
    seed_chain(&chain, &net, 3);

    let context = NetworkContext::with_network("kusama");
    let list = Arc::new(
        LiveListController::<Extrinsic, _>::new(
            EntityKind::Extrinsic,
            LiveListConfig::default(),
            chain.clone(),
        )
        .unwrap(),
    );
    let binding = follow_network(list.clone(), context.subscribe(), FilterSet::new());
    let mut rx = list.subscribe();
    wait_for(&mut rx, |s| !s.loading && s.items.len() == 6).await;
    eventually(|| chain.active_feeds() == 1).await;

    drop(rx);
    drop(binding);
    drop(list);
    eventually(|| chain.active_feeds() == 0).await;
}
