//! Block detail: wait for finality, then load the block's records once.

use crate::fixtures::{
    block, event, eventually, extrinsic, inherent, init_test_logging, seed_chain, wait_for, within,
};
use ex_01_network_context::NetworkContext;
use ex_03_block_watcher::{
    BlockWatcherApi, EnrichmentStatus, FinalizationWatcher, WatchPhase, WatcherConfig, WatcherError,
    WatcherEvent,
};
use shared_bus::InMemoryChain;
use shared_types::entities::{BlockNumber, EntityKind, NetworkId};
use shared_types::errors::TransportError;
use std::sync::Arc;
use std::time::Duration;

type Watcher = FinalizationWatcher<InMemoryChain>;

fn polkadot() -> NetworkId {
    NetworkId::new("polkadot")
}

/// Eight seeded blocks plus an unfinalized block 9 with three extrinsics
/// and four events.
fn chain_with_pending_block() -> Arc<InMemoryChain> {
    init_test_logging();
    let chain = Arc::new(InMemoryChain::new());
    let net = polkadot();
    seed_chain(&chain, &net, 8);

    chain.put_block(&net, block(9, false));
    chain.push_extrinsic(&net, extrinsic(9, 2, 1, "staking", "bond"));
    chain.push_extrinsic(&net, inherent(9, 0));
    chain.push_extrinsic(&net, extrinsic(9, 1, 1, "balances", "transfer"));
    for idx in [3, 0, 2, 1] {
        chain.push_event(&net, event(9, idx, "system", "ExtrinsicSuccess"));
    }
    chain.set_head(&net, 9);
    chain
}

fn watcher(chain: &Arc<InMemoryChain>, number: BlockNumber) -> Watcher {
    let config = WatcherConfig {
        enrichment_page_size: 2,
        ..WatcherConfig::default()
    };
    FinalizationWatcher::new(number, config, chain.clone()).unwrap()
}

#[tokio::test]
async fn test_heads_advance_then_finality_triggers_single_enrichment() {
    let chain = chain_with_pending_block();
    let net = polkadot();
    let watcher = watcher(&chain, 9);
    let mut events = watcher.events();

    watcher.start(net.clone()).unwrap();
    eventually(|| chain.active_feeds() == 2).await;

    for head in [10, 11, 12] {
        chain.set_head(&net, head);
    }
    let mut rx = watcher.subscribe();
    let snapshot = wait_for(&mut rx, |s| s.head_number == Some(12)).await;
    assert_eq!(snapshot.phase, WatchPhase::Observing);
    assert_eq!(snapshot.blocks_behind, Some(3));
    assert_eq!(snapshot.enrichment, EnrichmentStatus::Pending);
    assert!(snapshot.extrinsics.is_empty());
    assert_eq!(chain.fetch_calls(), 0);

    assert!(chain.finalize_block(&net, 9));
    let finalized = within(watcher.wait_finalized()).await.unwrap();
    assert_eq!(finalized.number, 9);
    assert!(finalized.finalized);

    let snapshot = within(watcher.wait_settled()).await;
    assert_eq!(snapshot.phase, WatchPhase::Finalized);
    assert_eq!(snapshot.enrichment, EnrichmentStatus::Completed);
    let extrinsics: Vec<u32> = snapshot.extrinsics.iter().map(|e| e.extrinsic_idx).collect();
    assert_eq!(extrinsics, vec![0, 1, 2]);
    let event_indices: Vec<u32> = snapshot.events.iter().map(|e| e.event_idx).collect();
    assert_eq!(event_indices, vec![0, 1, 2, 3]);
    assert!(snapshot.extrinsics.iter().all(|e| e.block_number == 9));

    eventually(|| chain.active_feeds() == 0).await;
    let calls = chain.fetch_calls();
    assert_eq!(calls, 4);

    // A spurious second finalization reaches nobody.
    chain.finalize_block(&net, 9);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(chain.fetch_calls(), calls);

    let mut finalized_events = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, WatcherEvent::Finalized { .. }) {
            finalized_events += 1;
        }
    }
    assert_eq!(finalized_events, 1);
}

#[tokio::test]
async fn test_already_finalized_block_resolves_immediately() {
    let chain = chain_with_pending_block();
    let watcher = watcher(&chain, 3);
    watcher.start(polkadot()).unwrap();

    let block = within(watcher.wait_finalized()).await.unwrap();
    assert_eq!(block.number, 3);

    let snapshot = within(watcher.wait_settled()).await;
    assert_eq!(snapshot.extrinsics.len(), 2);
    assert_eq!(snapshot.events.len(), 2);
}

#[tokio::test]
async fn test_watcher_gated_on_first_network() {
    let chain = chain_with_pending_block();
    let context = NetworkContext::new();
    let watcher = watcher(&chain, 9);
    watcher.start_on(context.subscribe()).unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(watcher.phase(), WatchPhase::Idle);
    assert_eq!(chain.active_feeds(), 0);

    context.set_network("polkadot");
    eventually(|| chain.active_feeds() == 2).await;

    // Switching away does not re-target the watcher.
    context.set_network("kusama");
    chain.finalize_block(&polkadot(), 9);
    let block = within(watcher.wait_finalized()).await.unwrap();
    assert_eq!(block.number, 9);
    assert_eq!(watcher.snapshot().network, Some(polkadot()));
}

#[tokio::test]
async fn test_unknown_network_fails_source() {
    let chain = chain_with_pending_block();
    let watcher = watcher(&chain, 9);
    watcher.start(NetworkId::new("westend")).unwrap();

    let result = within(watcher.wait_finalized()).await;
    assert_eq!(
        result,
        Err(WatcherError::Source(TransportError::UnknownNetwork(
            NetworkId::new("westend")
        )))
    );
    eventually(|| chain.active_feeds() == 0).await;
}

#[tokio::test]
async fn test_feed_drop_before_finality() {
    let chain = chain_with_pending_block();
    let watcher = watcher(&chain, 9);
    watcher.start(polkadot()).unwrap();
    eventually(|| chain.active_feeds() == 2).await;

    chain.drop_feeds(&polkadot(), "node restarted");
    let result = within(watcher.wait_finalized()).await;
    assert_eq!(
        result,
        Err(WatcherError::Source(TransportError::Disconnected(
            "node restarted".to_string()
        )))
    );
    assert_eq!(watcher.phase(), WatchPhase::Stopped);
    eventually(|| chain.active_feeds() == 0).await;
}

#[tokio::test]
async fn test_enrichment_failure_is_reported_not_fatal() {
    let chain = chain_with_pending_block();
    let watcher = watcher(&chain, 9);
    watcher.start(polkadot()).unwrap();
    eventually(|| chain.active_feeds() == 2).await;

    chain.fail_fetches(Some(TransportError::Rpc("indexer down".to_string())));
    chain.finalize_block(&polkadot(), 9);

    let snapshot = within(watcher.wait_settled()).await;
    assert_eq!(snapshot.phase, WatchPhase::Finalized);
    match snapshot.enrichment {
        EnrichmentStatus::Failed(error) => {
            assert_eq!(error.kind, EntityKind::Extrinsic);
            assert_eq!(error.cause, TransportError::Rpc("indexer down".to_string()));
        }
        other => panic!("unexpected enrichment status: {other:?}"),
    }
    assert!(within(watcher.wait_finalized()).await.is_ok());
}
