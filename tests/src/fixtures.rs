//! Shared setup for the integration flows.

use shared_bus::InMemoryChain;
use shared_types::entities::{Block, BlockNumber, Event, Extrinsic, NetworkId};
use std::future::Future;
use std::sync::Once;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

/// Upper bound for any single wait in the flows.
pub const WAIT: Duration = Duration::from_secs(3);

static LOGGING: Once = Once::new();

/// Install a quiet subscriber once per test binary.
///
/// `EXPLORER_LOG_LEVEL=debug` shows the subsystems' logs while debugging.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let mut config = explorer_telemetry::TelemetryConfig::from_env();
        if std::env::var("EXPLORER_LOG_LEVEL").is_err() {
            config.log_level = "warn".to_string();
        }
        // Another harness may already own the global subscriber.
        let _ = explorer_telemetry::init_logging(&config);
    });
}

/// An extrinsic at `block_number` / `idx`.
pub fn extrinsic(block_number: BlockNumber, idx: u32, signed: u8, module: &str, call: &str) -> Extrinsic {
    Extrinsic {
        block_number,
        extrinsic_idx: idx,
        hash: Some(format!("0x{block_number:04x}{idx:02x}")),
        call_module: module.to_string(),
        call_name: call.to_string(),
        signed,
        ..Default::default()
    }
}

/// An inherent (`timestamp.set`) at `block_number` / `idx`.
pub fn inherent(block_number: BlockNumber, idx: u32) -> Extrinsic {
    extrinsic(block_number, idx, 0, "timestamp", "set")
}

/// A runtime event at `block_number` / `idx`.
pub fn event(block_number: BlockNumber, idx: u32, module: &str, name: &str) -> Event {
    Event {
        block_number,
        event_idx: idx,
        extrinsic_idx: Some(0),
        event_module: module.to_string(),
        event_name: name.to_string(),
        ..Default::default()
    }
}

/// A block header.
pub fn block(number: BlockNumber, finalized: bool) -> Block {
    Block {
        number,
        hash: format!("0x{number:08x}"),
        parent_hash: format!("0x{:08x}", number.saturating_sub(1)),
        finalized,
        ..Default::default()
    }
}

/// Seed `blocks` blocks on `network`: one inherent and one signed transfer
/// per block, two events per block, head at the last block.
pub fn seed_chain(chain: &InMemoryChain, network: &NetworkId, blocks: BlockNumber) {
    chain.add_network(network.clone());
    for number in 1..=blocks {
        chain.put_block(network, block(number, number + 2 <= blocks));
        chain.push_extrinsic(network, inherent(number, 0));
        chain.push_extrinsic(network, extrinsic(number, 1, 1, "balances", "transfer"));
        chain.push_event(network, event(number, 0, "system", "ExtrinsicSuccess"));
        chain.push_event(network, event(number, 1, "balances", "Transfer"));
    }
    chain.set_head(network, blocks);
}

/// Wait until a watched value satisfies `predicate`, returning a clone.
pub async fn wait_for<T: Clone>(
    rx: &mut watch::Receiver<T>,
    predicate: impl FnMut(&T) -> bool,
) -> T {
    timeout(WAIT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for value")
        .expect("sender dropped")
        .clone()
}

/// Poll `condition` until it holds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition never held");
}

/// Await `future` with the suite's timeout.
pub async fn within<F: Future>(future: F) -> F::Output {
    timeout(WAIT, future).await.expect("timed out")
}
