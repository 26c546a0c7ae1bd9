use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::dht::Stabilizer;
use crate::error::Result;
use crate::tests::default::node;
use crate::tests::default::small_ring_config;
use crate::tests::default::MockFault;
use crate::tests::default::MockTransport;

#[tokio::test]
async fn test_stabilization_once() -> Result<()> {
    let transport = MockTransport::new();
    let config = small_ring_config();
    let a = transport.spawn(&config, 1);
    let b = transport.join(&config, 40, a.node()).await;

    Stabilizer::new(b.clone()).stabilize().await?;
    Stabilizer::new(a.clone()).stabilize().await?;

    assert_eq!(a.successor()?, node(40));
    assert_eq!(b.predecessor()?, Some(node(1)));
    // fix_fingers of A ran after A adopted B.
    assert!(a
        .lock_store()?
        .finger()
        .list()
        .iter()
        .all(|f| f.node == node(40)));
    Ok(())
}

#[tokio::test]
async fn test_stabilization_swallows_failures() -> Result<()> {
    let transport = MockTransport::new();
    let config = small_ring_config();
    let a = transport.spawn(&config, 1);
    let b = transport.join(&config, 40, a.node()).await;

    transport.set_fault(a.node(), MockFault::Broken);
    Stabilizer::new(b.clone()).stabilize().await?;
    assert_eq!(b.successor()?, node(1));

    transport.clear_fault(a.node());
    Stabilizer::new(b.clone()).stabilize().await?;
    Stabilizer::new(a.clone()).stabilize().await?;
    assert_eq!(b.predecessor()?, Some(node(1)));

    // Once A is unreachable, B stops trusting it as predecessor.
    transport.set_fault(a.node(), MockFault::Down);
    Stabilizer::new(b.clone()).stabilize().await?;
    assert_eq!(b.predecessor()?, None);
    Ok(())
}

#[tokio::test]
async fn test_stabilization_wait() -> Result<()> {
    let transport = MockTransport::new();
    let config = small_ring_config();
    let a = transport.spawn(&config, 1);
    let b = transport.join(&config, 40, a.node()).await;
    let c = transport.join(&config, 25, a.node()).await;

    let interval = Duration::from_millis(10);
    let runners: Vec<_> = [&a, &b, &c]
        .into_iter()
        .map(|s| Arc::new(Stabilizer::new((*s).clone()).with_interval(interval)))
        .collect();

    tokio::select! {
        _ = futures::future::join_all(runners.into_iter().map(|r| r.wait())) => {
            unreachable!();
        }
        _ = sleep(Duration::from_millis(1000)) => {}
    }

    assert_eq!(a.successor()?, node(25));
    assert_eq!(c.successor()?, node(40));
    assert_eq!(b.successor()?, node(1));
    assert_eq!(a.predecessor()?, Some(node(40)));
    assert_eq!(c.predecessor()?, Some(node(1)));
    assert_eq!(b.predecessor()?, Some(node(25)));
    Ok(())
}
