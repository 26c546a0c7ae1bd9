use crate::config::FixFingers;
use crate::dht::Id;
use crate::dht::IdSpace;
use crate::error::ClientError;
use crate::error::Error;
use crate::error::Result;
use crate::inspect::ChordInspect;
use crate::message::Message;
use crate::message::Reply;
use crate::tests::default::gen_ring;
use crate::tests::default::node;
use crate::tests::default::small_ring_config;
use crate::tests::default::stabilize_all;
use crate::tests::default::MockFault;
use crate::tests::default::MockTransport;

const RING: [u32; 5] = [1, 18, 25, 40, 58];

fn owner_of(id: u32) -> u32 {
    RING.iter()
        .copied()
        .find(|n| *n >= id)
        .unwrap_or(RING[0])
}

#[tokio::test]
async fn test_single_node_owns_everything() -> Result<()> {
    let transport = MockTransport::new();
    let n10 = transport.spawn(&small_ring_config(), 10);

    for id in [10u32, 3, 11, 63] {
        assert_eq!(n10.find_successor(Id::from(id)).await?, node(10));
    }
    assert_eq!(n10.successor()?, node(10));
    assert_eq!(n10.predecessor()?, None);
    assert!(transport.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_two_node_join_then_stabilize() -> Result<()> {
    let transport = MockTransport::new();
    let config = small_ring_config();
    let a = transport.spawn(&config, 1);
    let b = transport.spawn(&config, 40);

    b.join(a.node()).await?;
    assert_eq!(b.successor()?, node(1));
    assert_eq!(b.predecessor()?, None);
    // Joining does not tell anyone.
    assert_eq!(a.successor()?, node(1));

    b.stabilize().await?;
    a.stabilize().await?;

    assert_eq!(a.successor()?, node(40));
    assert_eq!(a.predecessor()?, Some(node(40)));
    assert_eq!(b.successor()?, node(1));
    assert_eq!(b.predecessor()?, Some(node(1)));

    // Nothing moves on a stable ring.
    let before = (a.lock_store()?.clone(), b.lock_store()?.clone());
    b.stabilize().await?;
    a.stabilize().await?;
    assert_eq!(before, (a.lock_store()?.clone(), b.lock_store()?.clone()));
    Ok(())
}

#[tokio::test]
async fn test_sequential_joins_converge() -> Result<()> {
    let transport = MockTransport::new();
    let services = gen_ring(&transport).await;

    for (i, service) in services.iter().enumerate() {
        let next = RING[(i + 1) % RING.len()];
        let prev = RING[(i + RING.len() - 1) % RING.len()];
        assert_eq!(service.id(), Id::from(RING[i]));
        assert_eq!(service.successor()?, node(next));
        assert_eq!(service.predecessor()?, Some(node(prev)));
    }

    let n40: Vec<_> = services[3]
        .lock_store()?
        .finger()
        .list()
        .iter()
        .map(|f| f.node.clone())
        .collect();
    assert_eq!(n40, vec![
        node(58),
        node(58),
        node(58),
        node(58),
        node(58),
        node(18)
    ]);

    let n1: Vec<_> = services[0]
        .lock_store()?
        .finger()
        .list()
        .iter()
        .map(|f| f.node.clone())
        .collect();
    assert_eq!(n1, vec![
        node(18),
        node(18),
        node(18),
        node(18),
        node(18),
        node(40)
    ]);
    Ok(())
}

#[tokio::test]
async fn test_lookup_hops_toward_owner() -> Result<()> {
    let transport = MockTransport::new();
    let services = gen_ring(&transport).await;
    let space = IdSpace::new(6)?;
    let n40 = &services[3];

    transport.clear_calls();
    assert_eq!(n40.find_successor(Id::from(20u32)).await?, node(25));

    let calls = transport.calls();
    assert_eq!(calls, vec![(Id::from(18u32), "FindSuccessor")]);

    let owner = Id::from(25u32);
    let mut hops = vec![n40.id()];
    hops.extend(calls.iter().map(|(id, _)| *id));
    assert!(hops.len() <= 6);
    for pair in hops.windows(2) {
        assert!(space.distance(pair[1], owner) < space.distance(pair[0], owner));
    }
    Ok(())
}

#[tokio::test]
async fn test_lookup_from_every_node() -> Result<()> {
    let transport = MockTransport::new();
    let services = gen_ring(&transport).await;

    for service in services.iter() {
        for id in 0u32..64 {
            assert_eq!(
                service.find_successor(Id::from(id)).await?,
                node(owner_of(id)),
                "lookup {} from {}",
                id,
                service.node()
            );
        }
        assert_eq!(service.find_successor(service.id()).await?, *service.node());
    }
    Ok(())
}

#[tokio::test]
async fn test_notify() -> Result<()> {
    let transport = MockTransport::new();
    let config = small_ring_config();
    let n40 = transport.spawn(&config, 40);

    assert!(n40.notify(node(25))?);
    assert!(!n40.notify(node(1))?);
    assert!(!n40.notify(node(58))?);
    assert!(!n40.notify(node(40))?);
    assert!(n40.notify(node(30))?);
    assert_eq!(n40.predecessor()?, Some(node(30)));

    // Across zero.
    let n1 = transport.spawn(&config, 1);
    assert!(n1.notify(node(58))?);
    assert!(n1.notify(node(60))?);
    assert!(n1.notify(node(0))?);
    assert!(!n1.notify(node(40))?);
    assert!(!n1.notify(node(1))?);
    assert_eq!(n1.predecessor()?, Some(node(0)));
    Ok(())
}

#[tokio::test]
async fn test_check_predecessor() -> Result<()> {
    let transport = MockTransport::new();
    let config = small_ring_config();
    let a = transport.spawn(&config, 1);
    let b = transport.join(&config, 40, a.node()).await;
    stabilize_all(&[b.clone(), a.clone()], 2).await;
    assert_eq!(b.predecessor()?, Some(node(1)));

    // Alive.
    b.check_predecessor().await?;
    assert_eq!(b.predecessor()?, Some(node(1)));

    // A protocol failure is reported and the predecessor stays.
    transport.set_fault(a.node(), MockFault::Broken);
    let err = b.check_predecessor().await.unwrap_err();
    assert!(matches!(err, Error::Client(ClientError::Unexpected(_))));
    assert_eq!(b.predecessor()?, Some(node(1)));

    // Unreachable.
    transport.set_fault(a.node(), MockFault::Down);
    b.check_predecessor().await?;
    assert_eq!(b.predecessor()?, None);

    // Without a predecessor there is nothing to check.
    b.check_predecessor().await?;
    assert_eq!(b.predecessor()?, None);
    Ok(())
}

#[tokio::test]
async fn test_check_predecessor_times_out() -> Result<()> {
    let transport = MockTransport::new();
    let config = small_ring_config();
    let a = transport.spawn(&config, 1);
    let b = transport.join(&config, 40, a.node()).await;
    stabilize_all(&[b.clone(), a.clone()], 2).await;

    transport.set_fault(a.node(), MockFault::Silent);
    b.check_predecessor().await?;
    assert_eq!(b.predecessor()?, None);
    Ok(())
}

#[tokio::test]
async fn test_deep_hop_failure_reaches_caller() -> Result<()> {
    let transport = MockTransport::new();
    let services = gen_ring(&transport).await;
    let n58 = &services[4];

    // N58 -> N18 -> N25 -> answer N40.
    assert_eq!(n58.find_successor(Id::from(30u32)).await?, node(40));

    transport.set_fault(&node(25), MockFault::Down);
    let err = n58.find_successor(Id::from(30u32)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Client(ClientError::ConnectionFailed(ref target)) if *target == node(25)
    ));

    assert_eq!(
        n58.serve(Message::FindSuccessor(Id::from(30u32))).await,
        Reply::Failed(ClientError::ConnectionFailed(node(25)))
    );
    Ok(())
}

#[tokio::test]
async fn test_fix_fingers_continues_after_failure() -> Result<()> {
    let transport = MockTransport::new();
    let services = gen_ring(&transport).await;
    let n58 = &services[4];

    n58.lock_store()?.finger_mut().refresh(5, node(25))?;
    transport.set_fault(&node(1), MockFault::Down);

    // Slots 3 and 4 are routed through N1, slot 5 is not.
    let err = n58.fix_fingers().await.unwrap_err();
    assert!(err.is_connection_failed());

    let store = n58.lock_store()?;
    let finger = store.finger();
    assert_eq!(finger.get(3).unwrap().node, node(18));
    assert_eq!(finger.get(4).unwrap().node, node(18));
    assert_eq!(finger.get(5).unwrap().node, node(40));
    Ok(())
}

#[tokio::test]
async fn test_incremental_fix_fingers() -> Result<()> {
    let transport = MockTransport::new();
    let config = small_ring_config().fix_fingers(FixFingers::Incremental);
    let a = transport.spawn(&config, 1);
    let b = transport.join(&config, 40, a.node()).await;
    stabilize_all(&[b.clone(), a.clone()], 2).await;

    a.fix_fingers().await?;
    {
        let store = a.lock_store()?;
        assert_eq!(store.finger().get(0).unwrap().node, node(40));
        assert_eq!(store.finger().get(1).unwrap().node, node(1));
    }

    for _ in 1..6 {
        a.fix_fingers().await?;
    }
    let store = a.lock_store()?;
    assert!(store.finger().list().iter().all(|f| f.node == node(40)));
    Ok(())
}

#[tokio::test]
async fn test_serve() -> Result<()> {
    let transport = MockTransport::new();
    let services = gen_ring(&transport).await;
    let n25 = &services[2];

    assert_eq!(n25.serve(Message::Ping).await, Reply::Pong);
    assert_eq!(
        n25.serve(Message::QuerySuccessor).await,
        Reply::Successor(node(40))
    );
    assert_eq!(
        n25.serve(Message::QueryPredecessor).await,
        Reply::Predecessor(Some(node(18)))
    );
    assert_eq!(
        n25.serve(Message::FindSuccessor(Id::from(50u32))).await,
        Reply::FoundSuccessor(node(58))
    );
    // A rejected candidate is still answered.
    assert_eq!(
        n25.serve(Message::NotifyPredecessor(node(1))).await,
        Reply::Notified
    );
    assert_eq!(n25.predecessor()?, Some(node(18)));
    Ok(())
}

#[tokio::test]
async fn test_inspect() -> Result<()> {
    let transport = MockTransport::new();
    let services = gen_ring(&transport).await;

    let inspect = ChordInspect::inspect(&services[3])?;
    assert_eq!(inspect.id, "0x28");
    assert_eq!(inspect.address, "mock://n40");
    assert_eq!(inspect.successor, "0x3a@mock://n58");
    assert_eq!(inspect.predecessor, Some("0x19@mock://n25".to_string()));
    assert_eq!(inspect.finger_table.len(), 6);
    assert_eq!(
        inspect.finger_table[5],
        ("0x8".to_string(), "0x12@mock://n18".to_string())
    );

    let json = serde_json::to_value(&inspect).unwrap();
    assert_eq!(json["successor"], "0x3a@mock://n58");
    Ok(())
}

#[tokio::test]
async fn test_inspect_fails_on_poisoned_store() {
    let transport = MockTransport::new();
    let n10 = transport.spawn(&small_ring_config(), 10);

    let poisoner = n10.clone();
    let handle = std::thread::spawn(move || {
        let _store = poisoner.lock_store().unwrap();
        panic!("poison the store lock");
    });
    assert!(handle.join().is_err());

    assert!(matches!(
        ChordInspect::inspect(&n10),
        Err(Error::StoreLockError)
    ));
    assert_eq!(
        n10.serve(Message::QuerySuccessor).await,
        Reply::Failed(ClientError::Unexpected(
            Error::StoreLockError.to_string()
        ))
    );
}

#[tokio::test]
async fn test_serve_rejects_ids_outside_ring() -> Result<()> {
    let transport = MockTransport::new();
    let services = gen_ring(&transport).await;
    let n25 = &services[2];
    transport.clear_calls();

    let reply = n25.serve(Message::FindSuccessor(Id::from(64u32))).await;
    assert!(matches!(reply, Reply::Failed(ClientError::Unexpected(_))));
    // Rejected before any routing.
    assert!(transport.calls().is_empty());

    let reply = n25.serve(Message::NotifyPredecessor(node(100))).await;
    assert!(matches!(reply, Reply::Failed(ClientError::Unexpected(_))));
    assert_eq!(n25.predecessor()?, Some(node(18)));

    // The largest id of the ring is still served.
    assert_eq!(
        n25.serve(Message::FindSuccessor(Id::from(63u32))).await,
        Reply::FoundSuccessor(node(1))
    );
    Ok(())
}
