//! Capability of talking to other nodes of the ring.
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::FutureExt;
use futures::pin_mut;
use futures::select;
use futures_timer::Delay;

use super::id::Id;
use super::node::Node;
use crate::error::ClientError;
use crate::error::ClientResult;

/// The operations a node can ask of another node.
///
/// Implementations carry the request over whatever wire they like. An unreachable peer
/// must be reported as [ClientError::ConnectionFailed], anything else that goes wrong
/// as [ClientError::Unexpected].
#[async_trait]
pub trait RemoteNode: Send + Sync {
    /// Ask the remote node for the successor of `id`.
    async fn find_successor(&self, id: Id) -> ClientResult<Node>;
    /// Current successor of the remote node.
    async fn successor(&self) -> ClientResult<Node>;
    /// Current predecessor of the remote node.
    async fn predecessor(&self) -> ClientResult<Option<Node>>;
    /// Offer `candidate` as predecessor of the remote node.
    async fn notify(&self, candidate: Node) -> ClientResult<()>;
    /// Liveness probe.
    async fn ping(&self) -> ClientResult<()>;
}

/// Factory of [RemoteNode] clients, one per target node.
pub trait Transport: Send + Sync + 'static {
    /// Client type produced by this transport.
    type Client: RemoteNode;

    /// Get a client talking to `node`.
    fn client(&self, node: &Node) -> Self::Client;
}

/// Await `fut` for at most `timeout`. Expiry is reported as a connection failure of
/// `target`.
pub async fn with_timeout<F, T>(target: &Node, timeout: Duration, fut: F) -> ClientResult<T>
where F: Future<Output = ClientResult<T>> {
    let fut = fut.fuse();
    let delay = Delay::new(timeout).fuse();
    pin_mut!(fut, delay);
    select! {
        ret = fut => ret,
        _ = delay => {
            tracing::warn!("remote call to {} timed out after {:?}", target, timeout);
            Err(ClientError::ConnectionFailed(target.clone()))
        }
    }
}

/// A [RemoteNode] that bounds every call of the wrapped client by a deadline.
pub struct TimedClient<C> {
    inner: C,
    target: Node,
    timeout: Duration,
}

impl<C> TimedClient<C> {
    /// Wrap `inner`, which talks to `target`, with a per-call `timeout`.
    pub fn new(inner: C, target: Node, timeout: Duration) -> Self {
        Self {
            inner,
            target,
            timeout,
        }
    }
}

#[async_trait]
impl<C> RemoteNode for TimedClient<C>
where C: RemoteNode
{
    async fn find_successor(&self, id: Id) -> ClientResult<Node> {
        with_timeout(&self.target, self.timeout, self.inner.find_successor(id)).await
    }

    async fn successor(&self) -> ClientResult<Node> {
        with_timeout(&self.target, self.timeout, self.inner.successor()).await
    }

    async fn predecessor(&self) -> ClientResult<Option<Node>> {
        with_timeout(&self.target, self.timeout, self.inner.predecessor()).await
    }

    async fn notify(&self, candidate: Node) -> ClientResult<()> {
        with_timeout(&self.target, self.timeout, self.inner.notify(candidate)).await
    }

    async fn ping(&self) -> ClientResult<()> {
        with_timeout(&self.target, self.timeout, self.inner.ping()).await
    }
}
