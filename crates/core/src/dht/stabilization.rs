//! Stabilization run daemons to maintain the ring.

use std::sync::Arc;
use std::time::Duration;

use futures::future::FutureExt;
use futures::pin_mut;
use futures::select;
use futures_timer::Delay;

use super::client::Transport;
use super::service::NodeService;
use crate::error::Result;

/// The stabilization runner.
pub struct Stabilizer<T> {
    service: Arc<NodeService<T>>,
    interval: Duration,
}

impl<T> Clone for Stabilizer<T> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            interval: self.interval,
        }
    }
}

impl<T> Stabilizer<T>
where T: Transport
{
    /// Create a new stabilization runner, ticking at the interval of the service config.
    pub fn new(service: Arc<NodeService<T>>) -> Self {
        let interval = service.config().stabilize_interval();
        Self { service, interval }
    }

    /// Override the tick interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Node maintained by this runner.
    pub fn service(&self) -> &Arc<NodeService<T>> {
        &self.service
    }

    /// Run stabilization once. Failures of single routines are logged, never returned.
    pub async fn stabilize(&self) -> Result<()> {
        tracing::debug!("STABILIZATION stabilize start");
        if let Err(e) = self.service.stabilize().await {
            tracing::error!("[stabilize] Failed on stabilize {:?}", e);
        }
        tracing::debug!("STABILIZATION stabilize end");
        tracing::debug!("STABILIZATION fix_fingers start");
        if let Err(e) = self.service.fix_fingers().await {
            tracing::error!("[stabilize] Failed on fix_finger {:?}", e);
        }
        tracing::debug!("STABILIZATION fix_fingers end");
        tracing::debug!("STABILIZATION check_predecessor start");
        if let Err(e) = self.service.check_predecessor().await {
            tracing::error!("[stabilize] Failed on check predecessor {:?}", e);
        }
        tracing::debug!("STABILIZATION check_predecessor end");
        Ok(())
    }

    /// Run stabilization in a loop.
    pub async fn wait(self: Arc<Self>) {
        loop {
            let timeout = Delay::new(self.interval).fuse();
            pin_mut!(timeout);
            select! {
                _ = timeout => self
                    .stabilize()
                    .await
                    .unwrap_or_else(|e| tracing::error!("failed to stabilize {:?}", e)),
            }
        }
    }
}
