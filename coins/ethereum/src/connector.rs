use crate::bridge::WalletBridge;
use alloy::primitives::Address;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokenscope_erc20::network_for_chain_id;
use tokenscope_error::Result;
use tokenscope_traits::{AccountsListener, NetworkListener, Subscription, WalletConnector};
use tokio::time::MissedTickBehavior;

/// Default interval between wallet polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// [`WalletConnector`] for a wallet bridge without push notifications.
///
/// Network and account changes are detected by polling `eth_chainId` and
/// `eth_accounts`. Each subscription owns one background task, aborted when
/// the subscription is cancelled.
#[derive(Debug, Clone)]
pub struct RpcWalletConnector {
    bridge: WalletBridge,
    poll_interval: Duration,
}

impl RpcWalletConnector {
    /// Creates a connector polling `bridge` at the default interval
    pub fn new(bridge: WalletBridge) -> Self {
        Self {
            bridge,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The underlying bridge
    pub fn bridge(&self) -> &WalletBridge {
        &self.bridge
    }

    fn spawn_poller<F>(&self, topic: &'static str, task: F) -> Subscription
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let handle = runtime.spawn(task);
                tracing::debug!(topic, interval_ms = self.poll_interval.as_millis() as u64, "wallet poller started");
                Subscription::new(topic, move || {
                    handle.abort();
                    tracing::debug!(topic, "wallet poller stopped");
                    Ok(())
                })
            }
            Err(_) => {
                tracing::error!(topic, "no async runtime, wallet events will not be delivered");
                Subscription::new(topic, || Ok(()))
            }
        }
    }
}

#[async_trait]
impl WalletConnector for RpcWalletConnector {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let accounts = self.bridge.request_accounts().await?;
        tracing::info!(count = accounts.len(), endpoint = %self.bridge.endpoint(), "wallet accounts granted");
        Ok(accounts)
    }

    fn on_network_change(&self, listener: NetworkListener) -> Subscription {
        let bridge = self.bridge.clone();
        let period = self.poll_interval;

        self.spawn_poller("network", async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<u64> = None;
            loop {
                ticker.tick().await;
                match bridge.chain_id().await {
                    Ok(chain_id) if last != Some(chain_id) => {
                        last = Some(chain_id);
                        listener(network_for_chain_id(chain_id));
                    }
                    Ok(_) => {}
                    Err(e) => tracing::debug!(error = %e, "chain id poll failed"),
                }
            }
        })
    }

    fn on_accounts_changed(&self, listener: AccountsListener) -> Subscription {
        let bridge = self.bridge.clone();
        let period = self.poll_interval;

        self.spawn_poller("accountsChanged", async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First successful poll is the baseline, only later changes are events
            let mut last: Option<Vec<Address>> = None;
            loop {
                ticker.tick().await;
                match bridge.accounts().await {
                    Ok(accounts) => {
                        let changed = last.as_ref().is_some_and(|prev| *prev != accounts);
                        if changed {
                            if accounts.is_empty() {
                                tracing::info!("wallet reports no accounts");
                            }
                            listener(accounts.clone());
                        }
                        last = Some(accounts);
                    }
                    Err(e) => tracing::debug!(error = %e, "accounts poll failed"),
                }
            }
        })
    }
}
