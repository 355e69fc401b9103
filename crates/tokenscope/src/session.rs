use tokenscope_traits::{Address, BalanceQueryResult, Network, Subscription, View};

/// Mutable controller state, rendered through [`View`] snapshots.
#[derive(Debug, Default)]
pub struct Session {
    pub(crate) connected_address: Option<Address>,
    pub(crate) network: Option<Network>,
    pub(crate) input_address: String,
    pub(crate) is_querying: bool,
    pub(crate) result: Option<BalanceQueryResult>,
    /// Wallet session whose events are currently accepted
    pub(crate) wallet_id: Option<u64>,
    /// Bumped whenever a running query's result would be stale
    pub(crate) epoch: u64,
}

impl Session {
    /// Snapshot for the renderer
    pub fn view(&self) -> View {
        View {
            connected_address: self.connected_address,
            network: self.network.clone(),
            input_address: self.input_address.clone(),
            is_querying: self.is_querying,
            result: self.result.clone(),
        }
    }

    /// True when typed input or a connected wallet gives a query a target
    pub(crate) fn has_target(&self, typed: &str) -> bool {
        !typed.trim().is_empty() || self.connected_address.is_some()
    }

    pub(crate) fn invalidate_running_query(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub(crate) fn clear_wallet(&mut self) {
        self.connected_address = None;
        self.network = None;
        self.result = None;
        self.wallet_id = None;
        self.invalidate_running_query();
    }
}

/// Listener handles of one connected wallet.
///
/// Created on connect and closed on disconnect; both subscriptions are
/// released together.
#[derive(Debug)]
pub(crate) struct WalletSession {
    pub(crate) id: u64,
    network: Subscription,
    accounts: Subscription,
}

impl WalletSession {
    pub(crate) fn new(id: u64, network: Subscription, accounts: Subscription) -> Self {
        Self {
            id,
            network,
            accounts,
        }
    }

    /// Cancels both subscriptions; failures are logged only
    pub(crate) fn close(self) {
        for subscription in [self.network, self.accounts] {
            let topic = subscription.topic().to_string();
            if let Err(e) = subscription.unsubscribe() {
                tracing::warn!(topic = %topic, error = %e, "failed to remove wallet listener");
            }
        }
        tracing::debug!(session = self.id, "wallet session closed");
    }
}
