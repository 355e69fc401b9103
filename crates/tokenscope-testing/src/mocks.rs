//! Controllable stand-ins for the controller's collaborators.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokenscope_error::{Result, TokenscopeError};
use tokenscope_traits::{
    parse_hex_address, AccountsListener, Address, Network, NetworkListener, Renderer,
    Subscription, TokenBalance, TokenDataService, TokenMetadata, View, WalletConnector, U256,
};
use tokio::sync::watch;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Wallet
// ============================================================================

#[derive(Default)]
struct WalletState {
    accounts: Vec<Address>,
    request_failure: Option<String>,
    request_count: usize,
    next_id: u64,
    network_listeners: HashMap<u64, NetworkListener>,
    accounts_listeners: HashMap<u64, AccountsListener>,
}

/// In-memory wallet whose events are fired by the test.
#[derive(Clone, Default)]
pub struct MockWalletConnector {
    state: Arc<Mutex<WalletState>>,
}

impl MockWalletConnector {
    /// A wallet exposing no accounts
    pub fn new() -> Self {
        Self::default()
    }

    /// A wallet exposing `accounts`
    pub fn with_accounts(accounts: Vec<Address>) -> Self {
        let wallet = Self::default();
        lock(&wallet.state).accounts = accounts;
        wallet
    }

    /// Replaces the accounts returned by the next request
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        lock(&self.state).accounts = accounts;
    }

    /// Makes account requests fail with `reason`
    pub fn fail_requests(&self, reason: impl Into<String>) {
        lock(&self.state).request_failure = Some(reason.into());
    }

    /// Number of account requests received
    pub fn request_count(&self) -> usize {
        lock(&self.state).request_count
    }

    /// Number of listeners currently registered
    pub fn active_subscriptions(&self) -> usize {
        let state = lock(&self.state);
        state.network_listeners.len() + state.accounts_listeners.len()
    }

    /// Delivers a network change to every network listener
    pub fn emit_network(&self, network: Network) {
        let listeners: Vec<NetworkListener> =
            lock(&self.state).network_listeners.values().cloned().collect();
        for listener in listeners {
            listener(network.clone());
        }
    }

    /// Delivers an account change to every account listener
    pub fn emit_accounts(&self, accounts: Vec<Address>) {
        let listeners: Vec<AccountsListener> =
            lock(&self.state).accounts_listeners.values().cloned().collect();
        for listener in listeners {
            listener(accounts.clone());
        }
    }

    fn register<L>(
        &self,
        topic: &'static str,
        listener: L,
        select: fn(&mut WalletState) -> &mut HashMap<u64, L>,
    ) -> Subscription
    where
        L: Send + 'static,
    {
        let id = {
            let mut state = lock(&self.state);
            state.next_id += 1;
            let id = state.next_id;
            select(&mut state).insert(id, listener);
            id
        };

        let state = self.state.clone();
        Subscription::new(topic, move || {
            let mut state = lock(&state);
            match select(&mut state).remove(&id) {
                Some(_) => Ok(()),
                None => Err(TokenscopeError::Subscription {
                    topic: topic.to_string(),
                    reason: "listener already removed".to_string(),
                }),
            }
        })
    }
}

#[async_trait]
impl WalletConnector for MockWalletConnector {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let mut state = lock(&self.state);
        state.request_count += 1;
        match &state.request_failure {
            Some(reason) => Err(TokenscopeError::WalletUnavailable(reason.clone())),
            None => Ok(state.accounts.clone()),
        }
    }

    fn on_network_change(&self, listener: NetworkListener) -> Subscription {
        self.register("network", listener, |s| &mut s.network_listeners)
    }

    fn on_accounts_changed(&self, listener: AccountsListener) -> Subscription {
        self.register("accountsChanged", listener, |s| &mut s.accounts_listeners)
    }
}

// ============================================================================
// Token data service
// ============================================================================

#[derive(Default)]
struct ServiceState {
    names: HashMap<String, Address>,
    balances: HashMap<Address, Vec<TokenBalance>>,
    metadata: HashMap<Address, TokenMetadata>,
    metadata_delays: HashMap<Address, Duration>,
    failing_metadata: HashSet<Address>,
    balance_failure: Option<String>,
    resolution_failure: Option<String>,
    resolve_calls: Vec<String>,
    balance_calls: Vec<Address>,
    metadata_calls: Vec<Address>,
}

/// In-memory token data with call recording and injectable failures.
pub struct MockTokenService {
    state: Mutex<ServiceState>,
    paused: watch::Sender<bool>,
}

impl Default for MockTokenService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTokenService {
    /// An empty service
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            state: Mutex::new(ServiceState::default()),
            paused,
        }
    }

    /// Adds one token holding for `owner` together with its metadata
    pub fn add_token(&self, owner: Address, contract: Address, raw: U256, metadata: TokenMetadata) {
        let mut state = lock(&self.state);
        state
            .balances
            .entry(owner)
            .or_default()
            .push(TokenBalance::new(contract, raw));
        state.metadata.insert(contract, metadata);
    }

    /// Adds a balance entry without touching metadata
    pub fn add_balance(&self, owner: Address, contract: Address, raw: U256) {
        lock(&self.state)
            .balances
            .entry(owner)
            .or_default()
            .push(TokenBalance::new(contract, raw));
    }

    /// Registers a resolvable name
    pub fn add_name(&self, name: impl Into<String>, address: Address) {
        lock(&self.state).names.insert(name.into(), address);
    }

    /// Delays metadata responses for `contract`
    pub fn delay_metadata(&self, contract: Address, delay: Duration) {
        lock(&self.state).metadata_delays.insert(contract, delay);
    }

    /// Makes metadata fetches for `contract` fail
    pub fn fail_metadata(&self, contract: Address) {
        lock(&self.state).failing_metadata.insert(contract);
    }

    /// Makes balance fetches fail with `reason`
    pub fn fail_balances(&self, reason: impl Into<String>) {
        lock(&self.state).balance_failure = Some(reason.into());
    }

    /// Makes name resolution fail at the transport level
    pub fn fail_resolution(&self, reason: impl Into<String>) {
        lock(&self.state).resolution_failure = Some(reason.into());
    }

    /// Holds balance fetches until [`resume_balances`](Self::resume_balances)
    pub fn pause_balances(&self) {
        self.paused.send_replace(true);
    }

    /// Releases held balance fetches
    pub fn resume_balances(&self) {
        self.paused.send_replace(false);
    }

    /// Inputs passed to `resolve_name`
    pub fn resolve_calls(&self) -> Vec<String> {
        lock(&self.state).resolve_calls.clone()
    }

    /// Owners passed to `token_balances`
    pub fn balance_calls(&self) -> Vec<Address> {
        lock(&self.state).balance_calls.clone()
    }

    /// Contracts passed to `token_metadata`
    pub fn metadata_calls(&self) -> Vec<Address> {
        lock(&self.state).metadata_calls.clone()
    }

    /// Total calls across all three operations
    pub fn total_calls(&self) -> usize {
        let state = lock(&self.state);
        state.resolve_calls.len() + state.balance_calls.len() + state.metadata_calls.len()
    }

    /// Waits until `count` balance fetches have started
    pub async fn wait_for_balance_calls(&self, count: usize) {
        while lock(&self.state).balance_calls.len() < count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

#[async_trait]
impl TokenDataService for MockTokenService {
    async fn resolve_name(&self, input: &str) -> Result<Option<Address>> {
        let mut state = lock(&self.state);
        state.resolve_calls.push(input.to_string());
        if let Some(reason) = &state.resolution_failure {
            return Err(TokenscopeError::RpcConnectionError {
                reason: reason.clone(),
            });
        }
        Ok(parse_hex_address(input).or_else(|| state.names.get(input).copied()))
    }

    async fn token_balances(&self, owner: Address) -> Result<Vec<TokenBalance>> {
        let outcome = {
            let mut state = lock(&self.state);
            state.balance_calls.push(owner);
            match &state.balance_failure {
                Some(reason) => Err(TokenscopeError::RpcRequestError {
                    method: "alchemy_getTokenBalances".to_string(),
                    reason: reason.clone(),
                }),
                None => Ok(state.balances.get(&owner).cloned().unwrap_or_default()),
            }
        };

        let mut paused = self.paused.subscribe();
        // Sender lives in self, the channel cannot close while we wait
        let _ = paused.wait_for(|held| !*held).await;
        outcome
    }

    async fn token_metadata(&self, contract: Address) -> Result<TokenMetadata> {
        let (delay, outcome) = {
            let mut state = lock(&self.state);
            state.metadata_calls.push(contract);
            let delay = state.metadata_delays.get(&contract).copied();
            let outcome = if state.failing_metadata.contains(&contract) {
                Err(TokenscopeError::RpcRequestError {
                    method: "alchemy_getTokenMetadata".to_string(),
                    reason: format!("metadata unavailable for {contract}"),
                })
            } else {
                state.metadata.get(&contract).cloned().ok_or_else(|| {
                    TokenscopeError::ContractError(format!("unknown contract {contract}"))
                })
            };
            (delay, outcome)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Renderer that records every view and alert it receives.
#[derive(Default)]
pub struct RecordingRenderer {
    views: Mutex<Vec<View>>,
    alerts: Mutex<Vec<String>>,
}

impl RecordingRenderer {
    /// A renderer with nothing recorded
    pub fn new() -> Self {
        Self::default()
    }

    /// Every rendered view, oldest first
    pub fn views(&self) -> Vec<View> {
        lock(&self.views).clone()
    }

    /// The latest rendered view
    pub fn last_view(&self) -> Option<View> {
        lock(&self.views).last().cloned()
    }

    /// Number of renders
    pub fn render_count(&self) -> usize {
        lock(&self.views).len()
    }

    /// Every alert shown, oldest first
    pub fn alerts(&self) -> Vec<String> {
        lock(&self.alerts).clone()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, view: &View) {
        lock(&self.views).push(view.clone());
    }

    fn alert(&self, message: &str) {
        lock(&self.alerts).push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{alice, bob, dai, usdc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_wallet_subscriptions_are_tracked() {
        let wallet = MockWalletConnector::with_accounts(vec![alice()]);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let sub = wallet.on_accounts_changed(Arc::new(move |_: Vec<Address>| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(wallet.active_subscriptions(), 1);

        wallet.emit_accounts(vec![bob()]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        sub.unsubscribe().unwrap();
        assert_eq!(wallet.active_subscriptions(), 0);
        wallet.emit_accounts(vec![alice()]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wallet_request_failure() {
        let wallet = MockWalletConnector::new();
        wallet.fail_requests("User rejected the request.");
        assert!(wallet.request_accounts().await.is_err());
        assert_eq!(wallet.request_count(), 1);
    }

    #[tokio::test]
    async fn test_service_records_calls() {
        let service = MockTokenService::new();
        service.add_token(alice(), usdc(), U256::from(5u64), TokenMetadata::new("USDC", 6));
        service.add_name("alice.eth", alice());

        assert_eq!(service.resolve_name("alice.eth").await.unwrap(), Some(alice()));
        assert_eq!(service.resolve_name("nobody.eth").await.unwrap(), None);
        assert_eq!(service.token_balances(alice()).await.unwrap().len(), 1);
        assert!(service.token_metadata(usdc()).await.is_ok());
        assert!(service.token_metadata(dai()).await.is_err());

        assert_eq!(service.resolve_calls().len(), 2);
        assert_eq!(service.balance_calls(), vec![alice()]);
        assert_eq!(service.metadata_calls(), vec![usdc(), dai()]);
        assert_eq!(service.total_calls(), 5);
    }

    #[tokio::test]
    async fn test_paused_balances_wait_for_resume() {
        let service = Arc::new(MockTokenService::new());
        service.pause_balances();

        let task = {
            let service = service.clone();
            tokio::spawn(async move { service.token_balances(alice()).await })
        };
        service.wait_for_balance_calls(1).await;
        assert!(!task.is_finished());

        service.resume_balances();
        assert!(task.await.unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_recording_renderer() {
        let renderer = RecordingRenderer::new();
        renderer.render(&View::default());
        renderer.alert("Query failed");
        assert_eq!(renderer.render_count(), 1);
        assert_eq!(renderer.alerts(), vec!["Query failed".to_string()]);
        assert!(renderer.last_view().is_some());
    }
}
