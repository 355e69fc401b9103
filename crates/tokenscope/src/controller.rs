//! Wallet connection state and one-shot balance queries.

use crate::format::BalanceFormatter;
use crate::session::{Session, WalletSession};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokenscope_error::{Result, TokenscopeError};
use tokenscope_traits::{
    Address, BalanceQueryResult, Network, Renderer, TokenDataService, TokenHolding, View,
    WalletConnector,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Why a submission did not start a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither typed input nor a connected wallet
    NoAddress,
    /// Another query is still running
    InFlight,
}

/// How a submitted query ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The result was stored and rendered
    Completed {
        /// The queried address
        owner: Address,
        /// Number of holdings found
        holdings: usize,
    },
    /// Nothing was fetched
    Skipped(SkipReason),
    /// The wallet changed while the query ran; its result was dropped
    Discarded,
}

/// Clears the in-flight flag when a query ends, however it ends.
struct InFlightGuard<'a> {
    session: &'a Mutex<Session>,
    armed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn new(session: &'a Mutex<Session>) -> Self {
        Self {
            session,
            armed: true,
        }
    }

    /// Clears the flag and applies the final state change under one lock
    fn release<R>(mut self, finish: impl FnOnce(&mut Session) -> R) -> R {
        self.armed = false;
        let mut session = lock(self.session);
        session.is_querying = false;
        finish(&mut session)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock(self.session).is_querying = false;
        }
    }
}

struct Inner {
    wallet: Arc<dyn WalletConnector>,
    data: Arc<dyn TokenDataService>,
    renderer: Arc<dyn Renderer>,
    formatter: BalanceFormatter,
    session: Mutex<Session>,
    wallet_session: Mutex<Option<WalletSession>>,
    next_wallet_id: AtomicU64,
}

impl Inner {
    /// Applies `change` and renders the new state
    fn update<R>(&self, change: impl FnOnce(&mut Session) -> R) -> R {
        let (out, view) = {
            let mut session = lock(&self.session);
            let out = change(&mut session);
            (out, session.view())
        };
        self.renderer.render(&view);
        out
    }

    /// Like [`update`](Self::update), but only while `wallet_id` is the live wallet session
    fn update_wallet(&self, wallet_id: u64, change: impl FnOnce(&mut Session)) -> bool {
        let view = {
            let mut session = lock(&self.session);
            if session.wallet_id != Some(wallet_id) {
                return false;
            }
            change(&mut session);
            session.view()
        };
        self.renderer.render(&view);
        true
    }

    fn surface(&self, err: &TokenscopeError) {
        if err.is_user_visible() {
            self.renderer.alert(err.alert_message());
        }
    }

    fn on_network(&self, wallet_id: u64, network: Network) {
        let name = network.to_string();
        if self.update_wallet(wallet_id, |s| s.network = Some(network)) {
            tracing::info!(network = %name, "wallet network changed");
        }
    }

    fn on_accounts(&self, wallet_id: u64, accounts: Vec<Address>) {
        match accounts.first().copied() {
            None => {
                if self.end_wallet_session(Some(wallet_id)) {
                    tracing::info!("wallet disconnected by the wallet");
                }
            }
            Some(account) => {
                let applied = self.update_wallet(wallet_id, |s| {
                    s.connected_address = Some(account);
                    s.result = None;
                    s.invalidate_running_query();
                });
                if applied {
                    tracing::info!(%account, "wallet account changed");
                }
            }
        }
    }

    /// Tears down the wallet session, optionally only if it is `only`
    fn end_wallet_session(&self, only: Option<u64>) -> bool {
        let closed = {
            let mut slot = lock(&self.wallet_session);
            match (slot.as_ref(), only) {
                (Some(current), Some(id)) if current.id != id => None,
                _ => slot.take(),
            }
        };
        let Some(wallet_session) = closed else {
            return false;
        };
        self.update(Session::clear_wallet);
        wallet_session.close();
        true
    }

    async fn resolve(&self, typed: &str) -> Result<Address> {
        match self.data.resolve_name(typed).await {
            Ok(Some(address)) => Ok(address),
            Ok(None) => Err(TokenscopeError::InvalidAddress {
                input: typed.to_string(),
                reason: "not a hex address or resolvable name".to_string(),
            }),
            Err(e) => Err(e.into_query_failure(typed)),
        }
    }

    async fn fetch(&self, owner: Address) -> Result<BalanceQueryResult> {
        let balances = self.data.token_balances(owner).await?;

        let mut seen = HashSet::with_capacity(balances.len());
        let contracts: Vec<Address> = balances
            .iter()
            .map(|b| b.contract_address)
            .filter(|c| seen.insert(*c))
            .collect();
        tracing::debug!(%owner, entries = balances.len(), contracts = contracts.len(), "fetching token metadata");

        // Every fetch settles before any failure is reported
        let settled = join_all(contracts.iter().map(|c| self.data.token_metadata(*c))).await;

        let mut metadata = HashMap::with_capacity(contracts.len());
        let mut first_failure = None;
        for (contract, outcome) in contracts.into_iter().zip(settled) {
            match outcome {
                Ok(meta) => {
                    metadata.insert(contract, meta);
                }
                Err(e) => {
                    tracing::debug!(%contract, error = %e, "metadata fetch failed");
                    if first_failure.is_none() {
                        first_failure = Some(TokenscopeError::QueryFailed {
                            target: owner.to_string(),
                            reason: format!("metadata for {contract}: {e}"),
                        });
                    }
                }
            }
        }
        if let Some(err) = first_failure {
            return Err(err);
        }

        let holdings = balances
            .into_iter()
            .map(|balance| {
                let meta = metadata
                    .get(&balance.contract_address)
                    .cloned()
                    .ok_or_else(|| TokenscopeError::QueryFailed {
                        target: owner.to_string(),
                        reason: format!("no metadata for {}", balance.contract_address),
                    })?;
                let display_balance = self.formatter.format(balance.raw_balance, meta.decimals)?;
                Ok(TokenHolding {
                    balance,
                    metadata: meta,
                    display_balance,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BalanceQueryResult { owner, holdings })
    }

    async fn run_query(
        &self,
        typed: &str,
        connected: Option<Address>,
        epoch: u64,
    ) -> Result<BalanceQueryResult> {
        let target = if typed.is_empty() {
            connected.ok_or(TokenscopeError::NotConnected)?
        } else {
            self.resolve(typed).await?
        };

        self.update(|s| {
            if s.epoch == epoch {
                s.result = None;
            }
        });

        self.fetch(target)
            .await
            .map_err(|e| e.into_query_failure(target))
    }
}

/// Orchestrates the wallet connection and balance queries, and pushes every
/// state change to the [`Renderer`].
///
/// Cloning yields another handle to the same controller.
#[derive(Clone)]
pub struct BalanceQueryController {
    inner: Arc<Inner>,
}

impl BalanceQueryController {
    /// Creates a controller with the default `en-US` formatter
    pub fn new(
        wallet: Arc<dyn WalletConnector>,
        data: Arc<dyn TokenDataService>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self::with_formatter(wallet, data, renderer, BalanceFormatter::default())
    }

    /// Creates a controller with a custom balance formatter
    pub fn with_formatter(
        wallet: Arc<dyn WalletConnector>,
        data: Arc<dyn TokenDataService>,
        renderer: Arc<dyn Renderer>,
        formatter: BalanceFormatter,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                wallet,
                data,
                renderer,
                formatter,
                session: Mutex::new(Session::default()),
                wallet_session: Mutex::new(None),
                next_wallet_id: AtomicU64::new(0),
            }),
        }
    }

    /// Starts building a controller
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::default()
    }

    /// Current state snapshot
    pub fn view(&self) -> View {
        lock(&self.inner.session).view()
    }

    /// Renders the current state
    pub fn publish(&self) {
        let view = self.view();
        self.inner.renderer.render(&view);
    }

    /// The connected wallet address
    pub fn connected_address(&self) -> Option<Address> {
        lock(&self.inner.session).connected_address
    }

    /// True while a query runs
    pub fn is_querying(&self) -> bool {
        lock(&self.inner.session).is_querying
    }

    /// Asks the wallet for its accounts and starts listening to it.
    ///
    /// The first account becomes the connected address. A second call
    /// replaces the previous wallet session.
    pub async fn connect(&self) -> Result<Address> {
        let accounts = match self.inner.wallet.request_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::warn!(error = %e, "wallet connection failed");
                self.inner.surface(&e);
                return Err(e);
            }
        };
        let Some(account) = accounts.first().copied() else {
            let e = TokenscopeError::WalletUnavailable("wallet exposed no accounts".to_string());
            tracing::warn!(error = %e, "wallet connection failed");
            self.inner.surface(&e);
            return Err(e);
        };

        let id = self.inner.next_wallet_id.fetch_add(1, Ordering::SeqCst) + 1;
        let switched = self.inner.update(|s| {
            let switched = s.wallet_id.is_some() && s.connected_address != Some(account);
            if switched {
                s.result = None;
                s.invalidate_running_query();
            }
            s.connected_address = Some(account);
            s.wallet_id = Some(id);
            switched
        });
        if switched {
            tracing::info!(%account, "reconnected as a different account, previous result cleared");
        }

        let weak = Arc::downgrade(&self.inner);
        let network = self.inner.wallet.on_network_change(Arc::new({
            let weak = weak.clone();
            move |network: Network| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_network(id, network);
                }
            }
        }));
        let accounts = self
            .inner
            .wallet
            .on_accounts_changed(Arc::new(move |accounts: Vec<Address>| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_accounts(id, accounts);
                }
            }));

        let replaced = lock(&self.inner.wallet_session).replace(WalletSession::new(id, network, accounts));
        if let Some(previous) = replaced {
            previous.close();
        }

        tracing::info!(%account, session = id, "wallet connected");
        Ok(account)
    }

    /// Stops listening to the wallet and clears the address and result.
    ///
    /// Returns false when no wallet was connected.
    pub fn disconnect(&self) -> bool {
        let closed = self.inner.end_wallet_session(None);
        if closed {
            tracing::info!("wallet disconnected");
        } else {
            tracing::debug!("disconnect ignored, no wallet connected");
        }
        closed
    }

    /// Records typed input without querying
    pub fn set_input_address(&self, input: impl Into<String>) {
        let input = input.into();
        self.inner.update(|s| s.input_address = input);
    }

    /// Queries the balances of the typed address, or of the connected
    /// wallet when nothing is typed.
    ///
    /// Returns `Err` for failures that were alerted to the user.
    pub async fn submit_query(&self, raw_input: &str) -> Result<QueryOutcome> {
        let typed = raw_input.trim();

        let (epoch, connected, view) = {
            let mut session = lock(&self.inner.session);
            if session.is_querying {
                tracing::debug!("query already in flight, submission ignored");
                return Ok(QueryOutcome::Skipped(SkipReason::InFlight));
            }
            if !session.has_target(typed) {
                tracing::debug!("nothing to query");
                return Ok(QueryOutcome::Skipped(SkipReason::NoAddress));
            }
            session.input_address = raw_input.to_string();
            session.is_querying = true;
            (session.epoch, session.connected_address, session.view())
        };
        let guard = InFlightGuard::new(&self.inner.session);
        self.inner.renderer.render(&view);

        let result = self.inner.run_query(typed, connected, epoch).await;

        let (outcome, view) = guard.release(|s| {
            let outcome = if s.epoch != epoch {
                if let Err(e) = &result {
                    tracing::debug!(error = %e, "stale query failed");
                }
                Ok(QueryOutcome::Discarded)
            } else {
                result.map(|found| {
                    let outcome = QueryOutcome::Completed {
                        owner: found.owner,
                        holdings: found.len(),
                    };
                    s.result = Some(found);
                    outcome
                })
            };
            (outcome, s.view())
        });
        self.inner.renderer.render(&view);

        match &outcome {
            Ok(QueryOutcome::Completed { owner, holdings }) => {
                tracing::info!(%owner, holdings, "balance query completed");
            }
            Ok(_) => tracing::info!("wallet changed during query, result discarded"),
            Err(e) => {
                tracing::warn!(error = %e, code = ?e.code(), "balance query failed");
                self.inner.surface(e);
            }
        }
        outcome
    }
}

impl fmt::Debug for BalanceQueryController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = lock(&self.inner.session);
        f.debug_struct("BalanceQueryController")
            .field("connected_address", &session.connected_address)
            .field("is_querying", &session.is_querying)
            .field("formatter", &self.inner.formatter)
            .finish()
    }
}

/// Builder for [`BalanceQueryController`]
#[derive(Default)]
pub struct ControllerBuilder {
    wallet: Option<Arc<dyn WalletConnector>>,
    data: Option<Arc<dyn TokenDataService>>,
    renderer: Option<Arc<dyn Renderer>>,
    formatter: BalanceFormatter,
}

impl ControllerBuilder {
    /// Sets the wallet connector
    pub fn wallet(mut self, wallet: Arc<dyn WalletConnector>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Sets the token data service
    pub fn data_service(mut self, data: Arc<dyn TokenDataService>) -> Self {
        self.data = Some(data);
        self
    }

    /// Sets the renderer
    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Sets the balance formatter
    pub fn formatter(mut self, formatter: BalanceFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Builds the controller
    pub fn build(self) -> Result<BalanceQueryController> {
        let missing = |what: &str| TokenscopeError::ConfigError(format!("{what} is required"));
        Ok(BalanceQueryController::with_formatter(
            self.wallet.ok_or_else(|| missing("wallet connector"))?,
            self.data.ok_or_else(|| missing("token data service"))?,
            self.renderer.ok_or_else(|| missing("renderer"))?,
            self.formatter,
        ))
    }
}
