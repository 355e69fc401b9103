//! Controller behaviour against in-memory collaborators.

use std::sync::Arc;
use std::time::Duration;
use tokenscope::prelude::*;
use tokenscope_testing::{
    alice, bob, dai, usdc, wbtc, EdgeCaseAddresses, EdgeCaseAmounts, MockTokenService,
    MockWalletConnector, RecordingRenderer,
};

struct Harness {
    wallet: Arc<MockWalletConnector>,
    service: Arc<MockTokenService>,
    renderer: Arc<RecordingRenderer>,
    controller: BalanceQueryController,
}

fn harness(accounts: Vec<Address>) -> Harness {
    let wallet = Arc::new(MockWalletConnector::with_accounts(accounts));
    let service = Arc::new(MockTokenService::new());
    let renderer = Arc::new(RecordingRenderer::new());
    let controller = BalanceQueryController::new(wallet.clone(), service.clone(), renderer.clone());
    Harness {
        wallet,
        service,
        renderer,
        controller,
    }
}

fn holding_symbols(view: &View) -> Vec<(Address, String)> {
    view.result
        .as_ref()
        .map(|r| {
            r.holdings
                .iter()
                .map(|h| (h.balance.contract_address, h.metadata.symbol.clone()))
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Guards
// ============================================================================

#[tokio::test]
async fn test_no_target_is_noop() {
    let h = harness(vec![]);

    for input in ["", "   ", "\t"] {
        let outcome = h.controller.submit_query(input).await.unwrap();
        assert_eq!(outcome, QueryOutcome::Skipped(SkipReason::NoAddress));
    }

    assert_eq!(h.service.total_calls(), 0);
    assert_eq!(h.renderer.render_count(), 0);
    assert!(h.renderer.alerts().is_empty());
    assert_eq!(h.controller.view(), View::default());
}

#[tokio::test]
async fn test_second_submission_while_in_flight_is_ignored() {
    let h = harness(vec![]);
    h.service
        .add_token(alice(), usdc(), U256::from(1_000_000u64), TokenMetadata::new("USDC", 6));
    h.service.pause_balances();

    let first = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.submit_query(EdgeCaseAddresses::ETH_CHECKSUMMED).await })
    };
    h.service.wait_for_balance_calls(1).await;
    assert!(h.controller.is_querying());
    let calls_before = h.service.total_calls();

    let second = h.controller.submit_query(EdgeCaseAddresses::ETH_SECOND).await.unwrap();
    assert_eq!(second, QueryOutcome::Skipped(SkipReason::InFlight));
    assert_eq!(h.service.total_calls(), calls_before);

    h.service.resume_balances();
    let outcome = first.await.unwrap().unwrap();
    assert_eq!(
        outcome,
        QueryOutcome::Completed {
            owner: alice(),
            holdings: 1
        }
    );
    assert!(!h.controller.is_querying());
    assert_eq!(h.service.balance_calls(), vec![alice()]);
}

// ============================================================================
// Resolution
// ============================================================================

#[tokio::test]
async fn test_unresolvable_input_alerts_without_fetching() {
    let h = harness(vec![]);

    let err = h.controller.submit_query("nobody.eth").await.unwrap_err();
    assert!(matches!(err, TokenscopeError::InvalidAddress { .. }));
    assert!(h.service.balance_calls().is_empty());
    assert!(h.service.metadata_calls().is_empty());
    assert_eq!(h.renderer.alerts(), vec!["Invalid address".to_string()]);
    assert!(!h.controller.is_querying());
}

#[tokio::test]
async fn test_invalid_input_keeps_previous_result() {
    let h = harness(vec![]);
    h.service
        .add_token(alice(), dai(), U256::from(10u64).pow(U256::from(18)), TokenMetadata::new("DAI", 18));

    h.controller
        .submit_query(EdgeCaseAddresses::ETH_CHECKSUMMED)
        .await
        .unwrap();
    assert!(h.controller.submit_query("0x1234").await.is_err());

    let view = h.controller.view();
    assert_eq!(view.result_count(), Some(1));
    assert_eq!(view.input_address, "0x1234");
}

#[tokio::test]
async fn test_bad_checksum_is_rejected() {
    let h = harness(vec![]);
    let err = h
        .controller
        .submit_query(EdgeCaseAddresses::ETH_BAD_CHECKSUM)
        .await
        .unwrap_err();
    assert!(matches!(err, TokenscopeError::InvalidAddress { .. }));
    assert!(h.service.balance_calls().is_empty());
}

#[tokio::test]
async fn test_name_resolves_before_fetch() {
    let h = harness(vec![]);
    h.service.add_name(EdgeCaseAddresses::ENS_NAME, alice());
    h.service
        .add_token(alice(), usdc(), U256::from(2_500_000u64), TokenMetadata::new("USDC", 6));

    let outcome = h
        .controller
        .submit_query(EdgeCaseAddresses::ENS_NAME)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        QueryOutcome::Completed {
            owner: alice(),
            holdings: 1
        }
    );
    assert_eq!(h.service.resolve_calls(), vec!["vitalik.eth".to_string()]);
    assert_eq!(h.service.balance_calls(), vec![alice()]);

    let view = h.controller.view();
    assert_eq!(view.label(), "vitalik.eth");
    assert_eq!(view.result.unwrap().holdings[0].display_balance, "2.50");
}

#[tokio::test]
async fn test_resolution_transport_failure_is_query_failure() {
    let h = harness(vec![]);
    h.service.fail_resolution("connection refused");

    let err = h.controller.submit_query("vitalik.eth").await.unwrap_err();
    assert!(matches!(err, TokenscopeError::QueryFailed { .. }));
    assert!(h.service.balance_calls().is_empty());
    assert_eq!(h.renderer.alerts(), vec!["Query failed".to_string()]);
}

#[tokio::test]
async fn test_typed_input_takes_precedence_over_wallet() {
    let h = harness(vec![alice()]);
    h.controller.connect().await.unwrap();

    h.controller
        .submit_query(EdgeCaseAddresses::ETH_SECOND)
        .await
        .unwrap();
    assert_eq!(h.service.balance_calls(), vec![bob()]);
}

#[tokio::test]
async fn test_connected_address_queried_without_resolution() {
    let h = harness(vec![alice()]);
    h.controller.connect().await.unwrap();

    let outcome = h.controller.submit_query("").await.unwrap();
    assert_eq!(
        outcome,
        QueryOutcome::Completed {
            owner: alice(),
            holdings: 0
        }
    );
    assert!(h.service.resolve_calls().is_empty());
    assert_eq!(h.service.balance_calls(), vec![alice()]);
    assert_eq!(h.controller.view().result_count(), Some(0));
}

// ============================================================================
// Fetch chain
// ============================================================================

#[tokio::test]
async fn test_metadata_fetched_once_per_contract_and_paired_by_key() {
    let h = harness(vec![]);
    h.service
        .add_token(alice(), usdc(), U256::from(1_000_000u64), TokenMetadata::new("USDC", 6));
    h.service
        .add_token(alice(), dai(), U256::from(5u64), TokenMetadata::new("DAI", 18));
    h.service
        .add_token(alice(), wbtc(), U256::from(100_000_000u64), TokenMetadata::new("WBTC", 8));
    h.service.add_balance(alice(), usdc(), U256::from(3_000_000u64));

    // Responses arrive in reverse request order
    h.service.delay_metadata(usdc(), Duration::from_millis(40));
    h.service.delay_metadata(dai(), Duration::from_millis(20));

    let outcome = h
        .controller
        .submit_query(EdgeCaseAddresses::ETH_LOWERCASE)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        QueryOutcome::Completed {
            owner: alice(),
            holdings: 4
        }
    );

    let mut requested = h.service.metadata_calls();
    requested.sort();
    let mut expected = vec![usdc(), dai(), wbtc()];
    expected.sort();
    assert_eq!(requested, expected);

    let view = h.controller.view();
    assert_eq!(
        holding_symbols(&view),
        vec![
            (usdc(), "USDC".to_string()),
            (dai(), "DAI".to_string()),
            (wbtc(), "WBTC".to_string()),
            (usdc(), "USDC".to_string()),
        ]
    );
    let displays: Vec<String> = view
        .result
        .unwrap()
        .holdings
        .into_iter()
        .map(|h| h.display_balance)
        .collect();
    assert_eq!(displays, vec!["1.00", "0.00", "1.00", "3.00"]);
}

#[tokio::test]
async fn test_default_formatting_policy() {
    let h = harness(vec![]);
    h.service.add_token(
        alice(),
        dai(),
        U256::from(EdgeCaseAmounts::ONE_POINT_2345),
        TokenMetadata::new("DAI", 18),
    );

    h.controller
        .submit_query(EdgeCaseAddresses::ETH_CHECKSUMMED)
        .await
        .unwrap();
    let view = h.controller.view();
    assert_eq!(view.result.unwrap().holdings[0].display_balance, "1.2345");
}

#[tokio::test]
async fn test_metadata_failure_fails_whole_query() {
    let h = harness(vec![]);
    h.service
        .add_token(bob(), usdc(), U256::from(1_000_000u64), TokenMetadata::new("USDC", 6));
    h.service
        .add_token(bob(), dai(), U256::from(2u64), TokenMetadata::new("DAI", 18));
    h.service.fail_metadata(dai());

    let err = h
        .controller
        .submit_query(EdgeCaseAddresses::ETH_SECOND)
        .await
        .unwrap_err();
    assert!(matches!(err, TokenscopeError::QueryFailed { .. }));
    assert_eq!(h.service.metadata_calls().len(), 2);
    assert_eq!(h.renderer.alerts(), vec!["Query failed".to_string()]);

    // No partial list is ever rendered
    for view in h.renderer.views() {
        assert!(view.result.is_none(), "rendered partial result: {view:?}");
    }
    assert!(!h.controller.is_querying());
}

#[tokio::test]
async fn test_balance_failure_clears_previous_result() {
    let h = harness(vec![alice()]);
    h.service
        .add_token(alice(), usdc(), U256::from(1u64), TokenMetadata::new("USDC", 6));
    h.controller.connect().await.unwrap();
    h.controller.submit_query("").await.unwrap();
    assert_eq!(h.controller.view().result_count(), Some(1));

    h.service.fail_balances("upstream 503");
    let err = h.controller.submit_query("").await.unwrap_err();
    assert!(matches!(err, TokenscopeError::QueryFailed { .. }));
    assert!(h.controller.view().result.is_none());
    assert!(!h.controller.is_querying());
}

#[tokio::test]
async fn test_loading_state_rendered_without_stale_result() {
    let h = harness(vec![]);
    h.service
        .add_token(alice(), usdc(), U256::from(1u64), TokenMetadata::new("USDC", 6));
    h.controller
        .submit_query(EdgeCaseAddresses::ETH_CHECKSUMMED)
        .await
        .unwrap();
    h.controller
        .submit_query(EdgeCaseAddresses::ETH_CHECKSUMMED)
        .await
        .unwrap();

    let views = h.renderer.views();
    assert!(views
        .iter()
        .any(|v| v.is_querying && v.result.is_none()));
    // A result is never shown while a query runs after resolution
    let last_loading = views.iter().rposition(|v| v.is_querying).unwrap();
    assert!(views[last_loading].result.is_none());
    assert_eq!(views.last().unwrap().result_count(), Some(1));
}

// ============================================================================
// Wallet lifecycle
// ============================================================================

#[tokio::test]
async fn test_connect_registers_listeners() {
    let h = harness(vec![alice(), bob()]);

    let address = h.controller.connect().await.unwrap();
    assert_eq!(address, alice());
    assert_eq!(h.wallet.active_subscriptions(), 2);
    assert!(h.renderer.last_view().unwrap().is_connected());

    h.wallet.emit_network(Network::new(11155111, "Sepolia"));
    let view = h.controller.view();
    assert_eq!(view.network.unwrap().name, "Sepolia");
}

#[tokio::test]
async fn test_connect_failure_alerts() {
    let h = harness(vec![]);
    h.wallet.fail_requests("User rejected the request.");

    let err = h.controller.connect().await.unwrap_err();
    assert!(matches!(err, TokenscopeError::WalletUnavailable(_)));
    assert_eq!(h.renderer.alerts(), vec!["Wallet connection failed".to_string()]);
    assert_eq!(h.wallet.active_subscriptions(), 0);
    assert!(h.controller.connected_address().is_none());
}

#[tokio::test]
async fn test_connect_without_accounts_fails() {
    let h = harness(vec![]);
    assert!(matches!(
        h.controller.connect().await,
        Err(TokenscopeError::WalletUnavailable(_))
    ));
    assert_eq!(h.wallet.active_subscriptions(), 0);
}

#[tokio::test]
async fn test_account_change_replaces_address_and_clears_result() {
    let h = harness(vec![alice()]);
    h.service
        .add_token(alice(), usdc(), U256::from(1u64), TokenMetadata::new("USDC", 6));
    h.controller.connect().await.unwrap();
    h.controller.submit_query("").await.unwrap();
    assert!(h.controller.view().result.is_some());

    h.wallet.emit_accounts(vec![bob(), alice()]);
    let view = h.controller.view();
    assert_eq!(view.connected_address, Some(bob()));
    assert!(view.result.is_none());
}

#[tokio::test]
async fn test_disconnect_clears_state_and_disables_wallet_queries() {
    let h = harness(vec![alice()]);
    h.service
        .add_token(alice(), usdc(), U256::from(1u64), TokenMetadata::new("USDC", 6));
    h.controller.connect().await.unwrap();
    h.wallet.emit_network(Network::new(1, "Ethereum"));
    h.controller.submit_query("").await.unwrap();

    assert!(h.controller.disconnect());
    let view = h.controller.view();
    assert!(view.connected_address.is_none());
    assert!(view.network.is_none());
    assert!(view.result.is_none());
    assert_eq!(h.wallet.active_subscriptions(), 0);

    let calls = h.service.total_calls();
    let outcome = h.controller.submit_query("").await.unwrap();
    assert_eq!(outcome, QueryOutcome::Skipped(SkipReason::NoAddress));
    assert_eq!(h.service.total_calls(), calls);
}

#[tokio::test]
async fn test_disconnect_when_not_connected_is_noop() {
    let h = harness(vec![]);
    assert!(!h.controller.disconnect());
    assert_eq!(h.renderer.render_count(), 0);
    assert!(h.renderer.alerts().is_empty());
}

#[tokio::test]
async fn test_wallet_originated_disconnect() {
    let h = harness(vec![alice()]);
    h.controller.connect().await.unwrap();

    h.wallet.emit_accounts(vec![]);
    assert!(h.controller.connected_address().is_none());
    assert_eq!(h.wallet.active_subscriptions(), 0);
    assert!(!h.controller.disconnect());
}

#[tokio::test]
async fn test_account_change_during_query_discards_result() {
    let h = harness(vec![alice()]);
    h.service
        .add_token(alice(), usdc(), U256::from(1u64), TokenMetadata::new("USDC", 6));
    h.controller.connect().await.unwrap();
    h.service.pause_balances();

    let query = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.submit_query("").await })
    };
    h.service.wait_for_balance_calls(1).await;
    h.wallet.emit_accounts(vec![bob()]);
    h.service.resume_balances();

    assert_eq!(query.await.unwrap().unwrap(), QueryOutcome::Discarded);
    let view = h.controller.view();
    assert_eq!(view.connected_address, Some(bob()));
    assert!(view.result.is_none());
    assert!(!view.is_querying);
}

#[tokio::test]
async fn test_disconnect_during_query_discards_result() {
    let h = harness(vec![alice()]);
    h.controller.connect().await.unwrap();
    h.service.pause_balances();

    let query = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.submit_query("").await })
    };
    h.service.wait_for_balance_calls(1).await;
    h.controller.disconnect();
    h.service.resume_balances();

    assert_eq!(query.await.unwrap().unwrap(), QueryOutcome::Discarded);
    assert!(h.controller.view().result.is_none());
    assert!(!h.controller.is_querying());
}

#[tokio::test]
async fn test_reconnect_as_different_account_clears_result() {
    let h = harness(vec![alice()]);
    h.service
        .add_token(alice(), usdc(), U256::from(1u64), TokenMetadata::new("USDC", 6));
    h.controller.connect().await.unwrap();
    h.controller.submit_query("").await.unwrap();
    assert!(h.controller.view().result.is_some());

    h.wallet.set_accounts(vec![bob()]);
    assert_eq!(h.controller.connect().await.unwrap(), bob());

    let view = h.controller.view();
    assert_eq!(view.connected_address, Some(bob()));
    assert!(view.result.is_none());
}

#[tokio::test]
async fn test_reconnect_as_same_account_keeps_result() {
    let h = harness(vec![alice()]);
    h.service
        .add_token(alice(), usdc(), U256::from(1u64), TokenMetadata::new("USDC", 6));
    h.controller.connect().await.unwrap();
    h.controller.submit_query("").await.unwrap();

    h.controller.connect().await.unwrap();
    let view = h.controller.view();
    assert_eq!(view.connected_address, Some(alice()));
    assert_eq!(view.result.map(|r| r.owner), Some(alice()));
}

#[tokio::test]
async fn test_reconnect_as_different_account_during_query_discards_result() {
    let h = harness(vec![alice()]);
    h.service
        .add_token(alice(), usdc(), U256::from(1u64), TokenMetadata::new("USDC", 6));
    h.controller.connect().await.unwrap();
    h.service.pause_balances();

    let query = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.submit_query("").await })
    };
    h.service.wait_for_balance_calls(1).await;
    h.wallet.set_accounts(vec![bob()]);
    h.controller.connect().await.unwrap();
    h.service.resume_balances();

    assert_eq!(query.await.unwrap().unwrap(), QueryOutcome::Discarded);
    let view = h.controller.view();
    assert_eq!(view.connected_address, Some(bob()));
    assert!(view.result.is_none());
    assert!(!view.is_querying);
}

#[tokio::test]
async fn test_unrepresentable_decimals_fail_query() {
    let h = harness(vec![]);
    h.service
        .add_token(alice(), usdc(), U256::from(5u64), TokenMetadata::new("ODD", 100));

    let err = h
        .controller
        .submit_query(EdgeCaseAddresses::ETH_CHECKSUMMED)
        .await
        .unwrap_err();
    assert!(matches!(err, TokenscopeError::QueryFailed { .. }));
    assert!(h.controller.view().result.is_none());
    assert_eq!(h.renderer.alerts(), vec!["Query failed".to_string()]);
}

#[tokio::test]
async fn test_formatter_locale_applied() {
    let wallet = Arc::new(MockWalletConnector::new());
    let service = Arc::new(MockTokenService::new());
    service.add_token(
        alice(),
        dai(),
        U256::from(EdgeCaseAmounts::LARGE_18),
        TokenMetadata::new("DAI", 18),
    );
    let controller = BalanceQueryController::builder()
        .wallet(wallet)
        .data_service(service)
        .renderer(Arc::new(RecordingRenderer::new()))
        .formatter(BalanceFormatter::for_locale(
            DisplayLocale::lookup("de").unwrap(),
        ))
        .build()
        .unwrap();

    controller
        .submit_query(EdgeCaseAddresses::ETH_CHECKSUMMED)
        .await
        .unwrap();
    let view = controller.view();
    assert_eq!(view.result.unwrap().holdings[0].display_balance, "1.000.000,00");
}
