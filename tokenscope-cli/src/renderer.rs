//! Terminal presentation of the controller state.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use tokenscope::traits::{Renderer, TokenHolding, View};

const RULE_WIDTH: usize = 64;

/// Shown in place of a missing token logo
pub const NO_LOGO: &str = "-no logo-";

/// Renders views as plain text.
pub struct TerminalRenderer<W = io::Stdout> {
    out: Mutex<W>,
}

impl TerminalRenderer {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render(&self, view: &View) {
        self.write(&draw(view));
    }

    fn alert(&self, message: &str) {
        self.write(&format!("\n  !! {message}\n\n"));
    }
}

fn holding_line(holding: &TokenHolding) -> String {
    let logo = holding.metadata.logo_uri.as_deref().unwrap_or(NO_LOGO);
    format!(
        "  {logo}\n    Symbol: ${}  Balance: {}",
        holding.metadata.symbol, holding.display_balance
    )
}

/// Text for one view
pub fn draw(view: &View) -> String {
    let mut lines = vec![String::new(), "─".repeat(RULE_WIDTH)];

    lines.push(match (&view.connected_address, &view.network) {
        (Some(address), Some(network)) => format!("Wallet:  {address} on {network}"),
        (Some(address), None) => format!("Wallet:  {address}"),
        _ => "Wallet:  not connected".to_string(),
    });

    let count = view
        .result_count()
        .map(|n| n.to_string())
        .unwrap_or_default();
    lines.push(format!("ERC-20 token balances of {} ({count}):", view.label()));
    lines.push(view.status_line().to_string());

    if let Some(result) = &view.result {
        lines.extend(result.holdings.iter().map(holding_line));
    }

    lines.push("─".repeat(RULE_WIDTH));
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenscope::traits::{
        BalanceQueryResult, Network, TokenBalance, TokenMetadata, U256,
    };
    use tokenscope_testing::{alice, dai, usdc};

    fn holding(contract: tokenscope::traits::Address, meta: TokenMetadata, display: &str) -> TokenHolding {
        TokenHolding {
            balance: TokenBalance::new(contract, U256::from(1u64)),
            metadata: meta,
            display_balance: display.to_string(),
        }
    }

    #[test]
    fn test_draw_idle() {
        let text = draw(&View::default());
        assert!(text.contains("Wallet:  not connected"));
        assert!(text.contains("ERC-20 token balances of ? ():"));
        assert!(text.contains("Please make a query!"));
    }

    #[test]
    fn test_draw_loading() {
        let view = View {
            input_address: "vitalik.eth".into(),
            is_querying: true,
            ..Default::default()
        };
        let text = draw(&view);
        assert!(text.contains("ERC-20 token balances of vitalik.eth ():"));
        assert!(text.contains("Loading ... (This may take a few seconds.)"));
    }

    #[test]
    fn test_draw_result() {
        let view = View {
            connected_address: Some(alice()),
            network: Some(Network::new(1, "Ethereum")),
            result: Some(BalanceQueryResult {
                owner: alice(),
                holdings: vec![
                    holding(usdc(), TokenMetadata::new("USDC", 6).with_logo("https://logo/usdc.png"), "1.50"),
                    holding(dai(), TokenMetadata::new("DAI", 18), "0.25"),
                ],
            }),
            ..Default::default()
        };
        let text = draw(&view);
        assert!(text.contains("on Ethereum (1)"));
        assert!(text.contains(&format!("ERC-20 token balances of {} (2):", alice())));
        assert!(text.contains("https://logo/usdc.png"));
        assert!(text.contains("Symbol: $USDC  Balance: 1.50"));
        assert!(text.contains(NO_LOGO));
        assert!(text.contains("Symbol: $DAI  Balance: 0.25"));
    }

    #[test]
    fn test_renderer_writes_views_and_alerts() {
        let renderer = TerminalRenderer::new(Vec::new());
        renderer.render(&View::default());
        renderer.alert("Invalid address");

        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(text.contains("Please make a query!"));
        assert!(text.contains("!! Invalid address"));
    }
}
