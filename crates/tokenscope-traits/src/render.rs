use crate::{Address, BalanceQueryResult, Network};

/// Snapshot of everything a renderer needs to draw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    /// Address of the connected wallet
    pub connected_address: Option<Address>,
    /// Network the wallet reports
    pub network: Option<Network>,
    /// Raw text typed by the user
    pub input_address: String,
    /// True while a balance query is in flight
    pub is_querying: bool,
    /// Result of the last successful query
    pub result: Option<BalanceQueryResult>,
}

impl View {
    /// The address shown in the heading: typed input, then wallet, then `?`
    pub fn label(&self) -> String {
        if !self.input_address.is_empty() {
            self.input_address.clone()
        } else if let Some(address) = self.connected_address {
            address.to_checksum(None)
        } else {
            "?".to_string()
        }
    }

    /// Number of holdings in the current result
    pub fn result_count(&self) -> Option<usize> {
        self.result.as_ref().map(|r| r.len())
    }

    /// True when a wallet is connected
    pub fn is_connected(&self) -> bool {
        self.connected_address.is_some()
    }

    /// Status text below the heading
    pub fn status_line(&self) -> &'static str {
        if self.is_querying {
            "Loading ... (This may take a few seconds.)"
        } else {
            "Please make a query!"
        }
    }
}

/// Presentation layer driven by the controller.
pub trait Renderer: Send + Sync {
    /// Draws a new state snapshot
    fn render(&self, view: &View);

    /// Shows a blocking user alert
    fn alert(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_precedence() {
        let mut view = View::default();
        assert_eq!(view.label(), "?");

        view.connected_address = Some(Address::ZERO);
        assert_eq!(view.label(), Address::ZERO.to_checksum(None));

        view.input_address = "vitalik.eth".into();
        assert_eq!(view.label(), "vitalik.eth");
    }

    #[test]
    fn test_status_line() {
        let mut view = View::default();
        assert_eq!(view.status_line(), "Please make a query!");
        view.is_querying = true;
        assert!(view.status_line().starts_with("Loading"));
    }

    #[test]
    fn test_result_count() {
        let mut view = View::default();
        assert_eq!(view.result_count(), None);
        view.result = Some(BalanceQueryResult {
            owner: Address::ZERO,
            holdings: vec![],
        });
        assert_eq!(view.result_count(), Some(0));
        assert!(!view.is_connected());
    }
}
