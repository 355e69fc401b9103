//! CLI Types

#[derive(Debug, Clone, PartialEq)]
pub enum CliResponse {
    Continue,
    Exit,
}

/// One entry of the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Connect,
    Disconnect,
    SetAddress,
    Query,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "c" | "connect" => Some(Self::Connect),
            "d" | "disconnect" => Some(Self::Disconnect),
            "a" | "address" => Some(Self::SetAddress),
            "q" | "query" | "" => Some(Self::Query),
            "x" | "exit" | "quit" => Some(Self::Exit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_parse() {
        assert_eq!(MenuChoice::parse("C"), Some(MenuChoice::Connect));
        assert_eq!(MenuChoice::parse(" d "), Some(MenuChoice::Disconnect));
        assert_eq!(MenuChoice::parse("address"), Some(MenuChoice::SetAddress));
        assert_eq!(MenuChoice::parse(""), Some(MenuChoice::Query));
        assert_eq!(MenuChoice::parse("quit"), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("swap"), None);
    }
}
