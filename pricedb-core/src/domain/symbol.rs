//! Ticker symbol normalization.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("symbol is empty")]
    Empty,

    #[error("symbol '{0}' contains characters outside [A-Z0-9.^=_-]")]
    InvalidCharacters(String),
}

/// Trim and upper-case a ticker, rejecting anything a provider would not accept.
///
/// Accepts the characters Yahoo uses in tickers: letters, digits and `. ^ = _ -`
/// (e.g. `BRK-B`, `^GSPC`, `EURUSD=X`).
pub fn normalize_symbol(symbol: &str) -> Result<String, SymbolError> {
    let normalized = symbol.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(SymbolError::Empty);
    }
    let valid = normalized
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '_' | '-'));
    if !valid {
        return Err(SymbolError::InvalidCharacters(normalized));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_symbol("  xom ").unwrap(), "XOM");
    }

    #[test]
    fn accepts_provider_punctuation() {
        assert_eq!(normalize_symbol("brk-b").unwrap(), "BRK-B");
        assert_eq!(normalize_symbol("^gspc").unwrap(), "^GSPC");
        assert_eq!(normalize_symbol("eurusd=x").unwrap(), "EURUSD=X");
    }

    #[test]
    fn rejects_empty_and_injection() {
        assert_eq!(normalize_symbol("   "), Err(SymbolError::Empty));
        assert!(matches!(
            normalize_symbol("XOM; DROP TABLE Summary"),
            Err(SymbolError::InvalidCharacters(_))
        ));
    }
}
