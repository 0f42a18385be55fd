//! Domain types for the price database.

pub mod bar;
pub mod range;
pub mod symbol;
pub mod technicals;

pub use bar::Bar;
pub use range::DateRange;
pub use symbol::{normalize_symbol, SymbolError};
pub use technicals::TechnicalRow;

/// Date format used for every stored and parsed date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
