//! Macro implementations

mod from_row;
mod record;

pub use from_row::derive_from_row;
pub use record::derive_record;
