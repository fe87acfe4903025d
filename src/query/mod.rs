//! Condition building for DAO operations.
//!
//! - [`Query`]: chainable builder for predicates, brackets, ordering, grouping,
//!   projection and update assignments
//! - [`Condition`]: the finalized `WHERE` text plus its positional arguments
//! - `value_conversion`: `sea_query::Value` to `ToSql` binding

pub mod builder;
#[doc(inline)]
pub use builder::{OrderItem, Query};

pub mod condition;
#[doc(inline)]
pub use condition::{count_placeholders, Condition, PLACEHOLDER};

pub(crate) mod value_conversion;
