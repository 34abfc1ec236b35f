//! Paginated, filterable table state.
//!
//! The crate keeps the data shaping of a table view apart from its rendering:
//! [`filter`] narrows a record slice with per-column text predicates,
//! [`pagination`] cuts the result into pages, and [`table::TableController`]
//! owns both states and hands out a [`table::DerivedView`] after every change.

pub mod column;
pub mod domain;
pub mod filter;
pub mod pagination;
pub mod table;

pub use column::ColumnDef;
pub use domain::{Result, TableError};
pub use filter::{FilterPredicate, FilterSet, MatchMode};
pub use pagination::PaginationState;
pub use table::{DerivedView, TableController, TableOptions};
