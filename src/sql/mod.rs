//! SQL utilities for the record engine
//!
//! Provides quoting helpers and the filter/sort/pagination query builder
//! over JSONB row payloads.

pub mod filter;
pub mod sanitize;

pub use filter::{build_filter_clause, build_order_by_clause, clamp_pagination};
pub use sanitize::{quote_identifier, quote_json_literal};
