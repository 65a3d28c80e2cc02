//! On-disk persistence for aggregation documents.

pub mod ncml;
