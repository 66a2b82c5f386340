//! Observed station series: the QualAr source, its table parser, the
//! per-group retriever and the on-disk cache.

pub mod cache;
pub mod error;
pub mod qualar_client;
pub mod retriever;
pub mod source;
pub mod table_parser;
