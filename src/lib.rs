pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod features;
pub mod fetcher;
pub mod inference;
pub mod lexical;
pub mod reputation;
pub mod routes;
pub mod similarity;
pub mod social;
pub mod structure;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;
