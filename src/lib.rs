//! Huddle library exports for the binary and integration tests

pub mod core;
pub mod host;
pub mod provider;

#[cfg(test)]
pub mod test_support;
