//! Shared utilities.

pub mod hash;
pub mod paths;

#[cfg(test)]
pub mod testutil;
