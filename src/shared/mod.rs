//! Shared helpers used across modules

#[cfg(test)]
pub mod test_helpers;
