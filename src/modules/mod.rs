//! Modules layer - clients for the external services the providers sit on

pub mod storage;
