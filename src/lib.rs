//! Client bindings for the ComDAO and SGBManager contracts.
//!
//! [`ethereum`] holds the call orchestration: option handling, read calls,
//! transaction submission, receipt polling and event decoding. [`contracts`]
//! layers typed wrappers over the bundled artifacts.

pub mod config;
pub mod contracts;
pub mod ethereum;
