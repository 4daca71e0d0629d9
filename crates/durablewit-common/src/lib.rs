//! durablewit common library
//!
//! Shared pieces used by every durablewit workspace member:
//!
//! - **Error Handling**: the common error and result types
//! - **Fingerprints**: streaming SHA-256 content digests used as dedup identity
//! - **Logging**: tracing subscriber setup driven by `LogConfig`
//!
//! # Example
//!
//! ```no_run
//! use durablewit_common::fingerprint::Fingerprint;
//!
//! # async fn run() -> durablewit_common::Result<()> {
//! let fingerprint = Fingerprint::from_file("cat.gif").await?;
//! println!("{fingerprint}");
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod fingerprint;
pub mod logging;

pub use error::{CommonError, Result};
pub use fingerprint::Fingerprint;
