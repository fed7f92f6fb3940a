//! External tool invocation: the forced aligner and the audio converter.
//!
//! Everything goes through [`CommandExecutor`] so the batch driver can be
//! tested without MFA or ffmpeg installed.

pub mod executor;
pub mod mfa;

pub use executor::{CommandExecutor, SystemCommandExecutor, tool_available};
#[cfg(test)]
pub(crate) use executor::mock::MockCommandExecutor;
pub use mfa::MfaAligner;
