//! gitsuper - AI-assisted git commit messages with SSO-grade authentication
//!
//! gitsuper generates commit messages with AI backends that sit behind
//! enterprise identity providers. This crate implements the part with
//! real protocol state and security-sensitive persistence: the
//! authentication subsystem.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to handlers)
//! - [`config`] - Provider configuration schema and loading
//! - [`auth`] - OAuth flows, token lifecycle, authentication strategies
//! - [`credentials`] - Encrypted-at-rest credential storage
//!
//! # Correctness Invariants
//!
//! The auth subsystem maintains the following invariants:
//!
//! 1. At most one HTTP token refresh is in flight per provider at a time
//! 2. A token is never observable in memory before it is durable on disk
//! 3. Token values never appear in logs, errors, or debug output
//! 4. A corrupted credential store degrades to "not authenticated",
//!    never to a crash

pub mod auth;
pub mod cli;
pub mod config;
pub mod credentials;
