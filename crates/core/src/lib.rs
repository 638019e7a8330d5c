//! Megami Core - session lifecycle and shared types.
//!
//! This crate provides the pieces of the persona chat that do no I/O:
//! - [`session`] - the per-visitor state machine (registration, turns,
//!   booking and mail latches, flash notices)
//! - [`transcript`] - windowing and plain-text rendering of a conversation
//! - [`policy`] - turn-count thresholds for the booking and mail triggers
//! - [`types`] - newtypes and small enums
//!
//! # Architecture
//!
//! No HTTP clients, no async, no storage. The `megami-web` crate owns every
//! collaborator call and feeds the results back through these types.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod message;
pub mod policy;
pub mod session;
pub mod transcript;
pub mod types;

pub use message::{Message, Notice};
pub use policy::TriggerPolicy;
pub use session::{Registration, TurnRejection, VisitorSession};
pub use transcript::TranscriptText;
pub use types::*;
