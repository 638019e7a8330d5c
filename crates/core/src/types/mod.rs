//! Core types for Megami.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod latch;
pub mod nickname;
pub mod role;

pub use id::*;
pub use latch::Latch;
pub use nickname::{Nickname, NicknameError};
pub use role::{ChatRole, NoticeLevel};
