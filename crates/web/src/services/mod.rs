//! Services orchestrating the visitor lifecycle.
//!
//! - [`registration`] - nickname gate and admin token check
//! - [`conversation`] - one user turn against the chat-completion collaborator
//! - [`summary`] - summary persistence, booking announcement, summary mail
//! - [`admin`] - cached summary listing and deletion
//! - [`email`] - SMTP summary mailer
//! - [`persona`] - system prompt and fixed bot lines

pub mod admin;
pub mod conversation;
pub mod email;
pub mod persona;
pub mod registration;
pub mod summary;

pub use email::{EmailError, EmailService, SummaryMail, SummaryMailer};
