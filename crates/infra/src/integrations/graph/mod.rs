//! Microsoft Graph calendar adapter
//!
//! Application (client credentials) access to user mailboxes:
//! - [`GraphTokenProvider`] obtains and caches app-only access tokens
//! - [`GraphCalendarClient`] implements the core `CalendarClient` port

mod client;
mod token;
mod types;

pub use client::GraphCalendarClient;
pub use token::GraphTokenProvider;
