//! External service integrations

pub mod details;
pub mod graph;
pub mod portal;

pub use details::{CachedDetailsLookup, DetailsClient};
pub use graph::{GraphCalendarClient, GraphTokenProvider};
pub use portal::{FormLogin, PortalLogin, PortalPlanningClient, PortalSessionProvider};
