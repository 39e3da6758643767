//! Legacy planning portal adapters
//!
//! The portal authenticates with a session cookie obtained from its login
//! form. [`PortalSessionProvider`] caches that cookie on disk for up to a day;
//! [`PortalPlanningClient`] reads the user's work order schedule store with it.

mod login;
mod planning;
mod session;

pub use login::{FormLogin, PortalLogin};
pub use planning::PortalPlanningClient;
pub use session::PortalSessionProvider;
