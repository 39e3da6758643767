//! Calendar reconciliation

pub mod clock;
pub mod codec;
pub mod engine;
mod guard;
pub mod mailbox;
pub mod ports;
pub mod run_state;

pub use clock::{ManualClock, SystemClock};
pub use codec::EventCodec;
pub use engine::{EngineConfig, ReconciliationEngine};
pub use mailbox::StaticMailboxMap;
pub use ports::{Clock, UserMailboxMap};
pub use run_state::RunState;
