//! Discovery, per-account coordination and the polling loop.

pub mod coordinator;
pub mod discovery;
pub mod report;
pub mod service;

pub use coordinator::RunCoordinator;
pub use discovery::DiscoveryStrategy;
pub use report::{AccountOutcome, RunReport};
pub use service::RelayService;
