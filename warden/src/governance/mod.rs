//! Governance: roles, capabilities, policies and MCP server registrations.
//!
//! - [`GovernanceBackend`]: the consumed service interface.
//! - [`GovernanceStore`]: process-wide state with refresh and optimistic update.
//! - [`MockGovernanceBackend`], [`HttpGovernanceBackend`]: implementations.

mod backend;
mod http;
mod mock;
mod store;

pub use backend::GovernanceBackend;
pub use http::HttpGovernanceBackend;
pub use mock::{FetchCounts, MockGovernanceBackend};
pub use store::GovernanceStore;
