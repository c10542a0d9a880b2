pub mod client;
pub mod store;
pub mod upstream;

pub use client::OrchestrationClient;
pub use store::SessionStore;
pub use upstream::{OutboundRequest, UpstreamPort, UpstreamResponse};
