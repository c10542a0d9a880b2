pub mod fake_client;
pub mod hyper_server;
pub mod live_client;
pub mod reqwest_upstream;
pub mod session;

pub use fake_client::FakeClient;
pub use hyper_server::{serve, GatewayAdapter};
pub use live_client::LiveClient;
pub use reqwest_upstream::ReqwestUpstream;
pub use session::{FileSessionStore, MemorySessionStore};
