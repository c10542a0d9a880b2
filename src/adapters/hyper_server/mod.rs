pub mod adapter;

pub use adapter::{serve, GatewayAdapter};
