pub mod errors;
pub mod gateway;
pub mod models;

pub use errors::*;
pub use gateway::{
    error_response, GatewayService, InboundRequest, RelayBody, RelayMethod, RelayResponse,
    BASE_URL_HEADER,
};
pub use models::*;
