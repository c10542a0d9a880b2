#![cfg(test)]
#![allow(dead_code)]

pub mod gateway_server;
pub mod stub_orchestrator;

pub use gateway_server::TestGatewayServer;
pub use stub_orchestrator::{RecordedRequest, Responder, StubOrchestrator, StubResponse};
