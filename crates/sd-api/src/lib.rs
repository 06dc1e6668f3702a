mod ai_config;
mod auth;
mod chat;
mod client;
mod knowledge;
pub mod sse;
pub mod transport;
mod wire;

#[cfg(test)]
mod tests;

pub use chat::{ChatRequest, Completion};
pub use client::ApiClient;
pub use sse::{FrameStream, StreamFrame};
pub use transport::{ApiRequest, ApiResponse, Body, EventDataStream, HttpTransport, Method, Transport};
