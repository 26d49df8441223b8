//! Client for the multicast push-notification gateway.
//!
//! One gateway request carries up to [`MAX_MULTICAST_TOKENS`] device tokens
//! and a shared notification payload; the response reports a delivery
//! outcome per token, aligned positionally with the request's token list.

pub mod auth;
pub mod client;
pub mod error;
pub mod payload;

pub use client::{GatewayConfig, HttpPushGateway, PushGateway};
pub use error::GatewayError;
pub use payload::{MAX_MULTICAST_TOKENS, NotificationMessage, TokenStatus};
