//! Push-notification fan-out pipeline.
//!
//! One invocation per created chat message:
//! 1. Validate the message payload (`trigger`)
//! 2. Resolve recipient tokens, excluding the sender (`resolver`)
//! 3. Partition into batches and dispatch to the gateway (`dispatcher`)
//! 4. Classify per-token delivery outcomes (`reconciler`)
//! 5. Prune tokens that failed delivery from the registry (`maintainer`)
//!
//! The pipeline holds no state between invocations; the token registry is
//! the only persistent, shared resource.

pub mod dispatcher;
pub mod maintainer;
pub mod pipeline;
pub mod reconciler;
pub mod registry;
pub mod resolver;
pub mod trigger;

#[cfg(test)]
pub(crate) mod testutil;

pub use pipeline::{FanoutError, FanoutPipeline};
