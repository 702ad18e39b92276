//! Vendor-specific client facades
//!
//! Facades translate domain calls into request descriptors for the
//! resilient core and decode vendor payloads into typed models. They
//! never retry themselves; terminal classified errors surface as-is.

pub mod easypost;
pub mod veeqo;
pub(crate) mod common;

pub use common::UserAgent;
