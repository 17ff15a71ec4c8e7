//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the icon logic.

pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_404_response, build_asset_response, build_health_response, build_text_response,
};
