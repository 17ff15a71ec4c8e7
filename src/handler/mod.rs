//! Request handler module
//!
//! Responsible for request routing dispatch and icon serving.

pub mod icons;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
