//! Icon domain logic
//!
//! Path parsing and SVG recoloring, independent of HTTP and of where the
//! assets are stored.

pub mod recolor;
pub mod route;

pub use recolor::recolor_svg;
pub use route::{Format, IconRequest, Plan};
