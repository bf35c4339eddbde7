#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use splatcap_3d as geometry;

#[doc(inline)]
pub use splatcap_depth as depth;

/// Capture session driving trajectory, capture and dataset export.
pub mod capture;
