//! Platform Abstraction Layer
//!
//! Window-server queries used by the capture controller and its hosts. Each platform
//! has its own implementation behind cfg attributes.

pub mod target;
pub mod window_enumerator;

pub use target::PlatformTargetWindow;
pub use window_enumerator::{enumerate_windows, find_window};
