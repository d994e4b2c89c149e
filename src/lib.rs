//! Workspace umbrella crate.
//!
//! Exposes the workspace crates (`core-service`, `core-subtitles`) behind a
//! single dependency. Host applications can depend on
//! `subtitle-core-workspace` and enable `desktop-shims` without wiring each
//! crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::{CoreError, SubtitleContext, SubtitleService};

#[cfg(feature = "desktop-shims")]
pub use core_subtitles as subtitles;
