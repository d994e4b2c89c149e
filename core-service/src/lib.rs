//! Subtitle service façade and bootstrap.
//!
//! This crate wires host-provided bridges (HTTP, settings, clock) and the
//! artifact database into the subtitle core. Desktop apps typically enable
//! the `desktop-shims` feature, which fills in reqwest and SQLite defaults
//! for any bridge the host leaves out.
//!
//! ```no_run
//! # async fn example() -> core_service::Result<()> {
//! use core_runtime::config::CoreConfig;
//! use core_service::SubtitleService;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/tmp/subtitles.db")
//!     .build()?;
//! let service = SubtitleService::bootstrap(config).await?;
//!
//! let tracks = service.auto_search_subtitles("The Matrix", Some("tt0133093")).await;
//! if let Some(track) = tracks.first() {
//!     let _cues = service.load_subtitle(track).await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod error;
pub mod service;

pub use context::SubtitleContext;
pub use error::{CoreError, Result};
pub use service::SubtitleService;
