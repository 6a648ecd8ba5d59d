//! Kana domain core.
//!
//! Pure domain logic with zero internal dependencies: job records and their
//! status machine, enhance settings, frame compositing, export planning and
//! archive packaging, the 12-slot grid planner and its rasterizer, account
//! contracts, and the traits describing the remote collaborators.

pub mod account;
pub mod compositor;
pub mod data_url;
pub mod error;
pub mod export;
pub mod generation;
pub mod grid_render;
pub mod job;
pub mod planner;
pub mod selection;
pub mod settings;
pub mod types;
