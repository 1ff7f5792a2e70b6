//! Memory strip: layout, treatments, parallel compositing and export.

pub mod compositor;
pub mod error;
pub mod export;
pub mod latch;
pub mod layout;
pub mod text;
pub mod treatment;
