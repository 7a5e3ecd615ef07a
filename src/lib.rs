pub mod backoff;
pub mod endpoints;
pub mod models;
pub mod sequence;
pub mod view;

#[cfg(target_arch = "wasm32")]
mod wasm_app;

#[cfg(target_arch = "wasm32")]
pub use wasm_app::*;

#[cfg(not(target_arch = "wasm32"))]
mod template;

#[cfg(not(target_arch = "wasm32"))]
pub use template::{render_index, IndexParams};
