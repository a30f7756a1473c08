// src/lib.rs
//! Glint
//!
//! A small real-time rendering runtime built on wgpu: cached GPU resources,
//! OBJ/glTF scene import, lit mesh drawing and batched sprites.

pub mod gfx;
pub mod prelude;

/// Initialises `env_logger` from `RUST_LOG`, defaulting to `info`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Routes log output through the test harness
#[cfg(test)]
pub(crate) fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
