//! Docker integration for per-environment images and containers.
//!
//! Each environment tag (a Python version) has its own image,
//! `rsconnect-python:<tag>`, built from `python:<tag>-slim`. Commands run in a
//! throwaway container with the working tree mounted at `/rsconnect`.
//!
//! # Module Structure
//!
//! - `container` - `docker run` invocation building
//! - `guard` - RAII guard for abandoned container cleanup
//! - `image` - image composition and daemon preflight

mod container;
mod guard;
mod image;

pub use container::ContainerRun;
pub use guard::ContainerGuard;
pub use image::{
    DOCKER_BUILD_TIMEOUT, DOCKER_INFO_TIMEOUT, build_image, check_docker_available, docker_info,
};
