//! Global types used across crossbuild

pub mod error;
pub use error::*;

mod meta;
mod triplet;
mod triplets;

pub use meta::*;
pub use triplet::*;
pub use triplets::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Per-target options provided by the frontend
pub struct BuildOptions {
    /// Build with cgo enabled and a cross C compiler
    pub cgo: bool,
    /// UPX level, 0 disables compression
    pub upx_level: u8,
    /// Forward compiler and UPX output
    pub verbose: bool,
}

impl BuildOptions {
    pub fn wants_upx(&self) -> bool {
        self.upx_level > 0
    }
}
