//! WGSL kernel sources

use super::Precision;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const COMMON: &str = include_str!("shaders/common.wgsl");
const BIT_REVERSE: &str = include_str!("shaders/bit_reverse.wgsl");
const BUTTERFLY: &str = include_str!("shaders/butterfly.wgsl");
const DFT_2D: &str = include_str!("shaders/dft2d.wgsl");

/// Placeholder replaced by the scalar type
const SCALAR_TOKEN: &str = "SCALAR";

/// Threads per workgroup along x and y, matches `@workgroup_size(8, 8, 1)`
pub const WORKGROUP_SIZE: u32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kernel {
    BitReverse,
    Butterfly,
    NaiveDft,
}

impl Kernel {
    pub fn label(self) -> &'static str {
        match self {
            Self::BitReverse => "FFT Bit Reverse",
            Self::Butterfly => "FFT Butterfly",
            Self::NaiveDft => "FFT Direct DFT",
        }
    }

    fn body(self) -> &'static str {
        match self {
            Self::BitReverse => BIT_REVERSE,
            Self::Butterfly => BUTTERFLY,
            Self::NaiveDft => DFT_2D,
        }
    }

    /// Complete WGSL module for this kernel at the given precision
    pub fn source(self, precision: Precision) -> String {
        format!("{COMMON}\n{}", self.body()).replace(SCALAR_TOKEN, precision.wgsl_scalar())
    }
}

/// Identity of a kernel source, used as the compiled-pipeline cache key
pub fn source_hash(source: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    hasher.finish()
}

/// Workgroups needed to cover `n` threads
pub fn workgroups(n: usize) -> u32 {
    (n as u32).div_ceil(WORKGROUP_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_token_is_fully_substituted() {
        for kernel in [Kernel::BitReverse, Kernel::Butterfly, Kernel::NaiveDft] {
            for precision in [Precision::F32, Precision::F64] {
                let src = kernel.source(precision);
                assert!(!src.contains(SCALAR_TOKEN));
                assert!(src.contains(&format!("vec2<{precision}>")));
                assert!(src.contains("fn main"));
            }
        }
    }

    #[test]
    fn hashes_distinguish_kernels_and_precision() {
        let a = source_hash(&Kernel::Butterfly.source(Precision::F32));
        let b = source_hash(&Kernel::Butterfly.source(Precision::F64));
        let c = source_hash(&Kernel::BitReverse.source(Precision::F32));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, source_hash(&Kernel::Butterfly.source(Precision::F32)));
    }

    #[test]
    fn workgroup_counts_round_up() {
        assert_eq!(workgroups(1), 1);
        assert_eq!(workgroups(8), 1);
        assert_eq!(workgroups(9), 2);
        assert_eq!(workgroups(256), 32);
    }
}
