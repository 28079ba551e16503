//! Configuration for wavelet operations.

use weft_transform::TransformConfig;

/// Configuration shared by everything that produces or transforms wavelet
/// operations.
#[derive(Debug, Clone)]
pub struct WaveletConfig {
    /// Version increment stamped on locally produced operations.
    pub version_increment: u64,
    /// Transform engine configuration for aggregate transforms.
    pub transform: TransformConfig,
}

impl Default for WaveletConfig {
    fn default() -> Self {
        Self {
            version_increment: 1,
            transform: TransformConfig::default(),
        }
    }
}
