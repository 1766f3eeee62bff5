//! Reusable per-layer buffers for draw calls.

use crate::sampler::ResampledSample;

/// Buffers used while drawing one layer.
#[derive(Debug, Clone, Default)]
pub struct LayerScratch {
    /// Resampled values of the layer.
    pub samples: Vec<ResampledSample>,
    /// Colors of the layer.
    pub colors: Vec<[u8; 4]>,
}

impl LayerScratch {
    fn clear(&mut self) {
        self.samples.clear();
        self.colors.clear();
    }
}

/// Buffers kept across draw calls so repeated draws do not reallocate.
#[derive(Debug, Clone, Default)]
pub struct ScratchPool {
    layers: Vec<LayerScratch>,
}

impl ScratchPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties every buffer, keeping its allocation, and makes sure
    /// `layer_count` layers are available.
    pub fn reset(&mut self, layer_count: usize) {
        for layer in &mut self.layers {
            layer.clear();
        }
        if self.layers.len() < layer_count {
            self.layers.resize_with(layer_count, LayerScratch::default);
        }
    }

    /// Buffers of one layer, growing the pool if needed.
    pub fn layer_mut(&mut self, index: usize) -> &mut LayerScratch {
        if index >= self.layers.len() {
            self.layers.resize_with(index + 1, LayerScratch::default);
        }
        &mut self.layers[index]
    }

    /// Number of layers the pool holds buffers for.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Total sample capacity across all layers.
    #[must_use]
    pub fn sample_capacity(&self) -> usize {
        self.layers.iter().map(|l| l.samples.capacity()).sum()
    }
}
