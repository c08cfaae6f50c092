//! Quantization-aware counterparts of the standard layers.
//!
//! Each layer wraps its full-precision counterpart and optionally applies a
//! kernel quantizer and an input quantizer around the wrapped forward pass.
//! The kernel quantizer operates on a scoped copy of the wrapped layer, so
//! the stored full-precision kernel is left untouched on every exit path.

pub mod conv;
pub mod conv_transpose;
pub mod linear;
pub mod local;

pub use crate::quantizer::{self, Quantizer, QuantizerConfig};
pub use burn::{
    config::Config,
    module::{Ignored, Module, Param},
    tensor::{backend::Backend, Tensor},
};
pub use conv::{
    QuantConv1d, QuantConv1dConfig, QuantConv2d, QuantConv2dConfig, QuantConv3d,
    QuantConv3dConfig,
};
pub use conv_transpose::{
    QuantConvTranspose2d, QuantConvTranspose2dConfig, QuantConvTranspose3d,
    QuantConvTranspose3dConfig,
};
pub use linear::{QuantLinear, QuantLinearConfig};
pub use local::{
    LocallyConnected1d, LocallyConnected1dConfig, LocallyConnected2d,
    LocallyConnected2dConfig, QuantLocallyConnected1d, QuantLocallyConnected1dConfig,
    QuantLocallyConnected2d, QuantLocallyConnected2dConfig,
};

/// A layer whose kernel can be replaced by a quantized copy.
///
/// `map_kernel` consumes and returns an owned layer, so quantization for one
/// forward pass never reaches the stored parameters.
pub trait KernelMapped<B: Backend>: Sized {
    /// Returns the layer with the quantizer applied to its kernel.
    fn map_kernel(self, quantizer: &Quantizer) -> Self;
}

pub(crate) fn quantize_input<B: Backend, const D: usize>(
    quantizer: &Option<Quantizer>,
    input: Tensor<B, D>,
) -> Tensor<B, D> {
    match quantizer {
        Some(quantizer) => quantizer.forward(input),
        None => input,
    }
}
