//! Quantized dense layer.

pub use super::*;
pub use burn::nn::{Linear, LinearConfig};

/// The configuration for [`QuantLinear`].
#[derive(Config, Debug)]
pub struct QuantLinearConfig {
    /// Wrapped dense layer.
    pub linear: LinearConfig,
    /// Quantizer applied to a scoped copy of the kernel.
    #[config(default = "None")]
    pub kernel_quantizer: Option<QuantizerConfig>,
    /// Quantizer applied to the input tensor.
    #[config(default = "None")]
    pub input_quantizer: Option<QuantizerConfig>,
}

/// Applies a linear transformation with optional kernel and input
/// quantization.
#[derive(Debug, Module)]
pub struct QuantLinear<B: Backend> {
    /// Wrapped dense layer.
    pub inner: Linear<B>,
    /// Kernel quantizer.
    pub kernel_quantizer: Ignored<Option<Quantizer>>,
    /// Input quantizer.
    pub input_quantizer: Ignored<Option<Quantizer>>,
}

impl QuantLinearConfig {
    /// Initialize from the configuration.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> QuantLinear<B> {
        QuantLinear {
            inner: self.linear.init(device),
            kernel_quantizer: Ignored(quantizer::get(self.kernel_quantizer.as_ref())),
            input_quantizer: Ignored(quantizer::get(self.input_quantizer.as_ref())),
        }
    }
}

impl<B: Backend> KernelMapped<B> for Linear<B> {
    fn map_kernel(
        mut self,
        quantizer: &Quantizer,
    ) -> Self {
        self.weight = self.weight.map(|kernel| quantizer.forward(kernel));
        self
    }
}

impl<B: Backend> QuantLinear<B> {
    /// Applies the forward pass on the input tensor.
    ///
    /// ## Shapes
    ///
    /// * `input` - `[..., d_input]`
    /// * `output` - `[..., d_output]`
    pub fn forward<const D: usize>(
        &self,
        input: Tensor<B, D>,
    ) -> Tensor<B, D> {
        let input = quantize_input(&self.input_quantizer, input);
        match self.kernel_quantizer.as_ref() {
            Some(quantizer) => {
                self.inner.to_owned().map_kernel(quantizer).forward(input)
            },
            None => self.inner.forward(input),
        }
    }
}
