//! Quantized transposed convolution layers.

pub use super::*;
pub use burn::nn::conv::{
    ConvTranspose2d, ConvTranspose2dConfig, ConvTranspose3d, ConvTranspose3dConfig,
};

/// The configuration for [`QuantConvTranspose2d`].
#[derive(Config, Debug)]
pub struct QuantConvTranspose2dConfig {
    /// Wrapped transposed convolution.
    pub conv: ConvTranspose2dConfig,
    /// Quantizer applied to a scoped copy of the kernel.
    #[config(default = "None")]
    pub kernel_quantizer: Option<QuantizerConfig>,
    /// Quantizer applied to the input tensor.
    #[config(default = "None")]
    pub input_quantizer: Option<QuantizerConfig>,
}

/// The configuration for [`QuantConvTranspose3d`].
#[derive(Config, Debug)]
pub struct QuantConvTranspose3dConfig {
    /// Wrapped transposed convolution.
    pub conv: ConvTranspose3dConfig,
    /// Quantizer applied to a scoped copy of the kernel.
    #[config(default = "None")]
    pub kernel_quantizer: Option<QuantizerConfig>,
    /// Quantizer applied to the input tensor.
    #[config(default = "None")]
    pub input_quantizer: Option<QuantizerConfig>,
}

/// Applies a 2D transposed convolution with optional kernel and input
/// quantization.
#[derive(Debug, Module)]
pub struct QuantConvTranspose2d<B: Backend> {
    /// Wrapped transposed convolution.
    pub inner: ConvTranspose2d<B>,
    /// Kernel quantizer.
    pub kernel_quantizer: Ignored<Option<Quantizer>>,
    /// Input quantizer.
    pub input_quantizer: Ignored<Option<Quantizer>>,
}

/// Applies a 3D transposed convolution with optional kernel and input
/// quantization.
#[derive(Debug, Module)]
pub struct QuantConvTranspose3d<B: Backend> {
    /// Wrapped transposed convolution.
    pub inner: ConvTranspose3d<B>,
    /// Kernel quantizer.
    pub kernel_quantizer: Ignored<Option<Quantizer>>,
    /// Input quantizer.
    pub input_quantizer: Ignored<Option<Quantizer>>,
}

impl QuantConvTranspose2dConfig {
    /// Initialize from the configuration.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> QuantConvTranspose2d<B> {
        QuantConvTranspose2d {
            inner: self.conv.init(device),
            kernel_quantizer: Ignored(quantizer::get(self.kernel_quantizer.as_ref())),
            input_quantizer: Ignored(quantizer::get(self.input_quantizer.as_ref())),
        }
    }
}

impl QuantConvTranspose3dConfig {
    /// Initialize from the configuration.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> QuantConvTranspose3d<B> {
        QuantConvTranspose3d {
            inner: self.conv.init(device),
            kernel_quantizer: Ignored(quantizer::get(self.kernel_quantizer.as_ref())),
            input_quantizer: Ignored(quantizer::get(self.input_quantizer.as_ref())),
        }
    }
}

impl<B: Backend> KernelMapped<B> for ConvTranspose2d<B> {
    fn map_kernel(
        mut self,
        quantizer: &Quantizer,
    ) -> Self {
        self.weight = self.weight.map(|kernel| quantizer.forward(kernel));
        self
    }
}

impl<B: Backend> KernelMapped<B> for ConvTranspose3d<B> {
    fn map_kernel(
        mut self,
        quantizer: &Quantizer,
    ) -> Self {
        self.weight = self.weight.map(|kernel| quantizer.forward(kernel));
        self
    }
}

impl<B: Backend> QuantConvTranspose2d<B> {
    /// Applies the forward pass on the input tensor.
    ///
    /// ## Shapes
    ///
    /// * `input` - `[batch, channels_in, height, width]`
    /// * `output` - `[batch, channels_out, height_out, width_out]`
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let input = quantize_input(&self.input_quantizer, input);
        match self.kernel_quantizer.as_ref() {
            Some(quantizer) => {
                self.inner.to_owned().map_kernel(quantizer).forward(input)
            },
            None => self.inner.forward(input),
        }
    }
}

impl<B: Backend> QuantConvTranspose3d<B> {
    /// Applies the forward pass on the input tensor.
    ///
    /// ## Shapes
    ///
    /// * `input` - `[batch, channels_in, depth, height, width]`
    /// * `output` - `[batch, channels_out, depth_out, height_out, width_out]`
    pub fn forward(
        &self,
        input: Tensor<B, 5>,
    ) -> Tensor<B, 5> {
        let input = quantize_input(&self.input_quantizer, input);
        match self.kernel_quantizer.as_ref() {
            Some(quantizer) => {
                self.inner.to_owned().map_kernel(quantizer).forward(input)
            },
            None => self.inner.forward(input),
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn forward_preserves_the_kernel() {
        use super::*;
        use burn::{backend::NdArray, tensor::Distribution};

        type B = NdArray<f32>;
        let device = &Default::default();

        let layer =
            QuantConvTranspose2dConfig::new(ConvTranspose2dConfig::new([2, 3], [3, 3]))
                .with_kernel_quantizer(Some(QuantizerConfig::Uniform(4)))
                .init::<B>(device);
        let kernel = layer.inner.weight.val().into_data();

        let input = Tensor::<B, 4>::random([1, 2, 5, 5], Distribution::Default, device);
        let _ = layer.forward(input);

        layer.inner.weight.val().into_data().assert_eq(&kernel, true);
    }

    #[test]
    fn forward_without_quantizers_matches_the_wrapped_layer() {
        use super::*;
        use burn::{backend::NdArray, tensor::Distribution};

        type B = NdArray<f32>;
        let device = &Default::default();

        let layer =
            QuantConvTranspose3dConfig::new(ConvTranspose3dConfig::new([2, 3], [2, 2, 2]))
                .init::<B>(device);
        let input =
            Tensor::<B, 5>::random([1, 2, 3, 3, 3], Distribution::Default, device);
        let output = layer.forward(input.to_owned());
        output
            .into_data()
            .assert_eq(&layer.inner.forward(input).into_data(), true);
    }
}
