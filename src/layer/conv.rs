//! Quantized convolution layers.

pub use super::*;
pub use burn::nn::conv::{
    Conv1d, Conv1dConfig, Conv2d, Conv2dConfig, Conv3d, Conv3dConfig,
};

/// The configuration for [`QuantConv1d`].
#[derive(Config, Debug)]
pub struct QuantConv1dConfig {
    /// Wrapped convolution.
    pub conv: Conv1dConfig,
    /// Quantizer applied to a scoped copy of the kernel.
    #[config(default = "None")]
    pub kernel_quantizer: Option<QuantizerConfig>,
    /// Quantizer applied to the input tensor.
    #[config(default = "None")]
    pub input_quantizer: Option<QuantizerConfig>,
}

/// The configuration for [`QuantConv2d`].
#[derive(Config, Debug)]
pub struct QuantConv2dConfig {
    /// Wrapped convolution.
    pub conv: Conv2dConfig,
    /// Quantizer applied to a scoped copy of the kernel.
    #[config(default = "None")]
    pub kernel_quantizer: Option<QuantizerConfig>,
    /// Quantizer applied to the input tensor.
    #[config(default = "None")]
    pub input_quantizer: Option<QuantizerConfig>,
}

/// The configuration for [`QuantConv3d`].
#[derive(Config, Debug)]
pub struct QuantConv3dConfig {
    /// Wrapped convolution.
    pub conv: Conv3dConfig,
    /// Quantizer applied to a scoped copy of the kernel.
    #[config(default = "None")]
    pub kernel_quantizer: Option<QuantizerConfig>,
    /// Quantizer applied to the input tensor.
    #[config(default = "None")]
    pub input_quantizer: Option<QuantizerConfig>,
}

/// Applies a 1D convolution with optional kernel and input quantization.
#[derive(Debug, Module)]
pub struct QuantConv1d<B: Backend> {
    /// Wrapped convolution.
    pub inner: Conv1d<B>,
    /// Kernel quantizer.
    pub kernel_quantizer: Ignored<Option<Quantizer>>,
    /// Input quantizer.
    pub input_quantizer: Ignored<Option<Quantizer>>,
}

/// Applies a 2D convolution with optional kernel and input quantization.
#[derive(Debug, Module)]
pub struct QuantConv2d<B: Backend> {
    /// Wrapped convolution.
    pub inner: Conv2d<B>,
    /// Kernel quantizer.
    pub kernel_quantizer: Ignored<Option<Quantizer>>,
    /// Input quantizer.
    pub input_quantizer: Ignored<Option<Quantizer>>,
}

/// Applies a 3D convolution with optional kernel and input quantization.
#[derive(Debug, Module)]
pub struct QuantConv3d<B: Backend> {
    /// Wrapped convolution.
    pub inner: Conv3d<B>,
    /// Kernel quantizer.
    pub kernel_quantizer: Ignored<Option<Quantizer>>,
    /// Input quantizer.
    pub input_quantizer: Ignored<Option<Quantizer>>,
}

impl QuantConv1dConfig {
    /// Initialize from the configuration.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> QuantConv1d<B> {
        QuantConv1d {
            inner: self.conv.init(device),
            kernel_quantizer: Ignored(quantizer::get(self.kernel_quantizer.as_ref())),
            input_quantizer: Ignored(quantizer::get(self.input_quantizer.as_ref())),
        }
    }
}

impl QuantConv2dConfig {
    /// Initialize from the configuration.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> QuantConv2d<B> {
        QuantConv2d {
            inner: self.conv.init(device),
            kernel_quantizer: Ignored(quantizer::get(self.kernel_quantizer.as_ref())),
            input_quantizer: Ignored(quantizer::get(self.input_quantizer.as_ref())),
        }
    }
}

impl QuantConv3dConfig {
    /// Initialize from the configuration.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> QuantConv3d<B> {
        QuantConv3d {
            inner: self.conv.init(device),
            kernel_quantizer: Ignored(quantizer::get(self.kernel_quantizer.as_ref())),
            input_quantizer: Ignored(quantizer::get(self.input_quantizer.as_ref())),
        }
    }
}

impl<B: Backend> KernelMapped<B> for Conv1d<B> {
    fn map_kernel(
        mut self,
        quantizer: &Quantizer,
    ) -> Self {
        self.weight = self.weight.map(|kernel| quantizer.forward(kernel));
        self
    }
}

impl<B: Backend> KernelMapped<B> for Conv2d<B> {
    fn map_kernel(
        mut self,
        quantizer: &Quantizer,
    ) -> Self {
        self.weight = self.weight.map(|kernel| quantizer.forward(kernel));
        self
    }
}

impl<B: Backend> KernelMapped<B> for Conv3d<B> {
    fn map_kernel(
        mut self,
        quantizer: &Quantizer,
    ) -> Self {
        self.weight = self.weight.map(|kernel| quantizer.forward(kernel));
        self
    }
}

impl<B: Backend> QuantConv1d<B> {
    /// Applies the forward pass on the input tensor.
    ///
    /// ## Shapes
    ///
    /// * `input` - `[batch, channels_in, length]`
    /// * `output` - `[batch, channels_out, length_out]`
    pub fn forward(
        &self,
        input: Tensor<B, 3>,
    ) -> Tensor<B, 3> {
        let input = quantize_input(&self.input_quantizer, input);
        match self.kernel_quantizer.as_ref() {
            Some(quantizer) => {
                self.inner.to_owned().map_kernel(quantizer).forward(input)
            },
            None => self.inner.forward(input),
        }
    }
}

impl<B: Backend> QuantConv2d<B> {
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

impl<B: Backend> QuantConv3d<B> {
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

        let layer = QuantConv2dConfig::new(Conv2dConfig::new([2, 3], [3, 3]))
            .with_kernel_quantizer(Some(QuantizerConfig::SteSign))
            .init::<B>(device);
        let kernel = layer.inner.weight.val().into_data();

        let input = Tensor::<B, 4>::random([1, 2, 8, 8], Distribution::Default, device);
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
            QuantConv1dConfig::new(Conv1dConfig::new(2, 4, 3)).init::<B>(device);
        let input = Tensor::<B, 3>::random([1, 2, 8], Distribution::Default, device);
        let output = layer.forward(input.to_owned());
        output
            .into_data()
            .assert_eq(&layer.inner.forward(input).into_data(), true);
    }

    #[test]
    fn forward_matches_an_eagerly_quantized_kernel() {
        use super::*;
        use burn::{backend::NdArray, tensor::Distribution};

        type B = NdArray<f32>;
        let device = &Default::default();

        let layer = QuantConv3dConfig::new(Conv3dConfig::new([2, 3], [2, 2, 2]))
            .with_kernel_quantizer(Some(QuantizerConfig::SteSign))
            .init::<B>(device);
        let reference = layer
            .inner
            .to_owned()
            .map_kernel(&QuantizerConfig::SteSign.init());

        let input =
            Tensor::<B, 5>::random([1, 2, 4, 4, 4], Distribution::Default, device);
        let output = layer.forward(input.to_owned());
        output
            .into_data()
            .assert_eq(&reference.forward(input).into_data(), true);
    }
}
