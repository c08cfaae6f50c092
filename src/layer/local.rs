//! Locally connected layers and their quantized variants.
//!
//! A locally connected layer applies a convolution-like transformation with
//! untied kernels: every output position owns its own kernel, so no weights
//! are shared across positions. The wrapped framework has no such layer, so
//! the full-precision modules live here as well.

pub use super::*;
pub use burn::nn::Initializer;

use burn::tensor::{module::unfold4d, ops::UnfoldOptions};

/// The configuration for [`LocallyConnected1d`].
#[derive(Config, Debug)]
pub struct LocallyConnected1dConfig {
    /// Input channels.
    pub channels_in: usize,
    /// Output channels.
    pub channels_out: usize,
    /// Input length.
    pub length: usize,
    /// Kernel size.
    pub kernel_size: usize,
    /// Stride.
    #[config(default = "1")]
    pub stride: usize,
    /// With bias.
    #[config(default = true)]
    pub bias: bool,
    /// Parameter initializer.
    #[config(default = "Initializer::XavierUniform { gain: 1.0 }")]
    pub initializer: Initializer,
}

/// The configuration for [`LocallyConnected2d`].
#[derive(Config, Debug)]
pub struct LocallyConnected2dConfig {
    /// Input channels.
    pub channels_in: usize,
    /// Output channels.
    pub channels_out: usize,
    /// Input size.
    pub size: [usize; 2],
    /// Kernel size.
    pub kernel_size: [usize; 2],
    /// Stride.
    #[config(default = "[1, 1]")]
    pub stride: [usize; 2],
    /// With bias.
    #[config(default = true)]
    pub bias: bool,
    /// Parameter initializer.
    #[config(default = "Initializer::XavierUniform { gain: 1.0 }")]
    pub initializer: Initializer,
}

/// Applies a 1D locally connected transformation with valid padding.
#[derive(Debug, Module)]
pub struct LocallyConnected1d<B: Backend> {
    /// `[positions, channels_out, channels_in * kernel_size]`
    pub weight: Param<Tensor<B, 3>>,
    /// `[positions, channels_out]`
    pub bias: Option<Param<Tensor<B, 2>>>,
    /// Kernel size.
    pub kernel_size: usize,
    /// Stride.
    pub stride: usize,
}

/// Applies a 2D locally connected transformation with valid padding.
#[derive(Debug, Module)]
pub struct LocallyConnected2d<B: Backend> {
    /// `[positions, channels_out, channels_in * kernel_size[0] * kernel_size[1]]`
    pub weight: Param<Tensor<B, 3>>,
    /// `[positions, channels_out]`
    pub bias: Option<Param<Tensor<B, 2>>>,
    /// Kernel size.
    pub kernel_size: [usize; 2],
    /// Stride.
    pub stride: [usize; 2],
    /// Output size.
    ///
    /// `positions = size_out[0] * size_out[1]`
    pub size_out: [usize; 2],
}

impl LocallyConnected1dConfig {
    /// Initialize from the configuration.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> LocallyConnected1d<B> {
        assert!(
            self.kernel_size <= self.length,
            "Kernel size should not exceed the input length"
        );
        let positions = (self.length - self.kernel_size) / self.stride + 1;
        let kernel = self.channels_in * self.kernel_size;
        let weight = self.initializer.init_with(
            [positions, self.channels_out, kernel],
            Some(kernel),
            Some(self.channels_out),
            device,
        );
        let bias = self.bias.then(|| {
            self.initializer.init_with(
                [positions, self.channels_out],
                Some(kernel),
                Some(self.channels_out),
                device,
            )
        });
        LocallyConnected1d {
            weight,
            bias,
            kernel_size: self.kernel_size,
            stride: self.stride,
        }
    }
}

impl LocallyConnected2dConfig {
    /// Initialize from the configuration.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> LocallyConnected2d<B> {
        assert!(
            self.kernel_size[0] <= self.size[0] && self.kernel_size[1] <= self.size[1],
            "Kernel size should not exceed the input size"
        );
        let size_out = [
            (self.size[0] - self.kernel_size[0]) / self.stride[0] + 1,
            (self.size[1] - self.kernel_size[1]) / self.stride[1] + 1,
        ];
        let positions = size_out[0] * size_out[1];
        let kernel = self.channels_in * self.kernel_size[0] * self.kernel_size[1];
        let weight = self.initializer.init_with(
            [positions, self.channels_out, kernel],
            Some(kernel),
            Some(self.channels_out),
            device,
        );
        let bias = self.bias.then(|| {
            self.initializer.init_with(
                [positions, self.channels_out],
                Some(kernel),
                Some(self.channels_out),
                device,
            )
        });
        LocallyConnected2d {
            weight,
            bias,
            kernel_size: self.kernel_size,
            stride: self.stride,
            size_out,
        }
    }
}

impl<B: Backend> LocallyConnected1d<B> {
    /// Applies the forward pass on the input tensor.
    ///
    /// ## Shapes
    ///
    /// * `input` - `[batch, channels_in, length]`
    /// * `output` - `[batch, channels_out, positions]`
    pub fn forward(
        &self,
        input: Tensor<B, 3>,
    ) -> Tensor<B, 3> {
        let [batch, channels_in, _] = input.dims();
        let [positions, _, _] = self.weight.dims();

        let columns = (0..positions)
            .map(|position| {
                let start = position * self.stride;
                input
                    .to_owned()
                    .slice([
                        0..batch,
                        0..channels_in,
                        start..start + self.kernel_size,
                    ])
                    .reshape([batch, channels_in * self.kernel_size])
            })
            .collect::<Vec<_>>();
        // [positions, batch, channels_in * kernel_size]
        let columns = Tensor::stack::<3>(columns, 0);

        // [positions, batch, channels_out]
        let mut output = columns.matmul(self.weight.val().swap_dims(1, 2));
        if let Some(bias) = &self.bias {
            output = output + bias.val().unsqueeze_dim::<3>(1);
        }
        // [batch, channels_out, positions]
        output.permute([1, 2, 0])
    }
}

impl<B: Backend> LocallyConnected2d<B> {
    /// Applies the forward pass on the input tensor.
    ///
    /// ## Shapes
    ///
    /// * `input` - `[batch, channels_in, size[0], size[1]]`
    /// * `output` - `[batch, channels_out, size_out[0], size_out[1]]`
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let [batch, _, _, _] = input.dims();
        let [_, channels_out, _] = self.weight.dims();

        // [batch, channels_in * kernel_size[0] * kernel_size[1], positions]
        let columns = unfold4d(
            input,
            self.kernel_size,
            UnfoldOptions::new(self.stride, [0, 0], [1, 1]),
        );
        // [positions, batch, channels_in * kernel_size[0] * kernel_size[1]]
        let columns = columns.permute([2, 0, 1]);

        // [positions, batch, channels_out]
        let mut output = columns.matmul(self.weight.val().swap_dims(1, 2));
        if let Some(bias) = &self.bias {
            output = output + bias.val().unsqueeze_dim::<3>(1);
        }
        let [height, width] = self.size_out;
        output
            .permute([1, 2, 0])
            .reshape([batch, channels_out, height, width])
    }
}

/// The configuration for [`QuantLocallyConnected1d`].
#[derive(Config, Debug)]
pub struct QuantLocallyConnected1dConfig {
    /// Wrapped locally connected layer.
    pub local: LocallyConnected1dConfig,
    /// Quantizer applied to a scoped copy of the kernel.
    #[config(default = "None")]
    pub kernel_quantizer: Option<QuantizerConfig>,
    /// Quantizer applied to the input tensor.
    #[config(default = "None")]
    pub input_quantizer: Option<QuantizerConfig>,
}

/// The configuration for [`QuantLocallyConnected2d`].
#[derive(Config, Debug)]
pub struct QuantLocallyConnected2dConfig {
    /// Wrapped locally connected layer.
    pub local: LocallyConnected2dConfig,
    /// Quantizer applied to a scoped copy of the kernel.
    #[config(default = "None")]
    pub kernel_quantizer: Option<QuantizerConfig>,
    /// Quantizer applied to the input tensor.
    #[config(default = "None")]
    pub input_quantizer: Option<QuantizerConfig>,
}

/// Applies a 1D locally connected transformation with optional kernel and
/// input quantization.
#[derive(Debug, Module)]
pub struct QuantLocallyConnected1d<B: Backend> {
    /// Wrapped locally connected layer.
    pub inner: LocallyConnected1d<B>,
    /// Kernel quantizer.
    pub kernel_quantizer: Ignored<Option<Quantizer>>,
    /// Input quantizer.
    pub input_quantizer: Ignored<Option<Quantizer>>,
}

/// Applies a 2D locally connected transformation with optional kernel and
/// input quantization.
#[derive(Debug, Module)]
pub struct QuantLocallyConnected2d<B: Backend> {
    /// Wrapped locally connected layer.
    pub inner: LocallyConnected2d<B>,
    /// Kernel quantizer.
    pub kernel_quantizer: Ignored<Option<Quantizer>>,
    /// Input quantizer.
    pub input_quantizer: Ignored<Option<Quantizer>>,
}

impl QuantLocallyConnected1dConfig {
    /// Initialize from the configuration.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> QuantLocallyConnected1d<B> {
        QuantLocallyConnected1d {
            inner: self.local.init(device),
            kernel_quantizer: Ignored(quantizer::get(self.kernel_quantizer.as_ref())),
            input_quantizer: Ignored(quantizer::get(self.input_quantizer.as_ref())),
        }
    }
}

impl QuantLocallyConnected2dConfig {
    /// Initialize from the configuration.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> QuantLocallyConnected2d<B> {
        QuantLocallyConnected2d {
            inner: self.local.init(device),
            kernel_quantizer: Ignored(quantizer::get(self.kernel_quantizer.as_ref())),
            input_quantizer: Ignored(quantizer::get(self.input_quantizer.as_ref())),
        }
    }
}

impl<B: Backend> KernelMapped<B> for LocallyConnected1d<B> {
    fn map_kernel(
        mut self,
        quantizer: &Quantizer,
    ) -> Self {
        self.weight = self.weight.map(|kernel| quantizer.forward(kernel));
        self
    }
}

impl<B: Backend> KernelMapped<B> for LocallyConnected2d<B> {
    fn map_kernel(
        mut self,
        quantizer: &Quantizer,
    ) -> Self {
        self.weight = self.weight.map(|kernel| quantizer.forward(kernel));
        self
    }
}

impl<B: Backend> QuantLocallyConnected1d<B> {
    /// Applies the forward pass on the input tensor.
    ///
    /// ## Shapes
    ///
    /// * `input` - `[batch, channels_in, length]`
    /// * `output` - `[batch, channels_out, positions]`
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

impl<B: Backend> QuantLocallyConnected2d<B> {
    /// Applies the forward pass on the input tensor.
    ///
    /// ## Shapes
    ///
    /// * `input` - `[batch, channels_in, size[0], size[1]]`
    /// * `output` - `[batch, channels_out, size_out[0], size_out[1]]`
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
