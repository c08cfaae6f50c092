//! Rounding.

pub use super::*;

/// STE, Straight-through estimator for quantization.
///
/// `output = round(input), d output = d input`
#[derive(Clone, Copy, Debug, Default, Module, PartialEq)]
pub struct StraightThroughEstimator;

impl StraightThroughEstimator {
    /// Initialize the estimator.
    #[inline]
    pub const fn init() -> Self {
        Self
    }

    /// Round the input tensor to the nearest integer.
    pub fn forward<B: Backend, const D: usize>(
        &self,
        input: Tensor<B, D>,
    ) -> Tensor<B, D> {
        (input.to_owned().round() - input.to_owned()).detach() + input
    }
}

/// Uniform quantization on the unit interval.
///
/// `output = round(clamp(input, 0, 1) * s) / s, s = 2^bits - 1`
///
/// The gradient passes straight through inside the interval and is blocked
/// outside it.
#[derive(Clone, Copy, Debug, Module, PartialEq)]
pub struct Uniform {
    /// Bit width.
    pub bits: usize,
    /// Rounding.
    pub round: StraightThroughEstimator,
}

impl Uniform {
    /// Initialize the quantizer, clamping the bit width to `1..=24`.
    pub fn init(bits: usize) -> Self {
        Self {
            bits: bits.clamp(1, 24),
            round: StraightThroughEstimator::init(),
        }
    }

    /// Quantize the input tensor.
    pub fn forward<B: Backend, const D: usize>(
        &self,
        input: Tensor<B, D>,
    ) -> Tensor<B, D> {
        let scale = ((1_usize << self.bits) - 1) as f32;
        let input = input.clamp(0.0, 1.0).mul_scalar(scale);
        self.round.forward(input).div_scalar(scale)
    }
}

impl Default for Uniform {
    #[inline]
    fn default() -> Self {
        Self::init(8)
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn forward() {
        use super::*;
        use burn::backend::NdArray;

        type B = NdArray<f32>;
        let device = &Default::default();

        let quantizer = Uniform::init(1);
        let input = Tensor::<B, 1>::from_data([0.3, 0.6, -0.2, 1.4], device);
        let output = quantizer.forward(input);
        output.into_data().assert_eq(
            &Tensor::<B, 1>::from_data([0.0, 1.0, 0.0, 1.0], device).into_data(),
            true,
        );

        let quantizer = Uniform::init(2);
        let input = Tensor::<B, 1>::from_data([0.0, 0.5, 1.0], device);
        let output = quantizer.forward(input);
        output.into_data().assert_approx_eq(
            &Tensor::<B, 1>::from_data([0.0, 0.6666667, 1.0], device).into_data(),
            6,
        );
    }

    #[test]
    fn bit_width_is_clamped() {
        use super::*;

        assert_eq!(Uniform::init(0).bits, 1);
        assert_eq!(Uniform::init(64).bits, 24);
    }

    #[test]
    fn gradient_passes_inside_the_interval() {
        use super::*;
        use burn::backend::{Autodiff, NdArray};

        type B = Autodiff<NdArray<f32>>;
        let device = &Default::default();

        let input =
            Tensor::<B, 1>::from_data([-0.5, 0.25, 0.75, 1.5], device).require_grad();
        let output = Uniform::init(4).forward(input.to_owned());
        let gradients = output.sum().backward();
        let gradient = input.grad(&gradients).unwrap();
        gradient.into_data().assert_approx_eq(
            &Tensor::<NdArray<f32>, 1>::from_data([0.0, 1.0, 1.0, 0.0], device)
                .into_data(),
            6,
        );
    }
}
