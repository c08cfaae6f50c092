//! Sign quantization.

pub use super::*;

/// Binary quantization with a clipped straight-through gradient.
///
/// `output = sign(input), d output = d input · 1[|input| <= 1]`
#[derive(Clone, Copy, Debug, Default, Module, PartialEq)]
pub struct SteSign;

impl SteSign {
    /// Initialize the quantizer.
    #[inline]
    pub const fn init() -> Self {
        Self
    }

    /// Binarize the input tensor to `-1` and `+1`.
    pub fn forward<B: Backend, const D: usize>(
        &self,
        input: Tensor<B, D>,
    ) -> Tensor<B, D> {
        let clipped = input.to_owned().clamp(-1.0, 1.0);
        (sign(input) - clipped.to_owned()).detach() + clipped
    }
}

/// Binary quantization with a polynomial surrogate gradient.
///
/// `output = sign(input), d output = d input · max(2 - 2|input|, 0)`
#[derive(Clone, Copy, Debug, Default, Module, PartialEq)]
pub struct ApproxSign;

impl ApproxSign {
    /// Initialize the quantizer.
    #[inline]
    pub const fn init() -> Self {
        Self
    }

    /// Binarize the input tensor to `-1` and `+1`.
    pub fn forward<B: Backend, const D: usize>(
        &self,
        input: Tensor<B, D>,
    ) -> Tensor<B, D> {
        let clipped = input.to_owned().clamp(-1.0, 1.0);
        let surrogate = clipped
            .to_owned()
            .mul(clipped.abs().neg().add_scalar(2.0));
        (sign(input) - surrogate.to_owned()).detach() + surrogate
    }
}

/// `sign(0) = 1`, so binarized kernels never contain zeros.
fn sign<B: Backend, const D: usize>(input: Tensor<B, D>) -> Tensor<B, D> {
    input
        .greater_equal_elem(0.0)
        .float()
        .mul_scalar(2.0)
        .sub_scalar(1.0)
}

#[cfg(test)]
mod tests {
    #[test]
    fn forward() {
        use super::*;
        use burn::backend::NdArray;

        type B = NdArray<f32>;
        let device = &Default::default();

        let input = Tensor::<B, 1>::from_data([-2.0, -0.5, 0.0, 0.5, 2.0], device);
        let expected =
            Tensor::<B, 1>::from_data([-1.0, -1.0, 1.0, 1.0, 1.0], device).into_data();

        let output = SteSign::init().forward(input.to_owned());
        output.into_data().assert_eq(&expected, true);

        let output = ApproxSign::init().forward(input);
        output.into_data().assert_eq(&expected, true);
    }

    #[test]
    fn gradient_is_clipped() {
        use super::*;
        use burn::backend::{Autodiff, NdArray};

        type B = Autodiff<NdArray<f32>>;
        let device = &Default::default();

        let input =
            Tensor::<B, 1>::from_data([-2.0, -0.5, 0.5, 2.0], device).require_grad();
        let output = SteSign::init().forward(input.to_owned());
        let gradients = output.sum().backward();
        let gradient = input.grad(&gradients).unwrap();
        gradient.into_data().assert_eq(
            &Tensor::<NdArray<f32>, 1>::from_data([0.0, 1.0, 1.0, 0.0], device)
                .into_data(),
            true,
        );
    }

    #[test]
    fn surrogate_gradient_decays_linearly() {
        use super::*;
        use burn::backend::{Autodiff, NdArray};

        type B = Autodiff<NdArray<f32>>;
        let device = &Default::default();

        let input =
            Tensor::<B, 1>::from_data([-2.0, -0.5, 0.0, 0.5, 2.0], device).require_grad();
        let output = ApproxSign::init().forward(input.to_owned());
        let gradients = output.sum().backward();
        let gradient = input.grad(&gradients).unwrap();
        gradient.into_data().assert_approx_eq(
            &Tensor::<NdArray<f32>, 1>::from_data([0.0, 1.0, 2.0, 1.0, 0.0], device)
                .into_data(),
            6,
        );
    }
}
