//! Quantizers map a tensor to a reduced-precision tensor while keeping the
//! computation differentiable through straight-through estimation.

pub mod round;
pub mod sign;

pub use burn::{
    config::Config,
    module::Module,
    tensor::{backend::Backend, Tensor},
};
pub use round::{StraightThroughEstimator, Uniform};
pub use sign::{ApproxSign, SteSign};

use crate::error::Error;
use std::str::FromStr;

/// The serializable specification of a [`Quantizer`].
#[derive(Config, Debug, PartialEq)]
pub enum QuantizerConfig {
    /// No precision reduction.
    Identity,
    /// Binary quantization with a clipped straight-through gradient.
    SteSign,
    /// Binary quantization with a polynomial surrogate gradient.
    ApproxSign,
    /// Uniform quantization to the given bit width.
    Uniform(usize),
}

/// A resolved quantizer, applied element-wise to kernel or input tensors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Quantizer {
    Identity,
    SteSign(SteSign),
    ApproxSign(ApproxSign),
    Uniform(Uniform),
}

impl QuantizerConfig {
    /// Initialize from the configuration.
    pub fn init(&self) -> Quantizer {
        match self {
            Self::Identity => Quantizer::Identity,
            Self::SteSign => Quantizer::SteSign(SteSign::init()),
            Self::ApproxSign => Quantizer::ApproxSign(ApproxSign::init()),
            Self::Uniform(bits) => Quantizer::Uniform(Uniform::init(*bits)),
        }
    }
}

impl Quantizer {
    /// Applies the quantizer to the input tensor.
    pub fn forward<B: Backend, const D: usize>(
        &self,
        input: Tensor<B, D>,
    ) -> Tensor<B, D> {
        match self {
            Self::Identity => input,
            Self::SteSign(quantizer) => quantizer.forward(input),
            Self::ApproxSign(quantizer) => quantizer.forward(input),
            Self::Uniform(quantizer) => quantizer.forward(input),
        }
    }

    /// The specification this quantizer was resolved from.
    pub fn to_config(&self) -> QuantizerConfig {
        match self {
            Self::Identity => QuantizerConfig::Identity,
            Self::SteSign(_) => QuantizerConfig::SteSign,
            Self::ApproxSign(_) => QuantizerConfig::ApproxSign,
            Self::Uniform(quantizer) => QuantizerConfig::Uniform(quantizer.bits),
        }
    }

    /// The registered name of this quantizer.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::SteSign(_) => "ste_sign",
            Self::ApproxSign(_) => "approx_sign",
            Self::Uniform(_) => "uniform",
        }
    }
}

/// Resolve an optional quantizer specification.
pub fn get(config: Option<&QuantizerConfig>) -> Option<Quantizer> {
    let quantizer = config.map(QuantizerConfig::init);
    if let Some(quantizer) = &quantizer {
        log::debug!("Resolved the quantizer: {}", quantizer.name());
    }
    quantizer
}

/// Serialize an optional quantizer back into its specification.
pub fn serialize(quantizer: Option<&Quantizer>) -> Option<QuantizerConfig> {
    quantizer.map(Quantizer::to_config)
}

impl FromStr for QuantizerConfig {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "identity" => Ok(Self::Identity),
            "ste_sign" => Ok(Self::SteSign),
            "approx_sign" => Ok(Self::ApproxSign),
            "uniform" => Ok(Self::Uniform(8)),
            _ => Err(Error::UnknownQuantizer(name.into())),
        }
    }
}
