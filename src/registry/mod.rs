//! Process-local registry of quantized layer types.
//!
//! Saved models refer to layers by type name. The registry maps those names
//! back to typed configurations so a saved configuration record can be
//! reconstructed. Registration is explicit: the composing application builds
//! a registry at startup instead of mutating framework-global state.

pub use crate::layer::{
    QuantConv1dConfig, QuantConv2dConfig, QuantConv3dConfig,
    QuantConvTranspose2dConfig, QuantConvTranspose3dConfig, QuantLinearConfig,
    QuantLocallyConnected1dConfig, QuantLocallyConnected2dConfig,
};

use crate::error::Error;
use std::collections::HashMap;

/// A layer configuration reconstructed from a saved record.
#[derive(Clone, Debug)]
pub enum LayerConfig {
    Conv1d(QuantConv1dConfig),
    Conv2d(QuantConv2dConfig),
    Conv3d(QuantConv3dConfig),
    ConvTranspose2d(QuantConvTranspose2dConfig),
    ConvTranspose3d(QuantConvTranspose3dConfig),
    LocallyConnected1d(QuantLocallyConnected1dConfig),
    LocallyConnected2d(QuantLocallyConnected2dConfig),
    Linear(QuantLinearConfig),
}

/// A deserializer turning one saved record into a [`LayerConfig`].
pub type LoadFn = fn(&str) -> Result<LayerConfig, Error>;

/// Name-to-type lookup for reconstructing quantized layers.
#[derive(Clone, Debug, Default)]
pub struct LayerRegistry {
    entries: HashMap<String, LoadFn>,
}

const BUILTINS: [(&str, LoadFn); 8] = [
    ("QuantConv1d", |record| {
        Ok(LayerConfig::Conv1d(serde_json::from_str(record)?))
    }),
    ("QuantConv2d", |record| {
        Ok(LayerConfig::Conv2d(serde_json::from_str(record)?))
    }),
    ("QuantConv3d", |record| {
        Ok(LayerConfig::Conv3d(serde_json::from_str(record)?))
    }),
    ("QuantConvTranspose2d", |record| {
        Ok(LayerConfig::ConvTranspose2d(serde_json::from_str(record)?))
    }),
    ("QuantConvTranspose3d", |record| {
        Ok(LayerConfig::ConvTranspose3d(serde_json::from_str(record)?))
    }),
    ("QuantLocallyConnected1d", |record| {
        Ok(LayerConfig::LocallyConnected1d(serde_json::from_str(record)?))
    }),
    ("QuantLocallyConnected2d", |record| {
        Ok(LayerConfig::LocallyConnected2d(serde_json::from_str(record)?))
    }),
    ("QuantLinear", |record| {
        Ok(LayerConfig::Linear(serde_json::from_str(record)?))
    }),
];

impl LayerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with every quantized layer type of this crate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, load) in BUILTINS {
            registry
                .register(name, load)
                .expect("The builtin names are unique");
        }
        registry
    }

    /// Register a layer type under a unique name.
    pub fn register(
        &mut self,
        name: &str,
        load: LoadFn,
    ) -> Result<(), Error> {
        if self.entries.contains_key(name) {
            return Err(Error::DuplicateLayer(name.into()));
        }
        log::debug!("Registering the quantized layer type: {name}");
        self.entries.insert(name.into(), load);
        Ok(())
    }

    /// Whether a layer type is registered under the name.
    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.entries.contains_key(name)
    }

    /// The registered names, in arbitrary order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Reconstruct a layer configuration from a saved record.
    pub fn load(
        &self,
        name: &str,
        record: &str,
    ) -> Result<LayerConfig, Error> {
        let load = self
            .entries
            .get(name)
            .ok_or_else(|| Error::UnknownLayer(name.into()))?;
        load(record)
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn builtins_are_registered() {
        use super::*;

        let registry = LayerRegistry::with_builtins();
        for name in [
            "QuantConv1d",
            "QuantConv2d",
            "QuantConv3d",
            "QuantConvTranspose2d",
            "QuantConvTranspose3d",
            "QuantLocallyConnected1d",
            "QuantLocallyConnected2d",
            "QuantLinear",
        ] {
            assert!(registry.contains(name), "{name} should be registered");
        }
        assert_eq!(registry.names().count(), 8);
    }

    #[test]
    fn record_round_trip() {
        use super::*;
        use crate::{layer::conv::Conv2dConfig, quantizer::QuantizerConfig};
        use burn::backend::NdArray;

        type B = NdArray<f32>;
        let device = &Default::default();

        let config = QuantConv2dConfig::new(Conv2dConfig::new([2, 3], [3, 3]))
            .with_kernel_quantizer(Some(QuantizerConfig::Uniform(4)))
            .with_input_quantizer(Some(QuantizerConfig::SteSign));
        let record = serde_json::to_string(&config).unwrap();

        let registry = LayerRegistry::with_builtins();
        let loaded = registry.load("QuantConv2d", &record).unwrap();
        let LayerConfig::Conv2d(loaded) = loaded else {
            panic!("The record should load as a 2D convolution");
        };
        assert_eq!(serde_json::to_string(&loaded).unwrap(), record);

        let layer = loaded.init::<B>(device);
        assert!(layer.kernel_quantizer.is_some());
        assert!(layer.input_quantizer.is_some());
    }

    #[test]
    fn duplicate_registration_fails() {
        use super::*;
        use crate::error::Error;

        let mut registry = LayerRegistry::with_builtins();
        let result = registry.register("QuantLinear", |record| {
            Ok(LayerConfig::Linear(serde_json::from_str(record)?))
        });
        assert!(matches!(result, Err(Error::DuplicateLayer(_))));
    }

    #[test]
    fn unknown_layer_fails() {
        use super::*;
        use crate::error::Error;

        let registry = LayerRegistry::with_builtins();
        let result = registry.load("QuantGroupNorm", "{}");
        assert!(matches!(result, Err(Error::UnknownLayer(_))));
    }
}
