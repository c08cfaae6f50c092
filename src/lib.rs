#![allow(missing_docs)]

pub mod error;
pub mod layer;
pub mod quantizer;
pub mod registry;

pub use error::Error;
