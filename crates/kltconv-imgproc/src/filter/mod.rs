//! Filter operations
//!
//! Gaussian and Gaussian-derivative kernels, the separable convolution engine that
//! applies them, and the gradient/smoothing entry points built on top.

/// Convolution backends
pub mod backend;
pub use backend::ConvolutionBackend;

/// Kernel cache
mod cache;
pub use cache::KernelCache;

/// Filter configuration
mod config;
pub use config::FilterConfig;

/// Gradient and smoothing operations
mod gradient;
pub use gradient::GradientEngine;

/// Filter kernels
pub mod kernels;

/// Separable filter operations
mod separable_filter;
pub use separable_filter::*;
