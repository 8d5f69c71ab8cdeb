use serde::{Deserialize, Serialize};

use super::backend::ConvolutionBackend;
use crate::error::FilterError;

/// Constants controlling kernel synthesis, caching and the convolution backend.
///
/// The defaults are the values used by the KLT feature tracker: a 71-tap working
/// buffer, tails truncated below 1% of the peak, and cached kernels reused while
/// sigma stays within 0.05 of the last request.
///
/// # Examples
///
/// ```
/// use kltconv_imgproc::filter::FilterConfig;
///
/// let config = FilterConfig::from_json(r#"{ "truncation_factor": 0.005 }"#).unwrap();
/// assert_eq!(config.max_kernel_width, 71);
/// assert_eq!(config.truncation_factor, 0.005);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Size of the working buffer kernels are sampled into. Must be odd.
    pub max_kernel_width: usize,
    /// Tail taps below this fraction of the kernel peak are discarded.
    pub truncation_factor: f64,
    /// Requests within this distance of the cached sigma reuse the cached kernels.
    pub sigma_tolerance: f32,
    /// Which 1-D correlation implementation runs the convolution passes.
    pub backend: ConvolutionBackend,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_kernel_width: 71,
            truncation_factor: 0.01,
            sigma_tolerance: 0.05,
            backend: ConvolutionBackend::Native,
        }
    }
}

impl FilterConfig {
    /// Parse a configuration from JSON. Missing fields take their default value.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::ConfigParse`] on malformed input and
    /// [`FilterError::InvalidConfiguration`] if the values fail [`FilterConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, FilterError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the constants are usable for kernel synthesis.
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.max_kernel_width % 2 == 0 {
            return Err(FilterError::InvalidConfiguration(format!(
                "max_kernel_width must be odd, got {}",
                self.max_kernel_width
            )));
        }

        if !self.truncation_factor.is_finite() || self.truncation_factor <= 0.0 {
            return Err(FilterError::InvalidConfiguration(format!(
                "truncation_factor must be positive, got {}",
                self.truncation_factor
            )));
        }

        if !self.sigma_tolerance.is_finite() || self.sigma_tolerance < 0.0 {
            return Err(FilterError::InvalidConfiguration(format!(
                "sigma_tolerance must be non-negative, got {}",
                self.sigma_tolerance
            )));
        }

        Ok(())
    }
}
