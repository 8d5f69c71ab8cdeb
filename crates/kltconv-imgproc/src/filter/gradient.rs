use kltconv_image::Image;

use super::backend::ConvolutionBackend;
use super::cache::KernelCache;
use super::config::FilterConfig;
use super::separable_filter::convolve_separable_with_backend;
use crate::error::FilterError;

/// Computes gaussian-smoothed images and gaussian-derivative gradients.
///
/// The engine owns the [`KernelCache`], so consecutive calls with nearly the same sigma
/// reuse the synthesized kernels. Give each thread its own engine, or guard a shared
/// one with a lock.
///
/// # Examples
///
/// ```
/// use kltconv_image::Image;
/// use kltconv_imgproc::filter::GradientEngine;
///
/// let img = Image::<f32, 1>::from_size_val([9, 9].into(), 100.0).unwrap();
/// let mut engine = GradientEngine::default();
///
/// let smoothed = engine.compute_smoothed_image(&img, 1.0).unwrap();
/// assert!((smoothed.get_pixel(4, 4, 0).unwrap() - 100.0).abs() < 1e-3);
/// assert_eq!(smoothed.get_pixel(0, 4, 0).unwrap(), 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GradientEngine {
    cache: KernelCache,
    backend: ConvolutionBackend,
}

impl GradientEngine {
    /// Create an engine from a filter configuration.
    ///
    /// An unavailable backend is replaced by [`ConvolutionBackend::Native`].
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidConfiguration`] if the configuration is invalid.
    pub fn new(config: FilterConfig) -> Result<Self, FilterError> {
        config.validate()?;
        Ok(Self {
            cache: KernelCache::new(config),
            backend: config.backend.resolve(),
        })
    }

    /// The backend running the convolution passes.
    pub fn backend(&self) -> ConvolutionBackend {
        self.backend
    }

    /// The kernel cache.
    pub fn cache(&self) -> &KernelCache {
        &self.cache
    }

    /// Compute the x and y gradients of an image at scale `sigma`.
    ///
    /// `grad_x` applies the derivative kernel along rows and the gaussian along columns;
    /// `grad_y` does the opposite.
    ///
    /// # Arguments
    ///
    /// * `src` - The source image with shape (H, W, C).
    /// * `sigma` - The gaussian sigma.
    ///
    /// # Returns
    ///
    /// The pair `(grad_x, grad_y)`, each the size of `src`.
    pub fn compute_gradients<const C: usize>(
        &mut self,
        src: &Image<f32, C>,
        sigma: f32,
    ) -> Result<(Image<f32, C>, Image<f32, C>), FilterError> {
        let kernels = self.cache.get_or_compute(sigma)?;
        let gauss = kernels.gaussian.as_slice();
        let deriv = kernels.derivative.as_slice();

        let grad_x = convolve_separable_with_backend(src, deriv, gauss, self.backend)?;
        let grad_y = convolve_separable_with_backend(src, gauss, deriv, self.backend)?;

        Ok((grad_x, grad_y))
    }

    /// Smooth an image with a gaussian of scale `sigma` along both axes.
    pub fn compute_smoothed_image<const C: usize>(
        &mut self,
        src: &Image<f32, C>,
        sigma: f32,
    ) -> Result<Image<f32, C>, FilterError> {
        let kernels = self.cache.get_or_compute(sigma)?;
        let gauss = kernels.gaussian.as_slice();

        convolve_separable_with_backend(src, gauss, gauss, self.backend)
    }

    /// Widths of the gaussian and derivative kernels for `sigma`.
    ///
    /// The kernels are synthesized for exactly `sigma` and replace the cached pair.
    pub fn kernel_widths(&mut self, sigma: f32) -> Result<(usize, usize), FilterError> {
        Ok(self.cache.refresh(sigma)?.widths())
    }
}
