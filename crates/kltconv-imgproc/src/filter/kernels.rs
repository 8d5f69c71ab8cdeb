use crate::error::FilterError;

use super::config::FilterConfig;

/// A 1-D convolution kernel with an odd number of taps.
///
/// The centre tap sits at index [`Kernel::radius`]; tap `i` weights the sample at
/// offset `i - radius` from the centre.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    taps: Vec<f32>,
}

impl Kernel {
    /// Create a kernel from its taps.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidKernel`] if the number of taps is even (or zero).
    pub fn new(taps: Vec<f32>) -> Result<Self, FilterError> {
        if taps.len() % 2 == 0 {
            return Err(FilterError::InvalidKernel(taps.len()));
        }
        Ok(Self { taps })
    }

    /// Number of taps.
    pub fn width(&self) -> usize {
        self.taps.len()
    }

    /// Number of taps on each side of the centre tap.
    pub fn radius(&self) -> usize {
        self.taps.len() / 2
    }

    /// The taps as a slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.taps
    }
}

impl AsRef<[f32]> for Kernel {
    fn as_ref(&self) -> &[f32] {
        &self.taps
    }
}

/// A Gaussian kernel and its first-derivative kernel, synthesized for one sigma.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelPair {
    /// The sigma the kernels were synthesized for.
    pub sigma: f32,
    /// Smoothing kernel, normalized to unit sum.
    pub gaussian: Kernel,
    /// Derivative kernel, normalized to unit first moment.
    pub derivative: Kernel,
}

impl KernelPair {
    /// Widths of the gaussian and derivative kernels.
    pub fn widths(&self) -> (usize, usize) {
        (self.gaussian.width(), self.derivative.width())
    }
}

/// Synthesize the truncated, normalized Gaussian and Gaussian-derivative kernels.
///
/// Both kernels are sampled into a working buffer of `config.max_kernel_width` taps,
/// then the tails whose magnitude is below `config.truncation_factor` of the peak are
/// dropped symmetrically. The gaussian is scaled to sum to one and the derivative is
/// scaled so that `sum(-i * tap[i + radius]) == 1`, which makes it return the true slope
/// of a linear ramp.
///
/// # Arguments
///
/// * `sigma` - The standard deviation of the gaussian.
/// * `config` - The filter constants.
///
/// # Errors
///
/// Returns [`FilterError::InvalidConfiguration`] if sigma is negative or not finite,
/// if it is so large that the working buffer cannot hold the kernel tails, or so small
/// that the derivative kernel collapses to a single zero tap.
///
/// # Examples
///
/// ```
/// use kltconv_imgproc::filter::{kernels, FilterConfig};
///
/// let kernels = kernels::gaussian_kernels(1.0, &FilterConfig::default()).unwrap();
/// assert_eq!(kernels.widths(), (7, 7));
/// ```
pub fn gaussian_kernels(sigma: f32, config: &FilterConfig) -> Result<KernelPair, FilterError> {
    config.validate()?;

    if !sigma.is_finite() || sigma < 0.0 {
        return Err(FilterError::InvalidConfiguration(format!(
            "sigma must be a non-negative number, got {sigma}"
        )));
    }

    if sigma == 0.0 {
        return Err(FilterError::InvalidConfiguration(
            "a sigma of 0 has no derivative kernel".to_string(),
        ));
    }

    let max_width = config.max_kernel_width;
    let half = max_width / 2;
    let sigma = sigma as f64;
    let two_sigma_sq = 2.0 * sigma * sigma;

    // sample both kernels over the full working buffer
    let mut gauss = vec![0.0f64; max_width];
    let mut deriv = vec![0.0f64; max_width];
    for (i, (g, d)) in gauss.iter_mut().zip(deriv.iter_mut()).enumerate() {
        let x = i as f64 - half as f64;
        *g = (-(x * x) / two_sigma_sq).exp();
        *d = -x * *g;
    }

    // the derivative peaks at x = sigma with magnitude sigma * e^-0.5
    let gauss_width = truncated_width(&gauss, 1.0, config.truncation_factor);
    let deriv_width = truncated_width(&deriv, sigma * (-0.5f64).exp(), config.truncation_factor);

    if gauss_width == max_width || deriv_width == max_width {
        return Err(FilterError::InvalidConfiguration(format!(
            "max_kernel_width {max_width} is too small for a sigma of {sigma}"
        )));
    }

    if deriv_width == 1 {
        return Err(FilterError::InvalidConfiguration(format!(
            "sigma {sigma} is too small to produce a derivative kernel"
        )));
    }

    let gaussian = normalize_gaussian(centered(&gauss, gauss_width));
    let derivative = normalize_derivative(centered(&deriv, deriv_width));

    log::debug!(
        "synthesized kernels for sigma {}: gaussian width {}, derivative width {}",
        sigma,
        gaussian.len(),
        derivative.len()
    );

    Ok(KernelPair {
        sigma: sigma as f32,
        gaussian: Kernel::new(gaussian)?,
        derivative: Kernel::new(derivative)?,
    })
}

/// Compute the widths of the kernels [`gaussian_kernels`] produces for `sigma`.
///
/// # Errors
///
/// Fails under the same conditions as [`gaussian_kernels`].
pub fn kernel_widths(sigma: f32, config: &FilterConfig) -> Result<(usize, usize), FilterError> {
    Ok(gaussian_kernels(sigma, config)?.widths())
}

/// Width left after trimming tail pairs below `factor * peak`.
///
/// Only the left half is scanned: the kernels are symmetric (or anti-symmetric), so
/// every tap dropped on the left drops its mirror on the right.
fn truncated_width(taps: &[f64], peak: f64, factor: f64) -> usize {
    let half = taps.len() / 2;
    let trimmed = taps[..half]
        .iter()
        .take_while(|&&t| (t / peak).abs() < factor)
        .count();
    taps.len() - 2 * trimmed
}

/// Copy the `width` taps around the centre of `taps` into their own buffer.
fn centered(taps: &[f64], width: usize) -> Vec<f64> {
    let start = (taps.len() - width) / 2;
    taps[start..start + width].to_vec()
}

fn normalize_gaussian(taps: Vec<f64>) -> Vec<f32> {
    let norm = taps.iter().sum::<f64>();
    taps.iter().map(|&t| (t / norm) as f32).collect()
}

fn normalize_derivative(taps: Vec<f64>) -> Vec<f32> {
    let half = (taps.len() / 2) as f64;
    let moment = taps
        .iter()
        .enumerate()
        .map(|(i, &t)| -(i as f64 - half) * t)
        .sum::<f64>();
    taps.iter().map(|&t| (t / moment) as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn first_moment(kernel: &Kernel) -> f64 {
        let half = kernel.radius() as f64;
        kernel
            .as_slice()
            .iter()
            .enumerate()
            .map(|(i, &t)| -(i as f64 - half) * t as f64)
            .sum()
    }

    #[test]
    fn test_kernel_rejects_even_length() {
        assert!(matches!(
            Kernel::new(vec![0.5, 0.5]),
            Err(FilterError::InvalidKernel(2))
        ));
        assert!(matches!(
            Kernel::new(vec![]),
            Err(FilterError::InvalidKernel(0))
        ));
    }

    #[test]
    fn test_gaussian_kernels_sigma_one() -> Result<(), FilterError> {
        let kernels = gaussian_kernels(1.0, &FilterConfig::default())?;
        assert_eq!(kernels.widths(), (7, 7));
        assert_eq!(kernels.gaussian.radius(), 3);

        let expected_gauss: [f32; 7] = [
            0.004433048, 0.05400558, 0.24203623, 0.39905028, 0.24203623, 0.05400558, 0.004433048,
        ];
        for (&k, &e) in kernels.gaussian.as_slice().iter().zip(expected_gauss.iter()) {
            assert_abs_diff_eq!(k, e, epsilon = 1e-7);
        }

        let expected_deriv: [f32; 7] = [
            0.013353735,
            0.10845453,
            0.24302974,
            0.0,
            -0.24302974,
            -0.10845453,
            -0.013353735,
        ];
        for (&k, &e) in kernels.derivative.as_slice().iter().zip(expected_deriv.iter()) {
            assert_abs_diff_eq!(k, e, epsilon = 1e-7);
        }

        Ok(())
    }

    #[test]
    fn test_gaussian_kernels_normalization() -> Result<(), FilterError> {
        let config = FilterConfig::default();
        for step in 2..=36 {
            let sigma = step as f32 * 0.25;
            let kernels = gaussian_kernels(sigma, &config)?;

            let sum = kernels
                .gaussian
                .as_slice()
                .iter()
                .map(|&t| t as f64)
                .sum::<f64>();
            assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-6);
            assert_abs_diff_eq!(first_moment(&kernels.derivative), 1.0, epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_gaussian_kernels_widths_odd_bounded_monotonic() -> Result<(), FilterError> {
        let config = FilterConfig::default();
        let mut last = (0, 0);
        for step in 2..=36 {
            let sigma = step as f32 * 0.25;
            let (gw, dw) = kernel_widths(sigma, &config)?;
            assert_eq!(gw % 2, 1);
            assert_eq!(dw % 2, 1);
            assert!(gw <= 71 && dw <= 71);
            assert!(gw >= last.0 && dw >= last.1, "widths shrank at sigma {sigma}");
            last = (gw, dw);
        }
        Ok(())
    }

    #[test]
    fn test_gaussian_kernels_symmetry() -> Result<(), FilterError> {
        let kernels = gaussian_kernels(2.3, &FilterConfig::default())?;

        let g = kernels.gaussian.as_slice();
        let d = kernels.derivative.as_slice();
        for i in 0..g.len() / 2 {
            assert_eq!(g[i], g[g.len() - 1 - i]);
        }
        for i in 0..d.len() / 2 {
            assert_eq!(d[i], -d[d.len() - 1 - i]);
        }
        assert_eq!(d[d.len() / 2], 0.0);
        Ok(())
    }

    #[test]
    fn test_gaussian_kernels_invalid_sigma() {
        let config = FilterConfig::default();
        for sigma in [-1.0, 0.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                gaussian_kernels(sigma, &config),
                Err(FilterError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_gaussian_kernels_sigma_too_large() {
        // the derivative tail no longer fits in 71 taps
        assert!(matches!(
            gaussian_kernels(10.0, &FilterConfig::default()),
            Err(FilterError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            gaussian_kernels(12.0, &FilterConfig::default()),
            Err(FilterError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_gaussian_kernels_sigma_too_small() {
        assert!(matches!(
            gaussian_kernels(0.2, &FilterConfig::default()),
            Err(FilterError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_gaussian_kernels_custom_width() -> Result<(), FilterError> {
        let config = FilterConfig {
            max_kernel_width: 9,
            ..Default::default()
        };
        assert_eq!(kernel_widths(1.0, &config)?, (7, 7));
        assert!(gaussian_kernels(2.0, &config).is_err());
        Ok(())
    }
}
