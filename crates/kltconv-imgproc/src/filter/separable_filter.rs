use kltconv_image::Image;

use super::backend::ConvolutionBackend;
use crate::error::FilterError;

fn check_kernel(kernel: &[f32]) -> Result<(), FilterError> {
    if kernel.len() % 2 == 0 {
        return Err(FilterError::InvalidKernel(kernel.len()));
    }
    Ok(())
}

/// Convolve every row of an image with a 1-D kernel.
///
/// For each interior column `x` in `[radius, width - radius)` the output is
/// `sum_i src[x - radius + i] * kernel[len - 1 - i]`, i.e. tap 0 weights the rightmost
/// sample of the window. The `radius` columns at each side are set to zero.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `kernel` - The kernel, of odd length.
///
/// # Returns
///
/// A new image of the same size; `src` is not modified.
///
/// # Errors
///
/// Returns [`FilterError::InvalidKernel`] if the kernel length is even.
pub fn convolve_horizontal<const C: usize>(
    src: &Image<f32, C>,
    kernel: &[f32],
) -> Result<Image<f32, C>, FilterError> {
    convolve_horizontal_with_backend(src, kernel, ConvolutionBackend::Native)
}

/// Convolve every row of an image with a 1-D kernel using the given backend.
///
/// See [`convolve_horizontal`].
pub fn convolve_horizontal_with_backend<const C: usize>(
    src: &Image<f32, C>,
    kernel: &[f32],
    backend: ConvolutionBackend,
) -> Result<Image<f32, C>, FilterError> {
    check_kernel(kernel)?;

    let mut dst = Image::from_size_val(src.size(), 0.0f32)?;
    backend.correlate_rows::<C>(src.as_slice(), dst.as_slice_mut(), src.size(), kernel)?;
    Ok(dst)
}

/// Convolve every column of an image with a 1-D kernel.
///
/// The column-wise counterpart of [`convolve_horizontal`]: the `radius` rows at the top
/// and bottom are set to zero.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `kernel` - The kernel, of odd length.
///
/// # Errors
///
/// Returns [`FilterError::InvalidKernel`] if the kernel length is even.
pub fn convolve_vertical<const C: usize>(
    src: &Image<f32, C>,
    kernel: &[f32],
) -> Result<Image<f32, C>, FilterError> {
    convolve_vertical_with_backend(src, kernel, ConvolutionBackend::Native)
}

/// Convolve every column of an image with a 1-D kernel using the given backend.
///
/// See [`convolve_vertical`].
pub fn convolve_vertical_with_backend<const C: usize>(
    src: &Image<f32, C>,
    kernel: &[f32],
    backend: ConvolutionBackend,
) -> Result<Image<f32, C>, FilterError> {
    check_kernel(kernel)?;

    let mut dst = Image::from_size_val(src.size(), 0.0f32)?;
    backend.correlate_cols::<C>(src.as_slice(), dst.as_slice_mut(), src.size(), kernel)?;
    Ok(dst)
}

/// Apply a separable filter: a horizontal pass with `kernel_x` followed by a vertical
/// pass with `kernel_y`.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `kernel_x` - The horizontal kernel.
/// * `kernel_y` - The vertical kernel.
///
/// # Errors
///
/// Returns [`FilterError::InvalidKernel`] if either kernel has even length. Both kernels
/// are checked before any pass runs.
///
/// # Examples
///
/// ```
/// use kltconv_image::Image;
/// use kltconv_imgproc::filter::convolve_separable;
///
/// let img = Image::<f32, 1>::from_size_val([5, 5].into(), 2.0).unwrap();
/// let out = convolve_separable(&img, &[0.25, 0.5, 0.25], &[0.25, 0.5, 0.25]).unwrap();
/// assert_eq!(out.get_pixel(2, 2, 0).unwrap(), 2.0);
/// assert_eq!(out.get_pixel(0, 2, 0).unwrap(), 0.0);
/// ```
pub fn convolve_separable<const C: usize>(
    src: &Image<f32, C>,
    kernel_x: &[f32],
    kernel_y: &[f32],
) -> Result<Image<f32, C>, FilterError> {
    convolve_separable_with_backend(src, kernel_x, kernel_y, ConvolutionBackend::Native)
}

/// Apply a separable filter using the given backend.
///
/// See [`convolve_separable`].
pub fn convolve_separable_with_backend<const C: usize>(
    src: &Image<f32, C>,
    kernel_x: &[f32],
    kernel_y: &[f32],
    backend: ConvolutionBackend,
) -> Result<Image<f32, C>, FilterError> {
    check_kernel(kernel_x)?;
    check_kernel(kernel_y)?;

    let tmp = convolve_horizontal_with_backend(src, kernel_x, backend)?;
    convolve_vertical_with_backend(&tmp, kernel_y, backend)
}
