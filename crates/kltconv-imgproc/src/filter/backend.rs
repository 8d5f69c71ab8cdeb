use kltconv_image::ImageSize;
use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Selects the implementation of the 1-D correlation behind each convolution pass.
///
/// Every backend zeroes the `radius`-wide border and accumulates the taps in the same
/// order, so the outputs are bit-identical; only the speed differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvolutionBackend {
    /// Plain loops over the pixel buffer.
    #[default]
    Native,

    /// Sliding windows over `ndarray` lanes. Needs the `ndarray` feature.
    Ndarray,
}

impl ConvolutionBackend {
    /// Whether this backend is compiled into the crate.
    pub fn is_available(self) -> bool {
        match self {
            ConvolutionBackend::Native => true,
            ConvolutionBackend::Ndarray => cfg!(feature = "ndarray"),
        }
    }

    /// Return this backend, or [`ConvolutionBackend::Native`] if it is not available.
    pub fn resolve(self) -> Self {
        if self.is_available() {
            return self;
        }
        log::warn!(
            "{:?} convolution backend is not compiled in, falling back to the native loop",
            self
        );
        ConvolutionBackend::Native
    }

    /// Correlate every row of `src` with the reversed `kernel`, writing the interior
    /// columns of `dst`. Border columns of `dst` are left untouched.
    pub(crate) fn correlate_rows<const C: usize>(
        self,
        src: &[f32],
        dst: &mut [f32],
        size: ImageSize,
        kernel: &[f32],
    ) -> Result<(), FilterError> {
        if size.width < kernel.len() || size.height == 0 {
            return Ok(());
        }

        match self {
            #[cfg(feature = "ndarray")]
            ConvolutionBackend::Ndarray => {
                accelerated::correlate_axis::<C>(src, dst, size, kernel, 1)
            }
            _ => {
                native_rows::<C>(src, dst, size.width, kernel);
                Ok(())
            }
        }
    }

    /// Correlate every column of `src` with the reversed `kernel`, writing the interior
    /// rows of `dst`. Border rows of `dst` are left untouched.
    pub(crate) fn correlate_cols<const C: usize>(
        self,
        src: &[f32],
        dst: &mut [f32],
        size: ImageSize,
        kernel: &[f32],
    ) -> Result<(), FilterError> {
        if size.height < kernel.len() || size.width == 0 {
            return Ok(());
        }

        match self {
            #[cfg(feature = "ndarray")]
            ConvolutionBackend::Ndarray => {
                accelerated::correlate_axis::<C>(src, dst, size, kernel, 0)
            }
            _ => {
                native_cols::<C>(src, dst, size, kernel);
                Ok(())
            }
        }
    }
}

fn native_rows<const C: usize>(src: &[f32], dst: &mut [f32], cols: usize, kernel: &[f32]) {
    let radius = kernel.len() / 2;
    let stride = cols * C;

    for (src_row, dst_row) in src.chunks_exact(stride).zip(dst.chunks_exact_mut(stride)) {
        for c in radius..cols - radius {
            let first = (c - radius) * C;
            for ch in 0..C {
                // tap 0 lines up with the rightmost sample of the window
                let mut acc = 0.0f32;
                for (i, &k) in kernel.iter().rev().enumerate() {
                    acc += src_row[first + i * C + ch] * k;
                }
                dst_row[c * C + ch] = acc;
            }
        }
    }
}

fn native_cols<const C: usize>(src: &[f32], dst: &mut [f32], size: ImageSize, kernel: &[f32]) {
    let radius = kernel.len() / 2;
    let stride = size.width * C;

    for r in radius..size.height - radius {
        let first = (r - radius) * stride;
        let dst_row = &mut dst[r * stride..(r + 1) * stride];
        for (offset, out) in dst_row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (i, &k) in kernel.iter().rev().enumerate() {
                acc += src[first + i * stride + offset] * k;
            }
            *out = acc;
        }
    }
}

#[cfg(feature = "ndarray")]
mod accelerated {
    use kltconv_image::ImageSize;
    use ndarray::{ArrayView3, ArrayViewMut3, Axis};

    use crate::error::FilterError;

    /// Correlate each lane of the (rows, cols, channels) view along `axis`.
    pub(super) fn correlate_axis<const C: usize>(
        src: &[f32],
        dst: &mut [f32],
        size: ImageSize,
        kernel: &[f32],
        axis: usize,
    ) -> Result<(), FilterError> {
        let shape = (size.height, size.width, C);
        let src = ArrayView3::from_shape(shape, src)?;
        let mut dst = ArrayViewMut3::from_shape(shape, dst)?;
        let radius = kernel.len() / 2;

        for (src_lane, mut dst_lane) in src
            .lanes(Axis(axis))
            .into_iter()
            .zip(dst.lanes_mut(Axis(axis)))
        {
            for (i, window) in src_lane.windows(kernel.len()).into_iter().enumerate() {
                dst_lane[i + radius] = window
                    .iter()
                    .zip(kernel.iter().rev())
                    .fold(0.0f32, |acc, (&s, &k)| acc + s * k);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_is_always_available() {
        assert!(ConvolutionBackend::Native.is_available());
        assert_eq!(
            ConvolutionBackend::Native.resolve(),
            ConvolutionBackend::Native
        );
    }

    #[test]
    fn test_resolve_ndarray() {
        let resolved = ConvolutionBackend::Ndarray.resolve();
        if cfg!(feature = "ndarray") {
            assert_eq!(resolved, ConvolutionBackend::Ndarray);
        } else {
            assert_eq!(resolved, ConvolutionBackend::Native);
        }
    }

    #[test]
    fn test_correlate_rows_reverses_taps() -> Result<(), FilterError> {
        let size = ImageSize {
            width: 5,
            height: 1,
        };
        let src = [1.0, 2.0, 3.0, 4.0, 5.0];
        // tap 0 weights the rightmost sample of the window
        let kernel = [1.0, 0.0, 0.0];

        for backend in [ConvolutionBackend::Native, ConvolutionBackend::Ndarray] {
            let mut dst = [0.0f32; 5];
            backend.resolve().correlate_rows::<1>(&src, &mut dst, size, &kernel)?;
            assert_eq!(dst, [0.0, 3.0, 4.0, 5.0, 0.0]);
        }
        Ok(())
    }

    #[test]
    fn test_correlate_cols_multichannel() -> Result<(), FilterError> {
        let size = ImageSize {
            width: 1,
            height: 3,
        };
        #[rustfmt::skip]
        let src = [
            1.0, 10.0,
            2.0, 20.0,
            4.0, 40.0,
        ];
        let kernel = [1.0, 1.0, 1.0];

        for backend in [ConvolutionBackend::Native, ConvolutionBackend::Ndarray] {
            let mut dst = [0.0f32; 6];
            backend.resolve().correlate_cols::<2>(&src, &mut dst, size, &kernel)?;
            assert_eq!(dst, [0.0, 0.0, 7.0, 70.0, 0.0, 0.0]);
        }
        Ok(())
    }

    #[test]
    fn test_backend_serde_names() -> Result<(), serde_json::Error> {
        let backend: ConvolutionBackend = serde_json::from_str("\"ndarray\"")?;
        assert_eq!(backend, ConvolutionBackend::Ndarray);
        assert_eq!(
            serde_json::to_string(&ConvolutionBackend::Native)?,
            "\"native\""
        );
        Ok(())
    }
}
