use kltconv_image::ImageError;

/// An error type for the filtering module.
#[derive(thiserror::Error, Debug)]
pub enum FilterError {
    /// The requested sigma or filter constants cannot produce a valid kernel.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The kernel has an even number of taps.
    #[error("Kernel length must be odd, got {0}")]
    InvalidKernel(usize),

    /// Error raised by the image buffer.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The filter configuration could not be parsed.
    #[error("Failed to parse filter configuration")]
    ConfigParse(#[from] serde_json::Error),

    /// The image could not be viewed as an array.
    #[cfg(feature = "ndarray")]
    #[error("Invalid array shape")]
    Shape(#[from] ndarray::ShapeError),
}
