#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use kltconv_image as image;

#[doc(inline)]
pub use kltconv_imgproc as imgproc;
