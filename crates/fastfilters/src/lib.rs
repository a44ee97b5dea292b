#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use fastfilters_image as image;

#[doc(inline)]
pub use fastfilters_imgproc as imgproc;

#[doc(inline)]
pub use fastfilters_linalg as linalg;
