mod pixel_converter;

pub use pixel_converter::{pack_uyvy, swap_red_blue, PixelConverter};
