use crate::domain::value_objects::{ColorSpace, Resolution, VideoFrame};

/// Swap the first and third byte of every four-byte pixel (RGBA <-> BGRA).
///
/// `buffer` must hold at least `pixel_count * 4` bytes. Applying it twice
/// restores the original contents.
pub fn swap_red_blue(buffer: &mut [u8], pixel_count: usize) {
    for pixel in buffer[..pixel_count * 4].chunks_exact_mut(4) {
        pixel.swap(0, 2);
    }
}

/// Pack an RGBA frame into UYVY 4:2:2 in place; returns the packed length.
///
/// BT.601 limited range. Chroma is averaged over each horizontal pixel pair;
/// an odd trailing pixel is paired with itself.
pub fn pack_uyvy(buffer: &mut [u8], resolution: Resolution) -> usize {
    let width = resolution.width() as usize;
    let height = resolution.height() as usize;
    if width == 0 || height == 0 {
        return 0;
    }

    let pairs = width.div_ceil(2);
    let row_out = pairs * 4;

    // Output offsets never pass the input still to be read, so one
    // forward pass is safe.
    for row in 0..height {
        let in_start = row * width * 4;
        let out_start = row * row_out;

        for pair in 0..pairs {
            let x0 = pair * 2;
            let x1 = (x0 + 1).min(width - 1);
            let p0 = in_start + x0 * 4;
            let p1 = in_start + x1 * 4;

            let (y0, u0, v0) = rgb_to_yuv(buffer[p0], buffer[p0 + 1], buffer[p0 + 2]);
            let (y1, u1, v1) = rgb_to_yuv(buffer[p1], buffer[p1 + 1], buffer[p1 + 2]);

            let out = out_start + pair * 4;
            buffer[out] = average(u0, u1);
            buffer[out + 1] = y0;
            buffer[out + 2] = average(v0, v1);
            buffer[out + 3] = y1;
        }
    }

    row_out * height
}

fn rgb_to_yuv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let r = i32::from(r);
    let g = i32::from(g);
    let b = i32::from(b);

    let y = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
    let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
    let v = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;

    (clamp_u8(y), clamp_u8(u), clamp_u8(v))
}

fn average(a: u8, b: u8) -> u8 {
    ((u16::from(a) + u16::from(b) + 1) / 2) as u8
}

fn clamp_u8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// Converts frames from the layout a source delivers to the layout a bridge publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelConverter {
    from: ColorSpace,
    to: ColorSpace,
}

impl PixelConverter {
    pub fn new(from: ColorSpace, to: ColorSpace) -> Self {
        Self { from, to }
    }

    /// Layout of the payload `convert` leaves in the frame
    pub fn output_layout(&self) -> ColorSpace {
        if self.from.is_four_byte() {
            self.to
        } else {
            self.from
        }
    }

    /// Convert `frame` in place and return the length of the converted payload
    pub fn convert(&self, frame: &mut VideoFrame) -> usize {
        let resolution = frame.resolution();
        let pixels = frame.pixel_count();

        match (self.from, self.to) {
            (from, to) if from == to => from.frame_size(resolution),
            (ColorSpace::Rgba, ColorSpace::Bgra) | (ColorSpace::Bgra, ColorSpace::Rgba) => {
                swap_red_blue(frame.data_mut(), pixels);
                pixels * 4
            }
            (ColorSpace::Rgba, ColorSpace::Uyvy) => pack_uyvy(frame.data_mut(), resolution),
            (ColorSpace::Bgra, ColorSpace::Uyvy) => {
                swap_red_blue(frame.data_mut(), pixels);
                pack_uyvy(frame.data_mut(), resolution)
            }
            // packed sources pass through untouched
            (from, _) => from.frame_size(resolution),
        }
    }
}
