use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use log::debug;

/// First code point of the braille patterns block
const BRAILLE_BASE: u32 = 0x2800;

/// Pixel size of one braille cell
const CELL_WIDTH: u32 = 2;
const CELL_HEIGHT: u32 = 4;

/// Dot bit for a pixel offset within a cell, braille dot numbering
const DOT_BITS: [[u32; CELL_HEIGHT as usize]; CELL_WIDTH as usize] = [
    [0x01, 0x02, 0x04, 0x40],
    [0x08, 0x10, 0x20, 0x80],
];

/// Braille rendering configuration
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Invert lit and unlit dots
    pub reverse: bool,
    /// Scale the source to this percentage of its size
    pub size_percent: Option<f64>,
    /// Maximum output width in braille columns
    pub max_x: Option<u32>,
    /// Maximum output height in braille rows
    pub max_y: Option<u32>,
    /// Per-channel sensitivity (red, green, blue, alpha)
    pub sensitivity: (f64, f64, f64, f64),
    /// Pad the output to a minimum canvas
    pub enable_padding: bool,
    /// Minimum canvas size in pixels when padding is on
    pub pad_size: (u32, u32),
    /// Disable to skip scaling and use the source pixels as-is
    pub enable_processing: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            reverse: false,
            size_percent: None,
            max_x: None,
            max_y: None,
            sensitivity: (2.0, 2.0, 2.0, 1.0),
            enable_padding: true,
            pad_size: (60, 60),
            enable_processing: true,
        }
    }
}

/// One rendered frame: a geometry header line plus the braille rows
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    /// Human-readable geometry summary, used by the encoder's progress log
    pub header: String,
    /// Braille rows, top to bottom, no embedded newlines
    pub rows: Vec<String>,
}

/// Image to braille text-art renderer
pub struct BrailleRenderer {
    options: RenderOptions,
}

impl BrailleRenderer {
    /// Create a renderer with the given options
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render an image into braille rows.
    ///
    /// Total over all inputs: any image produces a frame, the only
    /// degenerate case being zero rows for a zero-sized image.
    pub fn render(&self, image: &DynamicImage) -> RenderedFrame {
        let scaled = self.scale(image);
        let (width, height) = scaled.dimensions();

        // Canvas in pixels: at least the padding floor, rounded up to
        // whole cells so partial cells never fall off the edge
        let (mut canvas_w, mut canvas_h) = if self.options.enable_padding {
            (
                width.max(self.options.pad_size.0),
                height.max(self.options.pad_size.1),
            )
        } else {
            (width, height)
        };
        canvas_w = round_up(canvas_w, CELL_WIDTH);
        canvas_h = round_up(canvas_h, CELL_HEIGHT);

        let cols = canvas_w / CELL_WIDTH;
        let cell_rows = canvas_h / CELL_HEIGHT;

        // Center the image on the canvas
        let off_x = (canvas_w - width) / 2;
        let off_y = (canvas_h - height) / 2;

        let mut rows = Vec::with_capacity(cell_rows as usize);
        for cell_y in 0..cell_rows {
            let mut row = String::with_capacity(cols as usize * 3);
            for cell_x in 0..cols {
                let mut bits = 0u32;
                for dx in 0..CELL_WIDTH {
                    for dy in 0..CELL_HEIGHT {
                        let px = cell_x * CELL_WIDTH + dx;
                        let py = cell_y * CELL_HEIGHT + dy;
                        if self.dot_lit(&scaled, px, py, off_x, off_y) {
                            bits |= DOT_BITS[dx as usize][dy as usize];
                        }
                    }
                }
                // bits <= 0xFF, so this stays inside the braille block
                row.push(char::from_u32(BRAILLE_BASE + bits).unwrap_or('\u{2800}'));
            }
            rows.push(row);
        }

        let header = format!("{}x{} cells ({}x{} px)", cols, cell_rows, canvas_w, canvas_h);
        debug!("Rendered frame: {}", header);

        RenderedFrame { header, rows }
    }

    /// Whether the dot at canvas position (px, py) is lit
    fn dot_lit(&self, image: &DynamicImage, px: u32, py: u32, off_x: u32, off_y: u32) -> bool {
        let (width, height) = image.dimensions();
        let lit = if px < off_x || py < off_y || px - off_x >= width || py - off_y >= height {
            false
        } else {
            let pixel = image.get_pixel(px - off_x, py - off_y).0;
            self.pixel_lit(pixel)
        };
        lit != self.options.reverse
    }

    /// Threshold one pixel by sensitivity-weighted luminance
    fn pixel_lit(&self, [r, g, b, a]: [u8; 4]) -> bool {
        let (sr, sg, sb, sa) = self.options.sensitivity;
        if f64::from(a) / 255.0 * sa < 0.5 {
            return false;
        }

        // ITU-R BT.709 luma, each channel weighted by its sensitivity
        let luminance = (0.2126 * f64::from(r) * sr
            + 0.7152 * f64::from(g) * sg
            + 0.0722 * f64::from(b) * sb)
            / 255.0;
        luminance >= 0.5
    }

    /// Scale the source image according to the sizing options
    fn scale(&self, image: &DynamicImage) -> DynamicImage {
        if !self.options.enable_processing {
            return image.clone();
        }

        let (width, height) = image.dimensions();
        if let Some(percent) = self.options.size_percent {
            let w = ((f64::from(width) * percent / 100.0) as u32).max(1);
            let h = ((f64::from(height) * percent / 100.0) as u32).max(1);
            return image.resize_exact(w, h, FilterType::Triangle);
        }

        if let Some(max_x) = self.options.max_x {
            let max_w = max_x * CELL_WIDTH;
            let max_h = self.options.max_y.map_or(u32::MAX, |y| y * CELL_HEIGHT);
            return image.resize(max_w.max(1), max_h.max(1), FilterType::Triangle);
        }

        image.clone()
    }
}

/// Convenience wrapper matching the renderer collaborator contract
pub fn render(image: &DynamicImage, options: &RenderOptions) -> RenderedFrame {
    BrailleRenderer::new(options.clone()).render(image)
}

/// Edge-detection pre-pass: a 3x3 Laplacian-style kernel, applied
/// before rendering when `--sobel` is on.
pub fn sobel(image: &DynamicImage) -> DynamicImage {
    const KERNEL: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0];
    image.filter3x3(&KERNEL)
}

fn round_up(value: u32, multiple: u32) -> u32 {
    (value + multiple - 1) / multiple * multiple
}
