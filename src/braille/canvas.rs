/// Monochrome bitmap drawn with braille glyphs (U+2800..U+28FF), two
/// pixels across and four down per terminal cell. The map draws each colour
/// on its own canvas and the UI stacks them.
#[derive(Debug, Clone)]
pub struct BrailleCanvas {
    width: usize,
    height: usize,
    /// Dot bits per cell, row-major
    cells: Vec<u8>,
}

impl BrailleCanvas {
    /// `width` x `height` in terminal cells
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0u8; width * height],
        }
    }

    pub fn pixel_width(&self) -> usize {
        self.width * 2
    }

    pub fn pixel_height(&self) -> usize {
        self.height * 4
    }

    /// Dot bit for a pixel inside its character cell:
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    #[inline(always)]
    fn dot(x: usize, y: usize) -> u8 {
        const DOTS: [[u8; 2]; 4] = [[0x01, 0x08], [0x02, 0x10], [0x04, 0x20], [0x40, 0x80]];
        DOTS[y % 4][x % 2]
    }

    /// Set a pixel; out-of-canvas pixels are ignored
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let cx = x / 2;
        let cy = y / 4;

        if cx >= self.width || cy >= self.height {
            return;
        }

        self.cells[cy * self.width + cx] |= Self::dot(x, y);
    }

    /// Projected coordinates can be negative; those are dropped
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        let (cx, cy) = (x / 2, y / 4);
        cx < self.width && cy < self.height && self.cells[cy * self.width + cx] & Self::dot(x, y) != 0
    }

    /// True when no dot has been set
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&b| b == 0)
    }

    /// Characters of one row; empty cells are U+2800
    pub fn row_chars(&self, row: usize) -> impl Iterator<Item = char> + '_ {
        let cells: &[u8] = if row < self.height {
            &self.cells[row * self.width..(row + 1) * self.width]
        } else {
            &[]
        };
        cells
            .iter()
            .map(|&b| char::from_u32(0x2800 + b as u32).unwrap_or(' '))
    }
}
