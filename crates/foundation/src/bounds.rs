/// Axis-aligned 2D extent `[min_x, min_y, max_x, max_y]` in some projection.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Extent {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Extent {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Extent { min, max }
    }

    pub fn from_array(e: [f64; 4]) -> Self {
        Extent::new([e[0], e[1]], [e[2], e[3]])
    }

    /// Empty extent that grows with `extend`.
    pub fn empty() -> Self {
        Extent::new([f64::INFINITY; 2], [f64::NEG_INFINITY; 2])
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    pub fn extend(&mut self, x: f64, y: f64) {
        self.min[0] = self.min[0].min(x);
        self.min[1] = self.min[1].min(y);
        self.max[0] = self.max[0].max(x);
        self.max[1] = self.max[1].max(y);
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        ]
    }

    pub fn bottom_left(&self) -> [f64; 2] {
        self.min
    }

    pub fn bottom_right(&self) -> [f64; 2] {
        [self.max[0], self.min[1]]
    }

    pub fn top_right(&self) -> [f64; 2] {
        self.max
    }

    pub fn top_left(&self) -> [f64; 2] {
        [self.min[0], self.max[1]]
    }

    /// Corners in the order bottom-left, bottom-right, top-right, top-left.
    pub fn corners(&self) -> [[f64; 2]; 4] {
        [
            self.bottom_left(),
            self.bottom_right(),
            self.top_right(),
            self.top_left(),
        ]
    }
}
