/// Fixed page dimensions in points. `y` grows downward from the top edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_x: f32,
    pub top_margin: f32,
    pub bottom_margin: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width: 595.28,
        height: 841.89,
        margin_x: 40.0,
        top_margin: 40.0,
        bottom_margin: 60.0,
    };

    /// Lowest `y` content may reach.
    pub fn content_bottom(&self) -> f32 {
        self.height - self.bottom_margin
    }

    pub fn content_width(&self) -> f32 {
        self.width - self.margin_x * 2.0
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        PageGeometry::A4
    }
}

/// Current vertical write position on the current page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor {
    pub y: f32,
    top: f32,
}

impl Cursor {
    pub fn new(geometry: &PageGeometry) -> Self {
        Cursor {
            y: geometry.top_margin,
            top: geometry.top_margin,
        }
    }

    pub fn advance(&mut self, dy: f32) {
        self.y += dy;
    }

    pub fn reset_top(&mut self) {
        self.y = self.top;
    }
}
