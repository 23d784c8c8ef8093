/// Number of rows and columns of the report grid.
pub const GRID_ROWS: u32 = 3;
pub const GRID_COLS: u32 = 3;

/// A named cell span of the 3x3 report grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelSlot {
    pub name: &'static str,
    pub row: u32,
    pub col: u32,
    pub col_span: u32,
}

impl PanelSlot {
    pub const THROUGHPUT: PanelSlot = PanelSlot::new("throughput", 0, 0, 2);
    pub const LATENCY_PERCENTILES: PanelSlot = PanelSlot::new("latency_percentiles", 0, 2, 1);
    pub const SUCCESS_GAUGE: PanelSlot = PanelSlot::new("success_gauge", 1, 0, 1);
    pub const LATENCY_SCATTER: PanelSlot = PanelSlot::new("latency_scatter", 1, 1, 1);
    pub const REQUEST_TOTALS: PanelSlot = PanelSlot::new("request_totals", 1, 2, 1);
    pub const DISTRIBUTION: PanelSlot = PanelSlot::new("distribution", 2, 0, 2);
    pub const SCORECARD: PanelSlot = PanelSlot::new("scorecard", 2, 2, 1);

    pub const ALL: [PanelSlot; 7] = [
        PanelSlot::THROUGHPUT,
        PanelSlot::LATENCY_PERCENTILES,
        PanelSlot::SUCCESS_GAUGE,
        PanelSlot::LATENCY_SCATTER,
        PanelSlot::REQUEST_TOTALS,
        PanelSlot::DISTRIBUTION,
        PanelSlot::SCORECARD,
    ];

    const fn new(name: &'static str, row: u32, col: u32, col_span: u32) -> Self {
        Self {
            name,
            row,
            col,
            col_span,
        }
    }
}

/// Pixel rectangle, origin at the top-left corner of the figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Maps grid slots to pixel rectangles below a title band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    width: i32,
    height: i32,
    title_band: i32,
    gap: i32,
}

impl GridLayout {
    pub fn new(width: u32, height: u32) -> Self {
        let height = height as i32;
        Self {
            width: width as i32,
            height,
            title_band: (height / 20).max(30),
            gap: 12,
        }
    }

    pub fn title_band(&self) -> i32 {
        self.title_band
    }

    /// Rectangle covering `slot`, with a gap between neighbouring cells.
    pub fn cell_rect(&self, slot: PanelSlot) -> Rect {
        let cols = GRID_COLS as i32;
        let rows = GRID_ROWS as i32;
        let cell_w = (self.width - self.gap) / cols;
        let cell_h = (self.height - self.title_band - self.gap) / rows;

        Rect {
            x: self.gap + slot.col as i32 * cell_w,
            y: self.title_band + slot.row as i32 * cell_h,
            width: slot.col_span as i32 * cell_w - self.gap,
            height: cell_h - self.gap,
        }
    }
}
