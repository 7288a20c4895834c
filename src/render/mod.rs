/// Line rendering between neighbouring selections
/// The canvas only holds geometry; the GUI paints it on top of the grid each frame
use crate::sequencer::{Point, SelectionEntry, SelectionStore};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: [u8; 3],
    pub width: f32,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: [255, 0, 0],
            width: 2.0,
        }
    }
}

/// One segment per pair of adjacent occupied columns. A gap breaks the chain.
pub fn connected_segments(entries: &[Option<SelectionEntry>]) -> Vec<Segment> {
    entries
        .windows(2)
        .filter_map(|pair| match (&pair[0], &pair[1]) {
            (Some(a), Some(b)) => Some(Segment {
                from: a.center,
                to: b.center,
            }),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct LineCanvas {
    width: f32,
    height: f32,
    style: LineStyle,
    segments: Vec<Segment>,
}

impl LineCanvas {
    pub fn new(style: LineStyle) -> Self {
        Self {
            style,
            ..Default::default()
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn style(&self) -> LineStyle {
        self.style
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn redraw(&mut self, store: &SelectionStore) {
        self.segments = connected_segments(store.entries());
    }
}
