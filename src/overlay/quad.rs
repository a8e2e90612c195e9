//! Quadrilateral outlines via Bresenham line rasterisation

use crate::capture::frame::FrameGeometry;
use crate::detection::{Point2D, Quad};

use super::pixel::PixelWriter;

/// Outline `quad` on the frame. Each edge is drawn or skipped on its own, so a
/// partially off-frame quad keeps its in-frame edges.
pub fn draw_quad(
    writer: Option<&PixelWriter>,
    buffer: &mut [u8],
    geometry: &FrameGeometry,
    quad: &Quad,
) {
    let Some(writer) = writer else {
        return;
    };

    for (from, to) in quad.edges() {
        draw_line(writer, buffer, geometry, from, to);
    }
}

/// Draw the segment `from..=to`. Nothing is drawn unless both endpoints lie
/// inside the frame.
pub fn draw_line(
    writer: &PixelWriter,
    buffer: &mut [u8],
    geometry: &FrameGeometry,
    from: Point2D,
    to: Point2D,
) {
    if !geometry.contains(from.x, from.y) || !geometry.contains(to.x, to.y) {
        return;
    }

    for Point2D { x, y } in LinePoints::new(from, to) {
        writer.put(buffer, geometry, x as u32, y as u32);
    }
}

/// Every pixel Bresenham visits between two endpoints, both inclusive
#[derive(Debug, Clone)]
pub struct LinePoints {
    x: i32,
    y: i32,
    end: Point2D,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    err: i32,
    done: bool,
}

impl LinePoints {
    pub fn new(from: Point2D, to: Point2D) -> Self {
        let dx = (to.x - from.x).abs();
        let dy = -(to.y - from.y).abs();
        Self {
            x: from.x,
            y: from.y,
            end: to,
            dx,
            dy,
            sx: if from.x < to.x { 1 } else { -1 },
            sy: if from.y < to.y { 1 } else { -1 },
            err: dx + dy,
            done: false,
        }
    }
}

impl Iterator for LinePoints {
    type Item = Point2D;

    fn next(&mut self) -> Option<Point2D> {
        if self.done {
            return None;
        }

        let current = Point2D::new(self.x, self.y);
        if current == self.end {
            self.done = true;
            return Some(current);
        }

        let e2 = 2 * self.err;
        if e2 >= self.dy {
            self.err += self.dy;
            self.x += self.sx;
        }
        if e2 <= self.dx {
            self.err += self.dx;
            self.y += self.sy;
        }

        Some(current)
    }
}
