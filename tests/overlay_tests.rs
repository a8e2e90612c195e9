use barcodereader::capture::PixelLayout;
use barcodereader::overlay::{draw_quad, PixelWriter};
use barcodereader::{
    BarcodeResult, DedupConfig, FrameGeometry, FrameProcessor, Point2D, Quad, Symbology, Timestamp,
};

fn lit(buffer: &[u8], geometry: &FrameGeometry) -> Vec<(u32, u32)> {
    let mut points = Vec::new();
    for y in 0..geometry.height {
        for x in 0..geometry.width {
            if buffer[y as usize * geometry.stride + x as usize] == 255 {
                points.push((x, y));
            }
        }
    }
    points
}

#[test]
fn rectangle_outline_on_luma() {
    let geometry = FrameGeometry::packed(PixelLayout::Gray8, 10, 10);
    let mut buffer = vec![0u8; geometry.plane_len()];
    let writer = PixelWriter::select(PixelLayout::Gray8);

    draw_quad(writer.as_ref(), &mut buffer, &geometry, &Quad::rect(1, 1, 4, 4));

    let points = lit(&buffer, &geometry);
    assert_eq!(points.len(), 12);
    assert!(points.contains(&(1, 1)));
    assert!(points.contains(&(4, 4)));
    assert!(!points.contains(&(2, 2)));
}

#[test]
fn edges_leaving_the_frame_are_skipped() {
    let geometry = FrameGeometry::packed(PixelLayout::Gray8, 10, 10);
    let mut buffer = vec![0u8; geometry.plane_len()];
    let writer = PixelWriter::select(PixelLayout::Gray8);

    draw_quad(writer.as_ref(), &mut buffer, &geometry, &Quad::rect(5, 5, 12, 8));

    assert_eq!(lit(&buffer, &geometry), [(5, 5), (5, 6), (5, 7), (5, 8)]);
}

#[test]
fn negative_corner_skips_its_edges() {
    let geometry = FrameGeometry::packed(PixelLayout::Gray8, 8, 8);
    let mut buffer = vec![0u8; geometry.plane_len()];
    let quad = Quad {
        top_left: Point2D::new(-1, 0),
        top_right: Point2D::new(6, 0),
        bottom_left: Point2D::new(0, 6),
        bottom_right: Point2D::new(6, 6),
    };

    draw_quad(PixelWriter::select(PixelLayout::Gray8).as_ref(), &mut buffer, &geometry, &quad);

    let points = lit(&buffer, &geometry);
    assert!(points.iter().all(|&(x, y)| x == 6 || y == 6));
    assert_eq!(points.len(), 13);
}

#[test]
fn diagonal_quad_is_closed() {
    let geometry = FrameGeometry::packed(PixelLayout::Gray8, 16, 16);
    let mut buffer = vec![0u8; geometry.plane_len()];
    let quad = Quad {
        top_left: Point2D::new(8, 1),
        top_right: Point2D::new(14, 8),
        bottom_left: Point2D::new(1, 8),
        bottom_right: Point2D::new(8, 14),
    };

    draw_quad(PixelWriter::select(PixelLayout::Gray8).as_ref(), &mut buffer, &geometry, &quad);

    let points = lit(&buffer, &geometry);
    for corner in [(8, 1), (14, 8), (1, 8), (8, 14)] {
        assert!(points.contains(&corner), "corner {corner:?} missing");
    }
}

#[test]
fn layout_without_writer_still_reconciles() {
    let geometry = FrameGeometry::packed(PixelLayout::Uyvy, 8, 8);
    let mut processor = FrameProcessor::new(PixelLayout::Uyvy, geometry, &DedupConfig::default());
    let mut buffer = vec![0u8; geometry.plane_len()];
    let batch = [BarcodeResult::new("A", Symbology::QrCode, Quad::rect(1, 1, 5, 5))];

    let emitted = processor.process_frame(&mut buffer, &batch, true, Timestamp::from_secs(0));

    assert_eq!(emitted, batch);
    assert!(buffer.iter().all(|&b| b == 0));
    assert!(processor.writer().is_none());
}
