//! Raster canvas for one map figure.
//!
//! A [`Figure`] owns its pixmap and the mapping from Web Mercator metres to
//! pixels. Every drawing call takes geometry already projected to EPSG:3857.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use geo::{Coord, Geometry, LineString, Polygon, Rect};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, RgbaImage};
use tiny_skia::{
    Color, FillRule, FilterQuality, IntSize, Paint, Path as SkPath, PathBuilder, Pixmap,
    PixmapPaint, Stroke, Transform,
};

use super::format::ImageFormat;
use super::style::Rgba;
use super::text::{draw_text, text_height, text_width};
use super::RenderError;

/// Fraction of the data extent added on each side of the map frame.
pub const MARGIN_FRACTION: f64 = 0.05;

/// Smallest span shown, so a single point still gets a readable map.
pub const MIN_SPAN_METERS: f64 = 1_000.0;

/// JPEG encoder quality.
pub const JPEG_QUALITY: u8 = 90;

/// Mapping from projected metres to canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Projected extent shown inside the frame.
    pub extent: Rect<f64>,
    /// Pixels per metre.
    pub scale: f64,
    /// Left edge of the frame in pixels.
    pub left: f64,
    /// Top edge of the frame in pixels.
    pub top: f64,
}

impl Viewport {
    /// Fit `data` padded by [`MARGIN_FRACTION`] into a pixel box, keeping
    /// the aspect ratio and centring the result.
    pub fn fit(data: Rect<f64>, x: f64, y: f64, width: f64, height: f64) -> Self {
        let center = data.center();
        let span_x = data.width().max(MIN_SPAN_METERS) * (1.0 + 2.0 * MARGIN_FRACTION);
        let span_y = data.height().max(MIN_SPAN_METERS) * (1.0 + 2.0 * MARGIN_FRACTION);

        let scale = (width / span_x).min(height / span_y);

        // Grow the short axis so the extent fills the box exactly
        let shown_x = width / scale;
        let shown_y = height / scale;
        let extent = Rect::new(
            Coord {
                x: center.x - shown_x / 2.0,
                y: center.y - shown_y / 2.0,
            },
            Coord {
                x: center.x + shown_x / 2.0,
                y: center.y + shown_y / 2.0,
            },
        );

        Self {
            extent,
            scale,
            left: x,
            top: y,
        }
    }

    /// Pixel position of a projected coordinate.
    pub fn to_px(&self, c: Coord<f64>) -> (f32, f32) {
        let px = self.left + (c.x - self.extent.min().x) * self.scale;
        let py = self.top + (self.extent.max().y - c.y) * self.scale;
        (px as f32, py as f32)
    }

    /// Frame width in pixels.
    pub fn width_px(&self) -> f64 {
        self.extent.width() * self.scale
    }

    /// Frame height in pixels.
    pub fn height_px(&self) -> f64 {
        self.extent.height() * self.scale
    }
}

/// Drawing style for one layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Symbol {
    pub fill: Rgba,
    pub edge: Rgba,
    pub edge_width: f32,
    pub marker_radius: f32,
    pub line_width: f32,
}

/// Legend swatch shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Swatch {
    /// Filled rectangle with an outline.
    Patch { fill: Rgba, edge: Rgba },
    /// Round marker.
    Marker { color: Rgba, radius: f32 },
}

/// One legend row.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub swatch: Swatch,
}

fn paint(rgba: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(Color::from_rgba8(rgba.0, rgba.1, rgba.2, rgba.3));
    paint.anti_alias = true;
    paint
}

/// Canvas for one map image.
pub struct Figure {
    pixmap: Pixmap,
    viewport: Viewport,
}

impl Figure {
    /// Create a blank canvas filled with `background`.
    pub fn new(
        width: u32,
        height: u32,
        viewport: Viewport,
        background: Rgba,
    ) -> Result<Self, RenderError> {
        let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::Canvas { width, height })?;
        pixmap.fill(Color::from_rgba8(
            background.0,
            background.1,
            background.2,
            background.3,
        ));
        Ok(Self { pixmap, viewport })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Pixel color at (`x`, `y`), un-premultiplied.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            (c.red(), c.green(), c.blue(), c.alpha())
        })
    }

    /// Draw a decoded tile image over the projected rectangle it covers.
    pub fn draw_tile(&mut self, tile: &RgbaImage, bounds: Rect<f64>) {
        let Some(tile_pixmap) = to_pixmap(tile) else {
            return;
        };
        let (x0, y0) = self.viewport.to_px(Coord {
            x: bounds.min().x,
            y: bounds.max().y,
        });
        let sx = (bounds.width() * self.viewport.scale) as f32 / tile.width() as f32;
        let sy = (bounds.height() * self.viewport.scale) as f32 / tile.height() as f32;

        self.pixmap.draw_pixmap(
            0,
            0,
            tile_pixmap.as_ref(),
            &PixmapPaint {
                quality: FilterQuality::Bilinear,
                ..PixmapPaint::default()
            },
            Transform::from_row(sx, 0.0, 0.0, sy, x0, y0),
            None,
        );
    }

    /// Draw any geometry with the given symbol.
    pub fn draw_geometry(&mut self, geometry: &Geometry<f64>, symbol: &Symbol) {
        match geometry {
            Geometry::Point(p) => self.draw_marker(p.0, symbol.fill, symbol.marker_radius),
            Geometry::MultiPoint(mp) => {
                for p in mp {
                    self.draw_marker(p.0, symbol.fill, symbol.marker_radius);
                }
            }
            Geometry::Line(l) => {
                self.draw_line(&LineString::from(vec![l.start, l.end]), symbol);
            }
            Geometry::LineString(ls) => self.draw_line(ls, symbol),
            Geometry::MultiLineString(mls) => {
                for ls in mls {
                    self.draw_line(ls, symbol);
                }
            }
            Geometry::Polygon(p) => self.draw_polygon(p, symbol),
            Geometry::MultiPolygon(mp) => {
                for p in mp {
                    self.draw_polygon(p, symbol);
                }
            }
            Geometry::Rect(r) => self.draw_polygon(&r.to_polygon(), symbol),
            Geometry::Triangle(t) => self.draw_polygon(&t.to_polygon(), symbol),
            Geometry::GeometryCollection(gc) => {
                for g in gc {
                    self.draw_geometry(g, symbol);
                }
            }
        }
    }

    fn draw_marker(&mut self, c: Coord<f64>, color: Rgba, radius: f32) {
        let (x, y) = self.viewport.to_px(c);
        if let Some(path) = PathBuilder::from_circle(x, y, radius) {
            self.pixmap
                .fill_path(&path, &paint(color), FillRule::Winding, Transform::identity(), None);
        }
    }

    fn draw_line(&mut self, line: &LineString<f64>, symbol: &Symbol) {
        let mut pb = PathBuilder::new();
        self.trace(&mut pb, line, false);
        if let Some(path) = pb.finish() {
            self.stroke(&path, symbol.fill, symbol.line_width);
        }
    }

    fn draw_polygon(&mut self, polygon: &Polygon<f64>, symbol: &Symbol) {
        let mut pb = PathBuilder::new();
        self.trace(&mut pb, polygon.exterior(), true);
        for ring in polygon.interiors() {
            self.trace(&mut pb, ring, true);
        }
        let Some(path) = pb.finish() else {
            return;
        };

        self.pixmap.fill_path(
            &path,
            &paint(symbol.fill),
            FillRule::EvenOdd,
            Transform::identity(),
            None,
        );
        if symbol.edge_width > 0.0 {
            self.stroke(&path, symbol.edge, symbol.edge_width);
        }
    }

    fn trace(&self, pb: &mut PathBuilder, line: &LineString<f64>, close: bool) {
        for (i, c) in line.coords().enumerate() {
            let (x, y) = self.viewport.to_px(*c);
            if i == 0 {
                pb.move_to(x, y);
            } else {
                pb.line_to(x, y);
            }
        }
        if close {
            pb.close();
        }
    }

    fn stroke(&mut self, path: &SkPath, color: Rgba, width: f32) {
        self.pixmap.stroke_path(
            path,
            &paint(color),
            &Stroke {
                width,
                ..Default::default()
            },
            Transform::identity(),
            None,
        );
    }

    /// Paint everything outside the map frame with `color`.
    pub fn mask_outside_frame(&mut self, color: Rgba) {
        let w = self.width() as f32;
        let h = self.height() as f32;
        let left = self.viewport.left as f32;
        let top = self.viewport.top as f32;
        let right = left + self.viewport.width_px() as f32;
        let bottom = top + self.viewport.height_px() as f32;

        let bands = [
            (0.0, 0.0, w, top),
            (0.0, bottom, w, h - bottom),
            (0.0, top, left, bottom - top),
            (right, top, w - right, bottom - top),
        ];
        let fill = paint(color);
        for (x, y, bw, bh) in bands {
            if let Some(rect) = tiny_skia::Rect::from_xywh(x, y, bw, bh) {
                self.pixmap.fill_rect(rect, &fill, Transform::identity(), None);
            }
        }
    }

    /// Draw `title` centred horizontally with its top at `y`.
    pub fn draw_title(&mut self, title: &str, y: f32, scale: u32, color: Rgba) {
        let width = text_width(title, scale) as f32;
        let x = ((self.width() as f32 - width) / 2.0).max(0.0);
        draw_text(&mut self.pixmap, title, x, y, scale, &paint(color));
    }

    /// Draw a legend box anchored at the top-right corner of the frame.
    pub fn draw_legend(
        &mut self,
        entries: &[LegendEntry],
        scale: u32,
        text_color: Rgba,
        background: Rgba,
    ) {
        if entries.is_empty() {
            return;
        }

        let line_h = text_height(scale) as f32;
        let pad = line_h * 0.75;
        let swatch = line_h * 1.5;
        let label_w = entries
            .iter()
            .map(|e| text_width(&e.label, scale))
            .max()
            .unwrap_or(0) as f32;

        let box_w = pad * 3.0 + swatch + label_w;
        let box_h = pad + entries.len() as f32 * (line_h + pad);
        let right = (self.viewport.left + self.viewport.width_px()) as f32;
        let box_x = right - box_w - pad;
        let box_y = self.viewport.top as f32 + pad;

        if let Some(rect) = tiny_skia::Rect::from_xywh(box_x, box_y, box_w, box_h) {
            let bg = (background.0, background.1, background.2, 220);
            self.pixmap
                .fill_rect(rect, &paint(bg), Transform::identity(), None);
            let outline = PathBuilder::from_rect(rect);
            self.stroke(&outline, (128, 128, 128, 255), 1.0);
        }

        let text_paint = paint(text_color);
        for (i, entry) in entries.iter().enumerate() {
            let row_y = box_y + pad + i as f32 * (line_h + pad);
            let cx = box_x + pad + swatch / 2.0;
            let cy = row_y + line_h / 2.0;

            match entry.swatch {
                Swatch::Patch { fill, edge } => {
                    if let Some(rect) =
                        tiny_skia::Rect::from_xywh(box_x + pad, row_y, swatch, line_h)
                    {
                        self.pixmap
                            .fill_rect(rect, &paint(fill), Transform::identity(), None);
                        self.stroke(&PathBuilder::from_rect(rect), edge, 1.0);
                    }
                }
                Swatch::Marker { color, radius } => {
                    if let Some(path) = PathBuilder::from_circle(cx, cy, radius) {
                        self.pixmap.fill_path(
                            &path,
                            &paint(color),
                            FillRule::Winding,
                            Transform::identity(),
                            None,
                        );
                    }
                }
            }

            draw_text(
                &mut self.pixmap,
                &entry.label,
                box_x + pad * 2.0 + swatch,
                row_y,
                scale,
                &text_paint,
            );
        }
    }

    /// Convert the canvas to a straight-alpha RGBA image.
    pub fn to_image(&self) -> Result<RgbaImage, RenderError> {
        let mut data = Vec::with_capacity(self.pixmap.data().len());
        for p in self.pixmap.pixels() {
            let c = p.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(self.width(), self.height(), data).ok_or(RenderError::Canvas {
            width: self.width(),
            height: self.height(),
        })
    }

    /// Encode the canvas to `path`.
    pub fn save(&self, path: &Path, format: ImageFormat) -> Result<(), RenderError> {
        let img = self.to_image()?;
        let encode_err = |source| RenderError::Encode {
            path: path.to_path_buf(),
            source,
        };

        match format {
            ImageFormat::Png => img
                .save_with_format(path, image::ImageFormat::Png)
                .map_err(encode_err),
            ImageFormat::Jpeg => {
                let file = File::create(path).map_err(|source| RenderError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                let rgb = image::DynamicImage::ImageRgba8(img).to_rgb8();
                let mut encoder =
                    JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
                encoder
                    .encode(
                        rgb.as_raw(),
                        rgb.width(),
                        rgb.height(),
                        ExtendedColorType::Rgb8,
                    )
                    .map_err(encode_err)
            }
        }
    }
}

/// Premultiply a decoded tile into a pixmap.
fn to_pixmap(img: &RgbaImage) -> Option<Pixmap> {
    let mut data = Vec::with_capacity(img.as_raw().len());
    for p in img.pixels() {
        let [r, g, b, a] = p.0;
        let pm = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        data.extend_from_slice(&[pm(r), pm(g), pm(b), a]);
    }
    Pixmap::from_vec(data, IntSize::from_wh(img.width(), img.height())?)
}
