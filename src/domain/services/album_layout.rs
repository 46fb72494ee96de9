//! Packing of multi-photo albums into one rectangle.
//!
//! Layouts by photo count:
//! - 1: full width, height follows the aspect ratio up to the height cap.
//! - 2: two columns sharing the smaller proportional height.
//! - 3–4: the tallest photo as a hero column, the rest stacked beside it.
//! - 5+: a 2- or 3-column grid; each row is as tall as its tallest photo needs,
//!   within a cap. A short last row is stretched to the full width.
//!
//! Every layout fills the container width exactly and rects never overlap.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{AlbumItem, AlbumLayout, ContainerStyle, Dimensions, PhotoSize, RectPart};

/// Share of the width given to the hero photo in 3–4 photo albums.
const HERO_SHARE: f64 = 2.0 / 3.0;

/// Size limits for packing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlbumConstraints {
    /// Maximum album height.
    pub max_height: f64,
    /// Minimum cell side; smaller cells are clamped and flagged `is_small`.
    pub min_cell_size: f64,
    /// Gap between cells.
    pub spacing: f64,
    /// Columns used for albums of five or more photos.
    pub grid_columns: usize,
    /// Grid row height cap, as a multiple of the nominal cell width.
    pub max_row_ratio: f64,
}

impl AlbumConstraints {
    /// Defaults for wide screens.
    pub const DESKTOP: Self = Self {
        max_height: 480.0,
        min_cell_size: 64.0,
        spacing: 0.0,
        grid_columns: 3,
        max_row_ratio: 1.5,
    };

    /// Defaults for phones.
    pub const MOBILE: Self = Self {
        max_height: 360.0,
        min_cell_size: 48.0,
        spacing: 0.0,
        grid_columns: 2,
        max_row_ratio: 1.25,
    };

    /// Picks the defaults for the device class.
    #[must_use]
    pub const fn for_device(is_mobile: bool) -> Self {
        if is_mobile { Self::MOBILE } else { Self::DESKTOP }
    }
}

impl Default for AlbumConstraints {
    fn default() -> Self {
        Self::DESKTOP
    }
}

/// Packs photos with the default constraints for the device class.
#[must_use]
pub fn calculate_album_layout(
    photos: &[PhotoSize],
    container_max_width: f64,
    is_mobile: bool,
) -> AlbumLayout {
    AlbumLayoutEngine::new(AlbumConstraints::for_device(is_mobile))
        .calculate(photos, container_max_width)
}

/// Album packer with fixed constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlbumLayoutEngine {
    constraints: AlbumConstraints,
}

impl AlbumLayoutEngine {
    /// Creates an engine.
    #[must_use]
    pub const fn new(constraints: AlbumConstraints) -> Self {
        Self { constraints }
    }

    /// Returns the constraints.
    #[must_use]
    pub const fn constraints(&self) -> &AlbumConstraints {
        &self.constraints
    }

    /// Packs `photos` into a container `container_width` wide.
    #[must_use]
    pub fn calculate(&self, photos: &[PhotoSize], container_width: f64) -> AlbumLayout {
        let width = if container_width.is_finite() {
            container_width.max(0.0)
        } else {
            0.0
        };
        if photos.is_empty() || width <= 0.0 {
            return AlbumLayout {
                container_style: ContainerStyle { width, height: 0.0 },
                layout: Vec::new(),
            };
        }

        let ratios: Vec<f64> = photos.iter().map(|p| p.aspect_ratio()).collect();
        let packer = Packer {
            width,
            spacing: self.constraints.spacing.clamp(0.0, width / 16.0),
            constraints: &self.constraints,
        };

        let rects = match ratios.len() {
            1 => packer.single(ratios[0]),
            2 => packer.pair(ratios[0], ratios[1]),
            3 | 4 => packer.hero(&ratios),
            _ => packer.grid(&ratios),
        };

        finish(rects, width)
    }
}

struct Packer<'a> {
    width: f64,
    spacing: f64,
    constraints: &'a AlbumConstraints,
}

impl Packer<'_> {
    fn single(&self, ratio: f64) -> Vec<Dimensions> {
        let (height, is_small) = self.clamp_height(self.width / ratio, self.constraints.min_cell_size);
        vec![rect(0.0, 0.0, self.width, height, is_small)]
    }

    fn pair(&self, first: f64, second: f64) -> Vec<Dimensions> {
        let column = (self.width - self.spacing) / 2.0;
        let natural = (column / first).min(column / second);
        let (height, is_small) = self.clamp_height(natural, self.constraints.min_cell_size);
        let right_x = column + self.spacing;

        vec![
            rect(0.0, 0.0, column, height, is_small),
            rect(right_x, 0.0, self.width - right_x, height, is_small),
        ]
    }

    #[allow(clippy::cast_precision_loss)]
    fn hero(&self, ratios: &[f64]) -> Vec<Dimensions> {
        let hero = tallest(ratios);
        let rest = ratios.len() - 1;
        let rest_f = rest as f64;

        let hero_width = (self.width - self.spacing) * HERO_SHARE;
        let floor = self.constraints.min_cell_size * rest_f + self.spacing * (rest_f - 1.0);
        let (height, hero_small) = self.clamp_height(hero_width / ratios[hero], floor);

        let side_x = hero_width + self.spacing;
        let side_width = self.width - side_x;
        let cell_height = (height - self.spacing * (rest_f - 1.0)) / rest_f;
        let side_small = side_width < self.constraints.min_cell_size
            || cell_height < self.constraints.min_cell_size;

        let mut rects = Vec::with_capacity(ratios.len());
        let mut slot = 0_usize;
        for index in 0..ratios.len() {
            if index == hero {
                rects.push(rect(0.0, 0.0, hero_width, height, hero_small));
                continue;
            }
            let y = slot as f64 * (cell_height + self.spacing);
            let cell = if slot + 1 == rest { height - y } else { cell_height };
            rects.push(rect(side_x, y, side_width, cell, side_small));
            slot += 1;
        }
        rects
    }

    #[allow(clippy::cast_precision_loss)]
    fn grid(&self, ratios: &[f64]) -> Vec<Dimensions> {
        let columns = self.constraints.grid_columns.clamp(1, ratios.len());
        let nominal = (self.width - self.spacing * (columns as f64 - 1.0)) / columns as f64;
        let cap = nominal * self.constraints.max_row_ratio.max(1.0);

        let mut rects = Vec::with_capacity(ratios.len());
        let mut y = 0.0;
        for row in ratios.chunks(columns) {
            let count = row.len() as f64;
            let cell_width = (self.width - self.spacing * (count - 1.0)) / count;
            let tallest_ratio = row.iter().copied().fold(f64::INFINITY, f64::min);

            let mut row_height = (nominal / tallest_ratio).min(cap);
            let is_small = row_height < self.constraints.min_cell_size
                || cell_width < self.constraints.min_cell_size;
            row_height = row_height.max(self.constraints.min_cell_size);

            let mut x = 0.0;
            for i in 0..row.len() {
                let width = if i + 1 == row.len() {
                    self.width - x
                } else {
                    cell_width
                };
                rects.push(rect(x, y, width, row_height, is_small));
                x += cell_width + self.spacing;
            }
            y += row_height + self.spacing;
        }
        rects
    }

    /// Clamps to `[floor, max_height]`; flags when the floor applied.
    fn clamp_height(&self, natural: f64, floor: f64) -> (f64, bool) {
        let floor = floor.min(self.constraints.max_height);
        if natural < floor {
            (floor, true)
        } else {
            (natural.min(self.constraints.max_height), false)
        }
    }
}

const fn rect(x: f64, y: f64, width: f64, height: f64, is_small: bool) -> Dimensions {
    Dimensions {
        x,
        y,
        width,
        height,
        is_small,
    }
}

/// Index of the photo with the smallest width/height ratio; first wins ties.
fn tallest(ratios: &[f64]) -> usize {
    ratios
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, &r)| if r < best.1 { (i, r) } else { best })
        .0
}

/// Derives the container height and each rect's edge flags.
fn finish(rects: Vec<Dimensions>, width: f64) -> AlbumLayout {
    let height = rects.iter().map(Dimensions::bottom).fold(0.0, f64::max);
    let epsilon = 1e-6 * width.max(height).max(1.0);

    let layout = rects
        .into_iter()
        .map(|dimensions| {
            let mut sides = RectPart::empty();
            if dimensions.x.abs() <= epsilon {
                sides |= RectPart::LEFT;
            }
            if dimensions.y.abs() <= epsilon {
                sides |= RectPart::TOP;
            }
            if (dimensions.right() - width).abs() <= epsilon {
                sides |= RectPart::RIGHT;
            }
            if (dimensions.bottom() - height).abs() <= epsilon {
                sides |= RectPart::BOTTOM;
            }
            AlbumItem { dimensions, sides }
        })
        .collect();

    AlbumLayout {
        container_style: ContainerStyle { width, height },
        layout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn squares(n: usize) -> Vec<PhotoSize> {
        vec![PhotoSize::new(100.0, 100.0); n]
    }

    fn assert_invariants(layout: &AlbumLayout, count: usize) {
        let width = layout.container_style.width;
        let height = layout.container_style.height;
        assert_eq!(layout.layout.len(), count);

        let max_bottom = layout
            .layout
            .iter()
            .map(|i| i.dimensions.bottom())
            .fold(0.0, f64::max);
        assert!((max_bottom - height).abs() < EPS);

        for (i, a) in layout.layout.iter().enumerate() {
            let d = a.dimensions;
            assert!(d.x >= -EPS && d.y >= -EPS, "item {i} starts outside");
            assert!(d.right() <= width + EPS, "item {i} exceeds width");
            assert!(d.bottom() <= height + EPS, "item {i} exceeds height");
            assert!(d.width > 0.0 && d.height > 0.0, "item {i} is empty");
            for (j, b) in layout.layout.iter().enumerate().skip(i + 1) {
                assert!(!d.overlaps(&b.dimensions, EPS), "items {i} and {j} overlap");
            }
        }

        let right_edge = layout
            .layout
            .iter()
            .map(|i| i.dimensions.right())
            .fold(0.0, f64::max);
        assert!((right_edge - width).abs() < EPS, "width not fully used");
    }

    #[test]
    fn test_two_squares_side_by_side() {
        let layout = calculate_album_layout(&squares(2), 300.0, false);

        assert!((layout.container_style.width - 300.0).abs() < EPS);
        let [left, right] = [layout.layout[0].dimensions, layout.layout[1].dimensions];
        assert!((left.width - 150.0).abs() < EPS && (left.height - 150.0).abs() < EPS);
        assert!((right.x - 150.0).abs() < EPS && (right.height - 150.0).abs() < EPS);
        assert_eq!(layout.layout[0].sides, RectPart::LEFT | RectPart::TOP | RectPart::BOTTOM);
        assert_eq!(layout.layout[1].sides, RectPart::RIGHT | RectPart::TOP | RectPart::BOTTOM);
    }

    #[test]
    fn test_single_photo_is_capped() {
        let tall = [PhotoSize::new(100.0, 1000.0)];
        let layout = calculate_album_layout(&tall, 300.0, false);

        assert!((layout.container_style.height - AlbumConstraints::DESKTOP.max_height).abs() < EPS);
        assert_eq!(layout.layout[0].sides, RectPart::all());
    }

    #[test]
    fn test_panorama_pair_hits_floor() {
        let wide = [PhotoSize::new(4000.0, 100.0), PhotoSize::new(100.0, 100.0)];
        let layout = calculate_album_layout(&wide, 300.0, false);

        assert!(layout.layout[0].dimensions.is_small);
        assert!((layout.container_style.height - AlbumConstraints::DESKTOP.min_cell_size).abs() < EPS);
    }

    #[test]
    fn test_hero_is_tallest_photo() {
        let photos = [
            PhotoSize::new(200.0, 100.0),
            PhotoSize::new(100.0, 300.0),
            PhotoSize::new(100.0, 100.0),
        ];
        let layout = calculate_album_layout(&photos, 300.0, false);

        let hero = layout.layout[1];
        assert!(hero.dimensions.x.abs() < EPS);
        assert!((hero.dimensions.height - layout.container_style.height).abs() < EPS);
        assert_eq!(hero.sides, RectPart::LEFT | RectPart::TOP | RectPart::BOTTOM);
        assert_eq!(layout.layout[0].sides, RectPart::TOP | RectPart::RIGHT);
        assert_eq!(layout.layout[2].sides, RectPart::BOTTOM | RectPart::RIGHT);
        assert_invariants(&layout, 3);
    }

    #[test]
    fn test_grid_last_row_stretches() {
        let layout = calculate_album_layout(&squares(5), 300.0, false);

        assert_invariants(&layout, 5);
        let last = layout.layout[4].dimensions;
        assert!((last.width - 150.0).abs() < EPS);
        assert!(layout.layout[4].sides.is_bottom_right());
    }

    #[test]
    fn test_invariants_hold_for_any_count() {
        let shapes = [
            (100.0, 100.0),
            (1920.0, 1080.0),
            (1080.0, 1920.0),
            (4000.0, 300.0),
            (300.0, 4000.0),
            (0.0, 0.0),
        ];
        for count in 1..=12 {
            let photos: Vec<PhotoSize> = (0..count)
                .map(|i| {
                    let (w, h) = shapes[i % shapes.len()];
                    PhotoSize::new(w, h)
                })
                .collect();
            for is_mobile in [false, true] {
                for width in [120.0, 300.0, 640.0] {
                    let layout = calculate_album_layout(&photos, width, is_mobile);
                    assert_invariants(&layout, count);
                }
            }
        }
    }

    #[test]
    fn test_spacing_keeps_rects_apart() {
        let engine = AlbumLayoutEngine::new(AlbumConstraints {
            spacing: 4.0,
            ..AlbumConstraints::DESKTOP
        });
        for count in 1..=9 {
            let layout = engine.calculate(&squares(count), 400.0);
            assert_invariants(&layout, count);
        }
    }

    #[test]
    fn test_empty_input() {
        let layout = calculate_album_layout(&[], 300.0, true);
        assert!(layout.layout.is_empty());
        assert!(layout.container_style.height.abs() < EPS);
    }
}
