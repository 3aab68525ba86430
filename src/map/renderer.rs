use rayon::prelude::*;

use crate::braille::BrailleCanvas;
use crate::geo::Rect;
use crate::map::geometry::{draw_dotted_rect, draw_line, draw_thick_line, fill_rings};
use crate::map::projection::Viewport;
use crate::map::spatial::BoundaryIndex;
use crate::presentation::{zone_style, ZoneStyle};
use crate::state::{ViewState, Zone};

/// Display settings for map layers
#[derive(Debug, Clone)]
pub struct DisplaySettings {
    /// Dotted district bounding boxes
    pub show_bounds: bool,
    /// Fill selected zones instead of only outlining them
    pub fill_selection: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_bounds: false,
            fill_selection: true,
        }
    }
}

/// One canvas per colour, drawn back to front by the UI
pub struct MapLayers {
    pub bounds: BrailleCanvas,
    pub outlines: BrailleCanvas,
    pub selected: BrailleCanvas,
    pub highlight: BrailleCanvas,
}

impl MapLayers {
    fn new(width: usize, height: usize) -> Self {
        Self {
            bounds: BrailleCanvas::new(width, height),
            outlines: BrailleCanvas::new(width, height),
            selected: BrailleCanvas::new(width, height),
            highlight: BrailleCanvas::new(width, height),
        }
    }
}

type PixelRing = Vec<(i32, i32)>;

/// A zone projected to canvas pixels
struct ProjectedZone {
    style: ZoneStyle,
    polygons: Vec<Vec<PixelRing>>,
}

#[derive(Debug, Clone, Default)]
pub struct MapRenderer {
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the districts currently on the map. `width`/`height` are in
    /// characters; the viewport is in braille pixels.
    pub fn render(
        &self,
        index: &BoundaryIndex,
        state: &ViewState,
        viewport: &Viewport,
        width: usize,
        height: usize,
    ) -> MapLayers {
        let mut layers = MapLayers::new(width, height);
        let view = viewport.bounds();

        if self.settings.show_bounds {
            for code in index.districts_intersecting(&view) {
                if let Some(rect) = index.district_bounds(&code) {
                    draw_rect(&mut layers.bounds, rect, viewport);
                }
            }
        }

        let visible: Vec<(ZoneStyle, &Zone)> = state
            .materialized_zones()
            .filter(|(_, zone)| zone.bounds.intersects(&view))
            .map(|(key, zone)| (zone_style(state, &key, zone), zone))
            .collect();

        let projected: Vec<ProjectedZone> = visible
            .par_iter()
            .map(|(style, zone)| ProjectedZone {
                style: *style,
                polygons: project_zone(zone, viewport),
            })
            .collect();

        for zone in &projected {
            for rings in &zone.polygons {
                if self.settings.fill_selection && zone.style.is_selected() {
                    fill_rings(&mut layers.selected, rings);
                }
                for ring in rings {
                    draw_ring(&mut layers.outlines, ring, viewport, draw_line);
                }
            }
        }

        // Highlight goes last so it sits on top of neighbouring outlines
        for zone in projected.iter().filter(|z| z.style.is_highlighted()) {
            for ring in zone.polygons.iter().flatten() {
                draw_ring(&mut layers.highlight, ring, viewport, draw_thick_line);
            }
        }

        layers
    }

    pub fn toggle_bounds(&mut self) {
        self.settings.show_bounds = !self.settings.show_bounds;
    }

    pub fn toggle_fill(&mut self) {
        self.settings.fill_selection = !self.settings.fill_selection;
    }
}

fn project_zone(zone: &Zone, viewport: &Viewport) -> Vec<Vec<PixelRing>> {
    zone.polygons
        .iter()
        .map(|rings| {
            rings
                .iter()
                .map(|ring| ring.iter().map(|v| viewport.project(v.x, v.y)).collect())
                .collect()
        })
        .collect()
}

/// Stroke a closed ring, skipping segments that are clearly off screen
fn draw_ring(
    canvas: &mut BrailleCanvas,
    ring: &[(i32, i32)],
    viewport: &Viewport,
    stroke: fn(&mut BrailleCanvas, i32, i32, i32, i32),
) {
    if ring.len() < 2 {
        return;
    }
    let closing = (ring[ring.len() - 1], ring[0]);
    for (a, b) in ring.windows(2).map(|w| (w[0], w[1])).chain(std::iter::once(closing)) {
        if a != b && viewport.line_might_be_visible(a, b) {
            stroke(canvas, a.0, a.1, b.0, b.1);
        }
    }
}

fn draw_rect(canvas: &mut BrailleCanvas, rect: &Rect, viewport: &Viewport) {
    let (x0, y0) = viewport.project(rect.west, rect.north);
    let (x1, y1) = viewport.project(rect.east, rect.south);
    draw_dotted_rect(canvas, x0, y0, x1, y1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::{layer, square_zone};
    use crate::state::ZoneKey;
    use std::collections::BTreeSet;

    const W: usize = 40;
    const H: usize = 20;

    fn fixture() -> (BoundaryIndex, ViewState, Viewport) {
        let index = BoundaryIndex::new([(
            "R".to_string(),
            vec![("D".to_string(), Rect::from_corners((0.0, 0.0), (0.02, 0.01)))],
        )]);
        let mut state = ViewState::new();
        state.show_districts(BTreeSet::from(["D".to_string()]));
        state.district_loaded(layer(
            "D",
            vec![
                square_zone("Z1", 10, 0.0, 0.0, 0.01),
                square_zone("Z2", 20, 0.01, 0.0, 0.01),
            ],
        ));
        let viewport = Viewport::new(0.01, 0.005, 14, W * 2, H * 4);
        (index, state, viewport)
    }

    #[test]
    fn test_outlines_only_for_plain_zones() {
        let (index, state, viewport) = fixture();
        let layers = MapRenderer::new().render(&index, &state, &viewport, W, H);
        assert!(!layers.outlines.is_blank());
        assert!(layers.selected.is_blank());
        assert!(layers.highlight.is_blank());
        assert!(layers.bounds.is_blank());
    }

    #[test]
    fn test_selected_and_highlighted_layers() {
        let (index, mut state, viewport) = fixture();
        state.select_zone(&ZoneKey::new("D", 0));
        state.highlight_zone(&ZoneKey::new("D", 1));

        let mut renderer = MapRenderer::new();
        renderer.toggle_bounds();
        let layers = renderer.render(&index, &state, &viewport, W, H);
        assert!(!layers.selected.is_blank());
        assert!(!layers.highlight.is_blank());
        assert!(!layers.bounds.is_blank());

        // The fill stays inside the selected zone (left half of the view)
        let (cx, cy) = viewport.project(0.005, 0.005);
        assert!(layers.selected.is_set(cx as usize, cy as usize));
        let (ox, oy) = viewport.project(0.015, 0.005);
        assert!(!layers.selected.is_set(ox as usize, oy as usize));
    }

    #[test]
    fn test_hidden_district_draws_nothing() {
        let (index, mut state, viewport) = fixture();
        state.clear_districts();
        let layers = MapRenderer::new().render(&index, &state, &viewport, W, H);
        assert!(layers.outlines.is_blank());
    }
}
