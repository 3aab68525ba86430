use std::collections::{BTreeSet, HashMap, HashSet};

use glam::DVec2;
use log::warn;

use crate::geo::Rect;
use crate::map::point_in_polygon;

/// Overlay visibility setting, cycled by the boundaries control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayMode {
    #[default]
    Auto,
    On,
    Off,
}

impl OverlayMode {
    /// Auto -> On -> Off -> Auto
    pub fn next(self) -> Self {
        match self {
            OverlayMode::Auto => OverlayMode::On,
            OverlayMode::On => OverlayMode::Off,
            OverlayMode::Off => OverlayMode::Auto,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OverlayMode::Auto => "Auto",
            OverlayMode::On => "On",
            OverlayMode::Off => "Off",
        }
    }
}

/// Identifies a zone by its district and position in that district's data
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneKey {
    pub district: String,
    pub index: usize,
}

impl ZoneKey {
    pub fn new(district: impl Into<String>, index: usize) -> Self {
        Self {
            district: district.into(),
            index,
        }
    }
}

/// Polygon as a list of rings: exterior first, then holes
pub type Polygon = Vec<Vec<DVec2>>;

/// Smallest selectable area
#[derive(Debug, Clone)]
pub struct Zone {
    pub code: String,
    pub population: u64,
    pub selected: bool,
    pub polygons: Vec<Polygon>,
    pub bounds: Rect,
}

impl Zone {
    /// Build a zone, deriving its bounds from the exterior rings.
    /// Returns `None` when there is no usable geometry.
    pub fn new(code: String, population: u64, polygons: Vec<Polygon>) -> Option<Self> {
        let bounds = Rect::from_points(
            polygons
                .iter()
                .filter_map(|p| p.first())
                .flatten()
                .map(|v| (v.x, v.y)),
        )?;
        Some(Self {
            code,
            population,
            selected: false,
            polygons,
            bounds,
        })
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.bounds.contains_point(lon, lat)
            && self
                .polygons
                .iter()
                .any(|rings| point_in_polygon(DVec2::new(lon, lat), rings))
    }
}

/// Zone data for one district, as delivered by a loader
#[derive(Debug, Clone)]
pub struct DistrictLayer {
    pub code: String,
    pub zones: Vec<Zone>,
}

/// An entry in the ordered selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedZone {
    pub key: ZoneKey,
    pub code: String,
    pub population: u64,
}

/// What happened to a district whose data just arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// Cached and drawn
    Shown,
    /// Cached only; the district is no longer wanted
    Cached,
    /// Data was already cached from an earlier request and was discarded
    Duplicate,
}

/// Which districts are cached, loading and drawn, which zones are selected
/// or highlighted, and the overlay mode. Loaded districts are never evicted;
/// a district is on the map only while it is loaded and wanted by the last
/// show-districts transition.
#[derive(Debug, Default)]
pub struct ViewState {
    viewport: Option<Rect>,
    zoom: u8,
    in_view: BTreeSet<String>,
    wanted: BTreeSet<String>,
    loaded: HashMap<String, DistrictLayer>,
    loading: HashSet<String>,
    on_map: BTreeSet<String>,
    selected: Vec<SelectedZone>,
    selected_population: u64,
    highlighted: Option<ZoneKey>,
    zone_code: Option<String>,
    overlay_mode: OverlayMode,
    overlay_active: bool,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_view(&mut self, viewport: Rect, zoom: u8) {
        self.viewport = Some(viewport);
        self.zoom = zoom;
    }

    /// Last viewport handed to a transition, `None` before the first one
    pub fn viewport(&self) -> Option<Rect> {
        self.viewport
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn set_in_view(&mut self, in_view: BTreeSet<String>) {
        self.in_view = in_view;
    }

    pub fn in_view(&self) -> &BTreeSet<String> {
        &self.in_view
    }

    /// Make exactly `wanted` visible. Cached districts are drawn at once;
    /// the returned codes are neither cached nor loading and must be
    /// requested by the caller (they are marked as loading here).
    pub fn show_districts(&mut self, wanted: BTreeSet<String>) -> Vec<String> {
        let mut to_load = Vec::new();

        for code in &wanted {
            if self.on_map.contains(code) {
                continue;
            }
            if self.loaded.contains_key(code) {
                self.on_map.insert(code.clone());
            } else if self.loading.insert(code.clone()) {
                to_load.push(code.clone());
            }
        }

        self.on_map.retain(|code| wanted.contains(code));

        let highlight_hidden = self
            .highlighted
            .as_ref()
            .is_some_and(|key| !self.on_map.contains(&key.district));
        if highlight_hidden {
            self.clear_current_zone();
        }

        self.wanted = wanted;
        to_load
    }

    /// Hide every district (data stays cached)
    pub fn clear_districts(&mut self) {
        self.show_districts(BTreeSet::new());
    }

    /// Accept data for a district. It is always cached; it is drawn only if
    /// still wanted and not already on the map.
    pub fn district_loaded(&mut self, layer: DistrictLayer) -> Arrival {
        let code = layer.code.clone();
        self.loading.remove(&code);

        let arrival = if self.loaded.contains_key(&code) {
            Arrival::Duplicate
        } else {
            self.loaded.insert(code.clone(), layer);
            Arrival::Cached
        };

        if self.wanted.contains(&code) && !self.on_map.contains(&code) {
            self.on_map.insert(code);
            return Arrival::Shown;
        }
        arrival
    }

    /// A load failed; the district can be requested again
    pub fn district_failed(&mut self, code: &str) {
        self.loading.remove(code);
    }

    pub fn is_loaded(&self, code: &str) -> bool {
        self.loaded.contains_key(code)
    }

    pub fn is_loading(&self, code: &str) -> bool {
        self.loading.contains(code)
    }

    pub fn is_on_map(&self, code: &str) -> bool {
        self.on_map.contains(code)
    }

    pub fn on_map(&self) -> &BTreeSet<String> {
        &self.on_map
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn loading_count(&self) -> usize {
        self.loading.len()
    }

    pub fn zone(&self, key: &ZoneKey) -> Option<&Zone> {
        self.loaded.get(&key.district)?.zones.get(key.index)
    }

    fn zone_mut(&mut self, key: &ZoneKey) -> Option<&mut Zone> {
        self.loaded.get_mut(&key.district)?.zones.get_mut(key.index)
    }

    /// Zones of every district currently on the map
    pub fn materialized_zones(&self) -> impl Iterator<Item = (ZoneKey, &Zone)> + '_ {
        self.on_map.iter().filter_map(|code| self.loaded.get(code)).flat_map(|layer| {
            layer
                .zones
                .iter()
                .enumerate()
                .map(move |(i, zone)| (ZoneKey::new(layer.code.as_str(), i), zone))
        })
    }

    /// Hit-test a geographic point against the drawn zones
    pub fn zone_at(&self, lon: f64, lat: f64) -> Option<ZoneKey> {
        self.on_map
            .iter()
            .filter_map(|code| self.loaded.get(code))
            .find_map(|layer| {
                layer
                    .zones
                    .iter()
                    .position(|zone| zone.contains(lon, lat))
                    .map(|i| ZoneKey::new(layer.code.as_str(), i))
            })
    }

    /// Flip a zone's selection. Returns the resulting selected flag, `None`
    /// if the zone is unknown.
    pub fn toggle_zone(&mut self, key: &ZoneKey) -> Option<bool> {
        if self.zone(key)?.selected {
            self.deselect_zone(key);
        } else {
            self.select_zone(key);
        }
        self.zone(key).map(|z| z.selected)
    }

    /// Select a zone. A code already in the selection (the same zone shipped
    /// in another district's file) is not added twice, and a selection whose
    /// total would overflow is refused.
    pub fn select_zone(&mut self, key: &ZoneKey) {
        let Some(zone) = self.zone(key) else {
            return;
        };
        if zone.selected || self.selected.iter().any(|s| s.code == zone.code) {
            return;
        }
        let Some(total) = self.selected_population.checked_add(zone.population) else {
            warn!("Zone {} population {} overflows the total", zone.code, zone.population);
            return;
        };
        let entry = SelectedZone {
            key: key.clone(),
            code: zone.code.clone(),
            population: zone.population,
        };
        if let Some(zone) = self.zone_mut(key) {
            zone.selected = true;
        }
        self.selected_population = total;
        self.selected.push(entry);
    }

    pub fn deselect_zone(&mut self, key: &ZoneKey) {
        let Some(zone) = self.zone_mut(key) else {
            return;
        };
        if !zone.selected {
            return;
        }
        zone.selected = false;
        let population = zone.population;
        self.selected.retain(|s| &s.key != key);
        self.selected_population = self.selected_population.saturating_sub(population);
    }

    pub fn deselect_all(&mut self) {
        for entry in std::mem::take(&mut self.selected) {
            if let Some(zone) = self.zone_mut(&entry.key) {
                zone.selected = false;
            }
        }
        self.selected_population = 0;
    }

    pub fn selected(&self) -> &[SelectedZone] {
        &self.selected
    }

    /// Selected zone codes in the order they were selected
    pub fn selected_codes(&self) -> impl Iterator<Item = &str> + '_ {
        self.selected.iter().map(|s| s.code.as_str())
    }

    pub fn selected_population(&self) -> u64 {
        self.selected_population
    }

    /// Apply the highlight rule: at most one highlighted zone, highlighting
    /// it again toggles it off. The displayed code follows the highlight.
    pub fn highlight_zone(&mut self, key: &ZoneKey) {
        if self.highlighted.as_ref() == Some(key) {
            self.clear_current_zone();
            return;
        }
        let Some(code) = self.zone(key).map(|z| z.code.clone()) else {
            return;
        };
        self.highlighted = Some(key.clone());
        self.zone_code = Some(code);
    }

    /// Pointer entered a zone: highlight rule, then show the hovered code
    pub fn enter_zone(&mut self, key: &ZoneKey) {
        let Some(code) = self.zone(key).map(|z| z.code.clone()) else {
            return;
        };
        self.highlight_zone(key);
        self.zone_code = Some(code);
    }

    /// Pointer left a zone. Leaving the highlighted zone drops the
    /// highlight; otherwise the code falls back to the highlighted zone's.
    pub fn leave_zone(&mut self, key: &ZoneKey) {
        if self.highlighted.as_ref() == Some(key) {
            self.clear_current_zone();
            return;
        }
        self.zone_code = self
            .highlighted
            .as_ref()
            .and_then(|key| self.zone(key))
            .map(|z| z.code.clone());
    }

    /// Drop the highlight and the displayed code
    pub fn clear_current_zone(&mut self) {
        self.highlighted = None;
        self.zone_code = None;
    }

    pub fn highlighted(&self) -> Option<&ZoneKey> {
        self.highlighted.as_ref()
    }

    /// Code shown in the overlay panel
    pub fn zone_code(&self) -> Option<&str> {
        self.zone_code.as_deref()
    }

    pub fn overlay_mode(&self) -> OverlayMode {
        self.overlay_mode
    }

    pub fn set_overlay_mode(&mut self, mode: OverlayMode) {
        self.overlay_mode = mode;
    }

    pub fn cycle_overlay_mode(&mut self) -> OverlayMode {
        self.overlay_mode = self.overlay_mode.next();
        self.overlay_mode
    }

    pub fn overlay_active(&self) -> bool {
        self.overlay_active
    }

    pub fn set_overlay_active(&mut self, active: bool) {
        self.overlay_active = active;
    }
}
