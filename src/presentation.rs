use crate::state::{ViewState, Zone, ZoneKey};

/// Shown in the area code slot when no zone is hovered or highlighted
pub const ZONE_CODE_PLACEHOLDER: &str = "…";

/// How a drawn zone should look
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneStyle {
    Default,
    Selected,
    Highlighted,
    SelectedHighlighted,
}

impl ZoneStyle {
    pub fn is_selected(self) -> bool {
        matches!(self, ZoneStyle::Selected | ZoneStyle::SelectedHighlighted)
    }

    pub fn is_highlighted(self) -> bool {
        matches!(self, ZoneStyle::Highlighted | ZoneStyle::SelectedHighlighted)
    }
}

/// Population box contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationPanel {
    pub population: String,
    /// The "Get data" action is only offered once something is selected
    pub can_submit: bool,
}

/// Boundaries box contents, present only while the overlay panel is active
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayPanel {
    pub mode: &'static str,
    pub zone_code: String,
}

/// Format with `,` thousands separators
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn population_panel(state: &ViewState) -> PopulationPanel {
    let total = state.selected_population();
    PopulationPanel {
        population: format_thousands(total),
        can_submit: total > 0,
    }
}

pub fn zone_code_text(state: &ViewState) -> &str {
    state.zone_code().unwrap_or(ZONE_CODE_PLACEHOLDER)
}

pub fn overlay_panel(state: &ViewState) -> Option<OverlayPanel> {
    state.overlay_active().then(|| OverlayPanel {
        mode: state.overlay_mode().label(),
        zone_code: zone_code_text(state).to_string(),
    })
}

pub fn zone_style(state: &ViewState, key: &ZoneKey, zone: &Zone) -> ZoneStyle {
    let highlighted = state.highlighted() == Some(key);
    match (zone.selected, highlighted) {
        (false, false) => ZoneStyle::Default,
        (true, false) => ZoneStyle::Selected,
        (false, true) => ZoneStyle::Highlighted,
        (true, true) => ZoneStyle::SelectedHighlighted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::{layer, square_zone};
    use crate::state::OverlayMode;
    use std::collections::BTreeSet;

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1700), "1,700");
        assert_eq!(format_thousands(18755), "18,755");
        assert_eq!(format_thousands(123456789), "123,456,789");
    }

    #[test]
    fn test_empty_state() {
        let state = ViewState::new();
        let panel = population_panel(&state);
        assert_eq!(panel.population, "0");
        assert!(!panel.can_submit);
        assert!(overlay_panel(&state).is_none());
        assert_eq!(zone_code_text(&state), ZONE_CODE_PLACEHOLDER);
    }

    #[test]
    fn test_overlay_panel_follows_state() {
        let mut state = ViewState::new();
        state.set_overlay_active(true);
        state.set_overlay_mode(OverlayMode::Off);
        assert_eq!(
            overlay_panel(&state),
            Some(OverlayPanel {
                mode: "Off",
                zone_code: ZONE_CODE_PLACEHOLDER.to_string()
            })
        );
    }

    #[test]
    fn test_zone_styles() {
        let mut state = ViewState::new();
        state.show_districts(BTreeSet::from(["A".to_string()]));
        state.district_loaded(layer(
            "A",
            vec![
                square_zone("Z1", 1, 0.0, 0.0, 1.0),
                square_zone("Z2", 2, 1.0, 0.0, 1.0),
            ],
        ));
        let z1 = ZoneKey::new("A", 0);
        let z2 = ZoneKey::new("A", 1);

        state.select_zone(&z1);
        state.highlight_zone(&z2);
        let style = |state: &ViewState, key: &ZoneKey| zone_style(state, key, state.zone(key).unwrap());
        assert_eq!(style(&state, &z1), ZoneStyle::Selected);
        assert_eq!(style(&state, &z2), ZoneStyle::Highlighted);

        state.highlight_zone(&z1);
        assert_eq!(style(&state, &z1), ZoneStyle::SelectedHighlighted);
        assert_eq!(style(&state, &z2), ZoneStyle::Default);
        assert_eq!(zone_code_text(&state), "Z1");
    }
}
