use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::map::MapLayers;
use crate::presentation::{self, OverlayPanel, PopulationPanel};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let map_inner = render_map(frame, app, chunks[0]);

    let state = app.controller.state();
    render_population_box(frame, &presentation::population_panel(state), map_inner);
    if let Some(panel) = presentation::overlay_panel(state) {
        render_overlay_box(frame, &panel, map_inner);
    }

    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) -> Rect {
    let title = if app.is_demo() { " Population Builder (demo data) " } else { " Population Builder " };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app.map_renderer.render(
        app.controller.index(),
        app.controller.state(),
        &viewport,
        inner.width as usize,
        inner.height as usize,
    );

    let cursor_pos = app.mouse_pixel_pos().and_then(|(px, py)| {
        let cx = (px / 2) as u16;
        let cy = (py / 4) as u16;
        (cx < inner.width && cy < inner.height).then_some((cx, cy))
    });

    frame.render_widget(MapWidget { layers, cursor_pos }, inner);
    inner
}

/// Braille map layers with the pointer marker on top
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            let y = area.y + row;
            for (col, ch) in canvas.row_chars(row as usize).take(area.width as usize).enumerate() {
                // Skip empty braille characters (U+2800)
                if ch == '\u{2800}' {
                    continue;
                }
                buf[(area.x + col as u16, y)].set_char(ch).set_fg(color);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front
        Self::render_layer(&self.layers.bounds, Color::DarkGray, area, buf);
        Self::render_layer(&self.layers.selected, Color::LightMagenta, area, buf);
        Self::render_layer(&self.layers.outlines, Color::Magenta, area, buf);
        Self::render_layer(&self.layers.highlight, Color::LightRed, area, buf);

        if let Some((cx, cy)) = self.cursor_pos {
            let x = area.x + cx;
            let y = area.y + cy;
            if x < area.x + area.width && y < area.y + area.height {
                buf[(x, y)].set_char('╋').set_fg(Color::Red);
            }
        }
    }
}

/// Top-right box with the selected population
fn render_population_box(frame: &mut Frame, panel: &PopulationPanel, map: Rect) {
    let mut lines = vec![Line::from(vec![
        Span::styled("Population ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            panel.population.as_str(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    ])];
    if panel.can_submit {
        lines.push(Line::from(Span::styled("[g] Get data", Style::default().fg(Color::Green))));
    }

    let width = (panel.population.len() as u16 + 14).max(16);
    let height = lines.len() as u16 + 2;
    let Some(area) = corner(map, width, height, 0) else {
        return;
    };

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        ),
        area,
    );
}

/// Boundaries box under the population box, shown while the overlay
/// panel is active
fn render_overlay_box(frame: &mut Frame, panel: &OverlayPanel, map: Rect) {
    let lines = vec![
        Line::from(vec![
            Span::styled("[o] Boundaries ", Style::default().fg(Color::DarkGray)),
            Span::styled(panel.mode, Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::styled("Area ", Style::default().fg(Color::DarkGray)),
            Span::styled(panel.zone_code.as_str(), Style::default().fg(Color::LightRed)),
        ]),
        Line::from(Span::styled("[x] Clear Map", Style::default().fg(Color::DarkGray))),
    ];

    let width = (panel.zone_code.chars().count() as u16 + 8).max(22);
    let Some(area) = corner(map, width, lines.len() as u16 + 2, 4) else {
        return;
    };

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        ),
        area,
    );
}

/// Box anchored to the top-right of the map, `offset` rows down. `None`
/// when the map is too small to hold it.
fn corner(map: Rect, width: u16, height: u16, offset: u16) -> Option<Rect> {
    if map.width < width + 1 || map.height < offset + height {
        return None;
    }
    Some(Rect {
        x: map.x + map.width - width - 1,
        y: map.y + offset,
        width,
        height,
    })
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.controller.state();
    let loading = state.loading_count();

    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | Districts: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{} shown, {} cached", state.on_map().len(), state.loaded_count()),
            Style::default().fg(Color::Magenta),
        ),
    ];
    if loading > 0 {
        spans.push(Span::styled(
            format!(", {loading} loading"),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(Span::styled(
        " | hjkl:pan +/-:zoom click:select o:boundaries x:clear g:get data r:reset q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
