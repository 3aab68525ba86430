use std::fs::File;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use log::{error, info};
use ratatui::DefaultTerminal;

use popbuilder::app::App;
use popbuilder::config::{AppConfig, Cli, LoggingConfig};
use popbuilder::submit;
use popbuilder::ui;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli)?;
    init_logging(&config.logging)?;
    info!("Starting with data directory {}", config.data.dir.display());

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &config);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    // Submitting navigates away from the map, so delivery happens once the
    // terminal is back to normal
    let Some(submission) = result? else {
        return Ok(());
    };
    match submit::deliver(&submission, config.results.endpoint.as_deref()) {
        Ok(body) => {
            println!("{body}");
            Ok(())
        }
        Err(err) => {
            error!("Results delivery failed: {err:#}");
            Err(err)
        }
    }
}

/// Log to a file: the terminal belongs to the map while it runs.
/// `RUST_LOG` overrides the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let file = File::create(&logging.file)
        .with_context(|| format!("Failed to create log file {}", logging.file.display()))?;
    env_logger::Builder::new()
        .filter_level(logging.level_filter())
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Handle mouse events for panning, zooming and zone interaction
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for cursor marker and hover
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click selects, click and drag pans
        MouseEventKind::Down(MouseButton::Left) => app.mouse_down(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.mouse_up(mouse.column, mouse.row),
        // Right click is the context menu
        MouseEventKind::Down(MouseButton::Right) => app.context_menu(mouse.column, mouse.row),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, config: &AppConfig) -> Result<Option<submit::Submission>> {
    let size = terminal.size()?;
    let mut app = App::from_config(config, size.width as usize, size.height as usize)?;

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                    // Pan with hjkl or arrow keys
                    KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                    KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                    KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                    KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                    // Zoom
                    KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                    KeyCode::Char('o') | KeyCode::Char('O') => app.toggle_overlay(),
                    KeyCode::Char('x') | KeyCode::Char('X') => app.clear_map(),
                    KeyCode::Char('g') | KeyCode::Char('G') | KeyCode::Enter => app.submit(),

                    // Display toggles
                    KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_bounds(),
                    KeyCode::Char('f') | KeyCode::Char('F') => app.map_renderer.toggle_fill(),

                    KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                    _ => {}
                },
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                _ => {}
            }
        }

        app.sync_viewport();
        app.drain_loads();

        if app.should_quit {
            break;
        }
    }

    Ok(app.take_submission())
}
