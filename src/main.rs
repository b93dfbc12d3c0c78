use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use cartomorph::config::{Config, Transition};
use cartomorph::data::DataCache;
use cartomorph::export;
use cartomorph::projection::ProjectionKind;
use cartomorph::state::{Action, App};
use cartomorph::ui;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use geojson::GeoJson;
use ratatui::{backend::CrosstermBackend, Terminal};

/// Poll interval while a transition is running.
const FRAME: Duration = Duration::from_millis(16);
const IDLE_POLL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "cartomorph", about = "Country mentions in the press, as a morphing world map")]
struct Cli {
    /// Configuration file (defaults to ./cartomorph.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the map files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    projection: Option<ProjectionKind>,

    #[arg(long, value_enum)]
    transition: Option<Transition>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a CSV file without one column
    ExportCsv {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value = "current")]
        column: String,
    },
    /// Copy a GeoJSON file without one feature property
    ExportGeojson {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value = "current")]
        property: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::ExportCsv { input, output, column }) => {
            let reader = BufReader::new(File::open(&input)?);
            let writer = BufWriter::new(File::create(&output)?);
            let rows = export::export_csv(reader, writer, &column)?;
            log::info!("Wrote {rows} rows to {}", output.display());
            return Ok(());
        }
        Some(Commands::ExportGeojson { input, output, property }) => {
            let mut geojson: GeoJson = fs::read_to_string(&input)?.parse()?;
            let stripped = export::strip_property(&mut geojson, &property);
            fs::write(&output, serde_json::to_string(&geojson)?)?;
            log::info!("Removed {property:?} from {stripped} features in {}", output.display());
            return Ok(());
        }
        None => {}
    }

    let mut config = Config::discover(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(projection) = cli.projection {
        config.projection = projection;
    }
    if let Some(transition) = cli.transition {
        config.transition = transition;
    }

    // Loading happens before the alternate screen so log lines stay visible.
    let maps = DataCache::new(&config.data_dir).load_or_empty(&config.maps);
    let mut app = App::new(config, maps);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let now = Instant::now();
        app.update(Action::Tick, now);
        terminal.draw(|f| ui::draw(f, app, now))?;

        let timeout = if app.animation.is_animating() || app.view.dragging { FRAME } else { IDLE_POLL };
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) => {
                    if app.handle_input(code, Instant::now()) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => app.handle_mouse(mouse, Instant::now()),
                _ => {}
            }
        }
    }
}
