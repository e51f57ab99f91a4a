use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tasktally::{
    config::{self, load_settings},
    logging::init_logging,
    ui::run_app,
    App, FileSlot, TaskStore,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = config::data_dir()?;
    let _logging = init_logging(&config::log_dir(&data_dir))?;
    let settings = load_settings(&data_dir);

    let slot = FileSlot::new(&data_dir, &settings.storage_key);
    tracing::info!(target: "tasktally", path = %slot.path().display(), "Opening task slot");
    let mut app = App::new(TaskStore::load(Box::new(slot)), &settings);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &settings);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(target: "tasktally", error = %err, "Event loop failed");
        eprintln!("{:?}", err);
    }
    Ok(())
}
