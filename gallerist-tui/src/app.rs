use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use gallerist_core::{ArtworkId, BulkRequest, PageRequest, PageSource, TableState, PAGE_CAPACITY};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

use crate::theme::TuiTheme;
use crate::ui;
use crate::worker::{Drained, Worker};

pub trait EventSource {
    fn poll(&mut self, timeout: Duration) -> Result<Option<Event>>;
}

pub struct RealEventSource;

impl EventSource for RealEventSource {
    fn poll(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if crossterm::event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Browse,
    /// "Select first N" overlay is open
    BulkInput,
}

/// Work the event loop has to hand to the fetch worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Page(PageRequest),
    Bulk(BulkRequest),
}

pub struct App {
    pub table: TableState,
    /// Highlighted row within the page window
    pub row: usize,
    pub mode: Mode,
    /// Bulk overlay input, kept between openings
    pub input: String,
    pub toast: Option<(String, Instant)>,
    pub quit: bool,
}

impl App {
    pub fn new(page_capacity: usize) -> Self {
        Self {
            table: TableState::new(page_capacity),
            row: 0,
            mode: Mode::Browse,
            input: String::new(),
            toast: None,
            quit: false,
        }
    }

    fn notify<S: Into<String>>(&mut self, msg: S, ms: u64) {
        self.toast = Some((msg.into(), Instant::now() + Duration::from_millis(ms)));
    }

    pub fn active_toast(&self) -> Option<&str> {
        match &self.toast {
            Some((msg, until)) if Instant::now() <= *until => Some(msg.as_str()),
            _ => None,
        }
    }

    pub fn handle_key(&mut self, k: KeyEvent) -> Option<Command> {
        if k.kind != KeyEventKind::Press {
            return None;
        }
        if k.code == KeyCode::Char('c') && k.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit = true;
            return None;
        }
        match self.mode {
            Mode::Browse => self.browse_key(k.code),
            Mode::BulkInput => self.bulk_key(k.code),
        }
    }

    fn browse_key(&mut self, code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.quit = true;
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.row = self.row.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.row + 1 < self.table.window().len() {
                    self.row += 1;
                }
                None
            }
            KeyCode::Char(' ') => {
                self.toggle_row();
                None
            }
            KeyCode::Char('a') => {
                self.toggle_page();
                None
            }
            KeyCode::Right | KeyCode::Char('n') | KeyCode::PageDown => {
                // cursor is 1-based, so it is also the 0-based index of the next page
                let cursor = self.table.cursor();
                if cursor < self.table.total_pages() {
                    self.goto(cursor)
                } else {
                    None
                }
            }
            KeyCode::Left | KeyCode::Char('p') | KeyCode::PageUp => {
                let cursor = self.table.cursor();
                if cursor > 1 {
                    self.goto(cursor - 2)
                } else {
                    None
                }
            }
            KeyCode::Home => self.goto(0),
            KeyCode::End => match self.table.total_pages() {
                0 => None,
                n => self.goto(n - 1),
            },
            KeyCode::Char('r') => {
                self.row = 0;
                Some(Command::Page(self.table.reload()))
            }
            KeyCode::Char('b') => {
                self.mode = Mode::BulkInput;
                None
            }
            _ => None,
        }
    }

    fn bulk_key(&mut self, code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Esc => {
                self.mode = Mode::Browse;
                None
            }
            KeyCode::Enter => self.table.on_bulk_select_submit(&self.input).map(Command::Bulk),
            KeyCode::Backspace => {
                self.input.pop();
                None
            }
            // integer keyfilter: digits, and a sign only in front
            KeyCode::Char(ch) if ch.is_ascii_digit() || (ch == '-' && self.input.is_empty()) => {
                self.input.push(ch);
                None
            }
            _ => None,
        }
    }

    fn goto(&mut self, index: u32) -> Option<Command> {
        let req = self.table.on_page_change(index)?;
        self.row = 0;
        Some(Command::Page(req))
    }

    /// The table reports the full checked subset of the page, never a delta.
    fn toggle_row(&mut self) {
        if self.table.is_loading() {
            self.notify("Still loading…", 900);
            return;
        }
        let Some(id) = self.table.window().get(self.row).map(|r| r.id) else {
            return;
        };
        let mut checked = self.table.visible_selection();
        if let Some(pos) = checked.iter().position(|c| *c == id) {
            checked.remove(pos);
        } else {
            checked.push(id);
        }
        self.table.on_selection_toggle(&checked);
    }

    fn toggle_page(&mut self) {
        if self.table.is_loading() {
            self.notify("Still loading…", 900);
            return;
        }
        let window = self.table.window();
        let all: Vec<ArtworkId> = window.iter().map(|r| r.id).collect();
        let checked = if !all.is_empty() && self.table.visible_selection().len() == all.len() {
            Vec::new()
        } else {
            all
        };
        self.table.on_selection_toggle(&checked);
    }

    pub fn after_drain(&mut self, d: Drained) {
        if d.pages_applied > 0 && self.row >= self.table.window().len() {
            self.row = self.table.window().len().saturating_sub(1);
        }
        if d.bulk_succeeded {
            self.mode = Mode::Browse;
            let n = self.table.selection().len();
            self.notify(format!("Selected {n} artworks"), 1500);
        }
    }
}

pub struct RunOptions {
    pub draw: bool,
    pub alt_screen: bool,
    pub tick: Duration,
    pub theme: TuiTheme,
    /// 1-based page to open on
    pub start_page: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            draw: true,
            alt_screen: true,
            tick: Duration::from_millis(100),
            theme: TuiTheme::default(),
            start_page: 1,
        }
    }
}

pub fn run_app_default(source: Arc<dyn PageSource>, handle: Handle, opts: RunOptions) -> Result<Vec<ArtworkId>> {
    let mut es = RealEventSource;
    run_app_with(source, handle, &mut es, opts)
}

/// Run the table until the user quits and return the final selection.
///
/// With `draw` off nothing touches the terminal: the loop waits for every
/// outstanding fetch before reading the next event and ends when the event
/// source runs dry.
pub fn run_app_with(
    source: Arc<dyn PageSource>,
    handle: Handle,
    es: &mut dyn EventSource,
    opts: RunOptions,
) -> Result<Vec<ArtworkId>> {
    let mut app = App::new(PAGE_CAPACITY);
    let mut worker = Worker::new(handle, source);
    if let Some(req) = app.table.on_page_change(opts.start_page.saturating_sub(1)) {
        worker.spawn_page(req);
    }

    let mut terminal = if opts.draw {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if opts.alt_screen {
            crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
        }
        Some(Terminal::new(CrosstermBackend::new(stdout))?)
    } else {
        None
    };

    let result = event_loop(&mut app, &mut worker, es, terminal.as_mut(), &opts);

    if opts.draw {
        disable_raw_mode()?;
        if opts.alt_screen {
            crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
        }
    }
    result?;
    Ok(app.table.selection().ids().to_vec())
}

fn event_loop(
    app: &mut App,
    worker: &mut Worker,
    es: &mut dyn EventSource,
    mut terminal: Option<&mut Terminal<CrosstermBackend<io::Stdout>>>,
    opts: &RunOptions,
) -> Result<()> {
    loop {
        let drained = if opts.draw {
            worker.drain(&mut app.table)
        } else {
            worker.settle(&mut app.table, Duration::from_secs(30))
        };
        app.after_drain(drained);

        if let Some(term) = terminal.as_deref_mut() {
            term.draw(|f| ui::draw(f, app, &opts.theme))?;
        }
        if app.quit {
            return Ok(());
        }

        match es.poll(opts.tick)? {
            Some(Event::Key(k)) => match app.handle_key(k) {
                Some(Command::Page(req)) => worker.spawn_page(req),
                Some(Command::Bulk(req)) => worker.spawn_bulk(req),
                None => {}
            },
            Some(_) => {}
            None if !opts.draw && worker.pending() == 0 => return Ok(()),
            None => {}
        }
    }
}
