use std::cell::RefCell;
use std::io;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect as Area;
use tracing::{info, warn};

use crate::drag::{CardDrop, DragController, DragOutcome};
use crate::error::{LanesError, Result};
use crate::geometry::{HeaderHit, HeaderTool, Point};
use crate::model::{Board, Config};
use crate::storage::Storage;
use crate::store::{BoardStore, DerivedViews, Persister};

use super::layout::{self, BoardLayout};
use super::sheet::{Field, Sheet};
use super::ui;

/// Event poll interval; also the auto-scroll frame.
const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Normal,
    Sheet,
    Confirm,
    Help,
    Prompt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmAction {
    DeleteCard(String),
    DeleteColumn(String),
    ClearBoard,
}

impl ConfirmAction {
    pub fn question(&self, board: &Board) -> String {
        match self {
            ConfirmAction::DeleteCard(id) => {
                let title = board.find_card(id).map(|c| c.title.as_str()).unwrap_or("this card");
                format!("Delete \"{title}\"?")
            }
            ConfirmAction::DeleteColumn(id) => {
                let title = board.column(id).map(|c| c.title.as_str()).unwrap_or("this category");
                format!("Delete \"{title}\" and all its cards?")
            }
            ConfirmAction::ClearBoard => "This will erase the board. Continue?".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromptAction {
    AddColumn,
    RenameColumn(String),
    Import,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub action: PromptAction,
    pub label: String,
    pub input: String,
}

pub struct App {
    pub storage: Storage,
    pub config: Config,
    pub store: BoardStore,
    pub views: Rc<RefCell<DerivedViews>>,
    persister: Rc<RefCell<Persister>>,
    pub drag: DragController,
    pub layout: BoardLayout,
    pub area: Area,
    pub scroll_x: i32,
    pub mode: Mode,
    pub sheet: Option<Sheet>,
    pub confirm: Option<ConfirmAction>,
    pub prompt: Option<Prompt>,
    pub selected_col: usize,
    pub selected_row: usize,
    pub message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(storage: Storage) -> Result<Self> {
        let mut config = storage.load_config();
        let board = storage.load_board();

        let mut store = BoardStore::new(board);
        let views = Rc::new(RefCell::new(DerivedViews::new()));
        let persister = Rc::new(RefCell::new(Persister::new(
            storage.clone(),
            Duration::from_millis(config.save_debounce_ms),
        )));
        store.subscribe(views.clone());
        store.subscribe(persister.clone());

        let mut mode = Mode::Normal;
        if !config.help_shown {
            mode = Mode::Help;
            config.help_shown = true;
            if let Err(e) = storage.save_config(&config) {
                warn!(error = %e, "could not remember that help was shown");
            }
        }

        let drag = DragController::new(&config.drag);
        let mut app = Self {
            storage,
            config,
            store,
            views,
            persister,
            drag,
            layout: BoardLayout::default(),
            area: Area::new(0, 0, 120, 30),
            scroll_x: 0,
            mode,
            sheet: None,
            confirm: None,
            prompt: None,
            selected_col: 0,
            selected_row: 0,
            message: None,
            should_quit: false,
        };
        app.relayout();
        Ok(app)
    }

    pub fn board(&self) -> &Board {
        self.store.board()
    }

    pub fn resize(&mut self, area: Area) {
        if area != self.area {
            self.area = area;
            self.relayout();
        }
    }

    /// Recompute the layout from the current board and drag state.
    pub fn relayout(&mut self) {
        self.layout = layout::compute(
            self.store.board(),
            &self.drag,
            self.area,
            self.scroll_x,
            self.config.column_width,
        );
        let max = self.layout.max_scroll();
        if self.scroll_x > max {
            self.scroll_x = max;
            self.layout = layout::compute(
                self.store.board(),
                &self.drag,
                self.area,
                self.scroll_x,
                self.config.column_width,
            );
        }
    }

    pub fn scroll_by(&mut self, dx: i32) {
        let next = (self.scroll_x + dx).clamp(0, self.layout.max_scroll());
        if next != self.scroll_x {
            self.scroll_x = next;
            self.relayout();
        }
    }

    pub fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse, now),
            Event::Resize(w, h) => self.area = Area::new(0, 0, w, h),
            _ => {}
        }
        self.after_change();
    }

    /// One frame: long-press timer, auto-scroll and the debounced save.
    pub fn tick(&mut self, now: Instant) {
        let was_dragging = self.drag.is_dragging();
        let dx = self.drag.tick(now, &self.layout.hit_map);
        if self.drag.is_dragging() != was_dragging {
            self.relayout();
        }
        if dx != 0 {
            let before = self.scroll_x;
            self.scroll_by(dx);
            if self.scroll_x != before {
                self.drag.refresh(&self.layout.hit_map);
                self.relayout();
            }
        }
        self.persister.borrow_mut().poll(now);
    }

    /// Write any pending change. Called on exit.
    pub fn shutdown(&mut self) -> Result<()> {
        self.persister.borrow_mut().flush()
    }

    fn after_change(&mut self) {
        if let Some(sheet) = &mut self.sheet {
            sheet.sync_columns(self.views.borrow().column_options());
        }
        let n = self.store.board().columns.len();
        if self.selected_col >= n {
            self.selected_col = n.saturating_sub(1);
        }
        self.clamp_row();
        self.relayout();
    }

    // --- selection ---

    fn selected_column_id(&self) -> Option<String> {
        self.board().columns.get(self.selected_col).map(|c| c.id.clone())
    }

    pub fn selected_card_id(&self) -> Option<String> {
        let col = self.board().columns.get(self.selected_col)?;
        self.board().list(&col.id).get(self.selected_row).cloned()
    }

    fn clamp_row(&mut self) {
        let count = self
            .selected_column_id()
            .map(|id| self.board().list(&id).len())
            .unwrap_or(0);
        if count == 0 {
            self.selected_row = 0;
        } else if self.selected_row >= count {
            self.selected_row = count - 1;
        }
    }

    fn select_card(&mut self, card_id: &str) {
        let board = self.store.board();
        for (i, col) in board.columns.iter().enumerate() {
            if let Some(row) = board.list(&col.id).iter().position(|id| id == card_id) {
                self.selected_col = i;
                self.selected_row = row;
                return;
            }
        }
    }

    /// Scroll just enough to bring the selected column into view.
    fn reveal_selected(&mut self) {
        self.relayout();
        let Some(col) = self.layout.columns.get(self.selected_col) else {
            return;
        };
        let viewport = self.layout.hit_map.viewport;
        if col.rect.x < viewport.x {
            self.scroll_by(col.rect.x - viewport.x);
        } else if col.rect.right() > viewport.right() {
            self.scroll_by(col.rect.right() - viewport.right());
        }
    }

    // --- keyboard ---

    pub fn handle_key(&mut self, key: KeyEvent) {
        // Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        // a gesture in flight owns the board until release
        if self.drag.is_busy() {
            return;
        }

        match self.mode {
            Mode::Normal => self.handle_normal(key),
            Mode::Sheet => self.handle_sheet(key),
            Mode::Confirm => self.handle_confirm(key),
            Mode::Help => self.handle_help(key),
            Mode::Prompt => self.handle_prompt(key),
        }
    }

    fn handle_normal(&mut self, key: KeyEvent) {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,

            // Horizontal scroll nudges
            KeyCode::Left if shift => self.scroll_by(-self.config.drag.scroll_step),
            KeyCode::Right if shift => self.scroll_by(self.config.drag.scroll_step),

            KeyCode::Char('h') | KeyCode::Left => {
                if self.selected_col > 0 {
                    self.selected_col -= 1;
                    self.clamp_row();
                    self.reveal_selected();
                }
            }
            KeyCode::Char('l') | KeyCode::Right => {
                if self.selected_col + 1 < self.board().columns.len() {
                    self.selected_col += 1;
                    self.clamp_row();
                    self.reveal_selected();
                }
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.selected_row += 1;
                self.clamp_row();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_row = self.selected_row.saturating_sub(1);
            }

            KeyCode::Char('a') => {
                if let Some(col) = self.selected_column_id() {
                    self.open_add_sheet(&col);
                }
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(id) = self.selected_card_id() {
                    self.open_edit_sheet(&id);
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_card_id() {
                    self.ask(ConfirmAction::DeleteCard(id));
                }
            }

            // Columns
            KeyCode::Char('n') => self.open_prompt(PromptAction::AddColumn, "Category name:", "New Category"),
            KeyCode::Char('r') => {
                if let Some(col) = self.board().columns.get(self.selected_col).cloned() {
                    self.open_prompt(PromptAction::RenameColumn(col.id), "Rename category:", &col.title);
                }
            }
            KeyCode::Char('D') => {
                if let Some(col) = self.selected_column_id() {
                    self.ask(ConfirmAction::DeleteColumn(col));
                }
            }

            // Board
            KeyCode::Char('x') => self.export(),
            KeyCode::Char('i') => self.open_prompt(PromptAction::Import, "Import board from file:", ""),
            KeyCode::Char('X') => self.ask(ConfirmAction::ClearBoard),

            KeyCode::Char('?') => self.mode = Mode::Help,
            KeyCode::Esc => self.message = None,
            _ => {}
        }
    }

    fn handle_sheet(&mut self, key: KeyEvent) {
        let Some(sheet) = &mut self.sheet else {
            self.mode = Mode::Normal;
            return;
        };
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('d')
                && let Some(id) = sheet.editing.clone()
            {
                self.ask(ConfirmAction::DeleteCard(id));
            } else if key.code == KeyCode::Char('s') {
                self.save_sheet();
            }
            return;
        }
        match key.code {
            KeyCode::Esc => self.close_sheet(),
            KeyCode::Enter => self.save_sheet(),
            KeyCode::Tab | KeyCode::Down => sheet.next_field(),
            KeyCode::BackTab | KeyCode::Up => sheet.prev_field(),
            KeyCode::Left if sheet.focus == Field::Column => {
                sheet.cycle_column(self.views.borrow().column_options(), -1)
            }
            KeyCode::Right if sheet.focus == Field::Column => {
                sheet.cycle_column(self.views.borrow().column_options(), 1)
            }
            KeyCode::Backspace => {
                if let Some(buf) = sheet.buffer_mut() {
                    buf.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(buf) = sheet.buffer_mut() {
                    buf.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_confirm(&mut self, key: KeyEvent) {
        let accepted = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter);
        let action = self.confirm.take();
        if accepted && let Some(action) = action {
            match action {
                ConfirmAction::DeleteCard(id) => {
                    let title = self.board().find_card(&id).map(|c| c.title.clone()).unwrap_or_default();
                    if self.store.delete_card(&id) {
                        self.message = Some(format!("Deleted: {title}"));
                    }
                    if self.sheet.as_ref().is_some_and(|s| s.editing.as_deref() == Some(id.as_str())) {
                        self.sheet = None;
                    }
                }
                ConfirmAction::DeleteColumn(id) => {
                    self.store.delete_column(&id);
                }
                ConfirmAction::ClearBoard => {
                    self.store.reset();
                    self.scroll_x = 0;
                    self.message = Some("Board cleared.".into());
                }
            }
        }
        self.mode = if self.sheet.is_some() { Mode::Sheet } else { Mode::Normal };
    }

    fn handle_help(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
            self.mode = Mode::Normal;
        }
    }

    fn handle_prompt(&mut self, key: KeyEvent) {
        let Some(prompt) = &mut self.prompt else {
            self.mode = Mode::Normal;
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
                self.mode = Mode::Normal;
            }
            KeyCode::Enter => self.submit_prompt(),
            KeyCode::Backspace => {
                prompt.input.pop();
            }
            KeyCode::Char(c) => prompt.input.push(c),
            _ => {}
        }
    }

    // --- pointer ---

    pub fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        let p = Point::new(mouse.column as i32, mouse.row as i32);
        let shift = mouse.modifiers.contains(KeyModifiers::SHIFT);
        let step = self.config.drag.scroll_step;

        match mouse.kind {
            MouseEventKind::ScrollLeft => self.scroll_by(-step),
            MouseEventKind::ScrollRight => self.scroll_by(step),
            MouseEventKind::ScrollUp if shift => self.scroll_by(-step),
            MouseEventKind::ScrollDown if shift => self.scroll_by(step),
            MouseEventKind::Down(MouseButton::Left) => match self.mode {
                Mode::Normal => self.press(p, now),
                Mode::Sheet => {
                    let inside = layout::to_rect(layout::sheet_area(self.area)).contains(p);
                    let dismissable = self.sheet.as_ref().is_some_and(|s| !s.is_edit() && s.is_empty());
                    if !inside && dismissable {
                        self.close_sheet();
                    }
                }
                Mode::Help => {
                    if !layout::to_rect(layout::help_area(self.area)).contains(p) {
                        self.mode = Mode::Normal;
                    }
                }
                Mode::Confirm | Mode::Prompt => {}
            },
            MouseEventKind::Drag(MouseButton::Left) => {
                let was_dragging = self.drag.is_dragging();
                self.drag.pointer_move(p, &self.layout.hit_map);
                if self.drag.is_dragging() || was_dragging {
                    self.relayout();
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let outcome = self.drag.release(p, &self.layout.hit_map);
                self.commit(outcome);
            }
            _ => {}
        }
    }

    fn press(&mut self, p: Point, now: Instant) {
        if let Some((col, hit)) = self.layout.hit_map.header_at(p) {
            let (column_id, rect) = (col.column_id.clone(), col.rect);
            match hit {
                HeaderHit::Tool(HeaderTool::AddCard) => self.open_add_sheet(&column_id),
                HeaderHit::Tool(HeaderTool::Delete) => self.ask(ConfirmAction::DeleteColumn(column_id)),
                HeaderHit::Title => {
                    let title = self.board().column(&column_id).map(|c| c.title.clone()).unwrap_or_default();
                    self.open_prompt(PromptAction::RenameColumn(column_id), "Rename category:", &title);
                }
                HeaderHit::Grip | HeaderHit::Background => {
                    if self.drag.press_header(&column_id, rect, hit, p, &self.layout.hit_map) {
                        self.relayout();
                    }
                }
            }
            return;
        }

        if let Some((col, card)) = self.layout.hit_map.card_at(p) {
            let (column_id, card_id, rect) = (col.column_id.clone(), card.card_id.clone(), card.rect);
            self.select_card(&card_id);
            self.drag
                .press_card(&card_id, &column_id, rect, p, self.config.pointer, now);
            return;
        }

        if self.layout.add_column.is_some_and(|r| r.contains(p)) {
            self.open_prompt(PromptAction::AddColumn, "Category name:", "New Category");
        }
    }

    /// Apply a finished gesture to the board.
    fn commit(&mut self, outcome: DragOutcome) {
        match outcome {
            DragOutcome::None => {}
            DragOutcome::Card(CardDrop::None) => {}
            DragOutcome::Card(CardDrop::Tap { card_id }) => self.open_edit_sheet(&card_id),
            DragOutcome::Card(CardDrop::Move { card_id, column_id, before }) => {
                self.store.move_card(&card_id, &column_id, before.as_deref());
                self.select_card(&card_id);
            }
            DragOutcome::Card(CardDrop::Delete { card_id }) => self.ask(ConfirmAction::DeleteCard(card_id)),
            DragOutcome::Columns(mut order) => {
                // columns the gesture never saw keep their place at the end
                for col in &self.store.board().columns {
                    if !order.contains(&col.id) {
                        order.push(col.id.clone());
                    }
                }
                self.store.move_column(&order);
            }
        }
        self.relayout();
    }

    // --- actions ---

    fn open_add_sheet(&mut self, column_id: &str) {
        self.sheet = Some(Sheet::add(column_id));
        self.mode = Mode::Sheet;
    }

    fn open_edit_sheet(&mut self, card_id: &str) {
        if let Some(card) = self.board().find_card(card_id) {
            self.sheet = Some(Sheet::edit(card));
            self.mode = Mode::Sheet;
        }
    }

    fn close_sheet(&mut self) {
        self.sheet = None;
        self.mode = Mode::Normal;
    }

    fn save_sheet(&mut self) {
        let Some(sheet) = &self.sheet else {
            return;
        };
        let editing = sheet.editing.clone();
        let today = Local::now().date_naive();
        let result = sheet.to_draft().and_then(|draft| {
            let title = draft.title.trim().to_string();
            match &editing {
                Some(id) => self.store.update_card(id, draft, today).map(|_| (id.clone(), title)),
                None => self.store.add_card(draft, today).map(|id| (id, title)),
            }
        });
        match result {
            Ok((id, title)) => {
                let verb = if editing.is_some() { "Saved" } else { "Added" };
                self.message = Some(format!("{verb}: {title}"));
                self.close_sheet();
                self.select_card(&id);
            }
            Err(e) => {
                if let Some(sheet) = &mut self.sheet {
                    if matches!(e, LanesError::EmptyTitle) {
                        sheet.focus = Field::Title;
                    }
                    sheet.error = Some(e.to_string());
                }
            }
        }
    }

    fn ask(&mut self, action: ConfirmAction) {
        self.confirm = Some(action);
        self.mode = Mode::Confirm;
    }

    fn open_prompt(&mut self, action: PromptAction, label: &str, initial: &str) {
        self.prompt = Some(Prompt {
            action,
            label: label.into(),
            input: initial.into(),
        });
        self.mode = Mode::Prompt;
    }

    fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        self.mode = Mode::Normal;
        match prompt.action {
            PromptAction::AddColumn => {
                if !prompt.input.trim().is_empty()
                    && let Ok(id) = self.store.add_column(&prompt.input)
                {
                    self.selected_col = self.board().columns.iter().position(|c| c.id == id).unwrap_or(0);
                    self.reveal_selected();
                }
            }
            PromptAction::RenameColumn(id) => {
                self.store.rename_column(&id, &prompt.input);
            }
            PromptAction::Import => match Storage::import_board(Path::new(prompt.input.trim())) {
                Ok(board) => {
                    let cards = board.cards.len();
                    self.store.replace(board);
                    self.scroll_x = 0;
                    self.message = Some(format!("Imported {cards} cards."));
                }
                Err(e) => {
                    warn!(error = %e, "import failed");
                    self.message = Some(e.to_string());
                }
            },
        }
    }

    fn export(&mut self) {
        let today = Local::now().date_naive();
        match Storage::export_board(self.board(), Path::new("."), today) {
            Ok(path) => self.message = Some(format!("Exported to {}", path.display())),
            Err(e) => self.message = Some(format!("Export failed: {e}")),
        }
    }
}

pub fn run_tui(storage: Storage) -> Result<()> {
    let mut app = App::new(storage)?;
    info!(root = %app.storage.root().display(), "tui started");

    enable_raw_mode().map_err(|e| LanesError::Terminal(e.to_string()))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .map_err(|e| LanesError::Terminal(e.to_string()))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| LanesError::Terminal(e.to_string()))?;

    let result = run_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture).ok();
    terminal.show_cursor().ok();

    let flushed = app.shutdown();
    info!("tui stopped");
    result.and(flushed)
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        let size = terminal.size().map_err(|e| LanesError::Terminal(e.to_string()))?;
        app.resize(Area::new(0, 0, size.width, size.height));
        terminal
            .draw(|f| ui::draw(f, app))
            .map_err(|e| LanesError::Terminal(e.to_string()))?;

        if event::poll(FRAME).map_err(|e| LanesError::Terminal(e.to_string()))? {
            let ev = event::read().map_err(|e| LanesError::Terminal(e.to_string()))?;
            app.handle_event(ev, Instant::now());
        }
        app.tick(Instant::now());

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseEventKind};
    use tempfile::TempDir;

    fn make_key(code: KeyCode) -> KeyEvent {
        make_key_mod(code, KeyModifiers::NONE)
    }

    fn make_key_mod(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn mouse(kind: MouseEventKind, x: u16, y: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column: x,
            row: y,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn key(app: &mut App, code: KeyCode) {
        app.handle_event(Event::Key(make_key(code)), Instant::now());
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            key(app, KeyCode::Char(c));
        }
    }

    fn click(app: &mut App, x: u16, y: u16) {
        let now = Instant::now();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), x, y), now);
        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), x, y), now);
    }

    fn drag(app: &mut App, from: (u16, u16), to: (u16, u16)) {
        let now = Instant::now();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), from.0, from.1), now);
        app.handle_event(mouse(MouseEventKind::Drag(MouseButton::Left), to.0, to.1), now);
        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), to.0, to.1), now);
    }

    /// Seed board, help already seen. Columns are 30 wide with a 1-cell gap:
    /// To-Do 0..30, Doing 31..61, Done 62..92, Floating 93..123. The first
    /// card of each column spans rows 3..7.
    fn test_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path());
        let config = Config {
            help_shown: true,
            ..Config::default()
        };
        storage.save_config(&config).unwrap();
        let app = App::new(storage).unwrap();
        (dir, app)
    }

    fn titles(app: &App, col: usize) -> Vec<String> {
        let board = app.board();
        board
            .column_cards(&board.columns[col].id)
            .iter()
            .map(|c| c.title.clone())
            .collect()
    }

    #[test]
    fn first_run_shows_help_once() {
        let dir = TempDir::new().unwrap();
        let app = App::new(Storage::new(dir.path())).unwrap();
        assert_eq!(app.mode, Mode::Help);
        let again = App::new(Storage::new(dir.path())).unwrap();
        assert_eq!(again.mode, Mode::Normal);
    }

    #[test]
    fn help_closes_on_esc_and_click_outside() {
        let (_dir, mut app) = test_app();
        key(&mut app, KeyCode::Char('?'));
        assert_eq!(app.mode, Mode::Help);
        key(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Normal);
        key(&mut app, KeyCode::Char('?'));
        click(&mut app, 0, 0);
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn dragging_the_todo_card_to_done_updates_progress() {
        let (_dir, mut app) = test_app();
        assert_eq!(app.views.borrow().progress().label(), "1 of 3 done");
        drag(&mut app, (5, 4), (70, 12));
        assert!(titles(&app, 0).is_empty());
        assert_eq!(titles(&app, 2), vec!["Celebrate small wins", "Set up project"]);
        assert_eq!(app.views.borrow().progress().label(), "2 of 3 done");
        assert!(app.board().violations().is_empty());
    }

    #[test]
    fn dropping_above_a_card_inserts_before_it() {
        let (_dir, mut app) = test_app();
        drag(&mut app, (5, 4), (70, 3));
        assert_eq!(titles(&app, 2), vec!["Set up project", "Celebrate small wins"]);
    }

    #[test]
    fn drop_outside_asks_before_deleting() {
        let (_dir, mut app) = test_app();
        let before = app.board().clone();
        // the title bar is outside the board viewport
        drag(&mut app, (5, 4), (10, 0));
        assert_eq!(app.mode, Mode::Confirm);
        key(&mut app, KeyCode::Char('n'));
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.board(), &before);

        drag(&mut app, (5, 4), (10, 0));
        key(&mut app, KeyCode::Char('y'));
        assert_eq!(app.board().cards.len(), 2);
        assert!(titles(&app, 0).is_empty());
    }

    #[test]
    fn tap_opens_the_edit_sheet() {
        let (_dir, mut app) = test_app();
        click(&mut app, 5, 4);
        assert_eq!(app.mode, Mode::Sheet);
        let sheet = app.sheet.as_ref().unwrap();
        assert!(sheet.is_edit());
        assert_eq!(sheet.title, "Set up project");
    }

    #[test]
    fn dragging_a_header_reorders_columns() {
        let (_dir, mut app) = test_app();
        // Floating's grip, dropped left of To-Do's midpoint
        drag(&mut app, (94, 2), (3, 2));
        let order: Vec<String> = app.board().columns.iter().map(|c| c.title.clone()).collect();
        assert_eq!(order, vec!["Floating", "To-Do", "Doing", "Done"]);
    }

    #[test]
    fn keys_are_ignored_while_a_column_is_dragged() {
        let (_dir, mut app) = test_app();
        let now = Instant::now();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 94, 2), now);
        app.handle_event(mouse(MouseEventKind::Drag(MouseButton::Left), 40, 2), now);
        key(&mut app, KeyCode::Char('X'));
        key(&mut app, KeyCode::Char('y'));
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.confirm.is_none());
        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), 40, 2), now);

        let board = app.board();
        assert_eq!(board.columns.len(), 4);
        assert_eq!(board.cards.len(), 3);
        assert!(board.violations().is_empty());
    }

    #[test]
    fn column_drop_after_board_replacement_keeps_every_column() {
        let (_dir, mut app) = test_app();
        let now = Instant::now();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 94, 2), now);
        app.handle_event(mouse(MouseEventKind::Drag(MouseButton::Left), 40, 2), now);
        app.store.reset();
        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), 40, 2), now);

        let board = app.board();
        let titles: Vec<&str> = board.columns.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["To-Do", "Doing", "Done", "Floating"]);
        assert!(board.violations().is_empty());
        assert!(!app.drag.is_busy());
    }

    #[test]
    fn header_tools_keep_their_clicks() {
        let (_dir, mut app) = test_app();
        // [+] on To-Do sits at 22..25 on the header line
        click(&mut app, 23, 2);
        assert_eq!(app.mode, Mode::Sheet);
        assert_eq!(app.sheet.as_ref().unwrap().column_id, app.board().columns[0].id);
        assert!(!app.drag.is_busy());
    }

    #[test]
    fn add_card_from_the_sheet() {
        let (_dir, mut app) = test_app();
        key(&mut app, KeyCode::Char('l'));
        key(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Write tests");
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Tab);
        type_text(&mut app, "qa, rust");
        key(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(titles(&app, 1), vec!["Draft first tasks", "Write tests"]);
        let card = app.board().cards.values().find(|c| c.title == "Write tests").unwrap();
        assert_eq!(card.tags, vec!["qa", "rust"]);
        assert_eq!(app.message.as_deref(), Some("Added: Write tests"));
    }

    #[test]
    fn empty_title_keeps_the_sheet_open() {
        let (_dir, mut app) = test_app();
        key(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "   ");
        key(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Sheet);
        assert!(app.sheet.as_ref().unwrap().error.is_some());
        assert_eq!(app.board().cards.len(), 3);
    }

    #[test]
    fn past_due_date_is_rejected() {
        let (_dir, mut app) = test_app();
        key(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Late");
        key(&mut app, KeyCode::Tab);
        type_text(&mut app, "2000-01-01");
        key(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Sheet);
        assert!(app.sheet.as_ref().unwrap().error.as_deref().unwrap().contains("future"));
    }

    #[test]
    fn click_outside_dismisses_only_an_empty_add_sheet() {
        let (_dir, mut app) = test_app();
        key(&mut app, KeyCode::Char('a'));
        click(&mut app, 0, 29);
        assert_eq!(app.mode, Mode::Normal);

        key(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "x");
        click(&mut app, 0, 29);
        assert_eq!(app.mode, Mode::Sheet);
    }

    #[test]
    fn editing_the_category_moves_the_card_to_the_tail() {
        let (_dir, mut app) = test_app();
        click(&mut app, 5, 4);
        for _ in 0..3 {
            key(&mut app, KeyCode::Tab);
        }
        key(&mut app, KeyCode::Right);
        key(&mut app, KeyCode::Right);
        key(&mut app, KeyCode::Enter);
        assert_eq!(titles(&app, 2), vec!["Celebrate small wins", "Set up project"]);
    }

    #[test]
    fn delete_from_the_edit_sheet_needs_confirmation() {
        let (_dir, mut app) = test_app();
        click(&mut app, 5, 4);
        app.handle_event(
            Event::Key(make_key_mod(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            Instant::now(),
        );
        assert_eq!(app.mode, Mode::Confirm);
        key(&mut app, KeyCode::Char('n'));
        assert_eq!(app.mode, Mode::Sheet);
        app.handle_event(
            Event::Key(make_key_mod(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            Instant::now(),
        );
        key(&mut app, KeyCode::Char('y'));
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.sheet.is_none());
        assert_eq!(app.board().cards.len(), 2);
    }

    #[test]
    fn add_and_rename_columns_through_prompts() {
        let (_dir, mut app) = test_app();
        key(&mut app, KeyCode::Char('n'));
        assert_eq!(app.prompt.as_ref().unwrap().input, "New Category");
        key(&mut app, KeyCode::Enter);
        assert_eq!(app.board().columns.last().unwrap().title, "New Category");

        key(&mut app, KeyCode::Char('r'));
        for _ in 0.."New Category".len() {
            key(&mut app, KeyCode::Backspace);
        }
        key(&mut app, KeyCode::Enter);
        assert_eq!(app.board().columns.last().unwrap().title, "Untitled");
    }

    #[test]
    fn empty_add_column_prompt_is_ignored() {
        let (_dir, mut app) = test_app();
        key(&mut app, KeyCode::Char('n'));
        for _ in 0.."New Category".len() {
            key(&mut app, KeyCode::Backspace);
        }
        key(&mut app, KeyCode::Enter);
        assert_eq!(app.board().columns.len(), 4);
    }

    #[test]
    fn delete_column_cascades_after_confirm() {
        let (_dir, mut app) = test_app();
        // [x] on To-Do sits at 26..29
        click(&mut app, 27, 2);
        assert_eq!(app.mode, Mode::Confirm);
        key(&mut app, KeyCode::Char('y'));
        assert_eq!(app.board().columns.len(), 3);
        assert_eq!(app.board().cards.len(), 2);
    }

    #[test]
    fn clear_board_resets_to_seed() {
        let (_dir, mut app) = test_app();
        key(&mut app, KeyCode::Char('d'));
        key(&mut app, KeyCode::Char('y'));
        assert_eq!(app.board().cards.len(), 2);
        key(&mut app, KeyCode::Char('X'));
        key(&mut app, KeyCode::Char('y'));
        assert_eq!(app.board().cards.len(), 3);
        assert_eq!(app.board().columns.len(), 4);
    }

    #[test]
    fn shift_arrows_nudge_the_scroll() {
        let (_dir, mut app) = test_app();
        // 4 columns + the add button overflow 120 cells by 20
        assert_eq!(app.layout.max_scroll(), 20);
        app.handle_event(
            Event::Key(make_key_mod(KeyCode::Right, KeyModifiers::SHIFT)),
            Instant::now(),
        );
        assert_eq!(app.scroll_x, 8);
        app.handle_event(mouse(MouseEventKind::ScrollRight, 50, 10), Instant::now());
        app.handle_event(mouse(MouseEventKind::ScrollRight, 50, 10), Instant::now());
        assert_eq!(app.scroll_x, 20);
        app.handle_event(
            Event::Key(make_key_mod(KeyCode::Left, KeyModifiers::SHIFT)),
            Instant::now(),
        );
        assert_eq!(app.scroll_x, 12);
    }

    #[test]
    fn dragging_near_the_edge_auto_scrolls() {
        let (_dir, mut app) = test_app();
        let now = Instant::now();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 5, 4), now);
        app.handle_event(mouse(MouseEventKind::Drag(MouseButton::Left), 119, 10), now);
        app.tick(now);
        assert!(app.scroll_x > 0);
        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), 119, 10), now);
        app.tick(now);
        assert!(!app.drag.scroller().is_running());
    }

    #[test]
    fn shutdown_flushes_pending_changes() {
        let (_dir, mut app) = test_app();
        key(&mut app, KeyCode::Char('d'));
        key(&mut app, KeyCode::Char('y'));
        app.shutdown().unwrap();
        let saved = app.storage.read_board().unwrap().unwrap();
        assert_eq!(saved.cards.len(), 2);
    }

    #[test]
    fn quit_on_q_and_ctrl_c() {
        let (_dir, mut app) = test_app();
        key(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
        let (_dir, mut app) = test_app();
        app.handle_key(make_key_mod(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }
}
