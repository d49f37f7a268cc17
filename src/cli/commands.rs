use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use chrono::Local;
use clap::{Parser, Subcommand};

use crate::error::{LanesError, Result};
use crate::model::{Board, CardDraft, Progress, parse_color, parse_due, parse_time};
use crate::storage::Storage;
use crate::store::{BoardStore, Persister};

#[derive(Parser, Debug)]
#[command(name = "lanes", version, about = "A kanban board for the terminal.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug detail
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Data directory (defaults to $LANES_HOME or the platform data dir)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive board (default)
    Tui,

    /// List all cards, column by column
    List,

    /// Add a new card
    Add {
        /// Card title
        title: String,
        /// Target column id or title (defaults to the first column)
        #[arg(long)]
        to: Option<String>,
        /// Tags to attach
        #[arg(long)]
        tag: Vec<String>,
        /// Due date, YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
        /// Due time, HH:MM
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Colour, #rrggbb
        #[arg(long)]
        color: Option<String>,
    },

    /// Move a card to a column, optionally before another card
    Move {
        /// Card id or number
        card: String,
        /// Target column id or title
        #[arg(long)]
        to: String,
        /// Card id or number to insert before
        #[arg(long)]
        before: Option<String>,
    },

    /// Delete a card permanently
    Delete {
        /// Card id or number
        card: String,
    },

    /// Column management
    Column {
        #[command(subcommand)]
        command: ColumnCmd,
    },

    /// Show completion progress
    Progress,

    /// Write the board to lanes-YYYY-MM-DD.json
    Export {
        /// Directory to write into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Replace the board with an exported file
    Import {
        file: PathBuf,
    },

    /// Erase the board and start over from the sample board
    Clear {
        /// Confirm erasing the board
        #[arg(long)]
        yes: bool,
    },

    /// Show version
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ColumnCmd {
    /// Add an empty column at the end
    Add {
        #[arg(default_value = "New Category")]
        title: String,
    },
    /// Rename a column
    Rename {
        /// Column id or title
        column: String,
        title: String,
    },
    /// Delete a column and every card in it
    Delete {
        /// Column id or title
        column: String,
        /// Confirm deleting the column's cards
        #[arg(long)]
        yes: bool,
    },
    /// Move a column to a 1-based position
    Move {
        /// Column id or title
        column: String,
        #[arg(long)]
        position: usize,
    },
}

/// A loaded board whose changes are written back when the command ends.
pub struct Session {
    pub store: BoardStore,
    persister: Rc<RefCell<Persister>>,
}

impl Session {
    pub fn open(storage: &Storage) -> Self {
        let mut store = BoardStore::new(storage.load_board());
        let persister = Rc::new(RefCell::new(Persister::new(storage.clone(), Duration::ZERO)));
        store.subscribe(persister.clone());
        Self { store, persister }
    }

    pub fn board(&self) -> &Board {
        self.store.board()
    }

    fn column_id(&self, id_or_title: &str) -> Result<String> {
        self.board()
            .resolve_column(id_or_title)
            .map(|c| c.id.clone())
            .ok_or_else(|| LanesError::ColumnNotFound(id_or_title.into()))
    }

    fn card_id(&self, id_or_num: &str) -> Result<String> {
        self.board()
            .resolve_card(id_or_num)
            .map(|c| c.id.clone())
            .ok_or_else(|| LanesError::CardNotFound(id_or_num.into()))
    }

    pub fn finish(self) -> Result<()> {
        self.persister.borrow_mut().flush()
    }
}

// --- Command implementations ---

pub fn list(storage: &Storage, json_output: bool) -> Result<()> {
    let board = storage.load_board();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&board)?);
        return Ok(());
    }

    let mut number = 0;
    for col in &board.columns {
        let cards = board.column_cards(&col.id);
        println!("── {} ({}) ──", col.title.to_uppercase(), cards.len());
        for card in cards {
            number += 1;
            let due = card.due_label().map(|d| format!(" due {d}")).unwrap_or_default();
            let tags = if card.tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", card.tags.join(", "))
            };
            println!("  {number}. {}{tags}{due}", card.title);
        }
        println!();
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn add(
    storage: &Storage,
    title: &str,
    to: Option<&str>,
    tags: Vec<String>,
    due: Option<&str>,
    time: Option<&str>,
    notes: Option<&str>,
    color: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let mut session = Session::open(storage);
    let column_id = match to {
        Some(col) => session.column_id(col)?,
        None => String::new(),
    };

    let mut draft = CardDraft::new(title, column_id);
    draft.tags = tags
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    draft.due = due.map(parse_due).transpose()?.flatten();
    draft.due_time = time.map(parse_time).transpose()?.flatten();
    draft.notes = notes.unwrap_or_default().into();
    draft.color = parse_color(color.unwrap_or_default())?;

    let id = session.store.add_card(draft, Local::now().date_naive())?;
    let board = session.board();
    let card = board.find_card(&id).ok_or_else(|| LanesError::CardNotFound(id.clone()))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(card)?);
    } else {
        let column = board.column(&card.column_id).map(|c| c.title.as_str()).unwrap_or("");
        println!("Added: {} → {}", card.title, column);
    }
    session.finish()
}

pub fn move_card(
    storage: &Storage,
    card: &str,
    to: &str,
    before: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let mut session = Session::open(storage);
    let card_id = session.card_id(card)?;
    let column_id = session.column_id(to)?;
    let before = before.map(|b| session.card_id(b)).transpose()?;

    session.store.move_card(&card_id, &column_id, before.as_deref());

    let board = session.board();
    let card = board.find_card(&card_id).ok_or_else(|| LanesError::CardNotFound(card_id.clone()))?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(card)?);
    } else {
        let column = board.column(&column_id).map(|c| c.title.as_str()).unwrap_or("");
        println!("Moved: {} → {}", card.title, column);
    }
    session.finish()
}

pub fn delete(storage: &Storage, card: &str, json_output: bool) -> Result<()> {
    let mut session = Session::open(storage);
    let card_id = session.card_id(card)?;
    let title = session
        .board()
        .find_card(&card_id)
        .map(|c| c.title.clone())
        .unwrap_or_default();

    session.store.delete_card(&card_id);

    if json_output {
        println!("{}", serde_json::json!({"deleted": card_id, "title": title}));
    } else {
        println!("Deleted: {title}");
    }
    session.finish()
}

pub fn column(storage: &Storage, cmd: ColumnCmd, json_output: bool) -> Result<()> {
    let mut session = Session::open(storage);
    match cmd {
        ColumnCmd::Add { title } => {
            let id = session.store.add_column(&title)?;
            if json_output {
                println!("{}", serde_json::json!({"id": id, "title": title.trim()}));
            } else {
                println!("Added column: {}", title.trim());
            }
        }
        ColumnCmd::Rename { column, title } => {
            let id = session.column_id(&column)?;
            let old = session.board().column(&id).map(|c| c.title.clone()).unwrap_or_default();
            session.store.rename_column(&id, &title);
            let new = session.board().column(&id).map(|c| c.title.clone()).unwrap_or_default();
            if json_output {
                println!("{}", serde_json::json!({"id": id, "title": new}));
            } else {
                println!("Renamed: {old} → {new}");
            }
        }
        ColumnCmd::Delete { column, yes } => {
            let id = session.column_id(&column)?;
            if !yes {
                return Err(LanesError::Other(format!(
                    "This will delete \"{column}\" and all its cards. Re-run with --yes to continue."
                )));
            }
            let title = session.board().column(&id).map(|c| c.title.clone()).unwrap_or_default();
            let cards = session.board().list(&id).len();
            session.store.delete_column(&id);
            if json_output {
                println!("{}", serde_json::json!({"deleted": id, "title": title, "cards": cards}));
            } else {
                println!("Deleted column: {title} ({cards} cards)");
            }
        }
        ColumnCmd::Move { column, position } => {
            let id = session.column_id(&column)?;
            let mut order: Vec<String> = session
                .board()
                .columns
                .iter()
                .map(|c| c.id.clone())
                .filter(|c| *c != id)
                .collect();
            let at = position.saturating_sub(1).min(order.len());
            order.insert(at, id.clone());
            session.store.move_column(&order);
            let title = session.board().column(&id).map(|c| c.title.clone()).unwrap_or_default();
            if json_output {
                println!("{}", serde_json::json!({"id": id, "position": at + 1}));
            } else {
                println!("Moved column: {title} to position {}", at + 1);
            }
        }
    }
    session.finish()
}

pub fn progress(storage: &Storage, json_output: bool) -> Result<()> {
    let board = storage.load_board();
    let p = Progress::of(&board);
    if json_output {
        println!(
            "{}",
            serde_json::json!({"completed": p.completed, "total": p.total, "percent": p.percent()})
        );
    } else {
        println!("{} ({}%)", p.label(), p.percent());
    }
    Ok(())
}

pub fn export(storage: &Storage, out: &Path, json_output: bool) -> Result<()> {
    let board = storage.load_board();
    let path = Storage::export_board(&board, out, Local::now().date_naive())?;
    if json_output {
        println!("{}", serde_json::json!({"exported": path.display().to_string()}));
    } else {
        println!("Exported to {}", path.display());
    }
    Ok(())
}

pub fn import(storage: &Storage, file: &Path, json_output: bool) -> Result<()> {
    let board = Storage::import_board(file)?;
    let mut session = Session::open(storage);
    session.store.replace(board);

    let board = session.board();
    if json_output {
        println!(
            "{}",
            serde_json::json!({"columns": board.columns.len(), "cards": board.cards.len()})
        );
    } else {
        println!(
            "Imported {} cards in {} columns",
            board.cards.len(),
            board.columns.len()
        );
    }
    session.finish()
}

pub fn clear(storage: &Storage, yes: bool) -> Result<()> {
    if !yes {
        return Err(LanesError::Other(
            "This will erase the board. Re-run with --yes to continue.".into(),
        ));
    }
    let mut session = Session::open(storage);
    session.store.reset();
    println!("Board cleared.");
    session.finish()
}

pub fn version() -> Result<()> {
    println!("lanes {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
