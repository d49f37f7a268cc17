mod commands;

pub use commands::Cli;
pub use commands::ColumnCmd;
pub use commands::Commands;
pub use commands::Session;

use crate::error::Result;
use crate::logging::{self, LogTarget};
use crate::storage::Storage;
use tracing::level_filters::LevelFilter;

pub fn run(cli: Cli) -> Result<()> {
    let root = cli.root.clone().unwrap_or_else(Storage::default_root);
    let storage = Storage::new(root);
    let json_output = cli.json;

    match &cli.command {
        None | Some(Commands::Tui) => {
            let level = if cli.verbose {
                LevelFilter::DEBUG
            } else {
                LevelFilter::INFO
            };
            logging::init(LogTarget::File(&storage.log_path()), level);
        }
        Some(_) => logging::init(LogTarget::Stderr, logging::level(cli.verbose, cli.quiet)),
    }

    match cli.command {
        None | Some(Commands::Tui) => crate::tui::run_tui(storage),
        Some(Commands::List) => commands::list(&storage, json_output),
        Some(Commands::Add {
            title,
            to,
            tag,
            due,
            time,
            notes,
            color,
        }) => commands::add(
            &storage,
            &title,
            to.as_deref(),
            tag,
            due.as_deref(),
            time.as_deref(),
            notes.as_deref(),
            color.as_deref(),
            json_output,
        ),
        Some(Commands::Move { card, to, before }) => {
            commands::move_card(&storage, &card, &to, before.as_deref(), json_output)
        }
        Some(Commands::Delete { card }) => commands::delete(&storage, &card, json_output),
        Some(Commands::Column { command }) => commands::column(&storage, command, json_output),
        Some(Commands::Progress) => commands::progress(&storage, json_output),
        Some(Commands::Export { out }) => commands::export(&storage, &out, json_output),
        Some(Commands::Import { file }) => commands::import(&storage, &file, json_output),
        Some(Commands::Clear { yes }) => commands::clear(&storage, yes),
        Some(Commands::Version) => commands::version(),
    }
}
