use std::path::PathBuf;

use clap::Subcommand;
use pomotrack_core::{storage, SessionStore};

#[derive(Subcommand)]
pub enum DataAction {
    /// Print the persisted record as JSON
    Export,
    /// Replace the persisted record from a JSON file
    Import {
        /// Path to the exported JSON file
        file: PathBuf,
    },
    /// Wipe the session log
    Clear,
    /// Print the data directory path
    Path,
}

pub fn run(action: DataAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        DataAction::Export => {
            let store = SessionStore::open()?;
            println!("{}", store.export_json()?);
        }
        DataAction::Import { file } => {
            let payload = std::fs::read_to_string(&file)?;
            let mut store = SessionStore::open()?;
            store.import_json(&payload)?;
            println!("imported {} sessions", store.sessions().len());
        }
        DataAction::Clear => {
            let mut store = SessionStore::open()?;
            store.clear();
            store.flush()?;
            println!("session log cleared");
        }
        DataAction::Path => {
            println!("{}", storage::data_dir()?.display());
        }
    }
    Ok(())
}
