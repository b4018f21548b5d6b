use clap::Subcommand;
use pomotrack_core::{SessionStore, SessionUpdate, Tag};

#[derive(Subcommand)]
pub enum SessionAction {
    /// List all sessions in the log
    List {
        /// Output as JSON instead of one line per session
        #[arg(long)]
        json: bool,
    },
    /// Delete a session by id (unknown id is a no-op)
    Delete {
        /// Session id
        id: String,
    },
    /// Change the tag of a session
    Retag {
        /// Session id
        id: String,
        /// New tag: work, learn or rest
        tag: String,
    },
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = SessionStore::open()?;

    match action {
        SessionAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(store.sessions())?);
            } else {
                for session in store.sessions() {
                    println!(
                        "{}  {}  {:>6}s  {:?}  {}",
                        session.id,
                        session.tag,
                        session.duration,
                        session.status,
                        session.start_time.to_rfc3339(),
                    );
                }
            }
        }
        SessionAction::Delete { id } => {
            if store.delete_session(&id) {
                println!("deleted {id}");
            } else {
                println!("no session with id {id}");
            }
        }
        SessionAction::Retag { id, tag } => {
            let tag: Tag = tag.parse()?;
            let update = SessionUpdate {
                tag: Some(tag),
                ..SessionUpdate::default()
            };
            if store.update_session(&id, &update) {
                println!("retagged {id} as {tag}");
            } else {
                println!("no session with id {id}");
            }
        }
    }

    store.flush()?;
    Ok(())
}
