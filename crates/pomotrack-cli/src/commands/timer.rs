use clap::Subcommand;
use serde::{Deserialize, Serialize};

use pomotrack_core::orchestrator::CompletionNotifier;
use pomotrack_core::storage::{self, Config, SessionStore};
use pomotrack_core::{ClockEngine, Orchestrator, Session, Tag};

const TIMER_STATE_FILE: &str = "timer.json";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a new tagged session (replaces any active one)
    Start {
        /// Session tag: work, learn or rest
        #[arg(long, default_value = "work")]
        tag: String,
    },
    /// Pause the running session
    Pause,
    /// Resume the paused session
    Resume,
    /// Cancel the current session and return to idle
    Reset,
    /// Complete the current session early
    Complete,
    /// Print current timer state as JSON (drives the countdown)
    Status,
}

/// Engine state carried between CLI invocations.
#[derive(Serialize, Deserialize)]
struct PersistedTimer {
    engine: ClockEngine,
    #[serde(default)]
    current_session_id: Option<String>,
}

fn load_persisted(duration_secs: u32) -> PersistedTimer {
    let fresh = || PersistedTimer {
        engine: ClockEngine::new(duration_secs),
        current_session_id: None,
    };
    let path = match storage::data_dir() {
        Ok(dir) => dir.join(TIMER_STATE_FILE),
        Err(_) => return fresh(),
    };
    let mut state = std::fs::read_to_string(path)
        .ok()
        .and_then(|json| serde_json::from_str::<PersistedTimer>(&json).ok())
        .unwrap_or_else(fresh);
    // An idle engine carries no countdown worth keeping; re-arm it with the
    // configured duration so config.toml edits take effect on the next start.
    if !state.engine.is_active() {
        state.engine = ClockEngine::new(duration_secs);
    }
    state
}

fn save_persisted(orchestrator: &Orchestrator) -> Result<(), Box<dyn std::error::Error>> {
    let state = PersistedTimer {
        engine: orchestrator.engine().clone(),
        current_session_id: orchestrator.current_session_id().map(String::from),
    };
    let path = storage::data_dir()?.join(TIMER_STATE_FILE);
    std::fs::write(path, serde_json::to_string(&state)?)?;
    Ok(())
}

/// Rings the terminal bell when a session completes.
struct BellNotifier;

impl CompletionNotifier for BellNotifier {
    fn notify(&self, session: &Session) {
        eprintln!("\x07session complete: {} ({}s)", session.tag, session.duration);
    }
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = SessionStore::open()?.with_debounce_ms(config.storage.debounce_ms);
    let persisted = load_persisted(config.timer.duration_secs);

    let mut orchestrator =
        Orchestrator::restore(store, persisted.engine, persisted.current_session_id);
    if config.notifications.enabled {
        orchestrator = orchestrator.with_notifier(Box::new(BellNotifier));
    }

    match action {
        TimerAction::Start { tag } => {
            let tag: Tag = tag.parse()?;
            let session = orchestrator.start_timer(tag);
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        TimerAction::Pause => match orchestrator.pause_timer() {
            Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
            None => println!("{}", serde_json::to_string_pretty(&orchestrator.timer_state())?),
        },
        TimerAction::Resume => match orchestrator.resume_timer() {
            Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
            None => println!("{}", serde_json::to_string_pretty(&orchestrator.timer_state())?),
        },
        TimerAction::Reset => {
            let event = orchestrator.reset_timer();
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::Complete => match orchestrator.complete_timer() {
            Some(session) => println!("{}", serde_json::to_string_pretty(&session)?),
            None => println!("{{\"type\": \"no_current_session\"}}"),
        },
        TimerAction::Status => {
            let completed = orchestrator.tick();
            println!("{}", serde_json::to_string_pretty(&orchestrator.timer_state())?);
            if let Some(session) = completed {
                println!("{}", serde_json::to_string_pretty(&session)?);
            }
        }
    }

    save_persisted(&orchestrator)?;
    orchestrator.flush()?;
    Ok(())
}
