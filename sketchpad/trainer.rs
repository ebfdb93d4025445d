use std::thread;
use std::time::Duration;

use log::{error, info};

use crate::state::SharedState;

/// How long a paused trainer sleeps before checking the flag again.
const PAUSE_POLL: Duration = Duration::from_millis(50);

/// Spawns the background thread that drives one training tick every `tick`.
/// A zero duration trains flat out.
pub fn spawn(state: SharedState, tick: Duration) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        info!("trainer started, one tick every {:?}", tick);
        loop {
            if state.is_paused() {
                thread::sleep(PAUSE_POLL);
                continue;
            }

            let result = state.session().tick();
            if let Err(e) = result {
                error!("training halted: {}", e);
                state.halt();
                return;
            }

            if !tick.is_zero() {
                thread::sleep(tick);
            }
        }
    })
}
