use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sketch_nn::TrainingSession;

/// State shared by the trainer thread and every request handler.
///
/// The whole `TrainingSession` sits behind one mutex: the trainer holds it for
/// exactly one tick and a handler for exactly one query, so `train` and
/// `query` never overlap on the network.
pub struct SketchState {
    session: Mutex<TrainingSession>,
    paused: AtomicBool,
    /// Set when the trainer thread gives up (e.g. an unexpected shape error).
    halted: AtomicBool,
    /// Where `POST /save` writes the model.
    pub save_path: PathBuf,
}

impl SketchState {
    pub fn new(session: TrainingSession, save_path: PathBuf) -> Self {
        SketchState {
            session: Mutex::new(session),
            paused: AtomicBool::new(false),
            halted: AtomicBool::new(false),
            save_path,
        }
    }

    /// Locks the session, recovering the guard from a poisoned lock.
    pub fn session(&self) -> MutexGuard<'_, TrainingSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Relaxed)
    }

    pub fn halt(&self) {
        self.halted.store(true, Ordering::Relaxed);
    }
}

/// Handle passed to the trainer and every request handler.
pub type SharedState = Arc<SketchState>;

#[cfg(test)]
mod tests {
    use super::*;
    use sketch_nn::{NeuralNetwork, Sample, TrainConfig};

    fn state() -> SketchState {
        let nn = NeuralNetwork::with_seed(2, 3, 2, 0.3, 1).unwrap();
        let samples = vec![Sample::new(0, vec![255.0, 0.0]), Sample::new(1, vec![0.0, 255.0])];
        let session = TrainingSession::new(nn, samples.clone(), samples, &TrainConfig::default()).unwrap();
        SketchState::new(session, PathBuf::from("model.json"))
    }

    #[test]
    fn flags_start_cleared_and_toggle() {
        let s = state();
        assert!(!s.is_paused());
        assert!(!s.is_halted());
        s.set_paused(true);
        assert!(s.is_paused());
        s.set_paused(false);
        assert!(!s.is_paused());
        s.halt();
        assert!(s.is_halted());
    }

    #[test]
    fn poisoned_session_lock_is_recovered() {
        let s = Arc::new(state());
        let clone = s.clone();
        let _ = std::thread::spawn(move || {
            let _guard = clone.session();
            panic!("poison the lock");
        })
        .join();

        assert!(s.session.is_poisoned());
        assert_eq!(s.session().stats().ticks, 0);
        s.session().tick().unwrap();
        assert_eq!(s.session().stats().ticks, 1);
    }
}
