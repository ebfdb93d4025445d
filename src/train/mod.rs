pub mod epoch_stats;
pub mod loop_fn;
pub mod session;
pub mod train_config;

pub use epoch_stats::{EpochStats, Evaluation, SessionStats, TickReport};
pub use loop_fn::{evaluate, train_loop};
pub use session::TrainingSession;
pub use train_config::TrainConfig;
