pub mod scheduler;
pub mod worker;

pub use scheduler::{run_poller, supervise, Poller};
pub use worker::{poll_once, poll_signal, PollOutcome, PollReport};
