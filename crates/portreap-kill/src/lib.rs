#![deny(clippy::all)]

mod process;
mod sleeper;
mod terminate;

pub use process::ProcessController;
pub use process::ProcessStatus;
pub use process::Signal;
#[cfg(unix)]
pub use process::UnixProcessController;
pub use sleeper::MockSleeper;
pub use sleeper::RealSleeper;
pub use sleeper::Sleeper;
pub use terminate::terminate;
pub use terminate::TerminateError;
pub use terminate::Terminator;
pub use terminate::KILL_GRACE;
pub use terminate::TERM_GRACE;
