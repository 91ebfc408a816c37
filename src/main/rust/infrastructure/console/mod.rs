mod command;
mod logging_observer;
mod shell;

pub use command::{BridgeRequest, Command, HELP};
pub use logging_observer::LoggingObserver;
pub use shell::run_console;
