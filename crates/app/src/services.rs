//! Application services: the driving use-cases of the synchronization core.

pub mod command_interpreter;
pub mod connection_manager;

pub use command_interpreter::CommandInterpreter;
pub use connection_manager::ConnectionManager;
