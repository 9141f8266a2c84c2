/// Network commands for the kernel shell.
///
/// The shell's line editor and console live in the platform layer; it hands
/// each entered line to `dispatch` together with the stack and somewhere to
/// write output. Commands map straight onto `NetStack` operations.
mod commands;

pub use commands::dispatch;
