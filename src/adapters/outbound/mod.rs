/// Outbound adapters - Infrastructure implementations of outbound ports
pub mod console;
pub mod filesystem;
pub mod memory;
pub mod network;
mod system_clock;

pub use system_clock::SystemClock;
