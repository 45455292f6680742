//! Bundled local host
//!
//! Concrete adapters that let the binary run without a chat platform:
//! - [`console`]: terminal chat surface and stdin command reader
//! - [`process`]: voice gateway that plays streams through a local player process

pub mod console;
pub mod process;

pub use console::{run_console, ConsoleChat};
pub use process::{LocalVoiceGateway, ProcessTransport};
