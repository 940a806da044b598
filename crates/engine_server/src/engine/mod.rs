//! UCI engine processes and their management.
//!
//! * [`EngineProcess`] bridges one engine subprocess to bounded queues.
//! * [`EngineFamily`] decides which options an engine is started with.
//! * [`EngineManager`] keeps the registry and the single active engine.

pub mod family;
pub mod manager;
pub mod personality;
pub mod process;

pub use family::{generic_init_commands, EngineFamily};
pub use manager::EngineManager;
pub use personality::PersonalityFileLoader;
pub use process::{position_command, EngineProcess, INPUT_QUEUE_CAPACITY, OUTPUT_QUEUE_CAPACITY, UNKNOWN_ENGINE_NAME};
