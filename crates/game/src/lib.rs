//! Entity I/O Game Classes
//!
//! Consumer entity classes built on `srcio_core`: the logic entities a
//! level designer wires maps with, plus the template spawner. Registering
//! them is one call:
//!
//! ```
//! let mut world = srcio_core::World::new();
//! srcio_game::register_game_entities(&mut world.classes);
//! ```

pub mod logic_auto;
pub mod logic_relay;
pub mod math_counter;
pub mod point_template;

pub use logic_auto::LogicAuto;
pub use logic_relay::{LogicRelay, RelayFlags};
pub use math_counter::MathCounter;
pub use point_template::{PointTemplate, TemplateFlags, MAX_TEMPLATES};

use srcio_core::ClassRegistry;

/// Register every game entity class
pub fn register_game_entities(classes: &mut ClassRegistry) {
    logic_auto::register(classes);
    logic_relay::register(classes);
    math_counter::register(classes);
    point_template::register(classes);
}

/// Initialize tracing output for binaries and tests
///
/// Filtered by `RUST_LOG`; safe to call more than once.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
