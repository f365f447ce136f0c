/*!
# Galaxy 3D Pass System

Hierarchical render pass management for the Galaxy 3D engine.

Passes form a tree rooted at a single `Parent` pass. Structural changes are
queued and applied once per frame by `PassSystem::process_queued_changes`,
which removes, builds, initializes and validates passes in a fixed order.

## Architecture

- **PassSystem**: Owns the pass arena and the per-phase queues
- **Pass**: Node of the hierarchy with its lifecycle state and bindings
- **PassTemplate / PassRequest**: Data-driven pass instantiation
- **PassBehavior**: Per-pass hooks for build, initialize and orphan events
- **PassBackend**: Receives resolved bindings when a pass initializes
- **SubresourceRangeMap**: Interval map used to track attachment writers
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod pass_system;
pub mod utils;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Pass system entry point
    pub use crate::pass_system::PassSystem;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Pass sub-module with all pass system types
    pub mod pass {
        pub use crate::pass_system::*;
    }

    // Utility data structures
    pub mod utils {
        pub use crate::utils::*;
    }
}
