/// Galaxy3D Engine - Singleton manager for the pass system and logging
///
/// This module provides global access to one `PassSystem` instance and to
/// the engine logger. It uses thread-safe static storage with RwLock for safe
/// concurrent access.

use std::sync::{OnceLock, RwLock, Arc, Mutex};
use std::time::SystemTime;
use crate::error::{Result, Error};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::pass_system::{PassBackend, PassSystem, PassSystemConfig};

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Internal state structure holding all engine singletons
struct EngineState {
    /// Pass system singleton (wrapped in Mutex for thread-safe mutable access)
    pass_system: RwLock<Option<Arc<Mutex<PassSystem>>>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            pass_system: RwLock::new(None),
        }
    }
}

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())))
}

// ===== PUBLIC API =====

/// Main engine singleton manager
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_pass_system::galaxy3d::Engine;
/// use galaxy_3d_pass_system::galaxy3d::pass::{NullBackend, PassSystemConfig};
///
/// Engine::initialize()?;
/// Engine::create_pass_system(PassSystemConfig::default(), NullBackend)?;
///
/// let passes = Engine::pass_system()?;
/// passes.lock().unwrap().process_queued_changes();
///
/// Engine::shutdown();
/// # Ok::<(), galaxy_3d_pass_system::galaxy3d::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Helper to log errors before returning them (internal use)
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!("galaxy3d::Engine", "Initialization failed: {}", msg);
            }
            Error::BackendError(msg) => {
                crate::engine_error!("galaxy3d::Engine", "Backend error: {}", msg);
            }
            _ => {
                crate::engine_error!("galaxy3d::Engine", "Engine error: {}", error);
            }
        }
        error
    }

    fn state() -> Result<&'static EngineState> {
        ENGINE_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("Engine not initialized. Call Engine::initialize() first.".to_string())
            ))
    }

    /// Initialize the engine
    ///
    /// This must be called once at application startup before creating any subsystems.
    /// Calling it again is harmless.
    pub fn initialize() -> Result<()> {
        ENGINE_STATE.get_or_init(EngineState::new);
        Ok(())
    }

    /// Destroy all singletons
    ///
    /// The engine stays initialized; a new pass system can be created afterwards.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut pass_system) = state.pass_system.write() {
                *pass_system = None;
            }
        }
    }

    // ===== PASS SYSTEM API =====

    /// Create and register the pass system singleton
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine is not initialized
    /// - A pass system already exists
    /// - The pass system lock is poisoned
    pub fn create_pass_system<B: PassBackend + 'static>(config: PassSystemConfig, backend: B) -> Result<()> {
        let state = Self::state()?;

        let mut lock = state.pass_system.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("PassSystem lock poisoned".to_string())
            ))?;

        if lock.is_some() {
            return Err(Self::log_and_return_error(
                Error::InitializationFailed("PassSystem already exists. Call Engine::destroy_pass_system() first.".to_string())
            ));
        }

        *lock = Some(Arc::new(Mutex::new(PassSystem::new(config, backend))));

        crate::engine_info!("galaxy3d::Engine", "PassSystem singleton created successfully");

        Ok(())
    }

    /// Get the pass system singleton
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine is not initialized
    /// - The pass system has not been created
    pub fn pass_system() -> Result<Arc<Mutex<PassSystem>>> {
        let state = Self::state()?;

        let lock = state.pass_system.read()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("PassSystem lock poisoned".to_string())
            ))?;

        lock.clone()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("PassSystem not created. Call Engine::create_pass_system() first.".to_string())
            ))
    }

    /// Destroy the pass system singleton
    ///
    /// Existing `Arc` handles stay valid until dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is not initialized
    pub fn destroy_pass_system() -> Result<()> {
        let state = Self::state()?;

        let mut lock = state.pass_system.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("PassSystem lock poisoned".to_string())
            ))?;

        *lock = None;

        crate::engine_info!("galaxy3d::Engine", "PassSystem singleton destroyed");

        Ok(())
    }

    /// Reset all singletons for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        Self::shutdown();
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// Replace the default logger with a custom implementation (file logger, test capture, etc.)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use galaxy_3d_pass_system::galaxy3d::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = self::logger().write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(DefaultLogger::new());
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// Used by engine_error! macro to include source location.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
