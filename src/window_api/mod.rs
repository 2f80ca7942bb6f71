//! Queries the operating system for the currently foregrounded window.
//! [GenericWindowManager] is the main artifact of this module that abstracts
//! the operations.

#[cfg(feature = "win")]
pub mod win;

#[cfg(feature = "win")]
extern crate windows;

use std::sync::Arc;

use anyhow::Result;

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Clone)]
pub struct ActiveWindowData {
    /// Title of the focused window. For example 'Document 1' or 'Vibing in
    /// YouTube - Chrome'
    pub window_title: Arc<str>,
    /// Full path to the executable owning the window. For example
    /// C:\Program Files\Mozilla Firefox\firefox.exe
    pub process_name: Arc<str>,
}

/// Contract the platform backend must implement. Failures are expected and
/// non-fatal; the observer turns them into idle ticks.
#[cfg_attr(test, automock)]
pub trait WindowManager: Send {
    fn get_active_window_data(&mut self) -> Result<ActiveWindowData>;

    /// Retrieve amount of time user has been inactive in milliseconds
    fn get_idle_time(&mut self) -> Result<u32>;
}

/// Front over the platform backend so the daemon wiring stays feature-free.
pub struct GenericWindowManager {
    inner: Box<dyn WindowManager>,
}

impl GenericWindowManager {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsWindowManager;
                Ok(Self {
                    inner: Box::new(WindowsWindowManager::new()),
                })
            }
            else {
                // This runtime error is needed to allow the project to be compiled for during testing.
                unimplemented!("No window manager was specified")
            }
        }
    }
}

impl WindowManager for GenericWindowManager {
    fn get_active_window_data(&mut self) -> Result<ActiveWindowData> {
        self.inner.get_active_window_data()
    }

    fn get_idle_time(&mut self) -> Result<u32> {
        self.inner.get_idle_time()
    }
}
