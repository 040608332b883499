//! Package lifecycle events and their listeners.

use log::info;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::package::PackageRef;
use crate::Result;

/// Hook points raised around install and uninstall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    PreInstall,
    PostInstall,
    PreUninstall,
    PostUninstall,
}

impl EventType {
    pub fn name(&self) -> &'static str {
        match self {
            EventType::PreInstall => "pre-install",
            EventType::PostInstall => "post-install",
            EventType::PreUninstall => "pre-uninstall",
            EventType::PostUninstall => "post-uninstall",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lifecycle event for one package.
#[derive(Debug, Clone, Copy)]
pub struct PackageEvent<'a> {
    pub event_type: EventType,
    pub package: &'a PackageRef,
    /// Where the package is (or will be) unpacked in the local repository
    pub install_path: &'a Path,
}

impl<'a> PackageEvent<'a> {
    pub fn new(event_type: EventType, package: &'a PackageRef, install_path: &'a Path) -> Self {
        Self {
            event_type,
            package,
            install_path,
        }
    }
}

/// Reacts to package lifecycle events.
pub trait EventListener: Send + Sync {
    /// Handle an event. An error aborts the operation that raised it.
    fn handle(&self, event: &PackageEvent<'_>) -> Result<()>;

    /// Listeners with a higher priority run first.
    fn priority(&self) -> i32 {
        0
    }
}

/// Runs listeners synchronously, highest priority first.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Listeners of equal priority run in registration order.
    pub fn add_listener(&mut self, listener: Arc<dyn EventListener>) {
        let position = self
            .listeners
            .iter()
            .position(|l| l.priority() < listener.priority())
            .unwrap_or(self.listeners.len());
        self.listeners.insert(position, listener);
    }

    pub fn with_listener(mut self, listener: Arc<dyn EventListener>) -> Self {
        self.add_listener(listener);
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Dispatch an event, stopping at the first listener error.
    pub fn dispatch(&self, event: &PackageEvent<'_>) -> Result<()> {
        for listener in &self.listeners {
            listener.handle(event)?;
        }
        Ok(())
    }
}

/// Logs every lifecycle event.
pub struct InstallLogger;

impl EventListener for InstallLogger {
    fn handle(&self, event: &PackageEvent<'_>) -> Result<()> {
        let action = match event.event_type {
            EventType::PreInstall => "Installing",
            EventType::PostInstall => "Installed",
            EventType::PreUninstall => "Uninstalling",
            EventType::PostUninstall => "Uninstalled",
        };
        info!("{}: {}", action, event.package);
        Ok(())
    }

    fn priority(&self) -> i32 {
        100
    }
}
