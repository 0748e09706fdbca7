//! Periodic write of the editor text to persistence.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use log::{debug, warn};

use crate::storage::Persistence;
use crate::surface::{AutosaveIndicator, Surface};

/// Source of repeating timers.
pub trait Scheduler {
    fn every(&self, interval: Duration, tick: Box<dyn FnMut()>) -> TimerHandle;
}

/// A live interval. Dropping the handle cancels it.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

pub struct AutosaveTimer {
    scheduler: Rc<dyn Scheduler>,
    interval: Duration,
    persistence: Persistence,
    surface: Rc<dyn Surface>,
    // At most one live interval.
    timer: RefCell<Option<TimerHandle>>,
}

impl AutosaveTimer {
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        interval: Duration,
        persistence: Persistence,
        surface: Rc<dyn Surface>,
    ) -> Self {
        Self {
            scheduler,
            interval,
            persistence,
            surface,
            timer: RefCell::new(None),
        }
    }

    pub fn is_active(&self) -> bool {
        self.timer.borrow().is_some()
    }

    /// Returns `false` when autosave was already running.
    pub fn start(&self) -> bool {
        if self.is_active() {
            return false;
        }
        let persistence = self.persistence.clone();
        let surface = self.surface.clone();
        let handle = self.scheduler.every(
            self.interval,
            Box::new(move || {
                let source = surface.editor_text();
                match persistence.save_source(&source) {
                    Ok(()) => {
                        debug!("Autosaved {} bytes", source.len());
                        surface.show_autosave(AutosaveIndicator::Saved);
                    }
                    Err(error) => warn!("Autosave failed: {error}"),
                }
            }),
        );
        *self.timer.borrow_mut() = Some(handle);
        self.surface.show_autosave(AutosaveIndicator::Active);
        true
    }

    /// Returns `false` when autosave was not running.
    pub fn stop(&self) -> bool {
        let Some(handle) = self.timer.borrow_mut().take() else {
            return false;
        };
        drop(handle);
        self.surface.show_autosave(AutosaveIndicator::Inactive);
        true
    }
}
