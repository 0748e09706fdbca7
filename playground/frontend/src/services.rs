//! Browser implementations of the storage and timer seams.

use std::time::Duration;

use scratchpad::StorageError;
use scratchpad::autosave::{Scheduler, TimerHandle};
use scratchpad::storage::KeyValueStore;
use zoon::*;

/// `window.localStorage`, values stored as raw strings.
pub struct LocalStore;

impl LocalStore {
    fn storage(key: &str) -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .and_then(|window| window.local_storage().ok().flatten())
            .ok_or_else(|| StorageError::Backend {
                key: key.to_string(),
                message: "localStorage is not available".to_string(),
            })
    }

    fn backend_error(key: &str, error: wasm_bindgen::JsValue) -> StorageError {
        StorageError::Backend {
            key: key.to_string(),
            message: format!("{error:?}"),
        }
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage(key)?
            .get_item(key)
            .map_err(|error| Self::backend_error(key, error))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage(key)?
            .set_item(key, value)
            .map_err(|error| Self::backend_error(key, error))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        Self::storage(key)?
            .remove_item(key)
            .map_err(|error| Self::backend_error(key, error))
    }
}

/// Repeating ticks on zoon's `Timer`. The task, and with it the interval,
/// ends when the handle is dropped.
pub struct TaskScheduler;

impl Scheduler for TaskScheduler {
    fn every(&self, interval: Duration, mut tick: Box<dyn FnMut()>) -> TimerHandle {
        let interval_ms = u32::try_from(interval.as_millis()).unwrap_or(u32::MAX).max(1);
        let task = Task::start_droppable(async move {
            loop {
                Timer::sleep(interval_ms).await;
                tick();
            }
        });
        TimerHandle::new(move || drop(task))
    }
}
