//! One runtime load per session, shared by every caller.

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

use futures_util::future::{FutureExt, LocalBoxFuture, Shared};
use log::{error, info};

use crate::error::LoadError;
use crate::exec::Runtime;

pub type LoadResult = Result<Rc<dyn Runtime>, LoadError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Loading,
    Ready,
    Failed,
}

#[derive(Clone)]
pub struct RuntimeLoader {
    load: Shared<LocalBoxFuture<'static, LoadResult>>,
    readiness: Rc<Cell<Readiness>>,
}

impl RuntimeLoader {
    /// Wrap the single load attempt for this session.
    ///
    /// Nothing runs until the first [`ready`](Self::ready) is polled; after
    /// that every caller observes the same result. There is no retry.
    pub fn initialize<F>(load: F) -> Self
    where
        F: Future<Output = LoadResult> + 'static,
    {
        let readiness = Rc::new(Cell::new(Readiness::Loading));
        let load = {
            let readiness = readiness.clone();
            async move {
                let result = load.await;
                match &result {
                    Ok(_) => {
                        info!("Runtime ready");
                        readiness.set(Readiness::Ready);
                    }
                    Err(load_error) => {
                        error!("Failed to load runtime: {load_error}");
                        readiness.set(Readiness::Failed);
                    }
                }
                result
            }
        };
        Self {
            load: load.boxed_local().shared(),
            readiness,
        }
    }

    pub async fn ready(&self) -> LoadResult {
        self.load.clone().await
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness.get()
    }
}
