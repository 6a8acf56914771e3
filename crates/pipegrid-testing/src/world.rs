//! TimelineWorld pattern for declarative controller tests.
//!
//! Provides a fluent interface for:
//! - Building a controller with a fixed clock
//! - Recording every store the controller emits
//! - Driving the editor with short calls

use pipegrid_engine::{PageSize, TimelineController, VisibleCell};
use pipegrid_types::{CellConfig, CellStore, CellValue, PipelineKind};
use std::cell::RefCell;
use std::rc::Rc;

use crate::fixtures::fixed_clock;

/// Controller plus the list of stores it emitted.
///
/// # Example
/// ```
/// use pipegrid_testing::TimelineWorld;
/// use pipegrid_types::{CellConfig, PipelineKind};
///
/// let mut world = TimelineWorld::new(PipelineKind::Culture, CellConfig::weeks(12));
/// world.select(3).commit("humidity", "65");
/// assert_eq!(world.emitted().len(), 1);
/// ```
pub struct TimelineWorld {
    controller: TimelineController,
    emitted: Rc<RefCell<Vec<CellStore>>>,
}

impl TimelineWorld {
    /// Empty store, fixed clock, default page size.
    pub fn new(kind: PipelineKind, config: CellConfig) -> Self {
        Self::with_store(kind, config, CellStore::new())
    }

    pub fn with_store(kind: PipelineKind, config: CellConfig, store: CellStore) -> Self {
        Self::from_controller(TimelineController::new(kind, config, store))
    }

    /// Wrap a pre-configured controller; its listener and clock are replaced.
    pub fn from_controller(controller: TimelineController) -> Self {
        let emitted: Rc<RefCell<Vec<CellStore>>> = Rc::default();
        let sink = Rc::clone(&emitted);
        let controller = controller
            .with_clock(fixed_clock)
            .on_change(move |store| sink.borrow_mut().push(store.clone()));
        Self {
            controller,
            emitted,
        }
    }

    pub fn readonly(mut self) -> Self {
        self.controller.set_readonly(true);
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.controller = self.controller.with_page_size(size);
        self
    }

    pub fn select(&mut self, index: usize) -> &mut Self {
        self.controller.select_cell(index);
        self
    }

    pub fn commit(&mut self, field: &str, value: impl Into<CellValue>) -> &mut Self {
        self.controller.commit_field(field, value);
        self
    }

    pub fn delete(&mut self, field: &str) -> &mut Self {
        self.controller.delete_field(field);
        self
    }

    pub fn controller(&self) -> &TimelineController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut TimelineController {
        &mut self.controller
    }

    pub fn cells(&self) -> Vec<VisibleCell> {
        self.controller.visible_cells()
    }

    pub fn store(&self) -> &CellStore {
        self.controller.store()
    }

    /// Every store emitted so far, oldest first.
    pub fn emitted(&self) -> Vec<CellStore> {
        self.emitted.borrow().clone()
    }
}
