//! One review's set of pipeline timelines.
//!
//! Each configured pipeline kind gets its own [`TimelineController`] with its
//! own store and edit session. Nothing is shared between them except the
//! settings they were built from.

use crate::Result;
use crate::config::{PipelineSettings, Settings};
use pipegrid_engine::{Clock, IntensityClassifier, TimelineController};
use pipegrid_types::{CellStore, GlyphTable, PipelineKind};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct ReviewBoard {
    timelines: BTreeMap<PipelineKind, TimelineController>,
}

impl ReviewBoard {
    /// Build one empty timeline per configured pipeline section.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let glyphs = GlyphTable::default().merged(settings.glyphs.clone());
        let classifier = IntensityClassifier::new(glyphs).with_icon_limit(settings.icon_limit);

        let mut timelines = BTreeMap::new();
        for (kind, pipeline) in settings.configured()? {
            let controller = build_controller(kind, pipeline, settings, &classifier)?;
            tracing::debug!(pipeline = %kind, summary = %controller.summary(), "timeline ready");
            timelines.insert(kind, controller);
        }

        Ok(Self { timelines })
    }

    /// Report every emitted store together with the pipeline it belongs to.
    pub fn on_change(self, listener: impl FnMut(PipelineKind, &CellStore) + 'static) -> Self {
        let shared = Rc::new(RefCell::new(listener));
        self.map_controllers(|kind, controller| {
            let sink = Rc::clone(&shared);
            controller.on_change(move |store| (*sink.borrow_mut())(kind, store))
        })
    }

    pub fn with_clock(self, clock: Clock) -> Self {
        self.map_controllers(|_, controller| controller.with_clock(clock))
    }

    fn map_controllers(
        self,
        f: impl Fn(PipelineKind, TimelineController) -> TimelineController,
    ) -> Self {
        let timelines = self
            .timelines
            .into_iter()
            .map(|(kind, controller)| (kind, f(kind, controller)))
            .collect();
        Self { timelines }
    }

    pub fn kinds(&self) -> impl Iterator<Item = PipelineKind> + '_ {
        self.timelines.keys().copied()
    }

    pub fn controller(&self, kind: PipelineKind) -> Option<&TimelineController> {
        self.timelines.get(&kind)
    }

    pub fn controller_mut(&mut self, kind: PipelineKind) -> Option<&mut TimelineController> {
        self.timelines.get_mut(&kind)
    }

    /// Load a saved store into `kind`'s timeline. False when the kind is not configured.
    pub fn hydrate(&mut self, kind: PipelineKind, store: CellStore) -> bool {
        match self.timelines.get_mut(&kind) {
            Some(controller) => {
                tracing::debug!(pipeline = %kind, cells = store.len(), "store hydrated");
                controller.replace_store(store);
                true
            }
            None => {
                tracing::warn!(pipeline = %kind, "hydrate ignored: pipeline not configured");
                false
            }
        }
    }

    /// Same as [`hydrate`](Self::hydrate), from a persisted JSON draft.
    pub fn hydrate_json(&mut self, kind: PipelineKind, json: &str) -> Result<bool> {
        let store = CellStore::from_json_str(json)?;
        Ok(self.hydrate(kind, store))
    }

    /// Current store of every timeline, ready to persist.
    pub fn snapshot(&self) -> BTreeMap<PipelineKind, CellStore> {
        self.timelines
            .iter()
            .map(|(kind, controller)| (*kind, controller.store().clone()))
            .collect()
    }
}

fn build_controller(
    kind: PipelineKind,
    pipeline: &PipelineSettings,
    settings: &Settings,
    classifier: &IntensityClassifier,
) -> Result<TimelineController> {
    let mut controller = TimelineController::new(kind, pipeline.cell_config()?, CellStore::new())
        .with_classifier(classifier.clone())
        .with_page_size(settings.page_size)
        .readonly(settings.readonly);

    if let Some(max_cells) = pipeline.max_cells {
        controller = controller.with_growth_guard(move |total| total < max_cells);
    }

    Ok(controller)
}
