use crate::intensity::IntensityClassifier;
use crate::pagination::{PageSize, PaginationWindow};
use crate::projection::{VisibleCell, project_cells};
use crate::session::{EditRejected, EditSession, QuickAddOption};
use chrono::{DateTime, Utc};
use pipegrid_types::{
    CellConfig, CellIndex, CellRecord, CellStore, CellValue, FieldCatalog, PipelineKind,
    field_label, is_reserved_key,
};
use std::fmt;
use std::ops::RangeInclusive;

/// Receives every new store right after a committed mutation.
pub type ChangeListener = Box<dyn FnMut(&CellStore)>;

/// Decides, from the current cell count, whether the timeline may grow.
pub type GrowthGuard = Box<dyn Fn(usize) -> bool>;

/// Source of write timestamps.
pub type Clock = fn() -> DateTime<Utc>;

/// Row of the "current data" list of the open cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentEntry {
    pub field: String,
    pub label: String,
    pub preview: String,
}

/// Composition root of one pipeline timeline.
///
/// Wires the cell configuration, the caller's store, the intensity
/// classifier, pagination and the edit session together. Reads are pure
/// projections. Every committed mutation builds a new [`CellStore`], hands it
/// to the change listener and returns it; the previous store value is never
/// modified.
///
/// In read-only mode every mutating call is a silent no-op while
/// [`visible_cells`](Self::visible_cells) keeps working, which is how the
/// preview path reuses the same projection.
pub struct TimelineController {
    kind: PipelineKind,
    config: CellConfig,
    store: CellStore,
    catalog: FieldCatalog,
    classifier: IntensityClassifier,
    window: PaginationWindow,
    page: usize,
    session: EditSession,
    readonly: bool,
    growth_guard: Option<GrowthGuard>,
    listener: Option<ChangeListener>,
    clock: Clock,
    clipboard: Vec<CellRecord>,
}

impl fmt::Debug for TimelineController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineController")
            .field("kind", &self.kind)
            .field("config", &self.config)
            .field("cells", &self.store.len())
            .field("page", &self.page)
            .field("session", &self.session)
            .field("readonly", &self.readonly)
            .field("clipboard", &self.clipboard.len())
            .finish_non_exhaustive()
    }
}

impl TimelineController {
    /// Controller over `store` with the built-in template of `kind`.
    pub fn new(kind: PipelineKind, config: CellConfig, store: CellStore) -> Self {
        Self {
            kind,
            config,
            store,
            catalog: FieldCatalog::builtin(kind),
            classifier: IntensityClassifier::default(),
            window: PaginationWindow::default(),
            page: 0,
            session: EditSession::new(),
            readonly: false,
            growth_guard: None,
            listener: None,
            clock: Utc::now,
            clipboard: Vec::new(),
        }
    }

    pub fn with_catalog(mut self, catalog: FieldCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_classifier(mut self, classifier: IntensityClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.window = PaginationWindow::new(page_size);
        self.page = self.window.clamp_page(self.page, self.config.total_cells);
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.set_readonly(readonly);
        self
    }

    /// External cap on growth, re-checked on every [`add_cells`](Self::add_cells).
    pub fn with_growth_guard(mut self, guard: impl Fn(usize) -> bool + 'static) -> Self {
        self.growth_guard = Some(Box::new(guard));
        self
    }

    pub fn on_change(mut self, listener: impl FnMut(&CellStore) + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    pub fn config(&self) -> &CellConfig {
        &self.config
    }

    pub fn store(&self) -> &CellStore {
        &self.store
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Short description of the timeline, e.g. `12 semaines`.
    pub fn summary(&self) -> String {
        self.config.summary()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total_pages(&self) -> usize {
        self.window.total_pages(self.config.total_cells)
    }

    /// Display cells of the current page.
    pub fn visible_cells(&self) -> Vec<VisibleCell> {
        let total = self.config.total_cells;
        let page = self.window.clamp_page(self.page, total);
        let indices: Vec<CellIndex> = self.window.page_range(page, total).collect();
        project_cells(
            &self.config,
            &self.store,
            &self.classifier,
            &indices,
            self.session.selected_index(),
        )
    }

    /// Record of the open cell, if it has one.
    pub fn selected_record(&self) -> Option<&CellRecord> {
        self.session
            .selected_index()
            .and_then(|index| self.store.get(index))
    }

    /// Quick-add list of the expanded category for the open cell.
    pub fn quick_add_options(&self) -> Vec<QuickAddOption> {
        self.session
            .quick_add_options(&self.catalog, self.selected_record())
    }

    /// Existing fields of the open cell with value previews cut to `preview_chars`.
    pub fn current_entries(&self, preview_chars: usize) -> Vec<CurrentEntry> {
        self.selected_record()
            .map(|record| {
                record
                    .data_entries()
                    .map(|(field, value)| CurrentEntry {
                        field: field.to_string(),
                        label: field_label(field),
                        preview: value.preview(preview_chars),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether "clear cell" is offered for `index`.
    pub fn can_clear(&self, index: CellIndex) -> bool {
        !self.readonly && self.store.get(index).is_some_and(CellRecord::has_data)
    }

    /// Whether "add cells" is offered right now.
    pub fn can_add_cells(&self) -> bool {
        !self.readonly
            && self.config.total_cells < self.config.capacity()
            && self
                .growth_guard
                .as_ref()
                .is_none_or(|guard| guard(self.config.total_cells))
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Move to `page`, clamped to the last page. Returns the page shown.
    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.page = self.window.clamp_page(page, self.config.total_cells);
        self.page
    }

    /// No wrap-around: false on the last page.
    pub fn next_page(&mut self) -> bool {
        if self.page + 1 >= self.total_pages() {
            return false;
        }
        self.page += 1;
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if self.page == 0 {
            return false;
        }
        self.page -= 1;
        true
    }

    // ------------------------------------------------------------------
    // Editor session
    // ------------------------------------------------------------------

    /// Open the editor on `index`. Ignored when read-only or out of range.
    pub fn select_cell(&mut self, index: CellIndex) -> bool {
        if self.readonly {
            tracing::debug!(pipeline = %self.kind, index, "select ignored: read-only");
            return false;
        }
        if index >= self.config.total_cells {
            tracing::debug!(pipeline = %self.kind, index, "select ignored: out of range");
            return false;
        }
        self.session.open(index);
        true
    }

    pub fn toggle_category(&mut self, category: &str) -> bool {
        let result = self.session.toggle_category(&self.catalog, category);
        self.accept(result)
    }

    /// Pick a field from the expanded category's quick-add list.
    pub fn begin_field(&mut self, field: &str) -> bool {
        let record = self
            .session
            .selected_index()
            .and_then(|index| self.store.get(index));
        let result = self.session.begin_field(&self.catalog, record, field);
        self.accept(result)
    }

    /// Explicitly edit a field the cell already holds.
    pub fn edit_existing_field(&mut self, field: &str) -> bool {
        let record = self
            .session
            .selected_index()
            .and_then(|index| self.store.get(index));
        let result = self.session.edit_existing(record, field);
        self.accept(result)
    }

    pub fn set_draft(&mut self, value: impl Into<CellValue>) -> bool {
        let result = self.session.set_draft(value);
        self.accept(result)
    }

    pub fn cancel_field(&mut self) -> bool {
        let result = self.session.cancel();
        self.accept(result)
    }

    /// Close the editor without saving anything pending.
    pub fn close_editor(&mut self) {
        self.session.close();
    }

    fn accept(&self, result: Result<(), EditRejected>) -> bool {
        match result {
            Ok(()) => true,
            Err(reason) => {
                tracing::debug!(pipeline = %self.kind, %reason, "edit transition rejected");
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Write `name = value` into the open cell.
    ///
    /// Add-only like the quick-add list: a field that already holds a value
    /// is refused unless it is the field opened with
    /// [`edit_existing_field`](Self::edit_existing_field).
    pub fn commit_field(&mut self, name: &str, value: impl Into<CellValue>) -> Option<CellStore> {
        if self.readonly {
            tracing::debug!(pipeline = %self.kind, field = name, "commit ignored: read-only");
            return None;
        }
        let Some(index) = self.session.selected_index() else {
            tracing::debug!(pipeline = %self.kind, field = name, "commit ignored: no cell open");
            return None;
        };
        let editing = self.session.pending_field().is_some_and(|f| f.name == name);
        if !editing && self.store.get(index).is_some_and(|r| r.is_truthy(name)) {
            tracing::debug!(pipeline = %self.kind, index, field = name, "commit ignored: field already holds a value");
            return None;
        }
        self.session.settle();
        self.write_field(index, name, value.into())
    }

    /// Write the field entered through the session.
    pub fn commit_pending(&mut self) -> Option<CellStore> {
        if self.readonly {
            return None;
        }
        match self.session.take_commit() {
            Ok(commit) => self.write_field(commit.index, &commit.name, commit.value),
            Err(reason) => {
                tracing::debug!(pipeline = %self.kind, %reason, "commit ignored");
                None
            }
        }
    }

    fn write_field(&mut self, index: CellIndex, name: &str, value: CellValue) -> Option<CellStore> {
        if is_reserved_key(name) {
            tracing::debug!(pipeline = %self.kind, field = name, "commit ignored: reserved key");
            return None;
        }
        let record = self.store.get(index).cloned().unwrap_or_default();
        let updated = record.with_field(name, value, (self.clock)());
        let store = self.store.with_record(index, updated);
        tracing::debug!(pipeline = %self.kind, index, field = name, "field committed");
        Some(self.publish(store))
    }

    /// Remove `name` from the open cell. Immediate, no confirmation.
    pub fn delete_field(&mut self, name: &str) -> Option<CellStore> {
        if self.readonly {
            return None;
        }
        let index = self.session.selected_index()?;
        let record = self.store.get(index)?;
        if record.get(name).is_none() {
            tracing::debug!(pipeline = %self.kind, index, field = name, "delete ignored: no such field");
            return None;
        }
        let updated = record.without_field(name, (self.clock)());
        let store = self.store.with_record(index, updated);
        if self.session.pending_field().is_some_and(|f| f.name == name) {
            self.session.settle();
        }
        tracing::debug!(pipeline = %self.kind, index, field = name, "field deleted");
        Some(self.publish(store))
    }

    /// Drop every field of `index`. Only offered when the cell has data.
    pub fn clear_cell(&mut self, index: CellIndex) -> Option<CellStore> {
        if !self.can_clear(index) {
            tracing::debug!(pipeline = %self.kind, index, "clear ignored");
            return None;
        }
        let store = self.store.without_cell(index);
        tracing::debug!(pipeline = %self.kind, index, "cell cleared");
        Some(self.publish(store))
    }

    /// Grow the timeline by `n` cells, never past its capacity.
    ///
    /// Refused silently when read-only or when the growth guard says no.
    /// Returns the new cell count.
    pub fn add_cells(&mut self, n: usize) -> Option<usize> {
        if n == 0 || !self.can_add_cells() {
            tracing::debug!(pipeline = %self.kind, n, "add cells refused");
            return None;
        }
        let total = self
            .config
            .total_cells
            .saturating_add(n)
            .min(self.config.capacity());
        self.config.total_cells = total;
        tracing::debug!(pipeline = %self.kind, total, "cells added");
        Some(total)
    }

    // ------------------------------------------------------------------
    // Multi-cell edits
    // ------------------------------------------------------------------

    /// Keep the records of `indices` for a later paste; absent cells copy as empty.
    /// Copying never touches the store, so it also works read-only.
    pub fn copy_cells(&mut self, indices: &[CellIndex]) -> bool {
        if indices.is_empty() {
            return false;
        }
        self.clipboard = indices
            .iter()
            .map(|index| self.store.get(*index).cloned().unwrap_or_default())
            .collect();
        tracing::debug!(pipeline = %self.kind, cells = indices.len(), "cells copied");
        true
    }

    pub fn copy_cell(&mut self, index: CellIndex) -> bool {
        self.copy_cells(&[index])
    }

    /// Records waiting to be pasted, in copy order.
    pub fn clipboard(&self) -> &[CellRecord] {
        &self.clipboard
    }

    /// Paste the copied data onto `targets`.
    ///
    /// A single copied cell lands on every target. Several copied cells are
    /// pasted pairwise, up to the shorter list. Pasted fields overwrite the
    /// target's and the rest of the target is kept.
    pub fn paste_cells(&mut self, targets: &[CellIndex]) -> Option<CellStore> {
        if self.readonly {
            return None;
        }
        let targets = self.in_range(targets);
        let pairs: Vec<(CellIndex, &CellRecord)> = match self.clipboard.as_slice() {
            [single] => targets.iter().map(|&index| (index, single)).collect(),
            many => targets.iter().copied().zip(many).collect(),
        };

        let now = (self.clock)();
        let updates = pairs
            .into_iter()
            .filter(|(_, source)| source.has_data())
            .map(|(index, source)| {
                let target = self.store.get(index).cloned().unwrap_or_default();
                let fields = source
                    .data_entries()
                    .map(|(name, value)| (name, value.clone()));
                (index, target.with_fields(fields, now))
            })
            .collect();
        self.publish_records("paste", updates)
    }

    pub fn paste_cell(&mut self, index: CellIndex) -> Option<CellStore> {
        self.paste_cells(&[index])
    }

    /// Drop every field of each index that has data.
    pub fn clear_cells(&mut self, indices: &[CellIndex]) -> Option<CellStore> {
        if self.readonly {
            return None;
        }
        let cleared: Vec<CellIndex> = indices
            .iter()
            .copied()
            .filter(|index| self.store.get(*index).is_some_and(CellRecord::has_data))
            .collect();
        if cleared.is_empty() {
            tracing::debug!(pipeline = %self.kind, "clear ignored: no cell with data");
            return None;
        }
        let store = self.store.without_cells(cleared.iter().copied());
        tracing::debug!(pipeline = %self.kind, cells = cleared.len(), "cells cleared");
        Some(self.publish(store))
    }

    /// Remove `fields` from every cell of `indices` that has any of them.
    pub fn delete_fields(&mut self, indices: &[CellIndex], fields: &[&str]) -> Option<CellStore> {
        if self.readonly {
            return None;
        }
        let fields: Vec<&str> = fields
            .iter()
            .copied()
            .filter(|name| !is_reserved_key(name))
            .collect();

        let now = (self.clock)();
        let updates: Vec<(CellIndex, CellRecord)> = indices
            .iter()
            .filter_map(|&index| {
                let record = self.store.get(index)?;
                fields
                    .iter()
                    .any(|name| record.contains(name))
                    .then(|| (index, record.without_fields(fields.iter().copied(), now)))
            })
            .collect();

        let pending_hit = self.session.selected_index().is_some_and(|selected| {
            updates.iter().any(|(index, _)| *index == selected)
        }) && self
            .session
            .pending_field()
            .is_some_and(|pending| fields.contains(&pending.name.as_str()));
        if pending_hit {
            self.session.settle();
        }
        self.publish_records("delete fields", updates)
    }

    /// Set `field = value` on every cell of `range`, either end first, cut to the timeline.
    pub fn assign_range(
        &mut self,
        field: &str,
        value: impl Into<CellValue>,
        range: RangeInclusive<CellIndex>,
    ) -> Option<CellStore> {
        if self.readonly || is_reserved_key(field) {
            tracing::debug!(pipeline = %self.kind, field, "assign ignored");
            return None;
        }
        let start = *range.start().min(range.end());
        let end = *range.start().max(range.end());
        let total = self.config.total_cells;
        if start >= total {
            tracing::debug!(pipeline = %self.kind, field, start, "assign ignored: out of range");
            return None;
        }

        let value = value.into();
        let now = (self.clock)();
        let updates = (start..=end.min(total - 1))
            .map(|index| {
                let record = self.store.get(index).cloned().unwrap_or_default();
                (index, record.with_field(field, value.clone(), now))
            })
            .collect();
        self.publish_records("assign", updates)
    }

    /// Set `field = value` on every cell of the timeline.
    pub fn assign_all(&mut self, field: &str, value: impl Into<CellValue>) -> Option<CellStore> {
        let last = self.config.total_cells.saturating_sub(1);
        self.assign_range(field, value, 0..=last)
    }

    /// Copy the listed fields of `source` onto every cell of `targets`.
    /// Fields the source does not hold are skipped.
    pub fn mass_assign(
        &mut self,
        source: CellIndex,
        fields: &[&str],
        targets: &[CellIndex],
    ) -> Option<CellStore> {
        if self.readonly {
            return None;
        }
        let Some(source_record) = self.store.get(source) else {
            tracing::debug!(pipeline = %self.kind, source, "mass assign ignored: empty source");
            return None;
        };
        let picked: Vec<(String, CellValue)> = fields
            .iter()
            .filter(|name| !is_reserved_key(name))
            .filter_map(|name| source_record.get(name).map(|v| (name.to_string(), v.clone())))
            .collect();
        if picked.is_empty() {
            return None;
        }

        let now = (self.clock)();
        let updates = self
            .in_range(targets)
            .into_iter()
            .filter(|index| *index != source)
            .map(|index| {
                let record = self.store.get(index).cloned().unwrap_or_default();
                (index, record.with_fields(picked.iter().cloned(), now))
            })
            .collect();
        self.publish_records("mass assign", updates)
    }

    fn in_range(&self, indices: &[CellIndex]) -> Vec<CellIndex> {
        indices
            .iter()
            .copied()
            .filter(|index| *index < self.config.total_cells)
            .collect()
    }

    fn publish_records(
        &mut self,
        action: &'static str,
        updates: Vec<(CellIndex, CellRecord)>,
    ) -> Option<CellStore> {
        if updates.is_empty() {
            tracing::debug!(pipeline = %self.kind, action, "nothing to write");
            return None;
        }
        let cells = updates.len();
        let store = self.store.with_records(updates);
        tracing::debug!(pipeline = %self.kind, action, cells, "cells updated");
        Some(self.publish(store))
    }

    /// Take a store re-supplied by the caller. Nothing is emitted.
    pub fn replace_store(&mut self, store: CellStore) {
        self.store = store;
    }

    /// Reset the whole pipeline section: new configuration, empty store,
    /// editor closed, first page.
    pub fn reset(&mut self, config: CellConfig) -> Option<CellStore> {
        if self.readonly {
            return None;
        }
        self.config = config;
        self.session.close();
        self.page = 0;
        Some(self.publish(CellStore::new()))
    }

    /// Switching to read-only closes any open editor.
    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
        if readonly {
            self.session.close();
        }
    }

    fn publish(&mut self, store: CellStore) -> CellStore {
        self.store = store.clone();
        if let Some(listener) = self.listener.as_mut() {
            listener(&store);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap()
    }

    fn culture_weeks(total: usize) -> TimelineController {
        TimelineController::new(PipelineKind::Culture, CellConfig::weeks(total), CellStore::new())
            .with_clock(fixed_clock)
    }

    #[test]
    fn test_commit_without_open_cell_is_noop() {
        let mut controller = culture_weeks(12);
        assert!(controller.commit_field("temperature", "22").is_none());
        assert!(controller.store().is_empty());
    }

    #[test]
    fn test_commit_round_trip() {
        let mut controller = culture_weeks(12);
        controller.select_cell(0);

        let store = controller.commit_field("temperature", "22").unwrap();
        let record = store.get(0).unwrap();
        assert_eq!(record.get("temperature"), Some(&CellValue::text("22")));
        assert_eq!(record.timestamp(), Some("2025-03-01T08:30:00.000Z"));
        assert_eq!(controller.visible_cells()[0].bucket, 1);
    }

    #[test]
    fn test_listener_sees_every_mutation() {
        let seen: Rc<RefCell<Vec<CellStore>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let mut controller = culture_weeks(12).on_change(move |store| {
            sink.borrow_mut().push(store.clone());
        });

        controller.select_cell(2);
        controller.commit_field("ph", "6.2");
        controller.delete_field("ph");
        controller.delete_field("ph");

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].get(2).unwrap().is_truthy("ph"));
        assert!(!seen[1].get(2).unwrap().has_data());
    }

    #[test]
    fn test_pending_commit_flow() {
        let mut controller = culture_weeks(12);
        controller.select_cell(5);
        assert!(controller.toggle_category("Irrigation"));
        assert!(controller.begin_field("ec"));
        assert!(controller.set_draft("1.4"));

        let store = controller.commit_pending().unwrap();
        assert!(store.get(5).unwrap().is_truthy("ec"));
        assert_eq!(controller.session().selected_index(), Some(5));
        assert!(controller.session().pending_field().is_none());
    }

    #[test]
    fn test_cancel_leaves_store_untouched() {
        let mut controller = culture_weeks(12);
        controller.select_cell(5);
        controller.toggle_category("Irrigation");
        controller.begin_field("ec");
        controller.set_draft("1.4");
        assert!(controller.cancel_field());

        assert!(controller.store().is_empty());
        assert!(controller.commit_pending().is_none());
    }

    #[test]
    fn test_select_out_of_range_ignored() {
        let mut controller = culture_weeks(12);
        assert!(!controller.select_cell(12));
        assert!(!controller.session().is_open());
    }

    #[test]
    fn test_clear_cell_needs_data() {
        let mut controller = culture_weeks(12);
        assert!(controller.clear_cell(3).is_none());

        controller.select_cell(3);
        controller.commit_field("notes", "taille");
        assert!(controller.can_clear(3));

        let store = controller.clear_cell(3).unwrap();
        assert!(!store.contains(3));
    }

    #[test]
    fn test_reserved_key_cannot_be_committed() {
        let mut controller = culture_weeks(12);
        controller.select_cell(0);
        assert!(controller.commit_field("timestamp", "now").is_none());
        assert!(controller.commit_field("_meta", "x").is_none());
    }

    #[test]
    fn test_add_cells_respects_guard_and_capacity() {
        let mut controller = culture_weeks(40).with_growth_guard(|total| total < 50);

        assert_eq!(controller.add_cells(8), Some(48));
        assert_eq!(controller.add_cells(8), Some(52));
        assert_eq!(controller.add_cells(8), None);
        assert_eq!(controller.config().total_cells, 52);

        let mut capped = culture_weeks(12).with_growth_guard(|_| false);
        assert_eq!(capped.add_cells(4), None);
        assert_eq!(capped.config().total_cells, 12);
    }

    #[test]
    fn test_add_cells_saturates_on_huge_counts() {
        let mut controller = culture_weeks(12);
        assert_eq!(controller.add_cells(usize::MAX), Some(52));
        assert_eq!(controller.config().total_cells, 52);
        assert!(!controller.can_add_cells());
    }

    #[test]
    fn test_commit_field_is_add_only() {
        let mut controller = culture_weeks(12);
        controller.select_cell(1);
        controller.commit_field("ph", "6.2");

        assert!(controller.toggle_category("Irrigation"));
        assert!(!controller.begin_field("ph"));
        assert!(controller.commit_field("ph", "7.0").is_none());
        assert_eq!(controller.store().get(1).unwrap().get("ph"), Some(&CellValue::text("6.2")));

        assert!(controller.edit_existing_field("ph"));
        let store = controller.commit_field("ph", "7.0").unwrap();
        assert_eq!(store.get(1).unwrap().get("ph"), Some(&CellValue::text("7.0")));
    }

    #[test]
    fn test_delete_field_drops_its_pending_draft() {
        let mut controller = culture_weeks(12);
        controller.select_cell(4);
        controller.commit_field("ec", "1.2");
        controller.edit_existing_field("ec");
        controller.set_draft("1.8");

        assert!(controller.delete_field("ec").is_some());
        assert!(controller.session().pending_field().is_none());
        assert!(controller.commit_pending().is_none());
        assert!(!controller.store().get(4).unwrap().contains("ec"));
    }

    #[test]
    fn test_single_copy_pastes_onto_every_target() {
        let mut controller = culture_weeks(12);
        controller.select_cell(0);
        controller.commit_field("ph", "6.2");
        controller.commit_field("ec", "1.4");
        controller.select_cell(3);
        controller.commit_field("ph", "5.8");
        controller.commit_field("notes", "rempotage");

        assert!(controller.copy_cell(0));
        let store = controller.paste_cells(&[3, 4, 40]).unwrap();

        let pasted = store.get(3).unwrap();
        assert_eq!(pasted.get("ph"), Some(&CellValue::text("6.2")));
        assert_eq!(pasted.get("notes"), Some(&CellValue::text("rempotage")));
        assert_eq!(store.get(4).unwrap().truthy_count(), 2);
        assert!(!store.contains(40));
    }

    #[test]
    fn test_bulk_copy_pastes_pairwise() {
        let mut controller = culture_weeks(12);
        for (index, value) in [(0, "20"), (1, "21")] {
            controller.select_cell(index);
            controller.commit_field("temperature", value);
        }

        assert!(controller.copy_cells(&[0, 1, 2]));
        assert_eq!(controller.clipboard().len(), 3);
        let store = controller.paste_cells(&[6, 7]).unwrap();

        assert_eq!(store.get(6).unwrap().get("temperature"), Some(&CellValue::text("20")));
        assert_eq!(store.get(7).unwrap().get("temperature"), Some(&CellValue::text("21")));

        let store = controller.paste_cells(&[8, 9, 10]).unwrap();
        assert!(store.contains(9));
        assert!(!store.contains(10));
    }

    #[test]
    fn test_paste_with_empty_clipboard_is_noop() {
        let mut controller = culture_weeks(12);
        assert!(!controller.copy_cells(&[]));
        assert!(controller.paste_cells(&[0, 1]).is_none());
        assert!(controller.store().is_empty());
    }

    #[test]
    fn test_clear_cells_skips_empty_ones() {
        let mut controller = culture_weeks(12);
        controller.select_cell(2);
        controller.commit_field("ph", "6");
        controller.select_cell(5);
        controller.commit_field("ph", "6.5");

        let store = controller.clear_cells(&[2, 3, 5]).unwrap();
        assert!(store.is_empty());
        assert!(controller.clear_cells(&[2, 3]).is_none());
    }

    #[test]
    fn test_delete_fields_across_cells() {
        let seen: Rc<RefCell<usize>> = Rc::default();
        let sink = Rc::clone(&seen);
        let mut controller = culture_weeks(12).on_change(move |_| *sink.borrow_mut() += 1);
        controller.assign_range("ph", "6", 0..=3);
        controller.assign_range("ec", "1.1", 2..=3);
        controller.select_cell(3);
        controller.edit_existing_field("ec");

        let store = controller.delete_fields(&[1, 2, 3, 9], &["ec", "timestamp"]).unwrap();
        assert!(store.get(1).unwrap().contains("ph"));
        assert!(!store.get(2).unwrap().contains("ec"));
        assert!(!store.get(3).unwrap().contains("ec"));
        assert!(controller.session().pending_field().is_none());

        assert!(controller.delete_fields(&[1, 2, 3], &["ec"]).is_none());
        assert_eq!(*seen.borrow(), 3);
    }

    #[test]
    fn test_assign_range_accepts_either_order_and_clamps() {
        let mut controller = culture_weeks(12);

        let store = controller.assign_range("light_hours", "18", 10..=7).unwrap();
        assert_eq!(store.indices().collect::<Vec<_>>(), vec![7, 8, 9, 10]);

        let store = controller.assign_range("light_hours", "12", 9..=30).unwrap();
        assert_eq!(store.indices().collect::<Vec<_>>(), vec![7, 8, 9, 10, 11]);
        assert_eq!(store.get(8).unwrap().get("light_hours"), Some(&CellValue::text("18")));
        assert_eq!(store.get(11).unwrap().get("light_hours"), Some(&CellValue::text("12")));

        assert!(controller.assign_range("light_hours", "12", 12..=20).is_none());
        assert!(controller.assign_range("_meta", "x", 0..=1).is_none());
    }

    #[test]
    fn test_assign_all_covers_the_timeline() {
        let mut controller = culture_weeks(6);
        let store = controller.assign_all("substrate", "coco").unwrap();
        assert_eq!(store.len(), 6);
        assert_eq!(controller.visible_cells()[5].bucket, 1);

        let mut empty = culture_weeks(0);
        assert!(empty.assign_all("substrate", "coco").is_none());
    }

    #[test]
    fn test_mass_assign_copies_chosen_fields() {
        let mut controller = culture_weeks(12);
        controller.select_cell(0);
        controller.commit_field("ph", "6.1");
        controller.commit_field("ec", "1.3");
        controller.commit_field("notes", "mère");

        let store = controller
            .mass_assign(0, &["ph", "ec", "humidity", "_meta"], &[0, 1, 2, 99])
            .unwrap();
        let target = store.get(2).unwrap();
        assert_eq!(target.truthy_count(), 2);
        assert!(!target.contains("notes"));
        assert!(!target.contains("humidity"));
        assert!(!store.contains(99));

        assert!(controller.mass_assign(5, &["ph"], &[1]).is_none());
        assert!(controller.mass_assign(0, &["humidity"], &[1]).is_none());
    }

    #[test]
    fn test_bulk_edits_refused_when_readonly() {
        let mut controller = culture_weeks(12);
        controller.assign_all("ph", "6");
        controller.set_readonly(true);

        assert!(controller.copy_cell(0));
        assert!(controller.paste_cell(1).is_none());
        assert!(controller.clear_cells(&[0]).is_none());
        assert!(controller.delete_fields(&[0], &["ph"]).is_none());
        assert!(controller.assign_all("ec", "1").is_none());
        assert!(controller.mass_assign(0, &["ph"], &[1]).is_none());
        assert_eq!(controller.store().len(), 12);
    }

    #[test]
    fn test_page_navigation() {
        let mut controller = culture_weeks(46);
        assert_eq!(controller.total_pages(), 3);
        assert!(!controller.prev_page());
        assert!(controller.next_page());
        assert!(controller.next_page());
        assert!(!controller.next_page());
        assert_eq!(controller.page(), 2);
        assert_eq!(controller.go_to_page(99), 2);
        assert_eq!(controller.visible_cells().len(), 6);
    }

    #[test]
    fn test_current_entries_preview() {
        let mut controller = culture_weeks(12);
        controller.select_cell(1);
        controller.commit_field("fertilizer_type", "Engrais organique liquide");

        let entries = controller.current_entries(20);
        assert_eq!(
            entries,
            vec![CurrentEntry {
                field: "fertilizer_type".to_string(),
                label: "fertilizer type".to_string(),
                preview: "Engrais organique li".to_string(),
            }]
        );
    }

    #[test]
    fn test_reset_empties_store() {
        let mut controller = culture_weeks(30);
        controller.select_cell(25);
        controller.commit_field("ph", "6");
        controller.go_to_page(1);

        let store = controller.reset(CellConfig::months(6)).unwrap();
        assert!(store.is_empty());
        assert_eq!(controller.page(), 0);
        assert!(!controller.session().is_open());
        assert_eq!(controller.summary(), "6 mois");
    }
}
