//! The table state machine.
//!
//! [`TableController`] owns the active filters and the pagination state of a
//! caller-owned record slice. Every operation runs to completion and leaves the
//! controller consistent: the page index is always valid for the filtered
//! record count. Callers re-read [`TableController::view`] after each change.

use std::collections::HashSet;

use derive_setters::Setters;
use tracing::{debug, trace, warn};

use crate::column::ColumnDef;
use crate::domain::{Result, TableError};
use crate::filter::{self, FilterSet, MatchMode};
use crate::pagination::{self, PaginationState};

pub const DEFAULT_PAGE_SIZE_OPTIONS: [usize; 3] = [10, 25, 50];

/// Construction options of a [`TableController`].
#[derive(Debug, Clone, PartialEq, Eq, Setters)]
pub struct TableOptions {
    /// Selectable page sizes. The first one is used initially.
    pub page_size_options: Vec<usize>,
    pub case_sensitive: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS.to_vec(),
            case_sensitive: false,
        }
    }
}

impl TableOptions {
    fn validate(&self) -> Result<()> {
        if self.page_size_options.is_empty() {
            return Err(TableError::EmptyPageSizeOptions);
        }
        if let Some((position, &size)) = self
            .page_size_options
            .iter()
            .enumerate()
            .find(|(_, size)| **size == 0)
        {
            return Err(TableError::InvalidPageSize { position, size });
        }
        Ok(())
    }
}

/// What the presentation layer renders: the rows of the current page and the
/// pagination flags.
#[derive(Debug)]
pub struct DerivedView<'a, R> {
    pub visible_rows: Vec<&'a R>,
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub can_go_previous: bool,
    pub can_go_next: bool,
    pub total_records: usize,
    pub filtered_records: usize,
}

pub struct TableController<'a, R> {
    records: &'a [R],
    columns: Vec<ColumnDef<R>>,
    page_size_options: Vec<usize>,
    mode: MatchMode,
    filters: FilterSet,
    pagination: PaginationState,
    rows: Vec<usize>, // Positions in `records` that pass the filters
    reported_columns: HashSet<String>,
}

impl<'a, R> TableController<'a, R> {
    pub fn new(
        records: &'a [R],
        columns: Vec<ColumnDef<R>>,
        options: TableOptions,
    ) -> Result<Self> {
        options.validate()?;

        let mut seen = HashSet::new();
        for column in columns.iter() {
            if !seen.insert(column.id()) {
                return Err(TableError::DuplicateColumn {
                    id: column.id().to_string(),
                });
            }
        }

        debug!(
            "New table with {} records, {} columns, page sizes {:?}",
            records.len(),
            columns.len(),
            options.page_size_options
        );

        Ok(Self {
            records,
            columns,
            pagination: PaginationState::new(options.page_size_options[0]),
            page_size_options: options.page_size_options,
            mode: MatchMode::from_case_sensitive(options.case_sensitive),
            filters: FilterSet::new(),
            rows: (0..records.len()).collect(),
            reported_columns: HashSet::new(),
        })
    }

    // -------------------------- Read accessors ---------------------------- //

    pub fn view(&self) -> DerivedView<'a, R> {
        let len = self.rows.len();
        let (begin, end) = self.pagination.bounds(len);
        let page_count = self.page_count();
        let records = self.records;

        DerivedView {
            visible_rows: self.rows[begin..end].iter().map(|&idx| &records[idx]).collect(),
            page_index: self.pagination.page_index,
            page_size: self.pagination.page_size,
            page_count,
            can_go_previous: pagination::can_go_previous(self.pagination.page_index),
            can_go_next: pagination::can_go_next(self.pagination.page_index, page_count),
            total_records: self.records.len(),
            filtered_records: len,
        }
    }

    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    pub fn predicates(&self) -> &FilterSet {
        &self.filters
    }

    /// Current pattern of `column_id`, if filtered.
    pub fn filter(&self, column_id: &str) -> Option<&str> {
        self.filters.get(column_id)
    }

    pub fn columns(&self) -> &[ColumnDef<R>] {
        &self.columns
    }

    pub fn column(&self, column_id: &str) -> Option<&ColumnDef<R>> {
        self.columns.iter().find(|c| c.id() == column_id)
    }

    pub fn records(&self) -> &'a [R] {
        self.records
    }

    pub fn page_size_options(&self) -> &[usize] {
        &self.page_size_options
    }

    pub fn page_count(&self) -> usize {
        self.pagination.page_count(self.rows.len())
    }

    pub fn match_mode(&self) -> MatchMode {
        self.mode
    }

    // ----------------------------- Mutators ------------------------------- //

    /// Filters `column_id` by `pattern`, replacing any earlier pattern of that
    /// column. An empty pattern removes the filter. Unknown columns are
    /// ignored and reported once.
    pub fn set_filter(&mut self, column_id: &str, pattern: &str) {
        if self.column(column_id).is_none() {
            if self.reported_columns.insert(column_id.to_string()) {
                warn!("Cannot filter unknown column \"{column_id}\", ignoring it");
            }
            return;
        }
        if self.filters.set(column_id, pattern) {
            debug!("Filter \"{column_id}\" set to \"{pattern}\"");
            self.refilter();
        }
    }

    pub fn clear_filters(&mut self) {
        if self.filters.is_empty() {
            return;
        }
        debug!("Clearing {} filters", self.filters.len());
        self.filters.clear();
        self.refilter();
    }

    pub fn set_page_index(&mut self, page_index: usize) {
        self.pagination.page_index = pagination::clamp(page_index, self.page_count());
        trace!("Page index set to {}", self.pagination.page_index);
    }

    pub fn next_page(&mut self) {
        if pagination::can_go_next(self.pagination.page_index, self.page_count()) {
            self.pagination.page_index += 1;
        }
    }

    pub fn previous_page(&mut self) {
        if pagination::can_go_previous(self.pagination.page_index) {
            self.pagination.page_index -= 1;
        }
    }

    pub fn first_page(&mut self) {
        self.set_page_index(0);
    }

    pub fn last_page(&mut self) {
        self.set_page_index(self.page_count().saturating_sub(1));
    }

    /// Changes the page size, keeping the first row of the current page in
    /// view. Zero is ignored.
    pub fn set_page_size(&mut self, page_size: usize) {
        if page_size == 0 {
            warn!("Ignoring page size of 0");
            return;
        }
        self.pagination.resize(page_size, self.rows.len());
        debug!(
            "Page size set to {}, now on page {}",
            page_size, self.pagination.page_index
        );
    }

    /// Moves to the page size option after the current one, wrapping around.
    pub fn next_page_size(&mut self) {
        let next = match self
            .page_size_options
            .iter()
            .position(|&size| size == self.pagination.page_size)
        {
            Some(pos) => self.page_size_options[(pos + 1) % self.page_size_options.len()],
            None => self.page_size_options[0],
        };
        self.set_page_size(next);
    }

    fn refilter(&mut self) {
        self.rows = filter::matching_indices(self.records, &self.columns, &self.filters, self.mode);
        if self.pagination.clamp_to(self.rows.len()) {
            trace!("Page index clamped to {}", self.pagination.page_index);
        }
    }
}
