use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, trace, warn};

use pagetable::{MatchMode, TableController, TableOptions};

use crate::app::{AppConfig, AppError, HELP_TEXT, Message};
use crate::dataset::{Dataset, Row};
use crate::inputter::{InputResult, Inputter};

#[derive(Debug, PartialEq)]
pub enum Status {
    Ready,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    Table,
    FilterInput,
    Popup,
}

/// Everything the ui needs to draw one frame.
pub struct UIData {
    pub name: String,
    pub headers: Vec<String>,
    pub widths: Vec<usize>,
    pub filtered_columns: Vec<bool>,
    pub rows: Vec<Vec<String>>,
    pub selected_row: usize,
    pub selected_column: usize,
    pub page_index: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub total_records: usize,
    pub filtered_records: usize,
    pub can_go_previous: bool,
    pub can_go_next: bool,
    pub filters: Vec<(String, String)>,
    pub case_sensitive: bool,
    pub cmd_prompt: String,
    pub cmdinput: InputResult,
    pub active_cmdinput: bool,
    pub popup_message: Option<String>,
    pub status_message: String,
}

pub struct Model<'a> {
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    name: String,
    table: TableController<'a, Row>,
    widths: Vec<usize>,
    max_column_width: usize,
    selected_row: usize, // Row on the current page
    selected_column: usize,
    input: Inputter,
    last_input: InputResult,
    status_message: String,
}

impl<'a> Model<'a> {
    pub fn init(dataset: &'a Dataset, config: &AppConfig) -> Result<Self, AppError> {
        Self::with_options(dataset, config.table.clone(), config.max_column_width)
    }

    fn with_options(
        dataset: &'a Dataset,
        options: TableOptions,
        max_column_width: usize,
    ) -> Result<Self, AppError> {
        let table = TableController::new(&dataset.rows, dataset.columns(), options)?;
        let status_message = format!("Loaded {} records", table.records().len());
        Ok(Self {
            status: Status::Ready,
            modus: Modus::Table,
            previous_modus: Modus::Table,
            name: dataset.name.clone(),
            table,
            widths: dataset.widths.clone(),
            max_column_width,
            selected_row: 0,
            selected_column: 0,
            input: Inputter::default(),
            last_input: InputResult::default(),
            status_message,
        })
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::FilterInput
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    pub fn update(&mut self, message: Message) {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, message);
        match self.modus {
            Modus::Table => match message {
                Message::Quit => self.quit(),
                Message::MoveUp => self.move_selection_up(),
                Message::MoveDown => self.move_selection_down(),
                Message::MoveLeft => self.selected_column = self.selected_column.saturating_sub(1),
                Message::MoveRight => {
                    if self.selected_column + 1 < self.table.columns().len() {
                        self.selected_column += 1;
                    }
                }
                Message::NextPage => self.table.next_page(),
                Message::PreviousPage => self.table.previous_page(),
                Message::FirstPage => self.table.first_page(),
                Message::LastPage => self.table.last_page(),
                Message::CyclePageSize => {
                    self.table.next_page_size();
                    self.set_status_message(format!(
                        "{} records per page",
                        self.table.pagination().page_size
                    ));
                }
                Message::Filter => self.enter_filter_mode(),
                Message::ClearFilters => {
                    self.table.clear_filters();
                    self.set_status_message("Cleared all filters");
                }
                Message::CopyRow => self.copy_row(),
                Message::Help => self.show_help(),
                _ => (),
            },
            Modus::Popup => match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.exit_popup(),
                _ => (),
            },
            Modus::FilterInput => {
                if let Message::RawKey(key) = message {
                    self.raw_input(key)
                }
            }
        }
        self.clamp_selection();
    }

    pub fn get_uidata(&self) -> UIData {
        let view = self.table.view();
        let columns = self.table.columns();

        let headers = columns.iter().map(|c| c.header().to_string()).collect();
        let filtered_columns = columns
            .iter()
            .map(|c| self.table.filter(c.id()).is_some())
            .collect();
        let widths = self
            .widths
            .iter()
            .map(|&w| std::cmp::min(w, self.max_column_width))
            .collect();
        let rows = view.visible_rows.iter().map(|r| r.cells.clone()).collect();

        UIData {
            name: self.name.clone(),
            headers,
            widths,
            filtered_columns,
            rows,
            selected_row: self.selected_row,
            selected_column: self.selected_column,
            page_index: view.page_index,
            page_count: view.page_count,
            page_size: view.page_size,
            total_records: view.total_records,
            filtered_records: view.filtered_records,
            can_go_previous: view.can_go_previous,
            can_go_next: view.can_go_next,
            filters: self
                .table
                .predicates()
                .iter()
                .map(|(c, p)| (c.to_string(), p.to_string()))
                .collect(),
            case_sensitive: self.table.match_mode() == MatchMode::CaseSensitive,
            cmd_prompt: self
                .selected_column_id()
                .map(|id| format!("filter {id}: "))
                .unwrap_or_default(),
            cmdinput: self.last_input.clone(),
            active_cmdinput: self.modus == Modus::FilterInput,
            popup_message: (self.modus == Modus::Popup).then(|| HELP_TEXT.to_string()),
            status_message: self.status_message.clone(),
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    fn selected_column_id(&self) -> Option<String> {
        self.table
            .columns()
            .get(self.selected_column)
            .map(|c| c.id().to_string())
    }

    fn selected_record(&self) -> Option<&'a Row> {
        self.table.view().visible_rows.get(self.selected_row).copied()
    }

    fn clamp_selection(&mut self) {
        let nrows = self.table.view().visible_rows.len();
        self.selected_row = std::cmp::min(self.selected_row, nrows.saturating_sub(1));
    }

    // -------------------- Control handling functions ---------------------- //

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::Popup;
    }

    fn exit_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::Popup;
    }

    fn enter_filter_mode(&mut self) {
        let Some(column_id) = self.selected_column_id() else {
            return;
        };
        trace!("Entering filter input for {column_id} ...");
        self.previous_modus = self.modus;
        self.modus = Modus::FilterInput;
        let current = self.table.filter(&column_id).unwrap_or("").to_string();
        self.input.set(&current);
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            self.handle_filter_input();
        }
    }

    fn handle_filter_input(&mut self) {
        self.modus = self.previous_modus;
        self.previous_modus = Modus::FilterInput;

        if self.last_input.canceled {
            self.set_status_message("Filter input canceled");
            return;
        }
        let Some(column_id) = self.selected_column_id() else {
            return;
        };
        let pattern = self.last_input.input.clone();
        self.table.set_filter(&column_id, &pattern);
        debug!("Filter on {column_id} is now \"{pattern}\"");

        let view = self.table.view();
        self.set_status_message(format!(
            "{} of {} records match",
            view.filtered_records, view.total_records
        ));
    }

    fn move_selection_up(&mut self) {
        if self.selected_row > 0 {
            self.selected_row -= 1;
        } else if self.table.view().can_go_previous {
            self.table.previous_page();
            self.selected_row = self.table.pagination().page_size - 1;
        }
    }

    fn move_selection_down(&mut self) {
        let view = self.table.view();
        if self.selected_row + 1 < view.visible_rows.len() {
            self.selected_row += 1;
        } else if view.can_go_next {
            self.table.next_page();
            self.selected_row = 0;
        }
    }

    fn copy_row(&mut self) {
        let Some(row) = self.selected_record() else {
            return;
        };
        let content = Self::row_as_csv(row);
        trace!("Row content: {}", content);

        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(content)) {
            Ok(_) => self.set_status_message("Copied row to clipboard"),
            Err(e) => {
                warn!("Error copying to clipboard: {:?}", e);
                self.set_status_message(format!("Clipboard error: {e}"));
            }
        }
    }

    fn row_as_csv(row: &Row) -> String {
        row.cells
            .iter()
            .map(|c| Self::wrap_cell_content(c))
            .collect::<Vec<String>>()
            .join(",")
    }

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.contains('"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace('"', "\"\"");
        }
        if needs_wrapping || needs_escaping {
            out = format!("\"{out}\"");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn dataset(n: usize) -> Dataset {
        Dataset::from_rows(
            "people.csv",
            vec!["name".into(), "city".into()],
            (0..n)
                .map(|i| {
                    let city = if i % 3 == 0 { "Vienna" } else { "Graz" };
                    vec![format!("person-{i}"), city.to_string()]
                })
                .collect(),
        )
    }

    fn model(dataset: &Dataset) -> Model<'_> {
        Model::with_options(dataset, TableOptions::default(), 40).unwrap()
    }

    fn type_filter(model: &mut Model, text: &str) {
        model.update(Message::Filter);
        for c in text.chars() {
            model.update(Message::RawKey(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)));
        }
        model.update(Message::RawKey(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
    }

    #[test]
    fn pages_through_records() {
        let data = dataset(12);
        let mut model = model(&data);
        assert_eq!(model.get_uidata().rows.len(), 10);

        model.update(Message::NextPage);
        let ui = model.get_uidata();
        assert_eq!(ui.page_index, 1);
        assert_eq!(ui.rows[0][0], "person-10");

        model.update(Message::NextPage);
        assert_eq!(model.get_uidata().page_index, 1);
    }

    #[test]
    fn filter_input_applies_to_selected_column() {
        let data = dataset(12);
        let mut model = model(&data);
        model.update(Message::NextPage);
        model.update(Message::MoveRight);
        type_filter(&mut model, "vienna");

        let ui = model.get_uidata();
        assert!(!ui.active_cmdinput);
        assert_eq!(ui.filtered_records, 4);
        assert_eq!(ui.page_index, 0);
        assert_eq!(ui.filters, vec![("city".to_string(), "vienna".to_string())]);
        assert_eq!(ui.filtered_columns, vec![false, true]);
        assert_eq!(ui.status_message, "4 of 12 records match");

        model.update(Message::ClearFilters);
        assert_eq!(model.get_uidata().filtered_records, 12);
    }

    #[test]
    fn keys_go_to_input_while_filtering() {
        let data = dataset(3);
        let mut model = model(&data);
        model.update(Message::Filter);
        assert!(model.raw_keyevents());
        model.update(Message::Quit);
        assert_eq!(model.status, Status::Ready);

        model.update(Message::RawKey(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(!model.raw_keyevents());
        assert!(model.get_uidata().filters.is_empty());
    }

    #[test]
    fn selection_follows_page_boundaries() {
        let data = dataset(12);
        let mut model = model(&data);
        for _ in 0..10 {
            model.update(Message::MoveDown);
        }
        let ui = model.get_uidata();
        assert_eq!(ui.page_index, 1);
        assert_eq!(ui.selected_row, 0);

        model.update(Message::MoveUp);
        let ui = model.get_uidata();
        assert_eq!(ui.page_index, 0);
        assert_eq!(ui.selected_row, 9);
    }

    #[test]
    fn selection_is_clamped_when_page_shrinks() {
        let data = dataset(12);
        let mut model = model(&data);
        for _ in 0..5 {
            model.update(Message::MoveDown);
        }
        model.update(Message::MoveRight);
        type_filter(&mut model, "Vienna");
        assert_eq!(model.get_uidata().selected_row, 3);
    }

    #[test]
    fn help_popup_opens_and_closes() {
        let data = dataset(1);
        let mut model = model(&data);
        model.update(Message::Help);
        assert!(model.get_uidata().popup_message.is_some());
        model.update(Message::NextPage);
        model.update(Message::Exit);
        assert!(model.get_uidata().popup_message.is_none());
        model.update(Message::Quit);
        assert_eq!(model.status, Status::Quitting);
    }

    #[test]
    fn page_size_cycles_through_options() {
        let data = dataset(30);
        let mut model = model(&data);
        model.update(Message::CyclePageSize);
        let ui = model.get_uidata();
        assert_eq!(ui.page_size, 25);
        assert_eq!(ui.rows.len(), 25);
        assert_eq!(ui.page_count, 2);
    }

    #[test]
    fn reports_loaded_records_and_match_mode() {
        let data = dataset(7);
        let model = model(&data);
        let ui = model.get_uidata();
        assert_eq!(ui.status_message, "Loaded 7 records");
        assert!(!ui.case_sensitive);

        let options = TableOptions::default().case_sensitive(true);
        let model = Model::with_options(&data, options, 40).unwrap();
        assert!(model.get_uidata().case_sensitive);
    }

    #[test]
    fn row_is_copied_as_csv() {
        let row = Row {
            cells: vec!["a b".into(), "say \"hi\"".into(), "plain".into()],
        };
        assert_eq!(Model::row_as_csv(&row), "\"a b\",\"say \"\"hi\"\"\",plain");
    }
}
