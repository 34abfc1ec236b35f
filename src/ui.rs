use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState},
};

use crate::model::{Model, UIData};

pub const COLUMN_SPACING: u16 = 1;
const PAGER_NEIGHBOURS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

/// Pages shown in the pagination bar: first, last and the neighbourhood of
/// `current`, with gaps collapsed into an ellipsis.
pub fn page_items(current: usize, count: usize) -> Vec<PageItem> {
    if count <= 2 * PAGER_NEIGHBOURS + 3 {
        return (0..count).map(PageItem::Page).collect();
    }
    let begin = std::cmp::max(current.saturating_sub(PAGER_NEIGHBOURS), 1);
    let end = std::cmp::min(current + PAGER_NEIGHBOURS, count - 2);

    let mut items = vec![PageItem::Page(0)];
    if begin > 1 {
        items.push(PageItem::Ellipsis);
    }
    items.extend((begin..=end).map(PageItem::Page));
    if end < count - 2 {
        items.push(PageItem::Ellipsis);
    }
    items.push(PageItem::Page(count - 1));
    items
}

#[derive(Debug, Default)]
pub struct TableUI {
    table_state: TableState,
}

impl TableUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();

        let block = Block::bordered()
            .title(Line::from(format!(" {} ", uidata.name).bold()).centered())
            .title_bottom(Self::filter_line(&uidata).centered())
            .border_set(border::THICK);
        let inner = block.inner(frame.area());
        frame.render_widget(block, frame.area());

        let [table_area, pager_area, status_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        self.draw_table(&uidata, frame, table_area);
        frame.render_widget(Paragraph::new(Self::pager_line(&uidata)).centered(), pager_area);
        Self::draw_statusline(&uidata, frame, status_area);

        if let Some(message) = &uidata.popup_message {
            let area = Self::popup_area(frame.area(), 60, 70);
            frame.render_widget(Clear, area);
            frame.render_widget(
                Paragraph::new(message.as_str()).block(Block::bordered().title(" Help ")),
                area,
            );
        }
    }

    fn draw_table(&mut self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let header = Row::new(uidata.headers.iter().enumerate().map(|(idx, name)| {
            let label = if uidata.filtered_columns.get(idx).copied().unwrap_or(false) {
                format!("{name}*")
            } else {
                name.clone()
            };
            Cell::from(label).bold()
        }))
        .underlined();

        let rows = uidata
            .rows
            .iter()
            .map(|cells| Row::new(cells.iter().map(|c| Cell::from(c.as_str()))));

        let widths = uidata
            .widths
            .iter()
            .map(|&w| Constraint::Length(u16::try_from(w).unwrap_or(u16::MAX)));

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(COLUMN_SPACING)
            .row_highlight_style(Style::new().reversed())
            .column_highlight_style(Style::new().yellow());

        let has_rows = !uidata.rows.is_empty();
        self.table_state
            .select(has_rows.then_some(uidata.selected_row));
        self.table_state
            .select_column((!uidata.headers.is_empty()).then_some(uidata.selected_column));
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn pager_line(uidata: &UIData) -> Line<'static> {
        let total = Span::raw(format!(
            "Total {}  ({} / page)",
            uidata.filtered_records, uidata.page_size
        ));
        if uidata.page_count <= 1 {
            return Line::from(total);
        }

        let arrow = |symbol: &'static str, enabled: bool| {
            if enabled { symbol.bold() } else { symbol.dim() }
        };
        let mut spans = vec![arrow("<", uidata.can_go_previous), Span::raw(" ")];
        for item in page_items(uidata.page_index, uidata.page_count) {
            spans.push(match item {
                PageItem::Page(p) if p == uidata.page_index => {
                    format!("[{}]", p + 1).yellow().bold()
                }
                PageItem::Page(p) => Span::raw(format!("{}", p + 1)),
                PageItem::Ellipsis => "…".dim(),
            });
            spans.push(Span::raw(" "));
        }
        spans.push(arrow(">", uidata.can_go_next));
        spans.push(Span::raw("  "));
        spans.push(total);
        Line::from(spans)
    }

    fn filter_line(uidata: &UIData) -> Line<'static> {
        if uidata.filters.is_empty() {
            return Line::from(vec![" Help ".into(), "<?> ".blue().bold()]);
        }
        let summary = uidata
            .filters
            .iter()
            .map(|(column, pattern)| format!("{column}~\"{pattern}\""))
            .collect::<Vec<String>>()
            .join(" & ");
        let mode = if uidata.case_sensitive { "Aa" } else { "aA" };
        Line::from(vec![
            " Filters: ".into(),
            summary.yellow(),
            format!(" ({} of {}) ", uidata.filtered_records, uidata.total_records).into(),
            format!("[{mode}] ").dim(),
        ])
    }

    fn draw_statusline(uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.active_cmdinput {
            let text = format!("{}{}", uidata.cmd_prompt, uidata.cmdinput.input);
            frame.render_widget(Paragraph::new(text), area);
            let offset = uidata.cmd_prompt.chars().count() + uidata.cmdinput.curser_pos;
            let x = area.x.saturating_add(u16::try_from(offset).unwrap_or(u16::MAX));
            frame.set_cursor_position((std::cmp::min(x, area.right().saturating_sub(1)), area.y));
        } else {
            frame.render_widget(Paragraph::new(uidata.status_message.as_str()).dim(), area);
        }
    }

    fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
        let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
            .flex(Flex::Center)
            .areas(area);
        let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
            .flex(Flex::Center)
            .areas(area);
        area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Message;
    use crate::dataset::Dataset;
    use pagetable::TableOptions;
    use ratatui::{
        Terminal,
        backend::TestBackend,
        crossterm::event::{KeyCode, KeyEvent, KeyModifiers},
    };

    fn render(model: &Model, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        let mut ui = TableUI::new();
        terminal.draw(|f| ui.draw(model, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn dataset(n: usize) -> Dataset {
        Dataset::from_rows(
            "cities.csv",
            vec!["name".into(), "country".into()],
            (0..n)
                .map(|i| vec![format!("city-{i}"), "Austria".to_string()])
                .collect(),
        )
    }

    fn config() -> crate::app::AppConfig {
        crate::app::AppConfig {
            path: "cities.csv".into(),
            table: TableOptions::default(),
            event_poll_time: 0,
            max_column_width: 20,
            log_file: "test.log".into(),
        }
    }

    #[test]
    fn short_page_lists_are_complete() {
        assert_eq!(
            page_items(1, 3),
            vec![PageItem::Page(0), PageItem::Page(1), PageItem::Page(2)]
        );
        assert!(page_items(0, 0).is_empty());
    }

    #[test]
    fn long_page_lists_collapse() {
        use PageItem::*;
        assert_eq!(
            page_items(10, 20),
            vec![
                Page(0),
                Ellipsis,
                Page(8),
                Page(9),
                Page(10),
                Page(11),
                Page(12),
                Ellipsis,
                Page(19),
            ]
        );
        assert_eq!(page_items(0, 20), vec![Page(0), Page(1), Page(2), Ellipsis, Page(19)]);
        assert_eq!(page_items(19, 20), vec![Page(0), Ellipsis, Page(17), Page(18), Page(19)]);
    }

    #[test]
    fn renders_header_rows_and_pager() {
        let data = dataset(12);
        let model = Model::init(&data, &config()).unwrap();
        let screen = render(&model, 60, 20);
        assert!(screen.contains("cities.csv"));
        assert!(screen.contains("country"));
        assert!(screen.contains("city-0"));
        assert!(!screen.contains("city-10"));
        assert!(screen.contains("[1]"));
        assert!(screen.contains("Total 12"));
    }

    #[test]
    fn filter_title_shows_match_mode() {
        let data = dataset(12);
        let mut config = config();
        config.table = TableOptions::default().case_sensitive(true);
        let mut model = Model::init(&data, &config).unwrap();
        model.update(Message::Filter);
        for c in "city-1".chars() {
            model.update(Message::RawKey(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)));
        }
        model.update(Message::RawKey(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));

        let screen = render(&model, 80, 20);
        assert!(screen.contains("name~\"city-1\""));
        assert!(screen.contains("(3 of 12)"));
        assert!(screen.contains("[Aa]"));
    }

    #[test]
    fn single_page_hides_page_numbers() {
        let data = dataset(4);
        let mut model = Model::init(&data, &config()).unwrap();
        model.update(Message::Help);
        let screen = render(&model, 60, 20);
        assert!(!screen.contains("[1]"));
        assert!(screen.contains("Total 4"));
        assert!(screen.contains("Help"));
    }
}
