use std::io::Stdout;
use std::path::Path;

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

use part_rename::parts::{FixedAnswer, MAX_SHOWN_ERRORS};
use part_rename::{BatchOperation, FileEntry, OverwritePrompt, PartSelection, Rule, Session};

use crate::config::Config;
use crate::logger::FileLogger;

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Single line text input with a cursor counted in chars.
#[derive(Debug, Default)]
struct TextInput {
    buffer: String,
    cursor: usize,
}

/// What a text input popup is asking for.
#[derive(Debug, Clone, Copy)]
enum InputPurpose {
    OpenDirectory,
    Destination(BatchOperation),
}

/// Part editor for one file.
#[derive(Debug)]
struct EditState {
    index: usize,
    selection: PartSelection,
    /// Highlighted part row
    cursor: usize,
    /// Custom part being typed
    custom_input: Option<TextInput>,
}

#[derive(Debug)]
enum Mode {
    Browse,
    Edit(EditState),
    ConfirmApply { template: usize, rule: Rule, text: String },
    Input { purpose: InputPurpose, input: TextInput },
    Preview { scroll: u16 },
    Message { title: String, text: String },
    Quit,
}

struct App<'a> {
    session: &'a mut Session,
    config: &'a Config,
    logger: Option<&'a mut FileLogger>,
    mode: Mode,
    list_state: ListState,
}

/// Asks for overwrite permission inside the terminal UI.
struct TuiPrompt<'t> {
    terminal: &'t mut Term,
}

impl TextInput {
    fn new(initial: &str) -> Self {
        Self {
            buffer: initial.to_string(),
            cursor: initial.chars().count(),
        }
    }

    fn len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_index(&self) -> usize {
        self.buffer
            .char_indices()
            .nth(self.cursor)
            .map_or(self.buffer.len(), |(index, _)| index)
    }

    fn split_at_cursor(&self) -> (&str, &str) {
        self.buffer.split_at(self.byte_index())
    }

    fn insert_char(&mut self, c: char) {
        let index = self.byte_index();
        self.buffer.insert(index, c);
        self.cursor += 1;
    }

    fn delete_char(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let index = self.byte_index();
            self.buffer.remove(index);
        }
    }

    fn delete_char_forward(&mut self) {
        if self.cursor < self.len() {
            let index = self.byte_index();
            self.buffer.remove(index);
        }
    }

    /// Apply an editing key. Returns false for keys the input does not handle.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Delete => self.delete_char_forward(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.len(),
            KeyCode::Char(c) => self.insert_char(c),
            _ => return false,
        }
        true
    }
}

impl InputPurpose {
    fn title(self) -> String {
        match self {
            Self::OpenDirectory => "Open directory".to_string(),
            Self::Destination(operation) => format!("Destination directory to {operation} files to"),
        }
    }
}

impl EditState {
    fn new(index: usize, selection: PartSelection) -> Self {
        Self {
            index,
            selection,
            cursor: 0,
            custom_input: None,
        }
    }
}

impl OverwritePrompt for TuiPrompt<'_> {
    fn confirm_overwrite(&mut self, target: &Path) -> bool {
        let text = format!("{}\nalready exists.\n\nOverwrite? (y/n)", target.display());
        loop {
            if self
                .terminal
                .draw(|frame| render_popup(frame, "File exists", &text, Color::Yellow))
                .is_err()
            {
                return false;
            }
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('y' | 'Y') => return true,
                    KeyCode::Char('n' | 'N') | KeyCode::Esc => return false,
                    _ => {}
                },
                Ok(_) => {}
                Err(_) => return false,
            }
        }
    }
}

/// Run the interactive terminal UI on the given session.
pub fn run_interactive(session: &mut Session, config: &Config, logger: Option<&mut FileLogger>) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    enable_raw_mode()?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, config, logger);
    let result = app.event_loop(&mut terminal);

    // Restore terminal before reporting any error
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;

    result
}

impl<'a> App<'a> {
    fn new(session: &'a mut Session, config: &'a Config, logger: Option<&'a mut FileLogger>) -> Self {
        let mut list_state = ListState::default();
        if !session.files().is_empty() {
            list_state.select(Some(0));
        }
        Self {
            session,
            config,
            logger,
            mode: Mode::Browse,
            list_state,
        }
    }

    fn event_loop(&mut self, terminal: &mut Term) -> anyhow::Result<()> {
        while !matches!(self.mode, Mode::Quit) {
            terminal.draw(|frame| self.render(frame))?;

            if let Event::Key(key_event) = event::read()? {
                if key_event.kind != KeyEventKind::Press {
                    continue;
                }
                if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
                    break;
                }
                let mode = std::mem::replace(&mut self.mode, Mode::Browse);
                self.mode = match mode {
                    Mode::Browse => self.handle_browse_key(key_event.code),
                    Mode::Edit(state) => self.handle_edit_key(state, key_event.code),
                    Mode::ConfirmApply { template, rule, text } => {
                        self.handle_confirm_key(template, rule, text, key_event.code)
                    }
                    Mode::Input { purpose, input } => self.handle_input_key(purpose, input, key_event.code, terminal),
                    Mode::Preview { scroll } => match key_event.code {
                        KeyCode::Up | KeyCode::Char('k') => Mode::Preview {
                            scroll: scroll.saturating_sub(1),
                        },
                        KeyCode::Down | KeyCode::Char('j') => Mode::Preview {
                            scroll: scroll.saturating_add(1),
                        },
                        _ => Mode::Browse,
                    },
                    Mode::Message { .. } => Mode::Browse,
                    Mode::Quit => Mode::Quit,
                };
            }
        }
        Ok(())
    }

    fn selected(&self) -> usize {
        self.list_state.selected().unwrap_or(0)
    }

    fn clamp_selection(&mut self) {
        let count = self.session.files().len();
        if count == 0 {
            self.list_state.select(None);
        } else {
            self.list_state.select(Some(self.selected().min(count - 1)));
        }
    }

    fn handle_browse_key(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => Mode::Quit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.list_state.select(Some(self.selected().saturating_sub(1)));
                self.clamp_selection();
                Mode::Browse
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.list_state.select(Some(self.selected() + 1));
                self.clamp_selection();
                Mode::Browse
            }
            KeyCode::Enter | KeyCode::Char('e') => self
                .session
                .edit(self.selected())
                .map_or(Mode::Browse, |selection| Mode::Edit(EditState::new(self.selected(), selection))),
            KeyCode::Char('u') => {
                self.session.reset_file(self.selected());
                Mode::Browse
            }
            KeyCode::Char('a') => self.confirm_apply(),
            KeyCode::Char('p') => {
                if self.session.pending_count() == 0 {
                    message("Preview", "No files to rename")
                } else {
                    Mode::Preview { scroll: 0 }
                }
            }
            KeyCode::Char(key @ ('c' | 'm')) => {
                let operation = if key == 'c' {
                    BatchOperation::Copy
                } else {
                    BatchOperation::Move
                };
                if self.session.pending_count() == 0 {
                    message("Nothing to do", "No renamed files to process")
                } else {
                    Mode::Input {
                        purpose: InputPurpose::Destination(operation),
                        input: TextInput::default(),
                    }
                }
            }
            KeyCode::Char('r') => match self.session.refresh() {
                Ok(Some(_)) => {
                    self.clamp_selection();
                    Mode::Browse
                }
                Ok(None) => message("Refresh", "Open a directory first"),
                Err(error) => {
                    self.clamp_selection();
                    message("Error", &error.to_string())
                }
            },
            KeyCode::Char('o') => {
                let current = self
                    .session
                    .directory()
                    .map(part_rename::path_to_string)
                    .unwrap_or_default();
                Mode::Input {
                    purpose: InputPurpose::OpenDirectory,
                    input: TextInput::new(&current),
                }
            }
            _ => Mode::Browse,
        }
    }

    fn confirm_apply(&self) -> Mode {
        let Some((template, rule)) = self.session.template_rule() else {
            return message(
                "Apply to all",
                "Edit one file first. Its part selection is used as the template for the other files.",
            );
        };
        let file = &self.session.files()[template];
        let text = format!(
            "Template: {}\n\n{}\n\nApply to the other {} file(s)? (y/n)",
            file.original_name,
            rule.describe(&file.original_parts()),
            self.session.files().len().saturating_sub(1)
        );
        Mode::ConfirmApply { template, rule, text }
    }

    fn handle_confirm_key(&mut self, template: usize, rule: Rule, text: String, code: KeyCode) -> Mode {
        match code {
            KeyCode::Char('y' | 'Y') | KeyCode::Enter => {
                let report = self.session.apply_rule(&rule, Some(template));
                if let Some(logger) = self.logger.as_deref_mut() {
                    let name = self.session.files()[template].original_name.as_str();
                    logger.log_replay(Some(name), &rule, &report);
                }
                let mut text = report.summary();
                for skipped in report.skipped_files.iter().take(MAX_SHOWN_ERRORS) {
                    text.push('\n');
                    text.push_str(skipped);
                }
                message("Apply to all", &text)
            }
            KeyCode::Char('n' | 'N') | KeyCode::Esc => Mode::Browse,
            _ => Mode::ConfirmApply { template, rule, text },
        }
    }

    fn handle_edit_key(&mut self, mut state: EditState, code: KeyCode) -> Mode {
        if let Some(mut input) = state.custom_input.take() {
            match code {
                KeyCode::Enter => {
                    state.selection.add_custom(&input.buffer);
                }
                KeyCode::Esc => {}
                _ => {
                    input.handle_key(code);
                    state.custom_input = Some(input);
                }
            }
            return Mode::Edit(state);
        }

        let part_count = state.selection.parts().len();
        match code {
            KeyCode::Esc => return Mode::Browse,
            KeyCode::Enter => {
                self.session.commit_edit(state.index, &state.selection);
                return Mode::Browse;
            }
            KeyCode::Up | KeyCode::Char('k') => state.cursor = state.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => state.cursor += 1,
            KeyCode::Char(' ') => {
                state.selection.toggle(state.cursor);
            }
            KeyCode::Char(digit @ '1'..='9') => {
                let index = digit as usize - '1' as usize;
                if index < part_count {
                    state.cursor = index;
                    state.selection.toggle(index);
                }
            }
            KeyCode::Char('i' | '+') => state.custom_input = Some(TextInput::default()),
            KeyCode::Delete | KeyCode::Char('d') => {
                if let Some(position) = state.cursor.checked_sub(part_count) {
                    state.selection.remove_custom(position);
                }
            }
            KeyCode::Backspace => {
                state.selection.pop_custom();
            }
            KeyCode::Char('s') => state.selection.select_all(),
            _ => {}
        }
        // Cursor covers original parts followed by custom parts
        let rows = part_count + state.selection.custom().len();
        state.cursor = state.cursor.min(rows.saturating_sub(1));
        Mode::Edit(state)
    }

    fn handle_input_key(
        &mut self,
        purpose: InputPurpose,
        mut input: TextInput,
        code: KeyCode,
        terminal: &mut Term,
    ) -> Mode {
        match code {
            KeyCode::Esc => Mode::Browse,
            KeyCode::Enter => {
                let Some(path) = part_rename::expand_directory_input(&input.buffer) else {
                    return Mode::Browse;
                };
                match purpose {
                    InputPurpose::OpenDirectory => self.open_directory(&path),
                    InputPurpose::Destination(operation) => self.run_batch(operation, &path, terminal),
                }
            }
            _ => {
                input.handle_key(code);
                Mode::Input { purpose, input }
            }
        }
    }

    fn open_directory(&mut self, path: &Path) -> Mode {
        match self.session.open(path) {
            Ok(_) => {
                self.list_state.select(Some(0));
                self.clamp_selection();
                Mode::Browse
            }
            Err(error) => message("Error", &error.to_string()),
        }
    }

    fn run_batch(&mut self, operation: BatchOperation, destination: &Path, terminal: &mut Term) -> Mode {
        let result = if self.config.overwrite {
            self.session.run_batch(destination, operation, &mut FixedAnswer(true))
        } else {
            self.session
                .run_batch(destination, operation, &mut TuiPrompt { terminal })
        };

        match result {
            Ok(report) => {
                if let Some(logger) = self.logger.as_deref_mut() {
                    logger.log_batch(&report);
                }
                self.clamp_selection();
                let title = format!("{} result", operation.past_tense());
                message(&title, &report.summary())
            }
            Err(error) => message("Error", &error.to_string()),
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(10),   // File list or part editor
                Constraint::Length(3), // Status
                Constraint::Length(3), // Help
            ])
            .split(frame.area());

        let directory = self
            .session
            .directory()
            .map_or_else(|| "No directory".to_string(), |dir| dir.display().to_string());
        let header_text = format!(
            "{directory}  ({} files, {} to rename)",
            self.session.files().len(),
            self.session.pending_count()
        );
        let header = Paragraph::new(header_text)
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL).title("Part Rename"));
        frame.render_widget(header, chunks[0]);

        if let Mode::Edit(state) = &self.mode {
            let file_name = self
                .session
                .file(state.index)
                .map(|file| file.original_name.as_str())
                .unwrap_or_default();
            render_editor(frame, chunks[1], file_name, state);
        } else {
            render_file_list(frame, chunks[1], self.session.files(), &mut self.list_state);
        }

        let (status_text, status_style) = self.status_line();
        let status = Paragraph::new(status_text)
            .style(status_style)
            .block(Block::default().borders(Borders::ALL).title("Status"));
        frame.render_widget(status, chunks[2]);

        let help = Paragraph::new(self.help_text())
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Help"));
        frame.render_widget(help, chunks[3]);

        match &self.mode {
            Mode::ConfirmApply { text, .. } => render_popup(frame, "Apply to all", text, Color::Yellow),
            Mode::Input { purpose, input } => {
                let (before, after) = input.split_at_cursor();
                let text = format!("> {before}│{after}\n\nEnter: confirm | Esc: cancel");
                render_popup(frame, &purpose.title(), &text, Color::Green);
            }
            Mode::Preview { scroll } => render_preview(frame, self.session, *scroll),
            Mode::Message { title, text } => render_popup(frame, title, text, Color::White),
            Mode::Browse | Mode::Edit(_) | Mode::Quit => {}
        }
    }

    fn status_line(&self) -> (String, Style) {
        match &self.mode {
            Mode::Edit(state) => {
                if let Some(input) = &state.custom_input {
                    let (before, after) = input.split_at_cursor();
                    (
                        format!("Custom part: {before}│{after}"),
                        Style::default().fg(Color::Green),
                    )
                } else {
                    (
                        format!("New name: {}", state.selection.preview()),
                        Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
                    )
                }
            }
            _ => self.session.file(self.selected()).map_or_else(
                || ("No files".to_string(), Style::default()),
                |file| {
                    if file.is_changed() {
                        (
                            format!("{} → {}", file.original_name, file.new_name),
                            Style::default().fg(Color::Green),
                        )
                    } else {
                        (format!("Selected: {}", file.original_name), Style::default())
                    }
                },
            ),
        }
    }

    fn help_text(&self) -> &'static str {
        match &self.mode {
            Mode::Edit(state) if state.custom_input.is_some() => "Type custom part | Enter: add | Esc: cancel",
            Mode::Edit(_) => {
                "Space/1-9: toggle part | i: add custom | d: remove custom | Backspace: remove last custom | s: select all | Enter: save | Esc: cancel"
            }
            Mode::ConfirmApply { .. } => "y: apply | n: cancel",
            Mode::Input { .. } => "Type a path | Enter: confirm | Esc: cancel",
            Mode::Preview { .. } => "↑/↓: scroll | any other key: close",
            Mode::Message { .. } => "Press any key",
            Mode::Browse | Mode::Quit => {
                "Enter: edit | a: apply to all | u: undo | p: preview | c: copy | m: move | r: refresh | o: open | q: quit"
            }
        }
    }
}

fn message(title: &str, text: &str) -> Mode {
    Mode::Message {
        title: title.to_string(),
        text: text.to_string(),
    }
}

/// Render the file table
fn render_file_list(frame: &mut Frame, area: Rect, files: &[FileEntry], list_state: &mut ListState) {
    let name_width = files
        .iter()
        .map(|file| file.original_name.chars().count())
        .max()
        .unwrap_or(0)
        .min(40);

    let items: Vec<ListItem> = files
        .iter()
        .map(|file| {
            let mut spans = vec![
                Span::raw(format!("{:<name_width$}  ", file.original_name)),
                Span::styled(file.name_parts.join(" | "), Style::default().fg(Color::Cyan)),
            ];
            if file.is_changed() {
                spans.push(Span::raw("  →  "));
                spans.push(Span::styled(
                    file.new_name.clone(),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Files (↑/↓ to select)"))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::REVERSED))
        .highlight_symbol("► ");
    frame.render_stateful_widget(list, area, list_state);
}

/// Render the part editor for one file
fn render_editor(frame: &mut Frame, area: Rect, file_name: &str, state: &EditState) {
    let selection = &state.selection;
    let mut items: Vec<ListItem> = selection
        .parts()
        .iter()
        .enumerate()
        .map(|(index, part)| {
            let mark = if selection.is_selected(index) { "[x]" } else { "[ ]" };
            let style = if index == state.cursor {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{mark} {}. {part}", index + 1)).style(style)
        })
        .collect();

    let part_count = selection.parts().len();
    items.extend(selection.custom().iter().enumerate().map(|(position, custom)| {
        let style = if part_count + position == state.cursor {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Magenta)
        };
        ListItem::new(format!(" +  {custom}")).style(style)
    }));

    let mut list_state = ListState::default();
    list_state.select(Some(state.cursor));

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Edit {file_name}")),
    );
    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Render all pending renames in a scrollable popup
fn render_preview(frame: &mut Frame, session: &Session, scroll: u16) {
    let text = session
        .preview()
        .into_iter()
        .map(|(original, new)| format!("{original} → {new}"))
        .collect::<Vec<_>>()
        .join("\n");

    let area = centered_rect(80, frame.area().height.saturating_sub(4), frame.area());
    frame.render_widget(Clear, area);
    let preview = Paragraph::new(text)
        .scroll((scroll, 0))
        .block(Block::default().borders(Borders::ALL).title("Preview"));
    frame.render_widget(preview, area);
}

/// Render a centered popup with wrapped text
fn render_popup(frame: &mut Frame, title: &str, text: &str, color: Color) {
    let height = text.lines().count() as u16 + 4;
    let area = centered_rect(70, height, frame.area());
    frame.render_widget(Clear, area);
    let popup = Paragraph::new(text.to_string())
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(area);
    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(vertical[1])[1]
}
