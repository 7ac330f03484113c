use crate::service::ChannelStore;
use crate::storage::channel::{Channel, ChannelInput};
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::*;
use tracing::debug;

pub enum AppMode {
    List,
    Search,
    Form,
    DeleteChannelConfirm,
    TagCreate,
    TagRename,
    TagDeleteConfirm,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Tags,
    Channels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Link,
    Name,
    Tags,
    Note,
    Favourite,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Link => FormField::Name,
            FormField::Name => FormField::Tags,
            FormField::Tags => FormField::Note,
            FormField::Note => FormField::Favourite,
            FormField::Favourite => FormField::Link,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::Link => FormField::Favourite,
            FormField::Name => FormField::Link,
            FormField::Tags => FormField::Name,
            FormField::Note => FormField::Tags,
            FormField::Favourite => FormField::Note,
        }
    }
}

/// Editable copy of a channel. Tags are typed as a comma separated line.
#[derive(Debug, Clone)]
pub struct ChannelForm {
    pub target_id: Option<String>,
    pub link: String,
    pub name: String,
    pub tags: String,
    pub note: String,
    pub favourite: bool,
    pub field: FormField,
}

impl ChannelForm {
    pub fn empty() -> Self {
        ChannelForm {
            target_id: None,
            link: String::new(),
            name: String::new(),
            tags: String::new(),
            note: String::new(),
            favourite: false,
            field: FormField::Link,
        }
    }

    pub fn for_channel(channel: &Channel) -> Self {
        let input = ChannelInput::from(channel);
        ChannelForm {
            target_id: Some(channel.id.clone()),
            link: input.link,
            name: input.name.unwrap_or_default(),
            tags: input.tags.join(", "),
            note: input.note.unwrap_or_default(),
            favourite: input.favourite,
            field: FormField::Link,
        }
    }

    pub fn to_input(&self) -> ChannelInput {
        ChannelInput {
            link: self.link.clone(),
            name: Some(self.name.clone()),
            tags: self.tags.split(',').map(|t| t.to_string()).collect(),
            note: Some(self.note.clone()),
            favourite: self.favourite,
        }
    }

    /// The tag being typed: whatever follows the last comma.
    fn tag_fragment(&self) -> &str {
        self.tags.rsplit(',').next().unwrap_or("").trim()
    }

    /// Tags already completed before the fragment.
    fn entered_tags(&self) -> Vec<&str> {
        let done = match self.tags.rfind(',') {
            Some(index) => &self.tags[..index],
            None => "",
        };
        done.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Known tags containing the fragment (case-insensitive), minus the
    /// ones this channel already has.
    pub fn tag_suggestions<'a>(&self, known: &'a [String]) -> Vec<&'a str> {
        let fragment = self.tag_fragment().to_lowercase();
        if fragment.is_empty() {
            return Vec::new();
        }
        let entered = self.entered_tags();
        known
            .iter()
            .map(String::as_str)
            .filter(|t| t.to_lowercase().contains(&fragment))
            .filter(|t| !entered.contains(t))
            .collect()
    }

    /// The fragment as a brand new tag, if no known or entered tag has
    /// exactly that name.
    pub fn new_tag_candidate(&self, known: &[String]) -> Option<&str> {
        let fragment = self.tag_fragment();
        let taken = fragment.is_empty()
            || known.iter().any(|t| t == fragment)
            || self.entered_tags().contains(&fragment);
        (!taken).then_some(fragment)
    }

    /// Replace the fragment with `tag` and start a new one.
    pub fn accept_tag(&mut self, tag: &str) {
        let mut entered: Vec<String> = self.entered_tags().into_iter().map(String::from).collect();
        entered.push(tag.to_string());
        self.tags = format!("{}, ", entered.join(", "));
    }

    fn active_buffer(&mut self) -> Option<&mut String> {
        match self.field {
            FormField::Link => Some(&mut self.link),
            FormField::Name => Some(&mut self.name),
            FormField::Tags => Some(&mut self.tags),
            FormField::Note => Some(&mut self.note),
            FormField::Favourite => None,
        }
    }
}

pub struct App {
    pub store: ChannelStore,
    pub mode: AppMode,
    pub focus: Focus,
    pub search_query: String,
    pub selected_index: usize,
    /// Sidebar cursor; 0 is "All Channels", `n` is the n-th tag.
    pub tag_cursor: usize,
    pub form: ChannelForm,
    pub input_buffer: String,
    pub pending_tag: Option<String>,
    pub pending_channel: Option<String>,
    pub should_quit: bool,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(store: ChannelStore) -> Self {
        App {
            store,
            mode: AppMode::List,
            focus: Focus::Channels,
            search_query: String::new(),
            selected_index: 0,
            tag_cursor: 0,
            form: ChannelForm::empty(),
            input_buffer: String::new(),
            pending_tag: None,
            pending_channel: None,
            should_quit: false,
            status_message: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        match self.mode {
            AppMode::List => self.handle_list_key(key),
            AppMode::Search => self.handle_search_key(key),
            AppMode::Form => self.handle_form_key(key, modifiers),
            AppMode::DeleteChannelConfirm => self.handle_delete_channel_key(key),
            AppMode::TagCreate => self.handle_tag_create_key(key),
            AppMode::TagRename => self.handle_tag_rename_key(key),
            AppMode::TagDeleteConfirm => self.handle_tag_delete_key(key),
            AppMode::Help => self.handle_help_key(key),
        }
    }

    fn visible_channels(&self) -> Vec<&Channel> {
        self.store.visible_channels(&self.search_query)
    }

    fn selected_channel(&self) -> Option<Channel> {
        self.visible_channels()
            .get(self.selected_index)
            .map(|c| (*c).clone())
    }

    /// The tag under the sidebar cursor, `None` for "All Channels".
    fn tag_at_cursor(&self) -> Option<String> {
        match self.tag_cursor {
            0 => None,
            n => self.store.tag_index().tags.get(n - 1).cloned(),
        }
    }

    fn clamp_cursors(&mut self) {
        let channel_count = self.visible_channels().len();
        if self.selected_index >= channel_count {
            self.selected_index = channel_count.saturating_sub(1);
        }
        let tag_count = self.store.tag_index().tags.len();
        if self.tag_cursor > tag_count {
            self.tag_cursor = tag_count;
        }
    }

    /// Report a finished mutation, preferring any storage failure.
    fn finish_mutation(&mut self, message: String) {
        self.clamp_cursors();
        self.status_message = match self.store.take_persist_error() {
            Some(e) => Some(format!("✗ {}", e)),
            None => Some(message),
        };
    }

    fn open_new_channel_form(&mut self) {
        self.form = ChannelForm::empty();
        self.mode = AppMode::Form;
        self.status_message = None;
    }

    fn open_tag_create(&mut self) {
        self.input_buffer.clear();
        self.mode = AppMode::TagCreate;
        self.status_message = None;
    }

    fn handle_list_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                if !self.search_query.is_empty() {
                    self.search_query.clear();
                    self.selected_index = 0;
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Tags => Focus::Channels,
                    Focus::Channels => Focus::Tags,
                };
            }
            KeyCode::Char('/') => {
                self.mode = AppMode::Search;
                self.input_buffer = self.search_query.clone();
            }
            KeyCode::Char('#') => {
                self.mode = AppMode::Search;
                self.input_buffer = String::from("#");
                self.search_query = self.input_buffer.clone();
            }
            KeyCode::Char('?') => {
                self.mode = AppMode::Help;
            }
            KeyCode::Char('a') => {
                self.open_new_channel_form();
            }
            KeyCode::Char('t') => {
                self.open_tag_create();
            }
            _ => match self.focus {
                Focus::Channels => self.handle_channel_pane_key(key),
                Focus::Tags => self.handle_tag_pane_key(key),
            },
        }
    }

    fn handle_channel_pane_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('j') | KeyCode::Down => {
                let max_index = self.visible_channels().len().saturating_sub(1);
                if self.selected_index < max_index {
                    self.selected_index += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_index = self.selected_index.saturating_sub(1);
            }
            KeyCode::Char('n') => {
                self.open_new_channel_form();
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(channel) = self.selected_channel() {
                    self.form = ChannelForm::for_channel(&channel);
                    self.mode = AppMode::Form;
                    self.status_message = None;
                }
            }
            KeyCode::Char('d') => {
                if let Some(channel) = self.selected_channel() {
                    self.pending_channel = Some(channel.id);
                    self.mode = AppMode::DeleteChannelConfirm;
                }
            }
            KeyCode::Char('o') => {
                if let Some(channel) = self.selected_channel() {
                    self.status_message = Some(format!("🔗 {}", channel.link));
                }
            }
            _ => {}
        }
    }

    fn handle_tag_pane_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.tag_cursor < self.store.tag_index().tags.len() {
                    self.tag_cursor += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.tag_cursor = self.tag_cursor.saturating_sub(1);
            }
            KeyCode::Char('n') => {
                self.open_tag_create();
            }
            KeyCode::Enter => {
                let tag = self.tag_at_cursor();
                debug!(tag = ?tag, "tag selected");
                self.store.select_tag(tag);
                self.selected_index = 0;
            }
            KeyCode::Char('r') => {
                if let Some(tag) = self.tag_at_cursor() {
                    self.input_buffer = tag.clone();
                    self.pending_tag = Some(tag);
                    self.mode = AppMode::TagRename;
                    self.status_message = None;
                }
            }
            KeyCode::Char('d') => {
                if let Some(tag) = self.tag_at_cursor() {
                    self.pending_tag = Some(tag);
                    self.mode = AppMode::TagDeleteConfirm;
                }
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.mode = AppMode::List;
                self.input_buffer.clear();
                self.search_query.clear();
                self.selected_index = 0;
            }
            KeyCode::Enter => {
                self.search_query = self.input_buffer.trim().to_string();
                self.input_buffer.clear();
                self.selected_index = 0;
                self.mode = AppMode::List;
            }
            KeyCode::Char(c) => {
                self.input_buffer.push(c);
                // Live search as you type
                self.search_query = self.input_buffer.clone();
                self.selected_index = 0;
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
                self.search_query = self.input_buffer.clone();
                self.selected_index = 0;
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        match key {
            KeyCode::Esc => {
                self.mode = AppMode::List;
            }
            KeyCode::Char('s') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.save_form();
            }
            KeyCode::Tab | KeyCode::Enter => {
                self.form.field = self.form.field.next();
            }
            KeyCode::BackTab => {
                self.form.field = self.form.field.prev();
            }
            KeyCode::Right if self.form.field == FormField::Tags => {
                self.accept_tag_suggestion();
            }
            KeyCode::Char('n')
                if self.form.field == FormField::Tags
                    && modifiers.contains(KeyModifiers::CONTROL) =>
            {
                self.accept_tag_suggestion();
            }
            KeyCode::Char(' ') if self.form.field == FormField::Favourite => {
                self.form.favourite = !self.form.favourite;
            }
            KeyCode::Char(c) => {
                if let Some(buffer) = self.form.active_buffer() {
                    buffer.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(buffer) = self.form.active_buffer() {
                    buffer.pop();
                }
            }
            _ => {}
        }
    }

    fn accept_tag_suggestion(&mut self) {
        let known = self.store.tag_index().tags;
        let choice = self
            .form
            .tag_suggestions(&known)
            .first()
            .copied()
            .or_else(|| self.form.new_tag_candidate(&known))
            .map(str::to_string);
        if let Some(tag) = choice {
            self.form.accept_tag(&tag);
        }
    }

    fn save_form(&mut self) {
        let input = self.form.to_input();
        match self.store.save_channel(input, self.form.target_id.as_deref()) {
            Ok(id) => {
                let name = self
                    .store
                    .get_channel(&id)
                    .map(|c| c.display_name().to_string())
                    .unwrap_or_default();
                self.mode = AppMode::List;
                self.finish_mutation(format!("✓ Saved: {}", name));
            }
            Err(e) => {
                // Keep the form open so the link can be filled in
                self.form.field = FormField::Link;
                self.status_message = Some(format!("✗ {}", e));
            }
        }
    }

    fn handle_delete_channel_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Enter => {
                if let Some(id) = self.pending_channel.take() {
                    let name = self
                        .store
                        .get_channel(&id)
                        .map(|c| c.display_name().to_string())
                        .unwrap_or_default();
                    if self.store.delete_channel(&id) {
                        self.finish_mutation(format!("✓ Deleted: {}", name));
                    }
                }
                self.mode = AppMode::List;
            }
            KeyCode::Esc | KeyCode::Char('n') => {
                self.pending_channel = None;
                self.mode = AppMode::List;
            }
            _ => {}
        }
    }

    fn handle_tag_create_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.input_buffer.clear();
                self.mode = AppMode::List;
            }
            KeyCode::Enter => match self.store.validate_new_tag_name(&self.input_buffer, None) {
                Ok(name) => {
                    self.store.create_standalone_tag(&name);
                    self.input_buffer.clear();
                    self.mode = AppMode::List;
                    self.finish_mutation(format!("✓ Tag created: {}", name));
                }
                Err(e) => {
                    self.status_message = Some(format!("✗ {}", e));
                }
            },
            KeyCode::Char(c) => {
                self.input_buffer.push(c);
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            _ => {}
        }
    }

    fn handle_tag_rename_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.input_buffer.clear();
                self.pending_tag = None;
                self.mode = AppMode::List;
            }
            KeyCode::Enter => {
                if let Some(old_name) = self.pending_tag.take() {
                    match self
                        .store
                        .validate_new_tag_name(&self.input_buffer, Some(&old_name))
                    {
                        Ok(new_name) => {
                            self.store.rename_tag(&old_name, &new_name);
                            self.finish_mutation(format!("✓ Renamed {} to {}", old_name, new_name));
                        }
                        Err(e) => {
                            self.status_message = Some(format!("✗ {}", e));
                        }
                    }
                }
                self.input_buffer.clear();
                self.mode = AppMode::List;
            }
            KeyCode::Char(c) => {
                self.input_buffer.push(c);
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            _ => {}
        }
    }

    fn handle_tag_delete_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Enter => {
                if let Some(tag) = self.pending_tag.take() {
                    self.store.delete_tag(&tag);
                    self.finish_mutation(format!("✓ Tag deleted: {}", tag));
                }
                self.mode = AppMode::List;
            }
            KeyCode::Esc | KeyCode::Char('n') => {
                self.pending_tag = None;
                self.mode = AppMode::List;
            }
            _ => {}
        }
    }

    fn handle_help_key(&mut self, key: KeyCode) {
        if matches!(key, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            self.mode = AppMode::List;
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        match self.mode {
            AppMode::List | AppMode::Search => self.render_list(frame),
            AppMode::Form => self.render_form(frame),
            AppMode::DeleteChannelConfirm => self.render_delete_channel(frame),
            AppMode::TagCreate | AppMode::TagRename => self.render_tag_input(frame),
            AppMode::TagDeleteConfirm => self.render_tag_delete(frame),
            AppMode::Help => self.render_help(frame),
        }
    }

    fn screen_chunks(frame: &Frame) -> std::rc::Rc<[Rect]> {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area())
    }

    fn render_title(&self, frame: &mut Frame, area: Rect) {
        let title_text = match self.store.selected_tag() {
            Some(tag) => format!("chantags - {} Channels", tag),
            None => format!("chantags - All Channels ({})", self.store.channels().len()),
        };
        let title = Paragraph::new(title_text)
            .block(Block::default().borders(Borders::ALL).title("chantags"))
            .style(Style::default().fg(Color::Cyan));
        frame.render_widget(title, area);
    }

    fn render_help_bar(&self, frame: &mut Frame, area: Rect, keys: &str) {
        let (text, style) = match self.status_message {
            Some(ref message) => (message.as_str(), Style::default().fg(Color::Yellow)),
            None => (keys, Style::default().fg(Color::DarkGray)),
        };
        let help = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .style(style);
        frame.render_widget(help, area);
    }

    fn render_list(&self, frame: &mut Frame) {
        let chunks = Self::screen_chunks(frame);
        self.render_title(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(0)])
            .split(chunks[1]);

        self.render_sidebar(frame, body[0]);
        self.render_channels(frame, body[1]);

        let keys = match (&self.mode, self.focus) {
            (AppMode::Search, _) => "Type to search (#tag for tags) | Enter: apply | Esc: clear",
            (_, Focus::Tags) => "j/k: navigate | Enter: select | n: new tag | r: rename | d: delete | Tab: channels | a: add channel | ?: help | q: quit",
            (_, Focus::Channels) => "j/k: navigate | n: new | e: edit | d: delete | o: link | /: search | #: tag search | Tab: tags | ?: help | q: quit",
        };
        self.render_help_bar(frame, chunks[2], keys);
    }

    fn render_sidebar(&self, frame: &mut Frame, area: Rect) {
        let snapshot = self.store.snapshot();
        let focused = self.focus == Focus::Tags && matches!(self.mode, AppMode::List);

        let mut items = Vec::with_capacity(snapshot.all_tags.len() + 1);
        let all_style = if snapshot.selected_tag.is_none() {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        items.push(ListItem::new(Line::from(vec![
            Span::styled("All Channels", all_style),
            Span::styled(
                format!(" {}", snapshot.channels.len()),
                Style::default().fg(Color::DarkGray),
            ),
        ])));

        for tag in &snapshot.all_tags {
            let style = if snapshot.selected_tag == Some(tag.as_str()) {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else if self.store.standalone_tags().contains(tag) {
                // Created ahead of use, no channels yet
                Style::default().fg(Color::Blue).add_modifier(Modifier::ITALIC)
            } else {
                Style::default().fg(Color::Blue)
            };
            let count = snapshot.tag_counts.get(tag).copied().unwrap_or(0);
            items.push(ListItem::new(Line::from(vec![
                Span::styled(format!("#{}", tag), style),
                Span::styled(format!(" {}", count), Style::default().fg(Color::DarkGray)),
            ])));
        }

        let mut state = ListState::default();
        if focused {
            state.select(Some(self.tag_cursor));
        }

        let border_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title("Tags"),
            )
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_channels(&self, frame: &mut Frame, area: Rect) {
        let channels = self.visible_channels();
        let focused = self.focus == Focus::Channels || matches!(self.mode, AppMode::Search);

        let items: Vec<ListItem> = channels
            .iter()
            .map(|channel| {
                let mut title = vec![Span::styled(
                    channel.display_name(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                )];
                if channel.favourite {
                    title.push(Span::styled(" ★", Style::default().fg(Color::Red)));
                }

                let mut lines = vec![Line::from(title)];
                lines.push(Line::from(Span::styled(
                    channel.link.as_str(),
                    Style::default().fg(Color::DarkGray),
                )));

                if !channel.tags.is_empty() {
                    let tags_str = channel
                        .tags
                        .iter()
                        .map(|t| format!("#{}", t))
                        .collect::<Vec<_>>()
                        .join(" ");
                    lines.push(Line::from(Span::styled(tags_str, Style::default().fg(Color::Blue))));
                }

                if let Some(ref note) = channel.note {
                    let first_line = note.lines().next().unwrap_or("").trim();
                    let preview: String = if first_line.chars().count() > 60 {
                        format!("{}...", first_line.chars().take(60).collect::<String>())
                    } else {
                        first_line.to_string()
                    };
                    lines.push(Line::from(Span::styled(preview, Style::default().fg(Color::Gray))));
                }
                lines.push(Line::default());

                ListItem::new(lines)
            })
            .collect();

        let mut state = ListState::default();
        if focused && !channels.is_empty() {
            state.select(Some(self.selected_index));
        }

        let count_label = match channels.len() {
            1 => "1 channel".to_string(),
            n => format!("{} channels", n),
        };
        let list_title = if self.search_query.is_empty() {
            count_label
        } else {
            format!("{} matching \"{}\"", count_label, self.search_query)
        };

        let border_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };

        if channels.is_empty() {
            let message = if self.search_query.is_empty() && self.store.selected_tag().is_none() {
                "No channels yet. Press 'a' to add your first channel."
            } else {
                "No channels found matching your criteria."
            };
            let empty = Paragraph::new(message)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(border_style)
                        .title(list_title),
                )
                .style(Style::default().fg(Color::DarkGray))
                .wrap(Wrap { trim: true });
            frame.render_widget(empty, area);
            return;
        }

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(list_title),
            )
            .highlight_style(Style::default().fg(Color::Yellow).bg(Color::DarkGray))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_form(&self, frame: &mut Frame) {
        let chunks = Self::screen_chunks(frame);
        self.render_title(frame, chunks[0]);

        let form = &self.form;
        let field_line = |label: &str, value: &str, field: FormField| {
            let active = form.field == field;
            let label_style = if active {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            let cursor = if active { "█" } else { "" };
            Line::from(vec![
                Span::styled(format!("{:<10}", label), label_style),
                Span::raw(value.to_string()),
                Span::styled(cursor, Style::default().fg(Color::Yellow)),
            ])
        };

        let favourite = if form.favourite { "[x]" } else { "[ ]" };
        let mut lines = vec![
            field_line("Link *", &form.link, FormField::Link),
            Line::default(),
            field_line("Name", &form.name, FormField::Name),
            Line::default(),
            field_line("Tags", &form.tags, FormField::Tags),
        ];

        if form.field == FormField::Tags {
            let known = self.store.tag_index().tags;
            let mut hints = vec![Span::raw(format!("{:<10}", ""))];
            for tag in form.tag_suggestions(&known).into_iter().take(8) {
                hints.push(Span::styled(format!("#{} ", tag), Style::default().fg(Color::Blue)));
            }
            if let Some(tag) = form.new_tag_candidate(&known) {
                hints.push(Span::styled(
                    format!("+ Create \"{}\"", tag),
                    Style::default().fg(Color::Green),
                ));
            }
            if hints.len() > 1 {
                lines.push(Line::from(hints));
            } else {
                lines.push(Line::default());
            }
        } else {
            lines.push(Line::default());
        }

        lines.extend([
            field_line("Note", &form.note, FormField::Note),
            Line::default(),
            field_line("Favourite", favourite, FormField::Favourite),
        ]);

        let title = if form.target_id.is_some() {
            "Edit Channel"
        } else {
            "Add Channel"
        };
        let body = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false });
        frame.render_widget(body, chunks[1]);

        self.render_help_bar(
            frame,
            chunks[2],
            "Tab/Shift+Tab: move | Space: toggle favourite | tags: comma separated, →/Ctrl+N: accept suggestion | Ctrl+S: save | Esc: cancel",
        );
    }

    fn render_delete_channel(&self, frame: &mut Frame) {
        let chunks = Self::screen_chunks(frame);
        self.render_title(frame, chunks[0]);

        let name = self
            .pending_channel
            .as_deref()
            .and_then(|id| self.store.get_channel(id))
            .map(|c| c.display_name())
            .unwrap_or("this channel");
        let message = format!(
            "Are you sure you want to delete \"{}\"?\n\nPress Enter/y to confirm, Esc/n to cancel",
            name
        );
        let confirm = Paragraph::new(message)
            .block(Block::default().borders(Borders::ALL).title("Confirm Delete"))
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::Red));
        frame.render_widget(confirm, chunks[1]);

        self.render_help_bar(frame, chunks[2], "Enter/y: confirm | Esc/n: cancel");
    }

    fn render_tag_input(&self, frame: &mut Frame) {
        let chunks = Self::screen_chunks(frame);
        self.render_title(frame, chunks[0]);

        let title = match (&self.mode, self.pending_tag.as_deref()) {
            (AppMode::TagRename, Some(tag)) => format!("Rename Tag #{}", tag),
            _ => "Create Tag".to_string(),
        };
        let input = Paragraph::new(format!("{}█", self.input_buffer))
            .block(Block::default().borders(Borders::ALL).title(title))
            .style(Style::default().fg(Color::White));
        frame.render_widget(input, chunks[1]);

        self.render_help_bar(frame, chunks[2], "Type tag name | Enter: confirm | Esc: cancel");
    }

    fn render_tag_delete(&self, frame: &mut Frame) {
        let chunks = Self::screen_chunks(frame);
        self.render_title(frame, chunks[0]);

        let tag = self.pending_tag.as_deref().unwrap_or("");
        let message = format!(
            "Are you sure you want to delete the tag \"{}\"? This will remove it from all channels.\n\nPress Enter/y to confirm, Esc/n to cancel",
            tag
        );
        let confirm = Paragraph::new(message)
            .block(Block::default().borders(Borders::ALL).title("Confirm Delete"))
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::Red));
        frame.render_widget(confirm, chunks[1]);

        self.render_help_bar(frame, chunks[2], "Enter/y: confirm | Esc/n: cancel");
    }

    fn render_help(&self, frame: &mut Frame) {
        let chunks = Self::screen_chunks(frame);
        self.render_title(frame, chunks[0]);

        let help_text = r#"📖 Keyboard Shortcuts

ANYWHERE IN THE LIST:
  Tab            Switch between tags and channels
  a              Add channel (same as n in channels)
  t              Create tag (same as n in tags)
  /              Search by name, tag or note
  #              Search by tag
  ?              Show this help
  Esc            Clear search (or quit)
  q              Quit

CHANNELS:
  j / ↓          Navigate down
  k / ↑          Navigate up
  n              Add channel
  e / Enter      Edit channel
  d              Delete channel
  o              Show channel link

TAGS:
  j / k          Navigate
  Enter          Filter by tag ("All Channels" clears)
  n              Create tag
  r              Rename tag
  d              Delete tag from every channel

CHANNEL FORM:
  Tab / Shift+Tab  Next / previous field
  Space          Toggle favourite
  → / Ctrl+N     Accept first tag suggestion
  Ctrl+S         Save
  Esc            Cancel
"#;

        let help_para = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Keyboard Shortcuts"))
            .wrap(Wrap { trim: false })
            .style(Style::default().fg(Color::White));
        frame.render_widget(help_para, chunks[1]);

        self.render_help_bar(frame, chunks[2], "Esc: back");
    }
}
