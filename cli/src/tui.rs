//! Interactive Secret Santa UI using ratatui
//!
//! The [`App`] holds only view state. Key handling returns the request to
//! send, if any, and server replies are folded back in through
//! [`App::handle_server_message`], so the whole state machine runs without a
//! live connection.

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use std::io;
use uuid::Uuid;

use crate::client::SantaClient;
use crate::messages::{Assignment, Change, ClientMessage, Participant, ServerMessage};

const MIN_PARTICIPANTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Manage,
    Assignments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
}

/// The recipient shown for the giver picked in the assignments view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    pub giver_id: Uuid,
    pub receiver: Option<Participant>,
}

/// Application state for TUI
pub struct App {
    pub mode: ViewMode,
    pub field: Field,
    pub name_input: String,
    pub email_input: String,
    /// Participants in insertion order
    pub participants: Vec<Participant>,
    /// Last known assignment set
    pub assignments: Vec<Assignment>,
    /// Cursor in the manage list
    pub selected: usize,
    /// Giver picked in the assignments view
    pub picked: Option<Uuid>,
    pub reveal: Option<Reveal>,
    pub status: String,
    pub warning: bool,
    pub should_quit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            mode: ViewMode::Manage,
            field: Field::Name,
            name_input: String::new(),
            email_input: String::new(),
            participants: Vec::new(),
            assignments: Vec::new(),
            selected: 0,
            picked: None,
            reveal: None,
            status: "Connected".to_string(),
            warning: false,
            should_quit: false,
        }
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.warning = false;
    }

    fn warn(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.warning = true;
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            ViewMode::Manage => ViewMode::Assignments,
            ViewMode::Assignments => ViewMode::Manage,
        };
    }

    fn active_input(&mut self) -> &mut String {
        match self.field {
            Field::Name => &mut self.name_input,
            Field::Email => &mut self.email_input,
        }
    }

    /// Build an add request from the inputs; blank input does nothing
    pub fn submit_participant(&mut self) -> Option<ClientMessage> {
        let name = self.name_input.trim();
        let email = self.email_input.trim();
        if name.is_empty() || email.is_empty() {
            return None;
        }

        let msg = ClientMessage::AddParticipant {
            name: name.to_string(),
            email: email.to_string(),
        };
        self.name_input.clear();
        self.email_input.clear();
        self.field = Field::Name;
        Some(msg)
    }

    pub fn remove_selected(&mut self) -> Option<ClientMessage> {
        let participant = self.participants.get(self.selected)?;
        Some(ClientMessage::RemoveParticipant {
            participant_id: participant.id,
        })
    }

    /// Build an assign request, or warn when the group is too small
    pub fn request_assign(&mut self) -> Option<ClientMessage> {
        if self.participants.len() < MIN_PARTICIPANTS {
            self.warn("You need at least 2 participants to assign Secret Santas!");
            return None;
        }
        self.set_status("Drawing...");
        Some(ClientMessage::Assign)
    }

    /// Move the assignments-view picker and ask for the new giver's recipient
    pub fn move_picker(&mut self, down: bool) -> Option<ClientMessage> {
        if self.participants.is_empty() {
            return None;
        }

        let last = self.participants.len() - 1;
        let index = match self.picked_index() {
            None => {
                if down {
                    0
                } else {
                    last
                }
            }
            Some(i) if down => (i + 1).min(last),
            Some(i) => i.saturating_sub(1),
        };

        let giver_id = self.participants[index].id;
        self.picked = Some(giver_id);
        self.reveal = None;
        Some(ClientMessage::LookupReceiver { giver_id })
    }

    pub fn picked_index(&self) -> Option<usize> {
        let picked = self.picked?;
        self.participants.iter().position(|p| p.id == picked)
    }

    fn clamp_selection(&mut self) {
        if self.selected >= self.participants.len() {
            self.selected = self.participants.len().saturating_sub(1);
        }
    }

    /// Map a key press to a state change and, optionally, a request
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ClientMessage> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL)
            | (KeyCode::Char('q'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
                None
            }
            (KeyCode::Char('t'), KeyModifiers::CONTROL) => {
                self.toggle_mode();
                None
            }
            _ => match self.mode {
                ViewMode::Manage => self.handle_manage_key(key),
                ViewMode::Assignments => self.handle_assignments_key(key),
            },
        }
    }

    fn handle_manage_key(&mut self, key: KeyEvent) -> Option<ClientMessage> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('g'), KeyModifiers::CONTROL) => self.request_assign(),
            (KeyCode::Char('d'), KeyModifiers::CONTROL) | (KeyCode::Delete, _) => {
                self.remove_selected()
            }
            (KeyCode::Enter, _) => self.submit_participant(),
            (KeyCode::Tab, _) | (KeyCode::BackTab, _) => {
                self.field = match self.field {
                    Field::Name => Field::Email,
                    Field::Email => Field::Name,
                };
                None
            }
            (KeyCode::Backspace, _) => {
                self.active_input().pop();
                None
            }
            (KeyCode::Up, _) => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            (KeyCode::Down, _) => {
                self.selected += 1;
                self.clamp_selection();
                None
            }
            (KeyCode::Char(c), m) if !m.contains(KeyModifiers::CONTROL) => {
                self.active_input().push(c);
                None
            }
            _ => None,
        }
    }

    fn handle_assignments_key(&mut self, key: KeyEvent) -> Option<ClientMessage> {
        if self.assignments.is_empty() {
            return None;
        }
        match key.code {
            KeyCode::Down => self.move_picker(true),
            KeyCode::Up => self.move_picker(false),
            KeyCode::Esc => {
                self.picked = None;
                self.reveal = None;
                None
            }
            _ => None,
        }
    }

    fn participant_added(&mut self, participant: Participant) {
        if self.participants.iter().any(|p| p.id == participant.id) {
            return;
        }
        self.set_status(format!("Added {}", participant.name));
        self.participants.push(participant);
    }

    fn participant_removed(&mut self, participant_id: Uuid, invalidated: &[Assignment]) {
        self.participants.retain(|p| p.id != participant_id);
        self.assignments
            .retain(|a| a.giver_id != participant_id && a.receiver_id != participant_id);
        if self.picked == Some(participant_id) {
            self.picked = None;
            self.reveal = None;
        }
        if let Some(reveal) = &mut self.reveal {
            if invalidated.iter().any(|a| a.giver_id == reveal.giver_id) {
                reveal.receiver = None;
            }
        }
        self.clamp_selection();
        self.set_status("Participant removed");
    }

    fn assignments_replaced(&mut self, assignments: Vec<Assignment>) {
        if self.assignments != assignments {
            self.picked = None;
            self.reveal = None;
        }
        self.assignments = assignments;
    }

    pub fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::ParticipantAdded { participant } => self.participant_added(participant),
            ServerMessage::ParticipantRemoved {
                participant_id,
                invalidated,
            } => self.participant_removed(participant_id, &invalidated),
            ServerMessage::Participants { participants } => {
                self.participants = participants;
                if self.picked_index().is_none() {
                    self.picked = None;
                    self.reveal = None;
                }
                self.clamp_selection();
            }
            ServerMessage::Assigned { assignments, .. } => {
                self.assignments = assignments;
                self.picked = None;
                self.reveal = None;
                self.mode = ViewMode::Assignments;
                self.set_status("Assignments have been made!");
            }
            ServerMessage::Assignments { assignments, .. } => {
                self.assignments_replaced(assignments)
            }
            ServerMessage::Receiver { giver_id, receiver } => {
                if self.picked == Some(giver_id) {
                    self.reveal = Some(Reveal { giver_id, receiver });
                }
            }
            ServerMessage::SessionChanged { change } => self.apply_change(change),
            ServerMessage::Error { message } => {
                self.warn(message);
            }
        }
    }

    /// Fold in a change made by another client. A remote draw updates the
    /// data but leaves the current view alone.
    fn apply_change(&mut self, change: Change) {
        match change {
            Change::ParticipantAdded { participant } => self.participant_added(participant),
            Change::ParticipantRemoved {
                participant_id,
                invalidated,
            } => self.participant_removed(participant_id, &invalidated),
            Change::Assigned { assignments, .. } => {
                self.assignments = assignments;
                self.picked = None;
                self.reveal = None;
                self.set_status("Assignments were redrawn");
            }
        }
    }
}

/// Run the TUI
pub async fn run(mut client: SantaClient) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();

    for msg in [ClientMessage::ListParticipants, ClientMessage::GetAssignments] {
        if let Err(e) = client.send(msg).await {
            tracing::warn!("Failed to load state: {}", e);
        }
    }

    // Main loop
    loop {
        terminal.draw(|f| draw_ui(f, &app))?;

        // Handle events with timeout
        if event::poll(std::time::Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(msg) = app.handle_key(key) {
                    if let Err(e) = client.send(msg).await {
                        app.warn(format!("Error: {}", e));
                    }
                }
            }
        }

        // Check for server messages
        while let Some(msg) = client.try_recv() {
            app.handle_server_message(msg);
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(())
}

fn draw_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Mode tabs
            Constraint::Min(10),   // Body
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);

    match app.mode {
        ViewMode::Manage => draw_manage(f, app, chunks[1]),
        ViewMode::Assignments => draw_assignments(f, app, chunks[1]),
    }

    draw_status(f, app, chunks[2]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let selected = match app.mode {
        ViewMode::Manage => 0,
        ViewMode::Assignments => 1,
    };
    let tabs = Tabs::new(vec!["Manage Participants", "View Assignments"])
        .select(selected)
        .block(
            Block::default()
                .title(" Secret Santa ")
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .fg(if selected == 0 { Color::Red } else { Color::Green })
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn input_box<'a>(label: &'a str, value: &'a str, active: bool) -> Paragraph<'a> {
    let (text, style) = if value.is_empty() {
        (label, Style::default().fg(Color::DarkGray))
    } else {
        (value, Style::default().fg(Color::White))
    };

    Paragraph::new(text).style(style).block(
        Block::default()
            .title(format!(" {} ", label))
            .borders(Borders::ALL)
            .border_style(if active {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::DarkGray)
            }),
    )
}

fn draw_manage(f: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Inputs
            Constraint::Min(5),    // Participant list
            Constraint::Length(2), // Assign hint
        ])
        .split(area);

    let inputs = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    f.render_widget(input_box("Name", &app.name_input, app.field == Field::Name), inputs[0]);
    f.render_widget(input_box("Email", &app.email_input, app.field == Field::Email), inputs[1]);

    let (cursor_area, cursor_len) = match app.field {
        Field::Name => (inputs[0], app.name_input.chars().count()),
        Field::Email => (inputs[1], app.email_input.chars().count()),
    };
    f.set_cursor_position((cursor_area.x + 1 + cursor_len as u16, cursor_area.y + 1));

    let title = format!(" Participants ({}) ", app.participants.len());
    if app.participants.is_empty() {
        let empty = Paragraph::new("No participants yet. Add some to get started!")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title(title).borders(Borders::ALL));
        f.render_widget(empty, rows[1]);
    } else {
        let items: Vec<ListItem> = app
            .participants
            .iter()
            .enumerate()
            .map(|(i, p)| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                    Span::styled(p.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw("  "),
                    Span::styled(p.email.clone(), Style::default().fg(Color::Gray)),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(app.selected));
        f.render_stateful_widget(list, rows[1], &mut state);
    }

    let hint = if app.participants.len() < MIN_PARTICIPANTS {
        String::new()
    } else if app.assignments.is_empty() {
        "Ctrl+G to assign Secret Santas".to_string()
    } else {
        "Assignments have been made! Ctrl+T to view them. Ctrl+G to draw again.".to_string()
    };
    f.render_widget(
        Paragraph::new(hint)
            .style(Style::default().fg(Color::Green))
            .wrap(Wrap { trim: true }),
        rows[2],
    );
}

fn draw_assignments(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Secret Santa Assignments ")
        .borders(Borders::ALL);

    if app.assignments.is_empty() {
        let text = vec![
            Line::from("No assignments yet."),
            Line::from(""),
            Line::from(
                "Go to \"Manage Participants\" (Ctrl+T) and press Ctrl+G to create assignments.",
            ),
        ];
        f.render_widget(
            Paragraph::new(text)
                .style(Style::default().fg(Color::DarkGray))
                .block(block)
                .wrap(Wrap { trim: true }),
            area,
        );
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let items: Vec<ListItem> = app
        .participants
        .iter()
        .map(|p| ListItem::new(p.name.clone()))
        .collect();
    let picker = List::new(items)
        .block(block.title_bottom(" Up/Down to select your name "))
        .highlight_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(app.picked_index());
    f.render_stateful_widget(picker, columns[0], &mut state);

    let lines = match &app.reveal {
        Some(Reveal {
            receiver: Some(receiver),
            ..
        }) => vec![
            Line::from("You are Secret Santa for:"),
            Line::from(""),
            Line::from(Span::styled(
                receiver.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(receiver.email.clone(), Style::default().fg(Color::Gray))),
        ],
        Some(Reveal { receiver: None, .. }) => {
            vec![Line::from("No assignment for this participant.")]
        }
        None if app.picked.is_some() => vec![Line::from("Looking up...")],
        None => vec![Line::from("-- Select your name --")],
    };
    let tip = Line::from(Span::styled(
        "Tip: each person should select their own name. Keep it secret!",
        Style::default().fg(Color::DarkGray),
    ));

    let mut text = lines;
    text.push(Line::from(""));
    text.push(tip);

    f.render_widget(
        Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true }),
        columns[1],
    );
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let status_text = format!(" {} | Ctrl+T switch view | Ctrl+C to quit", app.status);

    let style = if app.warning {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    };

    f.render_widget(Paragraph::new(status_text).style(style), area);
}
