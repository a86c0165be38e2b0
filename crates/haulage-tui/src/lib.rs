// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use haulage_app::export::INVOICE_COLUMNS;
use haulage_app::nav;
use haulage_app::{
    AppCommand, AppEvent, AppState, Credentials, DashboardData, Export, ExportFormat, Invoice,
    InvoiceBrowser, InvoiceDraft, LineItemId, LineItemPatch, LoginErrors, LoginForm, Notification,
    PageNav, Pager, QuickAction, QuickActionOutcome, RecordStore, ScreenKind, TopbarMenu, Trip,
    TripFilterForm, TripSelection, VisibleSlice, format_cents,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, info, warn};

/// Below this many columns the invoice list switches to cards and the
/// sidebar becomes a drawer.
pub const NARROW_WIDTH: u16 = 100;
const SIDEBAR_WIDTH: u16 = 28;
const SIDEBAR_COLLAPSED_WIDTH: u16 = 6;
const FALLBACK_WIDTH: u16 = 120;
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const POLL_INTERVAL: Duration = Duration::from_millis(120);

const FILTER_FIELDS: [&str; 7] = [
    "Drop Address",
    "Driver",
    "Vehicle",
    "From Date",
    "To Date",
    "Bill To",
    "Fuel Levy",
];

/// Everything the terminal UI needs from the outside world.
///
/// The `spawn_*` defaults run inline and report through `tx`; real runtimes
/// override them to do the work on a background thread.
pub trait AppRuntime {
    fn credentials(&self) -> Credentials;
    fn pager(&self) -> Pager;
    fn load_invoices(&mut self) -> Result<Vec<Invoice>>;
    fn load_dashboard(&mut self) -> Result<DashboardData>;
    fn load_trips(&mut self) -> Result<Vec<Trip>>;
    fn load_notifications(&mut self) -> Vec<Notification>;
    fn load_quick_actions(&mut self) -> Vec<QuickAction>;
    fn perform_quick_action(&mut self, action_id: &str) -> QuickActionOutcome;
    fn write_export(&mut self, export: &Export) -> Result<PathBuf>;
    fn write_print_document(&mut self, html: &str) -> Result<PathBuf>;
    fn copy_to_clipboard(&mut self, text: &str) -> Result<()>;
    fn now(&self) -> OffsetDateTime;
    fn spawn_feed_refresh(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let event = InternalEvent::FeedLoaded {
            notifications: self.load_notifications(),
            quick_actions: self.load_quick_actions(),
        };
        tx.send(event)
            .map_err(|_| anyhow!("feed event channel closed"))?;
        Ok(())
    }
    fn spawn_quick_action(&mut self, action: QuickAction, tx: Sender<InternalEvent>) -> Result<()> {
        let outcome = self.perform_quick_action(&action.id);
        tx.send(InternalEvent::QuickActionFinished {
            label: action.label,
            outcome,
        })
        .map_err(|_| anyhow!("quick action channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    FeedLoaded {
        notifications: Vec<Notification>,
        quick_actions: Vec<QuickAction>,
    },
    QuickActionFinished {
        label: String,
        outcome: QuickActionOutcome,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListLayout {
    Table,
    Cards,
}

impl ListLayout {
    pub fn for_width(width: u16) -> Self {
        if width < NARROW_WIDTH {
            Self::Cards
        } else {
            Self::Table
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LoginField {
    #[default]
    Email,
    Password,
}

#[derive(Debug, Clone, Default)]
struct LoginView {
    form: LoginForm,
    focus: LoginField,
    errors: LoginErrors,
    reveal_password: bool,
}

impl LoginView {
    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }

    fn edit(&mut self, edit: FieldEdit) {
        let (value, error) = match self.focus {
            LoginField::Email => (&mut self.form.email, &mut self.errors.email),
            LoginField::Password => (&mut self.form.password, &mut self.errors.password),
        };
        edit_text(value, edit);
        *error = None;
    }
}

#[derive(Debug, Clone, Default)]
struct ListView {
    browser: Option<InvoiceBrowser>,
    searching: bool,
    cursor: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NewInvoiceFocus {
    Filter,
    Trips,
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DraftField {
    Customer,
    Notes,
    TaxPercent,
    Description(LineItemId),
    Qty(LineItemId),
    Rate(LineItemId),
}

impl DraftField {
    fn item_id(self) -> Option<LineItemId> {
        match self {
            Self::Description(id) | Self::Qty(id) | Self::Rate(id) => Some(id),
            Self::Customer | Self::Notes | Self::TaxPercent => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldEdit {
    Push(char),
    Pop,
}

#[derive(Debug, Clone)]
struct NewInvoiceView {
    focus: NewInvoiceFocus,
    filter_values: [String; 7],
    filter_cursor: usize,
    filter: Option<TripFilterForm>,
    trips: Vec<Trip>,
    selection: TripSelection,
    trip_cursor: usize,
    draft: InvoiceDraft,
    draft_cursor: usize,
}

impl NewInvoiceView {
    fn new(trips: Vec<Trip>, today: Date) -> Self {
        let mut filter_values: [String; 7] = Default::default();
        filter_values[3] = today.to_string();
        filter_values[4] = today.to_string();
        Self {
            focus: NewInvoiceFocus::Filter,
            filter_values,
            filter_cursor: 0,
            filter: None,
            selection: TripSelection::new(&trips),
            trips,
            trip_cursor: 0,
            draft: InvoiceDraft::new(today),
            draft_cursor: 0,
        }
    }

    fn reachable_sections(&self) -> Vec<NewInvoiceFocus> {
        let mut sections = vec![NewInvoiceFocus::Filter];
        if self.filter.is_some() {
            sections.push(NewInvoiceFocus::Trips);
            if self.selection.can_proceed() {
                sections.push(NewInvoiceFocus::Draft);
            }
        }
        sections
    }

    fn cycle_focus(&mut self, forward: bool) {
        let sections = self.reachable_sections();
        let len = sections.len();
        let position = sections
            .iter()
            .position(|section| *section == self.focus)
            .unwrap_or(0);
        let next = if forward {
            (position + 1) % len
        } else {
            (position + len - 1) % len
        };
        self.focus = sections[next];
    }
}

#[derive(Debug, Clone, Default)]
struct ViewData {
    width: u16,
    login: LoginView,
    dashboard: Option<DashboardData>,
    list: ListView,
    new_invoice: Option<NewInvoiceView>,
    notifications: Vec<Notification>,
    quick_actions: Vec<QuickAction>,
    action_in_flight: Option<String>,
    status_token: u64,
}

impl ViewData {
    fn new(width: u16) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    /// Drops everything loaded for the signed-in session.
    fn reset_session(&mut self) {
        *self = Self {
            width: self.width,
            status_token: self.status_token,
            ..Self::default()
        };
    }
}

/// What a screen handler wants done once it has released its borrows.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Followup {
    Nothing,
    Status(String),
    Command(AppCommand),
    CommandThenStatus(AppCommand, String),
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let width = terminal
        .size()
        .map(|size| size.width)
        .unwrap_or(FALLBACK_WIDTH);
    let mut view_data = ViewData::new(width);
    let (internal_tx, internal_rx) = mpsc::channel();

    if state.shows_chrome() {
        if let Err(error) = load_screen_data(state.screen, runtime, &mut view_data) {
            state.dispatch(AppCommand::SetStatus(format!("load failed: {error:#}")));
        }
        start_feed_refresh(state, runtime, &mut view_data, &internal_tx);
    }
    info!(screen = state.screen.route(), width, "terminal ui started");

    let result = event_loop(
        &mut terminal,
        state,
        runtime,
        &mut view_data,
        &internal_tx,
        &internal_rx,
    );

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn event_loop<R: AppRuntime>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    internal_rx: &Receiver<InternalEvent>,
) -> Result<()> {
    loop {
        process_internal_events(state, view_data, internal_tx, internal_rx);

        terminal
            .draw(|frame| render(frame, state, view_data))
            .context("draw frame")?;

        if !event::poll(POLL_INTERVAL).context("poll event")? {
            continue;
        }
        match event::read().context("read event")? {
            Event::Key(key) => {
                if handle_key_event(state, runtime, view_data, internal_tx, key) {
                    info!("quit requested");
                    return Ok(());
                }
            }
            Event::Resize(width, _) => view_data.width = width,
            _ => {}
        }
    }
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::FeedLoaded {
                notifications,
                quick_actions,
            } => {
                debug!(
                    notifications = notifications.len(),
                    quick_actions = quick_actions.len(),
                    "feed loaded"
                );
                let unread = notifications.len();
                view_data.notifications = notifications;
                view_data.quick_actions = quick_actions;
                state.dispatch(AppCommand::SetUnread(unread));
            }
            InternalEvent::QuickActionFinished { label, outcome } => {
                view_data.action_in_flight = None;
                let message = match outcome {
                    QuickActionOutcome::Completed => format!("{label}: done"),
                    QuickActionOutcome::Simulated => {
                        format!("{label}: done (simulated, feed server unavailable)")
                    }
                };
                emit_status(state, view_data, tx, message);
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

/// Applies `command` and reacts to the events it produced.
fn dispatch<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    for event in state.dispatch(command) {
        match event {
            AppEvent::ScreenChanged(screen) => {
                debug!(screen = screen.route(), "screen changed");
                if let Err(error) = load_screen_data(screen, runtime, view_data) {
                    warn!(
                        screen = screen.route(),
                        error = %format!("{error:#}"),
                        "screen data failed to load"
                    );
                    emit_status(state, view_data, internal_tx, format!("load failed: {error:#}"));
                }
            }
            AppEvent::SignedOut => {
                info!("signed out");
                view_data.reset_session();
            }
            AppEvent::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(internal_tx, view_data.status_token);
            }
            _ => {}
        }
    }
}

/// Loads whatever `screen` renders, once per session.
fn load_screen_data<R: AppRuntime>(
    screen: ScreenKind,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Result<()> {
    match screen {
        ScreenKind::Login => {}
        ScreenKind::Dashboard => {
            if view_data.dashboard.is_none() {
                view_data.dashboard = Some(runtime.load_dashboard()?);
            }
        }
        ScreenKind::InvoiceList => {
            if view_data.list.browser.is_none() {
                let store = RecordStore::new(runtime.load_invoices()?)?;
                debug!(records = store.len(), "invoice list loaded");
                view_data.list = ListView {
                    browser: Some(InvoiceBrowser::new(store, runtime.pager())),
                    ..ListView::default()
                };
            }
        }
        ScreenKind::InvoiceNew => {
            if view_data.new_invoice.is_none() {
                let trips = runtime.load_trips()?;
                view_data.new_invoice = Some(NewInvoiceView::new(trips, runtime.now().date()));
            }
        }
    }
    Ok(())
}

fn start_feed_refresh<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Err(error) = runtime.spawn_feed_refresh(internal_tx.clone()) {
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("feed refresh failed: {error:#}"),
        );
    }
}

fn apply_followup<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    followup: Followup,
) {
    match followup {
        Followup::Nothing => {}
        Followup::Status(message) => emit_status(state, view_data, internal_tx, message),
        Followup::Command(command) => dispatch(state, runtime, view_data, internal_tx, command),
        Followup::CommandThenStatus(command, message) => {
            dispatch(state, runtime, view_data, internal_tx, command);
            emit_status(state, view_data, internal_tx, message);
        }
    }
}

/// Returns true when the app should quit.
fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('q') {
        return true;
    }

    if state.logout_prompt {
        handle_logout_prompt_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if !state.shows_chrome() {
        handle_login_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if ctrl
        && let KeyCode::Char(ch) = key.code
        && let Some(command) = chrome_command(state, view_data.width, ch)
    {
        dispatch(state, runtime, view_data, internal_tx, command);
        return false;
    }

    if state.open_menu.is_some() {
        handle_menu_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    match state.screen {
        ScreenKind::Login => {}
        ScreenKind::Dashboard => {
            if key.code == KeyCode::Char('r') && !ctrl {
                emit_status(state, view_data, internal_tx, "refreshing feed");
                start_feed_refresh(state, runtime, view_data, internal_tx);
            }
        }
        ScreenKind::InvoiceList => {
            if let Some(action) = list_action_for_key(key, view_data.list.searching) {
                apply_list_action(state, runtime, view_data, internal_tx, action);
            }
        }
        ScreenKind::InvoiceNew => {
            handle_new_invoice_key(state, runtime, view_data, internal_tx, key);
        }
    }
    false
}

/// Ctrl shortcuts available on every screen with chrome.
fn chrome_command(state: &AppState, width: u16, ch: char) -> Option<AppCommand> {
    match ch {
        'd' => Some(AppCommand::Navigate(ScreenKind::Dashboard)),
        'l' => Some(AppCommand::Navigate(ScreenKind::InvoiceList)),
        'n' => Some(AppCommand::Navigate(ScreenKind::InvoiceNew)),
        'b' if width < NARROW_WIDTH => Some(AppCommand::ToggleMobileSidebar),
        'b' => Some(AppCommand::ToggleSidebar),
        'g' => active_group(state.screen).map(AppCommand::ToggleGroup),
        't' => Some(AppCommand::ToggleMenu(TopbarMenu::Notifications)),
        'a' => Some(AppCommand::ToggleMenu(TopbarMenu::QuickActions)),
        'p' => Some(AppCommand::ToggleMenu(TopbarMenu::Profile)),
        'x' => Some(AppCommand::RequestLogout),
        _ => None,
    }
}

/// Sidebar group containing the current screen, if any.
fn active_group(screen: ScreenKind) -> Option<&'static str> {
    nav::items()
        .find(|item| !item.children.is_empty() && nav::is_active(item, screen.route()))
        .map(|item| item.id)
}

fn handle_logout_prompt_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let command = match key.code {
        KeyCode::Char('y') | KeyCode::Enter => AppCommand::ConfirmLogout,
        KeyCode::Char('n') | KeyCode::Esc => AppCommand::CancelLogout,
        _ => return,
    };
    dispatch(state, runtime, view_data, internal_tx, command);
}

fn handle_login_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let login = &mut view_data.login;
    match key.code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => login.toggle_focus(),
        KeyCode::Char('r') if ctrl => login.reveal_password = !login.reveal_password,
        KeyCode::Char(ch) if !ctrl => login.edit(FieldEdit::Push(ch)),
        KeyCode::Backspace => login.edit(FieldEdit::Pop),
        KeyCode::Enter => match login.form.submit(&runtime.credentials()) {
            Ok(()) => {
                info!(email = %login.form.email, "signed in");
                view_data.login = LoginView::default();
                dispatch(state, runtime, view_data, internal_tx, AppCommand::SignedIn);
                start_feed_refresh(state, runtime, view_data, internal_tx);
            }
            Err(errors) => {
                debug!(
                    email = errors.email.is_some(),
                    password = errors.password.is_some(),
                    "sign in rejected"
                );
                login.errors = errors;
            }
        },
        _ => {}
    }
}

fn handle_menu_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (state.open_menu, key.code) {
        (_, KeyCode::Esc) => {
            dispatch(state, runtime, view_data, internal_tx, AppCommand::DismissOverlays);
        }
        (Some(TopbarMenu::QuickActions), KeyCode::Char(ch)) => {
            if let Some(index) = ch
                .to_digit(10)
                .and_then(|digit| (digit as usize).checked_sub(1))
            {
                start_quick_action(state, runtime, view_data, internal_tx, index);
            }
        }
        (Some(TopbarMenu::Profile), KeyCode::Char('l')) => {
            dispatch(state, runtime, view_data, internal_tx, AppCommand::RequestLogout);
        }
        _ => {}
    }
}

fn start_quick_action<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    index: usize,
) {
    let Some(action) = view_data.quick_actions.get(index).cloned() else {
        return;
    };
    if let Some(running) = &view_data.action_in_flight {
        let message = format!("{running} is still running");
        emit_status(state, view_data, internal_tx, message);
        return;
    }

    info!(action = %action.id, "quick action started");
    view_data.action_in_flight = Some(action.label.clone());
    dispatch(state, runtime, view_data, internal_tx, AppCommand::DismissOverlays);
    emit_status(state, view_data, internal_tx, format!("{}...", action.label));
    if let Err(error) = runtime.spawn_quick_action(action, internal_tx.clone()) {
        view_data.action_in_flight = None;
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("quick action failed: {error:#}"),
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListAction {
    StartSearch,
    EndSearch,
    TypeQuery(char),
    EraseQuery,
    ClearQuery,
    Page(PageNav),
    MoveCursor(isize),
    View,
    Cancel,
    Copy,
    Export(ExportFormat),
    Print,
    CreateInvoice,
    BulkImport,
}

fn list_action_for_key(key: KeyEvent, searching: bool) -> Option<ListAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if searching {
        return match key.code {
            KeyCode::Esc | KeyCode::Enter => Some(ListAction::EndSearch),
            KeyCode::Backspace => Some(ListAction::EraseQuery),
            KeyCode::Char('u') if ctrl => Some(ListAction::ClearQuery),
            KeyCode::Char(ch) if !ctrl => Some(ListAction::TypeQuery(ch)),
            _ => None,
        };
    }
    if ctrl {
        return None;
    }
    match key.code {
        KeyCode::Char('/') => Some(ListAction::StartSearch),
        KeyCode::Left | KeyCode::Char('h') => Some(ListAction::Page(PageNav::Prev)),
        KeyCode::Right | KeyCode::Char('l') => Some(ListAction::Page(PageNav::Next)),
        KeyCode::Home | KeyCode::Char('g') => Some(ListAction::Page(PageNav::First)),
        KeyCode::End | KeyCode::Char('G') => Some(ListAction::Page(PageNav::Last)),
        KeyCode::Char(ch @ '1'..='9') => Some(ListAction::Page(PageNav::To(
            usize::from(ch as u8 - b'0'),
        ))),
        KeyCode::Down | KeyCode::Char('j') => Some(ListAction::MoveCursor(1)),
        KeyCode::Up | KeyCode::Char('k') => Some(ListAction::MoveCursor(-1)),
        KeyCode::Enter => Some(ListAction::View),
        KeyCode::Char('x') => Some(ListAction::Cancel),
        KeyCode::Char('y') => Some(ListAction::Copy),
        KeyCode::Char('c') => Some(ListAction::Export(ExportFormat::Csv)),
        KeyCode::Char('e') => Some(ListAction::Export(ExportFormat::Spreadsheet)),
        KeyCode::Char('f') => Some(ListAction::Export(ExportFormat::Document)),
        KeyCode::Char('p') => Some(ListAction::Print),
        KeyCode::Char('n') => Some(ListAction::CreateInvoice),
        KeyCode::Char('b') => Some(ListAction::BulkImport),
        _ => None,
    }
}

fn apply_list_action<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    action: ListAction,
) {
    let list = &mut view_data.list;
    let Some(browser) = list.browser.as_mut() else {
        return;
    };

    let followup = match action {
        ListAction::StartSearch => {
            list.searching = true;
            Followup::Nothing
        }
        ListAction::EndSearch => {
            list.searching = false;
            Followup::Nothing
        }
        ListAction::TypeQuery(ch) => {
            let query = format!("{}{ch}", browser.query());
            browser.set_query(query);
            list.cursor = 0;
            Followup::Nothing
        }
        ListAction::EraseQuery => {
            let mut query = browser.query().to_owned();
            query.pop();
            browser.set_query(query);
            list.cursor = 0;
            Followup::Nothing
        }
        ListAction::ClearQuery => {
            browser.set_query("");
            list.cursor = 0;
            Followup::Nothing
        }
        ListAction::Page(nav) => {
            browser.navigate(nav);
            list.cursor = 0;
            Followup::Nothing
        }
        ListAction::MoveCursor(delta) => {
            let rows = browser.visible_slice().items.len();
            list.cursor = step_cursor(list.cursor, delta, rows);
            Followup::Nothing
        }
        ListAction::View => match selected_number(browser, list.cursor) {
            Some(number) => Followup::Status(format!("View invoice: {number}")),
            None => Followup::Nothing,
        },
        ListAction::Cancel => match selected_number(browser, list.cursor) {
            Some(number) => {
                info!(invoice = %number, "invoice cancelled");
                Followup::Status(format!("Cancelled {number}"))
            }
            None => Followup::Nothing,
        },
        ListAction::Copy => match browser
            .clipboard_payload()
            .and_then(|payload| runtime.copy_to_clipboard(&payload))
        {
            Ok(()) => Followup::Status("Copied JSON to clipboard".to_owned()),
            Err(error) => {
                warn!(error = %format!("{error:#}"), "clipboard copy failed");
                Followup::Status(format!("Copy failed: {error:#}"))
            }
        },
        ListAction::Export(format) => {
            let rows = browser.filtered().len();
            let export = browser.export(format, runtime.now());
            match runtime.write_export(&export) {
                Ok(path) => {
                    info!(path = %path.display(), rows, "export written");
                    Followup::Status(format!("exported {rows} invoices to {}", path.display()))
                }
                Err(error) => Followup::Status(format!("export failed: {error:#}")),
            }
        }
        ListAction::Print => {
            let html = browser.print_document();
            match runtime.write_print_document(&html) {
                Ok(path) => Followup::Status(format!("print view written to {}", path.display())),
                Err(error) => Followup::Status(format!("print failed: {error:#}")),
            }
        }
        ListAction::CreateInvoice => Followup::Command(AppCommand::InvoiceCreated),
        ListAction::BulkImport => Followup::Command(AppCommand::BulkImported),
    };

    apply_followup(state, runtime, view_data, internal_tx, followup);
}

fn selected_number(browser: &InvoiceBrowser, cursor: usize) -> Option<String> {
    browser
        .visible_slice()
        .items
        .get(cursor)
        .map(|invoice| invoice.number.clone())
}

fn step_cursor(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}

fn handle_new_invoice_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return;
    }
    let today = runtime.now().date();
    let Some(form) = view_data.new_invoice.as_mut() else {
        return;
    };

    let followup = match key.code {
        KeyCode::Tab => {
            form.cycle_focus(true);
            Followup::Nothing
        }
        KeyCode::BackTab => {
            form.cycle_focus(false);
            Followup::Nothing
        }
        code => match form.focus {
            NewInvoiceFocus::Filter => filter_key(form, code),
            NewInvoiceFocus::Trips => trips_key(form, code),
            NewInvoiceFocus::Draft => draft_key(form, code, today),
        },
    };

    apply_followup(state, runtime, view_data, internal_tx, followup);
}

fn filter_key(form: &mut NewInvoiceView, code: KeyCode) -> Followup {
    match code {
        KeyCode::Up => form.filter_cursor = form.filter_cursor.saturating_sub(1),
        KeyCode::Down => {
            form.filter_cursor = (form.filter_cursor + 1).min(FILTER_FIELDS.len() - 1);
        }
        KeyCode::Backspace => {
            form.filter_values[form.filter_cursor].pop();
        }
        KeyCode::Char(ch) => form.filter_values[form.filter_cursor].push(ch),
        KeyCode::Enter => {
            return match build_trip_filter(&form.filter_values) {
                Ok(filter) => {
                    let message = format!(
                        "{} trips ready to bill to {}",
                        form.trips.len(),
                        filter.bill_to
                    );
                    form.filter = Some(filter);
                    form.focus = NewInvoiceFocus::Trips;
                    Followup::Status(message)
                }
                Err(error) => Followup::Status(format!("{error:#}")),
            };
        }
        _ => {}
    }
    Followup::Nothing
}

fn trips_key(form: &mut NewInvoiceView, code: KeyCode) -> Followup {
    match code {
        KeyCode::Up => form.trip_cursor = form.trip_cursor.saturating_sub(1),
        KeyCode::Down => form.trip_cursor = step_cursor(form.trip_cursor, 1, form.trips.len()),
        KeyCode::Char(' ') => {
            if let Some(trip) = form.trips.get(form.trip_cursor) {
                form.selection.toggle_one(trip.id);
            }
        }
        KeyCode::Char('a') => form.selection.toggle_all(),
        KeyCode::Enter => {
            if !form.selection.can_proceed() {
                return Followup::Status(
                    "no trips selected -- press space to check a trip and retry".to_owned(),
                );
            }
            if form.draft.customer.trim().is_empty()
                && let Some(filter) = &form.filter
            {
                form.draft.customer = filter.bill_to.clone();
            }
            form.focus = NewInvoiceFocus::Draft;
            form.draft_cursor = 0;
            return Followup::Status(format!(
                "{} trips selected",
                form.selection.checked_count()
            ));
        }
        _ => {}
    }
    Followup::Nothing
}

fn draft_key(form: &mut NewInvoiceView, code: KeyCode, today: Date) -> Followup {
    let fields = draft_fields(&form.draft);
    let field = fields.get(form.draft_cursor).copied();
    match code {
        KeyCode::Up => form.draft_cursor = form.draft_cursor.saturating_sub(1),
        KeyCode::Down => form.draft_cursor = step_cursor(form.draft_cursor, 1, fields.len()),
        KeyCode::Insert => {
            form.draft.add_item();
            // Land on the new item's description.
            form.draft_cursor = draft_fields(&form.draft).len().saturating_sub(3);
        }
        KeyCode::Delete => {
            if let Some(id) = field.and_then(DraftField::item_id) {
                form.draft.remove_item(id);
                let len = draft_fields(&form.draft).len();
                form.draft_cursor = form.draft_cursor.min(len.saturating_sub(1));
            }
        }
        KeyCode::Backspace => {
            if let Some(field) = field {
                edit_draft(&mut form.draft, field, FieldEdit::Pop);
            }
        }
        KeyCode::Char(ch) => {
            if let Some(field) = field {
                edit_draft(&mut form.draft, field, FieldEdit::Push(ch));
            }
        }
        KeyCode::Enter => return save_draft(form, today),
        _ => {}
    }
    Followup::Nothing
}

fn save_draft(form: &mut NewInvoiceView, today: Date) -> Followup {
    if let Err(error) = form.draft.validate() {
        return Followup::Status(format!("{error:#}"));
    }
    let customer = form.draft.customer.trim().to_owned();
    let total = form.draft.grand_total_cents();
    info!(customer = %customer, total_cents = total, "invoice saved");
    let message = format!(
        "invoice for {customer} saved: {} trips, total {}",
        form.selection.checked_count(),
        format_cents(total)
    );
    *form = NewInvoiceView::new(form.trips.clone(), today);
    Followup::CommandThenStatus(AppCommand::InvoiceCreated, message)
}

fn draft_fields(draft: &InvoiceDraft) -> Vec<DraftField> {
    let mut fields = vec![DraftField::Customer, DraftField::Notes, DraftField::TaxPercent];
    for item in draft.items() {
        fields.extend([
            DraftField::Description(item.id),
            DraftField::Qty(item.id),
            DraftField::Rate(item.id),
        ]);
    }
    fields
}

fn edit_text(text: &mut String, edit: FieldEdit) {
    match edit {
        FieldEdit::Push(ch) => text.push(ch),
        FieldEdit::Pop => {
            text.pop();
        }
    }
}

/// Keypad entry: digits shift in from the right, backspace shifts one out.
/// Non-digits and overflow leave the value alone.
fn edit_number(value: i64, edit: FieldEdit) -> Option<i64> {
    match edit {
        FieldEdit::Push(ch) => {
            let digit = ch.to_digit(10)?;
            value.checked_mul(10)?.checked_add(i64::from(digit))
        }
        FieldEdit::Pop => Some(value / 10),
    }
}

fn edit_draft(draft: &mut InvoiceDraft, field: DraftField, edit: FieldEdit) {
    match field {
        DraftField::Customer => edit_text(&mut draft.customer, edit),
        DraftField::Notes => edit_text(&mut draft.notes, edit),
        DraftField::TaxPercent => {
            if let Some(tax) = edit_number(draft.tax_percent, edit) {
                draft.tax_percent = tax;
            }
        }
        DraftField::Description(id) | DraftField::Qty(id) | DraftField::Rate(id) => {
            let Some(item) = draft.items().iter().find(|item| item.id == id) else {
                return;
            };
            let patch = match field {
                DraftField::Description(_) => {
                    let mut description = item.description.clone();
                    edit_text(&mut description, edit);
                    LineItemPatch {
                        description: Some(description),
                        ..LineItemPatch::default()
                    }
                }
                DraftField::Qty(_) => LineItemPatch {
                    qty: edit_number(item.qty, edit),
                    ..LineItemPatch::default()
                },
                _ => LineItemPatch {
                    rate_cents: edit_number(item.rate_cents, edit),
                    ..LineItemPatch::default()
                },
            };
            draft.update_item(id, patch);
        }
    }
}

fn build_trip_filter(values: &[String; 7]) -> Result<TripFilterForm> {
    let [drop_address, driver, vehicle, from, to, bill_to, fuel_levy] = values;
    let form = TripFilterForm {
        drop_address: drop_address.trim().to_owned(),
        driver: driver.trim().to_owned(),
        vehicle: vehicle.trim().to_owned(),
        from_date: parse_optional_date(from).context("from date")?,
        to_date: parse_optional_date(to).context("to date")?,
        bill_to: bill_to.trim().to_owned(),
        fuel_levy_cents: if fuel_levy.trim().is_empty() {
            None
        } else {
            Some(parse_money(fuel_levy).context("fuel levy")?)
        },
    };
    form.validate()?;
    Ok(form)
}

fn parse_optional_date(value: &str) -> Result<Option<Date>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
        .map(Some)
        .with_context(|| format!("{trimmed:?} is not a YYYY-MM-DD date"))
}

/// Parses `12`, `12.5`, or `-12.50` into cents.
pub fn parse_money(value: &str) -> Result<i64> {
    let trimmed = value.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && fraction.is_empty() {
        bail!("amount {trimmed:?} is empty");
    }
    if fraction.len() > 2
        || !whole
            .chars()
            .chain(fraction.chars())
            .all(|ch| ch.is_ascii_digit())
    {
        bail!("amount {trimmed:?} must look like 12.50");
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse()? };
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>()? * 10,
        _ => fraction.parse()?,
    };
    let cents = whole
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(fraction))
        .ok_or_else(|| anyhow!("amount {trimmed:?} is too large"))?;
    Ok(if negative { -cents } else { cents })
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    if !state.shows_chrome() {
        let area = centered_rect(60, 60, frame.area());
        let login = Paragraph::new(render_login_text(&view_data.login)).block(
            Block::default()
                .title("Trucking Solution - sign in")
                .borders(Borders::ALL),
        );
        frame.render_widget(login, area);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let topbar = Paragraph::new(topbar_text(state, view_data)).block(
        Block::default()
            .title("Trucking Solution")
            .borders(Borders::ALL),
    );
    frame.render_widget(topbar, layout[0]);

    let narrow = frame.area().width < NARROW_WIDTH;
    let content = match sidebar_width(state, narrow) {
        Some(width) => {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(width), Constraint::Min(1)])
                .split(layout[1]);
            let sidebar = Paragraph::new(render_sidebar_text(state))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(sidebar, body[0]);
            body[1]
        }
        None => layout[1],
    };

    match state.screen {
        ScreenKind::Login => {}
        ScreenKind::Dashboard => {
            let body = Paragraph::new(render_dashboard_text(view_data.dashboard.as_ref()))
                .block(Block::default().borders(Borders::ALL).title("dashboard"));
            frame.render_widget(body, content);
        }
        ScreenKind::InvoiceList => render_invoice_list(frame, content, state, view_data),
        ScreenKind::InvoiceNew => {
            let body = Paragraph::new(render_new_invoice_text(view_data.new_invoice.as_ref()))
                .block(Block::default().borders(Borders::ALL).title("new invoice"));
            frame.render_widget(body, content);
        }
    }

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status_widget, layout[2]);

    if let Some(menu) = state.open_menu {
        let (title, body) = match menu {
            TopbarMenu::Notifications => ("notifications", notifications_text(view_data)),
            TopbarMenu::QuickActions => ("quick actions", quick_actions_text(view_data)),
            TopbarMenu::Profile => ("profile", profile_text()),
        };
        let area = centered_rect(50, 50, frame.area());
        frame.render_widget(Clear, area);
        let overlay = Paragraph::new(body).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(overlay, area);
    }

    if state.logout_prompt {
        let area = centered_rect(40, 30, frame.area());
        frame.render_widget(Clear, area);
        let prompt = Paragraph::new("Log out of Trucking Solution?\n\ny/enter  log out\nn/esc    stay")
            .block(
                Block::default()
                    .title("log out")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            );
        frame.render_widget(prompt, area);
    }
}

fn sidebar_width(state: &AppState, narrow: bool) -> Option<u16> {
    if narrow {
        return state.sidebar.mobile_open.then_some(SIDEBAR_WIDTH);
    }
    if state.sidebar.collapsed {
        Some(SIDEBAR_COLLAPSED_WIDTH)
    } else {
        Some(SIDEBAR_WIDTH)
    }
}

fn render_invoice_list(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let Some(browser) = &view_data.list.browser else {
        let empty = Paragraph::new("no invoices loaded")
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };
    let slice = browser.visible_slice();

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(area);

    let header = Paragraph::new(list_header_text(
        state,
        browser,
        &slice,
        view_data.list.searching,
    ))
    .block(
        Block::default()
            .title("List of Generated Invoices")
            .borders(Borders::ALL),
    );
    frame.render_widget(header, sections[0]);

    if slice.items.is_empty() {
        let empty = Paragraph::new(format!("No invoices match {:?}", browser.query()))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, sections[1]);
    } else {
        match ListLayout::for_width(frame.area().width) {
            ListLayout::Table => {
                render_invoice_table(frame, sections[1], &slice, view_data.list.cursor);
            }
            ListLayout::Cards => {
                let cards = Paragraph::new(render_invoice_cards_text(&slice, view_data.list.cursor))
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(cards, sections[1]);
            }
        }
    }

    let pager = Paragraph::new(page_buttons_text(&slice))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(pager, sections[2]);
}

fn render_invoice_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    slice: &VisibleSlice<'_>,
    cursor: usize,
) {
    let widths = [
        Constraint::Length(4),
        Constraint::Length(16),
        Constraint::Length(11),
        Constraint::Min(20),
        Constraint::Min(12),
        Constraint::Length(15),
        Constraint::Length(16),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(6),
    ];
    let header = Row::new(INVOICE_COLUMNS.iter().map(|column| {
        Cell::from(*column).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let rows = slice.items.iter().enumerate().map(|(offset, invoice)| {
        let style = if offset == cursor {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        Row::new(invoice_row_cells(slice.start_index + offset + 1, invoice)).style(style)
    });
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn invoice_row_cells(position: usize, invoice: &Invoice) -> [String; 10] {
    [
        position.to_string(),
        invoice.number.clone(),
        invoice.date.to_string(),
        invoice.supplier.joined(" | "),
        invoice.product.clone(),
        invoice.pickup.clone(),
        invoice.drop_location.clone(),
        format_cents(invoice.total_cents),
        invoice.vehicle.clone(),
        invoice.loads.to_string(),
    ]
}

fn render_invoice_cards_text(slice: &VisibleSlice<'_>, cursor: usize) -> String {
    let mut lines = Vec::new();
    for (offset, invoice) in slice.items.iter().enumerate() {
        let marker = if offset == cursor { ">" } else { " " };
        lines.push(format!(
            "{marker} {}. {}  {}  {}",
            slice.start_index + offset + 1,
            invoice.number,
            invoice.date,
            format_cents(invoice.total_cents)
        ));
        lines.push(format!("    {}", invoice.supplier.joined(" | ")));
        lines.push(format!(
            "    {}  {} -> {}  {}  loads {}",
            invoice.product, invoice.pickup, invoice.drop_location, invoice.vehicle, invoice.loads
        ));
    }
    lines.join("\n")
}

fn list_header_text(
    state: &AppState,
    browser: &InvoiceBrowser,
    slice: &VisibleSlice<'_>,
    searching: bool,
) -> String {
    let caret = if searching { "_" } else { "" };
    format!(
        "{} invoices generated (n create, b bulk import)\nsearch: {}{caret}\n{}",
        state.generated_invoices,
        browser.query(),
        slice.summary()
    )
}

fn page_buttons_text(slice: &VisibleSlice<'_>) -> String {
    if slice.total_pages == 0 {
        return String::new();
    }
    let arrow = |nav: PageNav, glyph: &str| {
        if slice.can_go(nav) {
            glyph.to_owned()
        } else {
            "·".to_owned()
        }
    };
    let mut parts = vec![arrow(PageNav::First, "«"), arrow(PageNav::Prev, "‹")];
    for page in slice.buttons() {
        if page == slice.current_page {
            parts.push(format!("[{page}]"));
        } else {
            parts.push(page.to_string());
        }
    }
    parts.push(arrow(PageNav::Next, "›"));
    parts.push(arrow(PageNav::Last, "»"));
    parts.join(" ")
}

fn render_sidebar_text(state: &AppState) -> String {
    let route = state.screen.route();
    let collapsed = state.sidebar.collapsed && !state.sidebar.mobile_open;
    let mut lines = Vec::new();
    for section in &nav::SIDEBAR {
        if !collapsed && !section.heading.is_empty() {
            lines.push(section.heading.to_uppercase());
        }
        for item in section.items {
            let marker = if nav::is_active(item, route) { "▌" } else { " " };
            if collapsed {
                lines.push(format!("{marker}{}", item.label.chars().take(3).collect::<String>()));
                continue;
            }
            let open = state.sidebar.is_open(item.id);
            let fold = match (item.children.is_empty(), open) {
                (true, _) => " ",
                (false, true) => "▾",
                (false, false) => "▸",
            };
            lines.push(format!("{marker}{fold} {}", item.label));
            if open {
                for child in item.children {
                    let current = if child.href == route { "•" } else { " " };
                    lines.push(format!("   {current} {}", child.label));
                }
            }
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

fn topbar_text(state: &AppState, view_data: &ViewData) -> String {
    let mut text = format!(
        "{}  |  ^T alerts ({})  ^A quick actions  ^P profile  ^B menu  ^Q quit",
        state.screen.label(),
        state.unread
    );
    if let Some(running) = &view_data.action_in_flight {
        text.push_str(&format!("  |  running: {running}"));
    }
    text
}

fn notifications_text(view_data: &ViewData) -> String {
    if view_data.notifications.is_empty() {
        return "No notifications".to_owned();
    }
    view_data
        .notifications
        .iter()
        .map(|notification| format!("• {} ({})", notification.text, notification.time))
        .collect::<Vec<_>>()
        .join("\n")
}

fn quick_actions_text(view_data: &ViewData) -> String {
    if view_data.quick_actions.is_empty() {
        return "No quick actions".to_owned();
    }
    let mut lines: Vec<String> = view_data
        .quick_actions
        .iter()
        .enumerate()
        .map(|(index, action)| format!("{}  {}", index + 1, action.label))
        .collect();
    if let Some(running) = &view_data.action_in_flight {
        lines.push(String::new());
        lines.push(format!("running: {running}"));
    }
    lines.join("\n")
}

fn profile_text() -> String {
    "Admin\nadmin@trucking.local\n\nl    log out\nesc  close".to_owned()
}

fn render_login_text(login: &LoginView) -> String {
    let marker = |field: LoginField| if login.focus == field { ">" } else { " " };
    let password = if login.reveal_password {
        login.form.password.clone()
    } else {
        "*".repeat(login.form.password.chars().count())
    };

    let mut lines = vec![
        "Welcome back. Sign in to manage trips and invoices.".to_owned(),
        String::new(),
        format!("{} Email:    {}", marker(LoginField::Email), login.form.email),
    ];
    if let Some(error) = &login.errors.email {
        lines.push(format!("    ! {error}"));
    }
    lines.push(format!("{} Password: {password}", marker(LoginField::Password)));
    if let Some(error) = &login.errors.password {
        lines.push(format!("    ! {error}"));
    }
    lines.push(String::new());
    lines.push("enter sign in  tab switch field  ctrl+r show password  ctrl+q quit".to_owned());
    lines.join("\n")
}

fn render_dashboard_text(data: Option<&DashboardData>) -> String {
    let Some(data) = data else {
        return "dashboard data unavailable".to_owned();
    };
    let mut lines = vec!["KPIs".to_owned()];
    for kpi in data.kpis() {
        lines.push(format!(
            "  {:<20} {:>12}  {:<10} {}",
            kpi.title, kpi.value, kpi.diff, kpi.sub
        ));
    }

    lines.push(String::new());
    lines.push("Weekly activity".to_owned());
    for day in &data.activity {
        lines.push(format!(
            "  {:<4} trips {:>3}  revenue {:>10}",
            day.day,
            day.trips,
            format_cents(day.revenue_cents)
        ));
    }

    lines.push(String::new());
    lines.push("Shipments".to_owned());
    for day in &data.shipments {
        lines.push(format!(
            "  {:<4} in transit {:>3}  delivered {:>3}  delayed {:>3}",
            day.day, day.in_transit, day.delivered, day.delayed
        ));
    }
    if let Some(busiest) = data.busiest_shipment_day() {
        lines.push(format!("  busiest: {} ({} shipments)", busiest.day, busiest.total()));
    }

    lines.push(String::new());
    lines.push("Status split".to_owned());
    for (label, pct) in data.status_percentages() {
        lines.push(format!("  {label:<12} {pct:>3}%"));
    }

    lines.push(String::new());
    lines.push("Top vehicles".to_owned());
    for vehicle in &data.vehicles {
        lines.push(format!(
            "  {:<8} {:<14} {:>6} km  {:>3} trips  {:>3}%",
            vehicle.id, vehicle.model, vehicle.km, vehicle.trips, vehicle.utilization
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Pending invoices (total {})",
        format_cents(data.pending_total_cents())
    ));
    for invoice in &data.pending {
        lines.push(format!(
            "  {:<10} {:<22} {:>10}  due {}  {}",
            invoice.id,
            invoice.client,
            format_cents(invoice.amount_cents),
            invoice.due,
            invoice.status.as_str()
        ));
    }
    lines.join("\n")
}

fn format_stamp(stamp: PrimitiveDateTime) -> String {
    stamp
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_default()
}

fn render_new_invoice_text(view: Option<&NewInvoiceView>) -> String {
    let Some(view) = view else {
        return "new invoice form unavailable".to_owned();
    };
    let section = |focus: NewInvoiceFocus, title: &str| {
        if view.focus == focus {
            format!("» {title}")
        } else {
            format!("  {title}")
        }
    };

    let mut lines = vec![section(NewInvoiceFocus::Filter, "Trip filter")];
    for (index, (label, value)) in FILTER_FIELDS.iter().zip(&view.filter_values).enumerate() {
        let marker = if view.focus == NewInvoiceFocus::Filter && index == view.filter_cursor {
            ">"
        } else {
            " "
        };
        lines.push(format!("  {marker} {label:<13} {value}"));
    }

    if view.filter.is_some() {
        lines.push(String::new());
        lines.push(section(
            NewInvoiceFocus::Trips,
            &format!("Trips ({} selected)", view.selection.checked_count()),
        ));
        let all = if view.selection.all_checked() { "x" } else { " " };
        lines.push(format!("    [{all}] all"));
        for (index, trip) in view.trips.iter().enumerate() {
            let marker = if view.focus == NewInvoiceFocus::Trips && index == view.trip_cursor {
                ">"
            } else {
                " "
            };
            let checked = if view.selection.is_checked(trip.id) { "x" } else { " " };
            lines.push(format!(
                "  {marker} [{checked}] {}  {}  {:<12} {} {}  {} - {}",
                trip.number,
                trip.docket,
                trip.material,
                trip.net_weight,
                trip.unit.as_str(),
                format_stamp(trip.start),
                format_stamp(trip.end)
            ));
        }
    }

    if view.focus == NewInvoiceFocus::Draft {
        lines.push(String::new());
        lines.push(section(NewInvoiceFocus::Draft, "Invoice"));
        let draft = &view.draft;
        for (index, field) in draft_fields(draft).into_iter().enumerate() {
            let marker = if index == view.draft_cursor { ">" } else { " " };
            let item = field
                .item_id()
                .and_then(|id| draft.items().iter().position(|item| item.id == id));
            let text = match (field, item) {
                (DraftField::Customer, _) => format!("Customer      {}", draft.customer),
                (DraftField::Notes, _) => format!("Notes         {}", draft.notes),
                (DraftField::TaxPercent, _) => format!("Tax %         {}", draft.tax_percent),
                (DraftField::Description(_), Some(position)) => format!(
                    "#{} Description {}",
                    position + 1,
                    draft.items()[position].description
                ),
                (DraftField::Qty(_), Some(position)) => {
                    format!("   Qty        {}", draft.items()[position].qty)
                }
                (DraftField::Rate(_), Some(position)) => {
                    let item = &draft.items()[position];
                    format!(
                        "   Rate       {}  = {}",
                        format_cents(item.rate_cents),
                        format_cents(item.amount_cents())
                    )
                }
                _ => continue,
            };
            lines.push(format!("  {marker} {text}"));
        }
        lines.push(String::new());
        lines.push(format!("    Subtotal    {}", format_cents(draft.subtotal_cents())));
        lines.push(format!(
            "    Tax ({}%)   {}",
            draft.tax_percent,
            format_cents(draft.tax_cents())
        ));
        lines.push(format!("    Total       {}", format_cents(draft.grand_total_cents())));
    }
    lines.join("\n")
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if let Some(status) = &state.status_line {
        return status.clone();
    }
    let hint = match state.screen {
        ScreenKind::Login => "enter sign in  ctrl+q quit",
        ScreenKind::Dashboard => {
            "r refresh feed  ^L invoices  ^N new invoice  ^G group  ^X log out"
        }
        ScreenKind::InvoiceList if view_data.list.searching => {
            "type to search  enter/esc done  ^U clear"
        }
        ScreenKind::InvoiceList => {
            "/ search  h/l page  j/k row  enter view  x cancel  y copy  c/e/f export  p print"
        }
        ScreenKind::InvoiceNew => {
            "tab section  enter confirm  space check trip  a all  ins/del line item"
        }
    };
    hint.to_owned()
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, InternalEvent, ListLayout, NARROW_WIDTH, ViewData, handle_key_event,
        page_buttons_text, parse_money, process_internal_events, render, render_sidebar_text,
    };
    use anyhow::{Result, bail};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use haulage_app::export::parse_clipboard_payload;
    use haulage_app::{
        AppCommand, AppState, Credentials, DashboardData, Export, GENERATED_INVOICES_START,
        Invoice, InvoiceBrowser, Notification, Pager, QuickAction, QuickActionOutcome,
        RecordStore, ScreenKind, Trip, sample,
    };
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::path::PathBuf;
    use std::sync::mpsc::{self, Receiver, Sender};
    use time::OffsetDateTime;
    use time::macros::datetime;

    #[derive(Default)]
    struct TestRuntime {
        exports: Vec<Export>,
        printed: Vec<String>,
        clipboard: Vec<String>,
        clipboard_fails: bool,
        actions: Vec<String>,
    }

    impl AppRuntime for TestRuntime {
        fn credentials(&self) -> Credentials {
            Credentials::default()
        }

        fn pager(&self) -> Pager {
            Pager::default()
        }

        fn load_invoices(&mut self) -> Result<Vec<Invoice>> {
            Ok(sample::invoices())
        }

        fn load_dashboard(&mut self) -> Result<DashboardData> {
            Ok(DashboardData::sample())
        }

        fn load_trips(&mut self) -> Result<Vec<Trip>> {
            Ok(sample::trips())
        }

        fn load_notifications(&mut self) -> Vec<Notification> {
            sample::fallback_notifications()
        }

        fn load_quick_actions(&mut self) -> Vec<QuickAction> {
            sample::fallback_quick_actions()
        }

        fn perform_quick_action(&mut self, action_id: &str) -> QuickActionOutcome {
            self.actions.push(action_id.to_owned());
            QuickActionOutcome::Simulated
        }

        fn write_export(&mut self, export: &Export) -> Result<PathBuf> {
            self.exports.push(export.clone());
            Ok(PathBuf::from("/exports").join(&export.file_name))
        }

        fn write_print_document(&mut self, html: &str) -> Result<PathBuf> {
            self.printed.push(html.to_owned());
            Ok(PathBuf::from("/exports/print.html"))
        }

        fn copy_to_clipboard(&mut self, text: &str) -> Result<()> {
            if self.clipboard_fails {
                bail!("no clipboard attached");
            }
            self.clipboard.push(text.to_owned());
            Ok(())
        }

        fn now(&self) -> OffsetDateTime {
            datetime!(2025-11-18 10:00 UTC)
        }
    }

    struct Harness {
        state: AppState,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: Sender<InternalEvent>,
        rx: Receiver<InternalEvent>,
    }

    impl Harness {
        fn new() -> Self {
            let (tx, rx) = mpsc::channel();
            Self {
                state: AppState::default(),
                runtime: TestRuntime::default(),
                view_data: ViewData::new(120),
                tx,
                rx,
            }
        }

        fn signed_in() -> Self {
            let mut harness = Self::new();
            harness.type_text("admin@admin.com");
            harness.key(KeyCode::Tab);
            harness.type_text("12345");
            harness.key(KeyCode::Enter);
            harness.drain();
            harness
        }

        fn key(&mut self, code: KeyCode) -> bool {
            self.send(KeyEvent::new(code, KeyModifiers::NONE))
        }

        fn ctrl(&mut self, ch: char) -> bool {
            self.send(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL))
        }

        fn send(&mut self, key: KeyEvent) -> bool {
            handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                key,
            )
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.key(KeyCode::Char(ch));
            }
        }

        fn drain(&mut self) {
            process_internal_events(&mut self.state, &mut self.view_data, &self.tx, &self.rx);
        }

        fn status(&self) -> &str {
            self.state.status_line.as_deref().unwrap_or_default()
        }

        fn browser(&self) -> &InvoiceBrowser {
            self.view_data
                .list
                .browser
                .as_ref()
                .expect("invoice list should be loaded")
        }
    }

    #[test]
    fn empty_login_reports_both_fields() {
        let mut harness = Harness::new();
        harness.key(KeyCode::Enter);
        let errors = &harness.view_data.login.errors;
        assert_eq!(errors.email.as_deref(), Some("Please enter your email"));
        assert_eq!(errors.password.as_deref(), Some("Please enter your password"));
        assert_eq!(harness.state.screen, ScreenKind::Login);
    }

    #[test]
    fn wrong_password_stays_on_login() {
        let mut harness = Harness::new();
        harness.type_text("admin@admin.com");
        harness.key(KeyCode::Tab);
        harness.type_text("nope");
        harness.key(KeyCode::Enter);
        assert_eq!(harness.state.screen, ScreenKind::Login);
        assert_eq!(
            harness.view_data.login.errors.password.as_deref(),
            Some("Invalid credentials. Try again.")
        );

        harness.key(KeyCode::Backspace);
        assert_eq!(harness.view_data.login.errors.password, None);
    }

    #[test]
    fn sign_in_loads_dashboard_and_feed() {
        let harness = Harness::signed_in();
        assert_eq!(harness.state.screen, ScreenKind::Dashboard);
        assert!(harness.view_data.dashboard.is_some());
        assert_eq!(harness.state.unread, 3);
        assert_eq!(harness.view_data.quick_actions.len(), 2);
        assert!(harness.view_data.login.form.password.is_empty());
    }

    #[test]
    fn ctrl_q_quits_from_any_screen() {
        let mut harness = Harness::new();
        assert!(harness.ctrl('q'));
        let mut harness = Harness::signed_in();
        assert!(harness.ctrl('q'));
        assert!(!harness.key(KeyCode::Char('q')));
    }

    #[test]
    fn search_pages_and_exports_the_full_view() {
        let mut harness = Harness::signed_in();
        harness.ctrl('l');
        assert_eq!(harness.state.screen, ScreenKind::InvoiceList);

        harness.key(KeyCode::Char('/'));
        harness.type_text("mansand");
        harness.key(KeyCode::Enter);
        assert!(!harness.view_data.list.searching);
        assert_eq!(harness.browser().query(), "mansand");

        harness.key(KeyCode::Right);
        let slice = harness.browser().visible_slice();
        assert_eq!(slice.current_page, 2);
        assert_eq!(slice.summary(), "Showing 11 to 15 of 15 results");

        harness.key(KeyCode::Char('c'));
        let export = &harness.runtime.exports[0];
        assert_eq!(export.body.lines().count(), 16);
        assert!(harness.status().starts_with("exported 15 invoices to /exports/"));
    }

    #[test]
    fn typing_a_query_returns_to_page_one() {
        let mut harness = Harness::signed_in();
        harness.ctrl('l');
        harness.key(KeyCode::Char('3'));
        assert_eq!(harness.browser().visible_slice().current_page, 3);

        harness.key(KeyCode::Char('/'));
        harness.type_text("rock");
        assert_eq!(harness.browser().visible_slice().current_page, 1);

        harness.ctrl('u');
        assert_eq!(harness.browser().query(), "");
    }

    #[test]
    fn row_actions_name_the_selected_invoice() {
        let mut harness = Harness::signed_in();
        harness.ctrl('l');
        harness.key(KeyCode::Char('j'));
        harness.key(KeyCode::Enter);
        assert_eq!(harness.status(), "View invoice: INV20251100040");

        harness.key(KeyCode::Char('x'));
        assert_eq!(harness.status(), "Cancelled INV20251100040");

        for _ in 0..20 {
            harness.key(KeyCode::Char('j'));
        }
        assert_eq!(harness.view_data.list.cursor, 9);
    }

    #[test]
    fn copy_reports_failure_then_success() {
        let mut harness = Harness::signed_in();
        harness.ctrl('l');

        harness.runtime.clipboard_fails = true;
        harness.key(KeyCode::Char('y'));
        assert!(harness.status().starts_with("Copy failed: "));

        harness.runtime.clipboard_fails = false;
        harness.key(KeyCode::Char('y'));
        assert_eq!(harness.status(), "Copied JSON to clipboard");
        let copied = parse_clipboard_payload(&harness.runtime.clipboard[0])
            .expect("clipboard payload should decode");
        assert_eq!(copied.len(), 30);
    }

    #[test]
    fn print_covers_the_current_page_only() {
        let mut harness = Harness::signed_in();
        harness.ctrl('l');
        harness.key(KeyCode::Char('p'));
        let html = &harness.runtime.printed[0];
        assert_eq!(html.matches("<tr><td>").count(), 10);
        assert_eq!(harness.status(), "print view written to /exports/print.html");
    }

    #[test]
    fn header_counter_bumps() {
        let mut harness = Harness::signed_in();
        harness.ctrl('l');
        harness.key(KeyCode::Char('n'));
        harness.key(KeyCode::Char('b'));
        assert_eq!(
            harness.state.generated_invoices,
            GENERATED_INVOICES_START + 6
        );
    }

    #[test]
    fn logout_confirms_and_resets_the_session() {
        let mut harness = Harness::signed_in();
        harness.ctrl('l');
        harness.ctrl('p');
        harness.key(KeyCode::Char('l'));
        assert!(harness.state.logout_prompt);
        assert_eq!(harness.state.open_menu, None);

        harness.key(KeyCode::Char('n'));
        assert!(!harness.state.logout_prompt);
        assert_eq!(harness.state.screen, ScreenKind::InvoiceList);

        harness.ctrl('x');
        harness.key(KeyCode::Char('y'));
        assert_eq!(harness.state.screen, ScreenKind::Login);
        assert!(harness.view_data.list.browser.is_none());
        assert!(harness.view_data.dashboard.is_none());
    }

    #[test]
    fn escape_closes_open_menu() {
        let mut harness = Harness::signed_in();
        harness.ctrl('t');
        assert_eq!(harness.state.unread, 0);
        harness.key(KeyCode::Esc);
        assert_eq!(harness.state.open_menu, None);
    }

    #[test]
    fn quick_action_reports_through_the_channel() {
        let mut harness = Harness::signed_in();
        harness.ctrl('a');
        harness.key(KeyCode::Char('2'));
        assert_eq!(harness.runtime.actions, vec!["create_trip".to_owned()]);
        assert_eq!(harness.view_data.action_in_flight.as_deref(), Some("Create trip"));
        assert_eq!(harness.state.open_menu, None);

        harness.drain();
        assert_eq!(harness.view_data.action_in_flight, None);
        assert!(harness.status().starts_with("Create trip: done (simulated"));
    }

    #[test]
    fn stale_status_clear_is_ignored() {
        let mut harness = Harness::signed_in();
        harness.ctrl('l');
        harness.key(KeyCode::Enter);
        let token = harness.view_data.status_token;

        harness
            .tx
            .send(InternalEvent::ClearStatus { token: token - 1 })
            .expect("channel open");
        harness.drain();
        assert!(harness.state.status_line.is_some());

        harness
            .tx
            .send(InternalEvent::ClearStatus { token })
            .expect("channel open");
        harness.drain();
        assert_eq!(harness.state.status_line, None);
    }

    #[test]
    fn ctrl_b_opens_drawer_when_narrow() {
        let mut harness = Harness::signed_in();
        harness.view_data.width = NARROW_WIDTH - 20;
        harness.ctrl('b');
        assert!(harness.state.sidebar.mobile_open);
        assert!(!harness.state.sidebar.collapsed);

        harness.view_data.width = NARROW_WIDTH + 20;
        harness.ctrl('b');
        assert!(harness.state.sidebar.collapsed);
    }

    #[test]
    fn new_invoice_walks_filter_trips_and_draft() {
        let mut harness = Harness::signed_in();
        harness.ctrl('n');
        assert_eq!(harness.state.screen, ScreenKind::InvoiceNew);

        harness.type_text("12 Plummer Rd");
        harness.key(KeyCode::Down);
        harness.type_text("R. Singh");
        harness.key(KeyCode::Down);
        harness.type_text("XW47RQ");
        harness.key(KeyCode::Down);
        harness.key(KeyCode::Down);
        harness.key(KeyCode::Down);
        harness.type_text("Midway Concrete");
        harness.key(KeyCode::Down);
        harness.type_text("12.50");
        harness.key(KeyCode::Enter);
        assert_eq!(harness.status(), "3 trips ready to bill to Midway Concrete");

        harness.key(KeyCode::Enter);
        assert!(harness.status().starts_with("no trips selected"));
        harness.key(KeyCode::Char(' '));
        harness.key(KeyCode::Enter);
        assert_eq!(harness.status(), "1 trips selected");

        for _ in 0..3 {
            harness.key(KeyCode::Down);
        }
        harness.type_text("Cartage");
        harness.key(KeyCode::Down);
        harness.key(KeyCode::Down);
        harness.type_text("25000");
        harness.key(KeyCode::Enter);

        assert_eq!(
            harness.status(),
            "invoice for Midway Concrete saved: 1 trips, total 295.00"
        );
        assert_eq!(
            harness.state.generated_invoices,
            GENERATED_INVOICES_START + 1
        );
        let form = harness
            .view_data
            .new_invoice
            .as_ref()
            .expect("form stays loaded");
        assert!(form.filter.is_none());
    }

    #[test]
    fn oversized_draft_renders_and_refuses_to_save() {
        let mut harness = Harness::signed_in();
        harness.ctrl('n');
        for value in ["Drop", "Driver", "Truck"] {
            harness.type_text(value);
            harness.key(KeyCode::Down);
        }
        harness.key(KeyCode::Down);
        harness.key(KeyCode::Down);
        harness.type_text("Bill");
        harness.key(KeyCode::Down);
        harness.type_text("0");
        harness.key(KeyCode::Enter);
        harness.key(KeyCode::Char(' '));
        harness.key(KeyCode::Enter);

        for _ in 0..4 {
            harness.key(KeyCode::Down);
        }
        harness.type_text("99999999999");
        harness.key(KeyCode::Down);
        harness.type_text("999999999");

        let mut terminal = Terminal::new(TestBackend::new(140, 40)).expect("test terminal");
        terminal
            .draw(|frame| render(frame, &harness.state, &harness.view_data))
            .expect("oversized draft renders");

        harness.key(KeyCode::Enter);
        assert!(harness.status().contains("too large"), "{}", harness.status());
        assert_eq!(harness.state.generated_invoices, GENERATED_INVOICES_START);
    }

    #[test]
    fn filter_rejects_reversed_dates() {
        let mut harness = Harness::signed_in();
        harness.ctrl('n');
        for value in ["Drop", "Driver", "Truck"] {
            harness.type_text(value);
            harness.key(KeyCode::Down);
        }
        for _ in 0..10 {
            harness.key(KeyCode::Backspace);
        }
        harness.type_text("2025-11-20");
        harness.key(KeyCode::Down);
        harness.key(KeyCode::Down);
        harness.type_text("Bill");
        harness.key(KeyCode::Down);
        harness.type_text("0");
        harness.key(KeyCode::Enter);
        assert_eq!(harness.status(), "trip to-date must be on/after from-date");
    }

    #[test]
    fn parse_money_accepts_common_shapes() {
        assert_eq!(parse_money("12").expect("whole"), 1200);
        assert_eq!(parse_money("12.5").expect("one place"), 1250);
        assert_eq!(parse_money(" 0.05 ").expect("cents"), 5);
        assert_eq!(parse_money("-3.10").expect("negative"), -310);
        assert!(parse_money("").is_err());
        assert!(parse_money("1.234").is_err());
        assert!(parse_money("12a").is_err());
    }

    #[test]
    fn list_layout_switches_at_narrow_width() {
        assert_eq!(ListLayout::for_width(NARROW_WIDTH - 1), ListLayout::Cards);
        assert_eq!(ListLayout::for_width(NARROW_WIDTH), ListLayout::Table);
    }

    #[test]
    fn page_buttons_disable_unreachable_arrows() {
        let store = RecordStore::new(sample::invoices()).expect("sample store");
        let mut browser = InvoiceBrowser::new(store, Pager::default());
        assert_eq!(page_buttons_text(&browser.visible_slice()), "· · [1] 2 3 › »");
        browser.set_page(3);
        assert_eq!(page_buttons_text(&browser.visible_slice()), "« ‹ 1 2 [3] · ·");
        browser.set_query("no such invoice");
        assert_eq!(page_buttons_text(&browser.visible_slice()), "");
    }

    #[test]
    fn sidebar_marks_active_item_and_open_group() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::SignedIn);
        state.dispatch(AppCommand::Navigate(ScreenKind::InvoiceNew));
        state.dispatch(AppCommand::ToggleGroup("invoice"));
        let text = render_sidebar_text(&state);
        assert!(text.contains("▌▾ Invoice"));
        assert!(text.contains("   • New Invoice"));
        assert!(text.contains("    List Invoice"));
        assert!(text.contains(" ▸ Expenses"));
    }

    #[test]
    fn every_screen_renders_at_both_widths() {
        for width in [80, 140] {
            let mut harness = Harness::new();
            let mut terminal =
                Terminal::new(TestBackend::new(width, 40)).expect("test terminal");
            terminal
                .draw(|frame| render(frame, &harness.state, &harness.view_data))
                .expect("login renders");

            harness = Harness::signed_in();
            for shortcut in ['d', 'l', 'n', 'a'] {
                harness.ctrl(shortcut);
                terminal
                    .draw(|frame| render(frame, &harness.state, &harness.view_data))
                    .expect("screen renders");
            }
        }
    }
}
