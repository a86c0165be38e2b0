// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ScreenKind;
use crate::nav::SidebarState;

/// Starting value of the "invoices generated" header counter.
pub const GENERATED_INVOICES_START: u32 = 338;
const BULK_IMPORT_BATCH: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopbarMenu {
    Notifications,
    QuickActions,
    Profile,
}

/// Session-wide view state shared by every screen.
///
/// Menus are mutually exclusive, so at most one topbar menu is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub screen: ScreenKind,
    pub sidebar: SidebarState,
    pub open_menu: Option<TopbarMenu>,
    pub unread: usize,
    pub logout_prompt: bool,
    pub generated_invoices: u32,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            screen: ScreenKind::Login,
            sidebar: SidebarState::default(),
            open_menu: None,
            unread: 0,
            logout_prompt: false,
            generated_invoices: GENERATED_INVOICES_START,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Navigate(ScreenKind),
    SignedIn,
    ToggleSidebar,
    ToggleMobileSidebar,
    ToggleGroup(&'static str),
    ToggleMenu(TopbarMenu),
    DismissOverlays,
    SetUnread(usize),
    RequestLogout,
    CancelLogout,
    ConfirmLogout,
    InvoiceCreated,
    BulkImported,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ScreenChanged(ScreenKind),
    SidebarCollapsed(bool),
    DrawerToggled(bool),
    GroupToggled(&'static str, bool),
    MenuChanged(Option<TopbarMenu>),
    UnreadChanged(usize),
    LogoutRequested,
    LogoutCancelled,
    SignedOut,
    GeneratedCountChanged(u32),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::Navigate(screen) => self.go_to(screen),
            AppCommand::SignedIn => {
                let mut events = self.go_to(ScreenKind::Dashboard);
                events.push(self.set_status("signed in"));
                events
            }
            AppCommand::ToggleSidebar => {
                let collapsed = self.sidebar.toggle_collapsed();
                vec![AppEvent::SidebarCollapsed(collapsed)]
            }
            AppCommand::ToggleMobileSidebar => {
                let open = self.sidebar.toggle_mobile();
                vec![AppEvent::DrawerToggled(open)]
            }
            AppCommand::ToggleGroup(id) => match self.sidebar.toggle_group(id) {
                Some(open) => vec![AppEvent::GroupToggled(id, open)],
                None => Vec::new(),
            },
            AppCommand::ToggleMenu(menu) => self.toggle_menu(menu),
            AppCommand::DismissOverlays => {
                let mut events = Vec::new();
                if self.open_menu.take().is_some() {
                    events.push(AppEvent::MenuChanged(None));
                }
                if self.logout_prompt {
                    self.logout_prompt = false;
                    events.push(AppEvent::LogoutCancelled);
                }
                events
            }
            AppCommand::SetUnread(count) => {
                self.unread = count;
                vec![AppEvent::UnreadChanged(count)]
            }
            AppCommand::RequestLogout => {
                self.logout_prompt = true;
                let mut events = Vec::new();
                if self.open_menu == Some(TopbarMenu::Profile) {
                    self.open_menu = None;
                    events.push(AppEvent::MenuChanged(None));
                }
                events.push(AppEvent::LogoutRequested);
                events
            }
            AppCommand::CancelLogout => {
                self.logout_prompt = false;
                vec![AppEvent::LogoutCancelled]
            }
            AppCommand::ConfirmLogout => {
                self.logout_prompt = false;
                self.open_menu = None;
                let mut events = vec![AppEvent::SignedOut];
                events.extend(self.go_to(ScreenKind::Login));
                events
            }
            AppCommand::InvoiceCreated => self.bump_generated(1),
            AppCommand::BulkImported => self.bump_generated(BULK_IMPORT_BATCH),
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    pub fn shows_chrome(&self) -> bool {
        self.screen.shows_chrome()
    }

    fn go_to(&mut self, screen: ScreenKind) -> Vec<AppEvent> {
        if self.screen == screen {
            return Vec::new();
        }
        self.screen = screen;
        self.open_menu = None;
        self.sidebar.mobile_open = false;
        vec![AppEvent::ScreenChanged(screen)]
    }

    fn toggle_menu(&mut self, menu: TopbarMenu) -> Vec<AppEvent> {
        self.open_menu = if self.open_menu == Some(menu) {
            None
        } else {
            Some(menu)
        };
        let mut events = vec![AppEvent::MenuChanged(self.open_menu)];
        if self.open_menu == Some(TopbarMenu::Notifications) && self.unread > 0 {
            self.unread = 0;
            events.push(AppEvent::UnreadChanged(0));
        }
        events
    }

    fn bump_generated(&mut self, by: u32) -> Vec<AppEvent> {
        self.generated_invoices = self.generated_invoices.saturating_add(by);
        vec![AppEvent::GeneratedCountChanged(self.generated_invoices)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
