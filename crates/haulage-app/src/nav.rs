// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::ScreenKind;

/// Routes rendered without the sidebar and topbar, including their sub-paths.
pub const CHROMELESS_ROUTES: [&str; 4] = ["/login", "/register", "/forgot-password", "/auth/logout"];

pub const LOGOUT_ROUTE: &str = "/auth/logout";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub id: &'static str,
    pub label: &'static str,
    pub href: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub id: &'static str,
    pub label: &'static str,
    pub href: &'static str,
    pub children: &'static [NavLink],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavSection {
    pub heading: &'static str,
    pub items: &'static [NavItem],
}

const fn leaf(id: &'static str, label: &'static str, href: &'static str) -> NavItem {
    NavItem {
        id,
        label,
        href,
        children: &[],
    }
}

pub const SIDEBAR: [NavSection; 3] = [
    NavSection {
        heading: "",
        items: &[leaf("dashboard", "Dashboard", "/dashboard")],
    },
    NavSection {
        heading: "Management & Controls",
        items: &[
            NavItem {
                id: "invoice",
                label: "Invoice",
                href: "/invoice/list",
                children: &[
                    NavLink {
                        id: "invoice_new",
                        label: "New Invoice",
                        href: "/invoice/new",
                    },
                    NavLink {
                        id: "invoice_list",
                        label: "List Invoice",
                        href: "/invoice/list",
                    },
                ],
            },
            leaf("trips", "Trips", "/trips"),
            leaf("suppliers", "Suppliers", "/suppliers"),
            leaf("routes", "Routes", "/routes"),
            leaf("products", "Products", "/products"),
            leaf("drivers", "Drivers", "/drivers"),
            leaf("vehicles", "Vehicles", "/vehicles"),
            leaf("trailers", "Trailers", "/trailers"),
            leaf("billto", "Bill To", "/bill-to"),
            NavItem {
                id: "expenses",
                label: "Expenses",
                href: "/expenses/list",
                children: &[
                    NavLink {
                        id: "expense_category",
                        label: "Expense Category",
                        href: "/expenses/categories",
                    },
                    NavLink {
                        id: "expense_list",
                        label: "Expense",
                        href: "/expenses/list",
                    },
                ],
            },
        ],
    },
    NavSection {
        heading: "Others",
        items: &[
            leaf("reports", "Reports", "/reports"),
            leaf("settings", "Settings", "/settings"),
            leaf("logout", "Logout", LOGOUT_ROUTE),
        ],
    },
];

fn route_matches(path: &str, route: &str) -> bool {
    path == route
        || path
            .strip_prefix(route)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub fn hides_chrome(path: &str) -> bool {
    CHROMELESS_ROUTES
        .iter()
        .any(|route| route_matches(path, route))
}

/// Whether `item` should be highlighted for `path`.
///
/// Parent items light up for any child whose href prefixes the path, so
/// "/invoice/new" activates the Invoice group even though the group's own
/// href is the list page.
pub fn is_active(item: &NavItem, path: &str) -> bool {
    if route_matches(path, item.href) {
        return true;
    }
    item.children
        .iter()
        .any(|child| path.starts_with(child.href))
}

pub fn items() -> impl Iterator<Item = &'static NavItem> {
    SIDEBAR.iter().flat_map(|section| section.items.iter())
}

pub fn find_item(id: &str) -> Option<&'static NavItem> {
    items().find(|item| item.id == id)
}

/// Screen a sidebar href leads to, if the terminal build has one.
pub fn screen_for_href(href: &str) -> Option<ScreenKind> {
    ScreenKind::from_route(href)
}

/// Sidebar view state: collapse, mobile drawer, and expanded groups.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SidebarState {
    pub collapsed: bool,
    pub mobile_open: bool,
    open_groups: BTreeSet<&'static str>,
}

impl SidebarState {
    pub fn toggle_collapsed(&mut self) -> bool {
        self.collapsed = !self.collapsed;
        self.collapsed
    }

    pub fn toggle_mobile(&mut self) -> bool {
        self.mobile_open = !self.mobile_open;
        self.mobile_open
    }

    /// Expands or folds a group. Returns the new open state, or `None` for
    /// ids that are not groups.
    pub fn toggle_group(&mut self, id: &str) -> Option<bool> {
        let item = find_item(id).filter(|item| !item.children.is_empty())?;
        if self.open_groups.remove(item.id) {
            Some(false)
        } else {
            self.open_groups.insert(item.id);
            Some(true)
        }
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.open_groups.contains(id)
    }
}
