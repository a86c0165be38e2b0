// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod browser;
pub mod dashboard;
pub mod export;
pub mod filter;
pub mod forms;
pub mod ids;
pub mod model;
pub mod nav;
pub mod pager;
pub mod sample;
pub mod state;
pub mod store;

pub use browser::*;
pub use dashboard::{DashboardData, Kpi};
pub use export::{Export, ExportFormat};
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use pager::{Page, PageNav, Pager};
pub use state::*;
pub use store::RecordStore;
