// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::info;

use crate::{Invoice, format_cents};

pub const INVOICE_COLUMNS: [&str; 10] = [
    "#",
    "INV NUM",
    "DATE",
    "SUPPLIER",
    "PRODUCT",
    "PICKUP",
    "DROP",
    "TOTAL PRICE",
    "TRUCK REGO NUMBER",
    "NO OF LOADS",
];

const SUPPLIER_LINE_SEPARATOR: &str = " | ";
const FILE_STEM: &str = "invoices_export";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Spreadsheet,
    Document,
}

impl ExportFormat {
    pub const ALL: [Self; 3] = [Self::Csv, Self::Spreadsheet, Self::Document];

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Spreadsheet => "xls",
            Self::Document => "pdf",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Spreadsheet | Self::Document => "application/vnd.ms-excel",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xls" | "excel" => Some(Self::Spreadsheet),
            "pdf" => Some(Self::Document),
            _ => None,
        }
    }
}

/// A downloadable payload. The body is the same comma-joined text for every
/// format; only the file name and declared content type change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub format: ExportFormat,
    pub file_name: String,
    pub content_type: &'static str,
    pub body: String,
}

impl Export {
    pub fn build(format: ExportFormat, records: &[&Invoice], now: OffsetDateTime) -> Self {
        Self {
            format,
            file_name: export_file_name(format, now),
            content_type: format.content_type(),
            body: to_delimited_text(records, &INVOICE_COLUMNS),
        }
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("create export directory {}", dir.display()))?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.body)
            .with_context(|| format!("write export {}", path.display()))?;
        info!(
            path = %path.display(),
            content_type = self.content_type,
            bytes = self.body.len(),
            "export written"
        );
        Ok(path)
    }
}

pub fn export_file_name(format: ExportFormat, now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    format!("{FILE_STEM}_{millis}.{}", format.extension())
}

/// Header line plus one line per record, joined with `\n`.
///
/// Supplier and product are wrapped in double quotes; supplier lines are
/// joined with `" | "`. Embedded quotes and commas are written through
/// unescaped, and only the supplier has its newlines flattened: a newline in
/// product, pickup, drop, or vehicle adds a line to the output.
// TODO: escape embedded quotes/commas and flatten newlines in every field once the target spreadsheet encoding is chosen.
pub fn to_delimited_text(records: &[&Invoice], columns: &[&str]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(columns.join(","));
    for (index, record) in records.iter().enumerate() {
        lines.push(delimited_row(index + 1, record));
    }
    lines.join("\n")
}

fn delimited_row(position: usize, record: &Invoice) -> String {
    let supplier = record
        .supplier
        .joined("\n")
        .replace('\n', SUPPLIER_LINE_SEPARATOR);
    [
        position.to_string(),
        record.number.clone(),
        record.date.to_string(),
        format!("\"{supplier}\""),
        format!("\"{}\"", record.product),
        record.pickup.clone(),
        record.drop_location.clone(),
        format_cents(record.total_cents),
        record.vehicle.clone(),
        record.loads.to_string(),
    ]
    .join(",")
}

/// Indented JSON of `records`, readable back with [`parse_clipboard_payload`].
pub fn to_clipboard_payload(records: &[&Invoice]) -> Result<String> {
    serde_json::to_string_pretty(records).context("serialize invoices for clipboard")
}

pub fn parse_clipboard_payload(payload: &str) -> Result<Vec<Invoice>> {
    serde_json::from_str(payload).context("decode clipboard invoices")
}

/// Minimal styled HTML for printing the rows currently on screen.
pub fn print_document(rows: &[&Invoice], start_index: usize) -> String {
    let mut out = String::new();
    out.push_str("<html>\n<head><title>Print - Invoices</title>\n<style>\n");
    out.push_str("body { font-family: Arial, Helvetica, sans-serif; padding: 20px; }\n");
    out.push_str("table { width:100%; border-collapse: collapse; }\n");
    out.push_str("th, td { border: 1px solid #ddd; padding: 6px 8px; font-size:12px; }\n");
    out.push_str("th { background:#0f766e; color:white; }\n");
    out.push_str("</style>\n</head>\n<body>\n<h3>Invoices</h3>\n<table>\n<tr>");
    for column in INVOICE_COLUMNS {
        out.push_str(&format!("<th>{}</th>", escape_html(column)));
    }
    out.push_str("</tr>\n");
    for (offset, row) in rows.iter().enumerate() {
        let supplier = format!(
            "{}<br>{}",
            escape_html(&row.supplier.name),
            escape_html(&row.supplier.address)
        );
        let cells = [
            (start_index + offset + 1).to_string(),
            escape_html(&row.number),
            row.date.to_string(),
            supplier,
            escape_html(&row.product),
            escape_html(&row.pickup),
            escape_html(&row.drop_location),
            format_cents(row.total_cents),
            escape_html(&row.vehicle),
            row.loads.to_string(),
        ];
        out.push_str("<tr>");
        for cell in cells {
            out.push_str(&format!("<td>{cell}</td>"));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n</body>\n</html>\n");
    out
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
