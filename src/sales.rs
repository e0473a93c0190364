use log::{ error, info };
use reqwest::Client;
use std::fmt::Write as _;
use std::time::Duration;
use thiserror::Error;

use crate::models::sales::SaleDetail;
use crate::transport::http::{ build_client, fetch_json };
use crate::transport::TransportError;

pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Error)]
pub enum SalesError {
    #[error("could not load sales detail: {0}")]
    Fetch(#[source] TransportError),
}

/// Read-only client for the sales detail table.
pub struct SalesClient {
    client: Client,
    base_url: String,
}

impl SalesClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        url::Url::parse(base_url)?;
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// All sale lines, newest first.
    pub async fn list_details(&self) -> Result<Vec<SaleDetail>, SalesError> {
        let url = format!("{}/detalleventa/listar", self.base_url);
        match fetch_json::<Vec<SaleDetail>>(&self.client, &url).await {
            Ok(mut rows) => {
                info!("Sales detail: {} lines", rows.len());
                sort_newest_first(&mut rows);
                Ok(rows)
            }
            Err(e) => {
                error!("Error fetching sales detail: {}", e);
                Err(SalesError::Fetch(e))
            }
        }
    }
}

/// Stable; undated rows sink to the end.
pub fn sort_newest_first(rows: &mut [SaleDetail]) {
    rows.sort_by_key(|row| std::cmp::Reverse(row.sold_at()));
}

/// Rows matching `term` case-insensitively. A blank term keeps everything.
pub fn filter_details<'a>(rows: &'a [SaleDetail], term: &str) -> Vec<&'a SaleDetail> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return rows.iter().collect();
    }
    rows.iter()
        .filter(|row| row.matches(&needle))
        .collect()
}

#[derive(Debug, PartialEq)]
pub struct SalesPage<'a> {
    /// 1-based, clamped to `1..=total_pages`.
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    /// Row number across all pages (1-based) paired with the row.
    pub rows: Vec<(usize, &'a SaleDetail)>,
}

pub fn paginate<'a>(rows: &[&'a SaleDetail], page: usize) -> SalesPage<'a> {
    let total_pages = rows.len().div_ceil(PAGE_SIZE);
    let page = page.clamp(1, total_pages.max(1));
    let first = (page - 1) * PAGE_SIZE;
    SalesPage {
        page,
        total_pages,
        total_rows: rows.len(),
        rows: rows
            .iter()
            .enumerate()
            .skip(first)
            .take(PAGE_SIZE)
            .map(|(i, row)| (i + 1, *row))
            .collect(),
    }
}

pub fn render_sales_page(page: &SalesPage<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Detalle de ventas (página {} de {}, {} resultados)",
        page.page,
        page.total_pages.max(1),
        page.total_rows
    );
    if page.rows.is_empty() {
        out.push_str("  (sin resultados)\n");
        return out;
    }
    let cell = |v: &Option<String>| v.clone().unwrap_or_else(|| "—".to_string());
    for (n, row) in &page.rows {
        let _ = writeln!(
            out,
            "  {:>3}. {} | {} | cant. {} | {} | satisf. {} | {}",
            n,
            cell(&row.cod_pro),
            cell(&row.nompro),
            cell(&row.cantidad),
            cell(&row.precio),
            cell(&row.satisfaction_score),
            cell(&row.fecha)
        );
    }
    out
}
