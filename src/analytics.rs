use log::{ error, info };
use reqwest::Client;
use std::fmt::Write as _;
use std::time::Duration;
use thiserror::Error;

use crate::models::analytics::{ ChartSeries, CriticalStock, MonthlyRevenue };
use crate::transport::http::{ build_client, fetch_json };
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("could not load {chart}: {source}")]
    Fetch {
        chart: &'static str,
        #[source]
        source: TransportError,
    },
}

/// Read-only client for the dashboard charts.
pub struct AnalyticsClient {
    client: Client,
    sales_base: String,
    inventory_base: String,
}

impl AnalyticsClient {
    pub fn new(
        sales_base: &str,
        inventory_base: &str,
        timeout: Option<Duration>
    ) -> Result<Self, TransportError> {
        url::Url::parse(sales_base)?;
        url::Url::parse(inventory_base)?;
        Ok(Self {
            client: build_client(timeout)?,
            sales_base: sales_base.trim_end_matches('/').to_string(),
            inventory_base: inventory_base.trim_end_matches('/').to_string(),
        })
    }

    pub async fn monthly_revenue(&self) -> Result<ChartSeries, AnalyticsError> {
        let url = format!("{}/ventas/ingresos-mensuales", self.sales_base);
        match fetch_json::<Vec<MonthlyRevenue>>(&self.client, &url).await {
            Ok(rows) => {
                info!("Monthly revenue: {} months", rows.len());
                Ok(ChartSeries::from_revenue(rows))
            }
            Err(source) => {
                error!("Error fetching monthly revenue: {}", source);
                Err(AnalyticsError::Fetch { chart: "ingresos mensuales", source })
            }
        }
    }

    pub async fn critical_stock(&self) -> Result<ChartSeries, AnalyticsError> {
        let url = format!("{}/productos/stock-critico", self.inventory_base);
        match fetch_json::<Vec<CriticalStock>>(&self.client, &url).await {
            Ok(rows) => {
                info!("Critical stock: {} products", rows.len());
                Ok(ChartSeries::from_stock(rows))
            }
            Err(source) => {
                error!("Error fetching critical stock: {}", source);
                Err(AnalyticsError::Fetch { chart: "stock crítico", source })
            }
        }
    }
}

/// Horizontal bars scaled so the largest value spans `width` cells.
pub fn render_bar_chart(series: &ChartSeries, width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", series.title);
    if series.is_empty() {
        out.push_str("  (sin datos)\n");
        return out;
    }
    let label_width = series.labels
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0);
    let max = series.max_value();
    for (label, value) in series.labels.iter().zip(&series.values) {
        let cells = if max > 0.0 && *value > 0.0 {
            ((value / max) * (width as f64)).round().max(1.0) as usize
        } else {
            0
        };
        let pad = label_width - label.chars().count();
        let _ = writeln!(
            out,
            "  {}{} │{} {}",
            label,
            " ".repeat(pad),
            "█".repeat(cells),
            format_value(*value)
        );
    }
    out
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 { format!("{}", value as i64) } else { format!("{:.2}", value) }
}
