pub mod analytics;
pub mod cli;
pub mod config;
pub mod events;
pub mod models;
pub mod notice;
pub mod render;
pub mod repl;
pub mod sales;
pub mod storage;
pub mod transport;
pub mod widget;

use analytics::AnalyticsClient;
use cli::Args;
use config::{ http_timeout, WidgetConfig };
use log::info;
use repl::Session;
use sales::SalesClient;
use std::error::Error;
use std::sync::Arc;
use storage::{ create_store, AvatarStore };
use transport::HttpTransport;
use widget::ChatWidget;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Chat API Base: {}", args.api_base);
    info!("User: {} ({})", args.user_name, args.user_id);
    info!("Storage Path: {}", args.storage_path.as_deref().unwrap_or("memory"));
    info!("Notice Duration: {}ms", args.notice_ms);
    info!("Rate Limit Statuses: {:?}", args.rate_limit_status);
    info!("Rate Limit Markers: {:?}", args.rate_limit_markers);
    info!("Analytics Base: {}", args.analytics_base);
    info!("Inventory Base: {}", args.inventory_base);
    info!("Sales Base: {}", args.sales_base);
    info!("-------------------------");

    let timeout = http_timeout(&args);
    let transport = Arc::new(HttpTransport::new(&args.api_base, timeout)?);
    let store = create_store(args.storage_path.as_deref())?;
    let widget = Arc::new(ChatWidget::new(transport, store.clone(), WidgetConfig::from_args(&args)));

    let session = Session {
        widget,
        avatars: AvatarStore::new(store, Some(args.user_id.as_str()), &args.user_name),
        analytics: AnalyticsClient::new(&args.analytics_base, &args.inventory_base, timeout)?,
        sales: SalesClient::new(&args.sales_base, timeout)?,
        chart_width: args.chart_width,
    };
    repl::run(session).await
}
