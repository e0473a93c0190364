use clap::Parser;

use crate::config::DEFAULT_USER_ID;
use crate::transport::DEFAULT_API_BASE;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat Backend Args ---
    /// Base URL of the chat backend (e.g., http://localhost:8080/api/gemini/chat)
    #[arg(long, env = "CHAT_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Request timeout in seconds for backend calls. 0 disables the timeout.
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "60")]
    pub http_timeout_secs: u64,

    // --- User Args ---
    /// Id sent to the backend as `usuarioId` and used to key the avatar.
    #[arg(long, env = "CHAT_USER_ID", default_value = DEFAULT_USER_ID)]
    pub user_id: String,

    /// Display name; keys the avatar when the user id is empty.
    #[arg(long, env = "CHAT_USER_NAME", default_value = "Usuario")]
    pub user_name: String,

    // --- Storage Args ---
    /// JSON file holding the durable keys (active conversation, avatar). In-memory when unset.
    #[arg(long, env = "STORAGE_PATH")]
    pub storage_path: Option<String>,

    // --- Snackbar Args ---
    /// Default time a notification stays visible, in milliseconds.
    #[arg(long, env = "NOTICE_MS", default_value = "2500")]
    pub notice_ms: u64,

    /// HTTP statuses that mean the assistant is saturated (comma separated).
    #[arg(long, env = "RATE_LIMIT_STATUS", value_delimiter = ',', default_value = "429")]
    pub rate_limit_status: Vec<u16>,

    /// Case-insensitive error text markers that mean the assistant is saturated (comma separated).
    #[arg(
        long,
        env = "RATE_LIMIT_MARKERS",
        value_delimiter = ',',
        default_values = ["resource_exhausted", "429"]
    )]
    pub rate_limit_markers: Vec<String>,

    // --- Dashboard Args ---
    /// Base URL serving `/ventas/ingresos-mensuales`.
    #[arg(long, env = "ANALYTICS_BASE", default_value = "https://backend7semestres-4.onrender.com")]
    pub analytics_base: String,

    /// Base URL serving `/productos/stock-critico`.
    #[arg(long, env = "INVENTORY_BASE", default_value = "http://localhost:8080/api")]
    pub inventory_base: String,

    /// Base URL serving `/detalleventa/listar`.
    #[arg(
        long,
        env = "SALES_BASE",
        default_value = "https://backend-stackflow-a9cqgjede9hbgch7.centralus-01.azurewebsites.net"
    )]
    pub sales_base: String,

    /// Width in characters of the dashboard bars.
    #[arg(long, env = "CHART_WIDTH", default_value = "40")]
    pub chart_width: usize,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}
