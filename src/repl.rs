use log::{ info, warn };
use std::error::Error;
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::Arc;
use tokio::io::{ AsyncBufReadExt, BufReader };

use crate::analytics::{ render_bar_chart, AnalyticsClient };
use crate::events::WidgetEvent;
use crate::render::render;
use crate::sales::{ filter_details, paginate, render_sales_page, SalesClient };
use crate::storage::AvatarStore;
use crate::widget::ChatWidget;

const HELP: &str = "\
Comandos:
  <texto>          enviar mensaje (//texto envía \"/texto\")
  /list            recargar conversaciones
  /open <id>       abrir conversación
  /new             nueva conversación
  /delete <id>     eliminar conversación
  /avatar <ruta>   cambiar avatar
  /charts          ver gráficos del panel
  /ventas [término] [página]
                   detalle de ventas, 10 por página (* = sin filtro)
  /dismiss         ocultar el aviso
  /help            esta ayuda
  /quit            salir";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Send(String),
    List,
    Open(i64),
    New,
    Delete(i64),
    Avatar(String),
    Charts,
    Sales {
        term: String,
        page: usize,
    },
    Dismiss,
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let text = line.trim_end_matches(&['\r', '\n'][..]);
    if !trimmed.starts_with('/') {
        return Some(Command::Send(text.to_string()));
    }
    if trimmed.starts_with("//") {
        return Some(Command::Send(text.trim_start()[1..].to_string()));
    }
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).unwrap_or_default();
    let id = || arg.parse::<i64>().ok();

    let command = match name {
        "/list" => Command::List,
        "/new" => Command::New,
        "/charts" => Command::Charts,
        "/ventas" => parse_sales(arg),
        "/dismiss" => Command::Dismiss,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        "/open" => id().map(Command::Open).unwrap_or_else(|| Command::Invalid(trimmed.into())),
        "/delete" => id().map(Command::Delete).unwrap_or_else(|| Command::Invalid(trimmed.into())),
        "/avatar" if !arg.is_empty() => Command::Avatar(arg.to_string()),
        _ => Command::Invalid(trimmed.to_string()),
    };
    Some(command)
}

/// `[term] [page]`: a trailing number is the page when a term precedes it,
/// and `*` stands for "no filter".
fn parse_sales(arg: &str) -> Command {
    let mut words: Vec<&str> = arg.split_whitespace().collect();
    let mut page = 1;
    if words.len() > 1 {
        if let Some(n) = words.last().and_then(|w| w.parse::<usize>().ok()) {
            page = n.max(1);
            words.pop();
        }
    }
    let term = match words.as_slice() {
        ["*"] => String::new(),
        _ => words.join(" "),
    };
    Command::Sales { term, page }
}

pub struct Session {
    pub widget: Arc<ChatWidget>,
    pub avatars: AvatarStore,
    pub analytics: AnalyticsClient,
    pub sales: SalesClient,
    pub chart_width: usize,
}

impl Session {
    /// Returns `false` when the user asked to quit.
    pub async fn dispatch(&self, command: Command) -> bool {
        match command {
            Command::Send(text) => {
                self.widget.set_draft(text);
                self.widget.send_draft().await;
            }
            Command::List => {
                self.widget.refresh_conversations().await;
            }
            Command::Open(id) => {
                self.widget.select_conversation(id).await;
            }
            Command::New => self.widget.start_new_conversation(),
            Command::Delete(id) => {
                self.widget.delete_conversation(id).await;
            }
            Command::Avatar(path) => {
                match self.avatars.save_from_file(&path) {
                    Ok(url) => println!("Avatar actualizado ({} caracteres).", url.len()),
                    Err(e) => {
                        warn!("Avatar upload failed: {}", e);
                        println!("No se pudo leer la imagen: {}", e);
                    }
                }
            }
            Command::Charts => self.print_charts().await,
            Command::Sales { term, page } => self.print_sales(&term, page).await,
            Command::Dismiss => self.widget.dismiss_notification(),
            Command::Help => println!("{}", HELP),
            Command::Invalid(raw) => println!("Comando desconocido: {}\n{}", raw, HELP),
            Command::Quit => {
                return false;
            }
        }
        true
    }

    async fn print_sales(&self, term: &str, page: usize) {
        match self.sales.list_details().await {
            Ok(rows) => {
                let matched = filter_details(&rows, term);
                println!("{}", render_sales_page(&paginate(&matched, page)));
            }
            Err(e) => println!("{}", e),
        }
    }

    async fn print_charts(&self) {
        for result in [self.analytics.monthly_revenue().await, self.analytics.critical_stock().await] {
            match result {
                Ok(series) => println!("{}", render_bar_chart(&series, self.chart_width)),
                Err(e) => println!("{}", e),
            }
        }
    }
}

/// Interactive loop over stdin. The widget view is redrawn after any
/// command that changed state; snackbar notices are printed as they appear.
pub async fn run(session: Session) -> Result<(), Box<dyn Error + Send + Sync>> {
    let dirty = Arc::new(AtomicBool::new(true));
    let flag = dirty.clone();
    let _subscription = session.widget.subscribe(move |event| {
        match event {
            WidgetEvent::NotificationShown(n) => println!("[{}] {}", n.severity, n.text),
            WidgetEvent::NotificationHidden | WidgetEvent::DraftChanged => {}
            _ => flag.store(true, Ordering::SeqCst),
        }
    });

    session.widget.open().await;
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if dirty.swap(false, Ordering::SeqCst) {
            println!("{}", render(&session.widget.snapshot(), &session.widget.notification()));
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(command) = parse_command(&line) else {
            continue;
        };
        if !session.dispatch(command).await {
            break;
        }
    }

    session.widget.close();
    info!("Chat session closed");
    Ok(())
}
