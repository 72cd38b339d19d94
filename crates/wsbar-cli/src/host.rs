use std::fs;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use wsbar_core::ShellConfig;
use wsbar_exec::AuthProvider;
use wsbar_exec::HttpPort;
use wsbar_exec::Navigator;
use wsbar_exec::ReqwestHttp;
use wsbar_exec::RestCommandDispatcher;
use wsbar_exec::ShellPorts;

const DEFAULT_LOG_FILTER: &str = "warn,wsbar=info,wsbar_core=info,wsbar_exec=info";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Routes logs to `<data_dir>/wsbar/wsbar.log` so they stay off the alternate
/// screen. Returns `None` (and installs nothing) when the directory is unusable.
pub fn init_file_logging() -> Option<WorkerGuard> {
    let dir = dirs::data_dir()?.join("wsbar");
    fs::create_dir_all(&dir).ok()?;
    let appender = tracing_appender::rolling::never(&dir, "wsbar.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

/// Auth context for a CLI session: signed in while a session token is held.
pub struct SessionAuth {
    signed_in: AtomicBool,
}

impl SessionAuth {
    pub fn new(signed_in: bool) -> Self {
        Self {
            signed_in: AtomicBool::new(signed_in),
        }
    }
}

impl AuthProvider for SessionAuth {
    fn is_authenticated(&self) -> bool {
        self.signed_in.load(Ordering::SeqCst)
    }

    fn sign_out(&self) {
        if self.signed_in.swap(false, Ordering::SeqCst) {
            info!("session token dropped");
        }
    }
}

/// A terminal cannot follow links, so the last destination is kept for the
/// status line instead.
#[derive(Default)]
pub struct StatusNavigator {
    last: Mutex<Option<String>>,
}

impl StatusNavigator {
    pub fn last(&self) -> Option<String> {
        match self.last.lock() {
            Ok(last) => last.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Navigator for StatusNavigator {
    fn navigate(&self, path: &str) {
        info!(%path, "navigation requested");
        let mut last = match self.last.lock() {
            Ok(last) => last,
            Err(poisoned) => poisoned.into_inner(),
        };
        *last = Some(path.to_string());
    }
}

pub fn build_ports(
    config: &ShellConfig,
    session: Option<&str>,
    navigator: Arc<StatusNavigator>,
) -> ShellPorts {
    let mut http = ReqwestHttp::new(config.api.base_url.clone());
    if let Some(token) = session {
        http = http.with_session_cookie(&config.api.session_cookie, token);
    }
    let http: Arc<dyn HttpPort> = Arc::new(http);
    let dispatcher = RestCommandDispatcher::new(Arc::clone(&http), config.api.command_path.clone());

    ShellPorts {
        http,
        dispatcher: Arc::new(dispatcher),
        navigator,
        auth: Arc::new(SessionAuth::new(session.is_some())),
    }
}
