use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tokio::sync::Semaphore;
use wsbar_core::ActionId;
use wsbar_core::FieldKey;
use wsbar_core::SessionState;

use super::*;
use crate::ports::HttpResponse;
use crate::ports::TransportError;

const USER_BODY: &str =
    r#"{"data":{"type":"users","id":"0x7f","attributes":{"user_name":"ada","affiliation":"lab"}}}"#;

struct FakeHttp {
    reply: Result<HttpResponse, TransportError>,
    gets: AtomicUsize,
}

impl FakeHttp {
    fn replying(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            }),
            gets: AtomicUsize::new(0),
        })
    }

    fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(TransportError("connection refused".to_string())),
            gets: AtomicUsize::new(0),
        })
    }

    fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpPort for FakeHttp {
    async fn get(&self, _path: &str) -> Result<HttpResponse, TransportError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }

    async fn post_json(&self, _path: &str, _body: &Value) -> Result<HttpResponse, TransportError> {
        Err(TransportError("not used by the shell".to_string()))
    }
}

/// Holds every GET until the test opens the gate, tracking overlap.
struct GatedHttp {
    gate: Semaphore,
    started: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl GatedHttp {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            started: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl HttpPort for GatedHttp {
    async fn get(&self, _path: &str) -> Result<HttpResponse, TransportError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let permit = self.gate.acquire().await.expect("gate open");
        permit.forget();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(HttpResponse {
            status: 200,
            body: USER_BODY.as_bytes().to_vec(),
        })
    }

    async fn post_json(&self, _path: &str, _body: &Value) -> Result<HttpResponse, TransportError> {
        Err(TransportError("not used by the shell".to_string()))
    }
}

#[derive(Default)]
struct RecordingDispatcher {
    commands: Mutex<Vec<String>>,
}

impl RecordingDispatcher {
    fn commands(&self) -> Vec<String> {
        self.commands.lock().expect("commands lock").clone()
    }
}

#[async_trait]
impl CommandDispatcher for RecordingDispatcher {
    async fn dispatch(&self, command_text: String) {
        self.commands
            .lock()
            .expect("commands lock")
            .push(command_text);
    }
}

#[derive(Default)]
struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.paths
            .lock()
            .expect("paths lock")
            .push(path.to_string());
    }
}

struct FakeAuth {
    authenticated: AtomicBool,
    sign_outs: AtomicUsize,
}

impl FakeAuth {
    fn new(authenticated: bool) -> Arc<Self> {
        Arc::new(Self {
            authenticated: AtomicBool::new(authenticated),
            sign_outs: AtomicUsize::new(0),
        })
    }
}

impl AuthProvider for FakeAuth {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    fn sign_out(&self) {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        self.authenticated.store(false, Ordering::SeqCst);
    }
}

struct Harness {
    driver: ShellDriver,
    http: Arc<FakeHttp>,
    dispatcher: Arc<RecordingDispatcher>,
    navigator: Arc<RecordingNavigator>,
    auth: Arc<FakeAuth>,
}

fn harness(http: Arc<FakeHttp>, authenticated: bool) -> Harness {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let auth = FakeAuth::new(authenticated);
    let ports = ShellPorts {
        http: http.clone(),
        dispatcher: dispatcher.clone(),
        navigator: navigator.clone(),
        auth: auth.clone(),
    };
    Harness {
        driver: ShellDriver::new(ShellConfig::default(), ports, Handle::current()),
        http,
        dispatcher,
        navigator,
        auth,
    }
}

#[tokio::test]
async fn one_fetch_across_renders_and_remounts() {
    let mut h = harness(FakeHttp::replying(200, USER_BODY), true);

    assert!(h.driver.mount().redraw);
    for _ in 0..4 {
        let _ = h.driver.render();
        h.driver.mount();
        h.driver.sync_auth();
    }
    assert!(h.driver.state().session().is_loading());

    let outcome = h.driver.settle().await;

    assert!(outcome.redraw);
    assert_eq!(h.http.gets(), 1);
    assert_eq!(h.driver.state().user_name(), Some("ada"));
    let profile = h.driver.state().session().profile().expect("profile");
    assert_eq!(profile.user_id, "0x7f");
    assert_eq!(profile.attribute("affiliation"), Some(&Value::from("lab")));

    h.driver.mount();
    h.driver.settle().await;
    assert_eq!(h.http.gets(), 1);
}

#[tokio::test]
async fn malformed_body_degrades_to_fetch_failed() {
    let mut h = harness(FakeHttp::replying(200, r#"{"data":{}}"#), true);

    h.driver.mount();
    h.driver.settle().await;

    assert_eq!(h.driver.state().session(), &SessionState::FetchFailed);
    let warnings = h
        .driver
        .state()
        .diagnostics
        .iter()
        .filter(|entry| entry.level == LogLevel::Warn)
        .count();
    assert_eq!(warnings, 1);
    let view = h.driver.render();
    assert!(view
        .items
        .iter()
        .any(|item| item.id == ActionId::AccountMenu && item.label == "Account"));
}

#[tokio::test]
async fn server_and_transport_errors_are_fetch_failures() {
    for http in [FakeHttp::replying(500, "oops"), FakeHttp::unreachable()] {
        let mut h = harness(http, true);

        h.driver.mount();
        h.driver.settle().await;

        assert_eq!(h.driver.state().session(), &SessionState::FetchFailed);
        assert_eq!(h.http.gets(), 1);

        h.driver.mount();
        h.driver.sync_auth();
        h.driver.settle().await;
        assert_eq!(h.http.gets(), 1);
    }
}

#[tokio::test]
async fn signed_out_shell_never_fetches() {
    let mut h = harness(FakeHttp::replying(200, USER_BODY), false);

    h.driver.mount();
    h.driver.settle().await;

    assert_eq!(h.http.gets(), 0);
    assert_eq!(h.driver.state().session(), &SessionState::NotLoaded);
}

#[tokio::test]
async fn response_after_unmount_is_not_applied() {
    let mut h = harness(FakeHttp::replying(200, USER_BODY), true);

    h.driver.mount();
    h.driver.unmount();
    h.driver.settle().await;

    assert_eq!(h.http.gets(), 1);
    assert_eq!(h.driver.state().session(), &SessionState::NotLoaded);
    assert_eq!(h.driver.state().user_name(), None);
}

#[tokio::test]
async fn confirm_closes_dialog_before_dispatching() {
    let mut h = harness(FakeHttp::replying(200, USER_BODY), true);
    h.driver.mount();

    h.driver.handle(UserAction::Activate(ActionId::NewWorksheet));
    h.driver
        .handle(UserAction::EditWorksheetName("foo".to_string()));
    let outcome = h.driver.handle(UserAction::ConfirmDialog);

    assert!(outcome.redraw);
    assert!(!outcome.prevent_default);
    assert!(!h.driver.state().dialog().is_open());
    h.driver.handle(UserAction::ConfirmDialog);

    h.driver.settle().await;
    assert_eq!(h.dispatcher.commands(), vec!["new foo".to_string()]);
}

#[tokio::test]
async fn enter_key_prevents_default_and_matches_confirm() {
    let mut h = harness(FakeHttp::replying(200, USER_BODY), true);
    h.driver.mount();

    h.driver.handle(UserAction::Activate(ActionId::NewWorksheet));
    h.driver.handle(UserAction::EditWorksheetName("  ".to_string()));
    let enter = h.driver.handle(UserAction::NameFieldKeyDown(FieldKey::Enter));

    h.driver.handle(UserAction::Activate(ActionId::NewWorksheet));
    h.driver.handle(UserAction::EditWorksheetName("  ".to_string()));
    let click = h.driver.handle(UserAction::ConfirmDialog);

    assert!(enter.prevent_default);
    assert!(!click.prevent_default);
    h.driver.settle().await;
    assert_eq!(
        h.dispatcher.commands(),
        vec!["new unnamed".to_string(), "new unnamed".to_string()]
    );
}

#[tokio::test]
async fn sign_out_calls_provider_once_and_resyncs() {
    let mut h = harness(FakeHttp::replying(200, USER_BODY), true);
    h.driver.mount();
    h.driver.settle().await;

    h.driver
        .handle(UserAction::ToggleAccountMenu { anchor: None });
    let outcome = h.driver.handle(UserAction::SignOut);

    assert!(outcome.redraw);
    assert_eq!(h.auth.sign_outs.load(Ordering::SeqCst), 1);
    assert!(!h.driver.state().is_authenticated());
    assert_eq!(h.driver.state().user_name(), None);
    let ids: Vec<ActionId> = h.driver.render().items.iter().map(|item| item.id).collect();
    assert!(ids.contains(&ActionId::Login));
    assert!(!ids.contains(&ActionId::AccountMenu));
}

#[tokio::test]
async fn links_go_through_navigation_port() {
    let mut h = harness(FakeHttp::replying(200, USER_BODY), true);
    h.driver.mount();

    h.driver.handle(UserAction::Activate(ActionId::Gallery));
    h.driver
        .handle(UserAction::ToggleAccountMenu { anchor: None });
    h.driver.handle(UserAction::OpenAccountProfile);

    assert_eq!(
        h.navigator.paths.lock().expect("paths lock").clone(),
        vec![
            "/worksheets?name=home".to_string(),
            "/account/profile".to_string(),
        ]
    );
}

#[tokio::test]
async fn remount_and_relogin_never_overlap_profile_requests() {
    let http = GatedHttp::new();
    let auth = FakeAuth::new(true);
    let ports = ShellPorts {
        http: http.clone(),
        dispatcher: Arc::new(RecordingDispatcher::default()),
        navigator: Arc::new(RecordingNavigator::default()),
        auth: auth.clone(),
    };
    let mut driver = ShellDriver::new(ShellConfig::default(), ports, Handle::current());

    driver.mount();
    tokio::task::yield_now().await;
    driver.unmount();
    driver.mount();
    auth.authenticated.store(false, Ordering::SeqCst);
    driver.sync_auth();
    auth.authenticated.store(true, Ordering::SeqCst);
    driver.sync_auth();
    for _ in 0..5 {
        tokio::task::yield_now().await;
        driver.pump();
    }

    assert_eq!(http.started.load(Ordering::SeqCst), 1);
    assert_eq!(http.max_in_flight.load(Ordering::SeqCst), 1);

    // The first answer belongs to the signed-out session; a fresh fetch follows it.
    http.gate.add_permits(2);
    driver.settle().await;

    assert_eq!(http.started.load(Ordering::SeqCst), 2);
    assert_eq!(http.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(driver.state().user_name(), Some("ada"));
}
