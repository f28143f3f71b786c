use gavel::{
    api,
    client::{
        signup::{BACKEND_NOT_FOUND, LOGIN_ROUTE, PASSWORD_MISMATCH},
        ApiClient, AuthSignal, ClientConfig, Navigator, Phase, SignupForm, SignupPage,
    },
    store::{MemoryStore, Store},
};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Recorder {
    paths: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl Navigator for Recorder {
    fn navigate(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}

/// Serves the full app over a fresh in-memory store on an ephemeral port.
async fn serve() -> (String, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let app = api::app(store.clone(), None);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), store)
}

fn alice(confirm: &str) -> SignupForm {
    SignupForm {
        username: "alice".to_string(),
        email: "a@x.com".to_string(),
        password: "p1".to_string(),
        confirm_password: confirm.to_string(),
    }
}

fn page(base_url: &str) -> (SignupPage<ApiClient, Recorder>, Recorder) {
    let api = ApiClient::new(ClientConfig::with_base_url(base_url)).unwrap();
    let navigator = Recorder::default();
    let page = SignupPage::new(api, navigator.clone(), AuthSignal::logged_out());
    (page, navigator)
}

#[tokio::test]
async fn signup_registers_and_navigates_to_login() {
    let (base_url, store) = serve().await;
    let (mut page, navigator) = page(&base_url);

    let state = page.submit(&alice("p1")).await.clone();

    assert_eq!(state.phase, Phase::Succeeded);
    assert!(!state.loading);
    assert_eq!(state.error, None);
    assert_eq!(navigator.paths(), vec![LOGIN_ROUTE.to_string()]);

    let user = store.user_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(user.name, "alice");
    assert_ne!(user.password_hash, "p1");
}

#[tokio::test]
async fn mismatched_passwords_never_reach_the_server() {
    let (base_url, store) = serve().await;
    let (mut page, navigator) = page(&base_url);

    let state = page.submit(&alice("p2")).await.clone();

    assert_eq!(state.error.as_deref(), Some(PASSWORD_MISMATCH));
    assert!(!state.loading);
    assert!(navigator.paths().is_empty());
    assert!(store.user_by_email("a@x.com").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_registration_shows_server_message() {
    let (base_url, _) = serve().await;
    let (mut page, navigator) = page(&base_url);

    page.submit(&alice("p1")).await;
    let state = page.submit(&alice("p1")).await.clone();

    assert_eq!(state.phase, Phase::Failed);
    assert_eq!(state.error.as_deref(), Some("User already exists"));
    assert_eq!(navigator.paths(), vec![LOGIN_ROUTE.to_string()]);
}

#[tokio::test]
async fn wrong_base_path_reports_missing_backend() {
    let (base_url, _) = serve().await;
    let (mut page, _) = page(&format!("{base_url}/nowhere"));

    let state = page.submit(&alice("p1")).await;

    assert_eq!(state.error.as_deref(), Some(BACKEND_NOT_FOUND));
}

#[tokio::test]
async fn root_answers_with_liveness_text() {
    let (base_url, _) = serve().await;

    let response = reqwest::get(format!("{base_url}/")).await.unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.text().await.unwrap(),
        "Auction System API is running successfully!"
    );
}
