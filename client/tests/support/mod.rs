//! In-process fake of the remote users endpoint.
//!
//! The endpoint owns a single-threaded Tokio runtime plus a `LocalSet`
//! because Actix uses `spawn_local` internally. Client futures are driven on
//! the same runtime through [`FakeUsersEndpoint::block_on`], so the server and
//! the client interleave on one thread. Dropping the endpoint stops the
//! server even if a test panics.

use std::future::Future;
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, web};
use serde_json::{Value, json};
use tokio::runtime::Runtime;
use tokio::task::LocalSet;
use url::Url;
use user_directory::outbound::http::HttpUsersApi;

/// Mutable endpoint state shared with the handlers.
#[derive(Default)]
struct FakeStore {
    users: Vec<Value>,
    last_id: i64,
    list_failure: Option<u16>,
    create_failure: Option<u16>,
    created_payloads: Vec<Value>,
}

#[derive(Default)]
struct FakeState {
    store: Mutex<FakeStore>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
}

impl FakeState {
    fn store(&self) -> MutexGuard<'_, FakeStore> {
        self.store.lock().expect("fake store lock")
    }
}

pub struct FakeUsersEndpoint {
    runtime: Runtime,
    local: LocalSet,
    base_url: Url,
    server: ServerHandle,
    state: web::Data<FakeState>,
}

impl FakeUsersEndpoint {
    pub fn start() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");
        let local = LocalSet::new();
        let state = web::Data::new(FakeState::default());

        let server_state = state.clone();
        let (base_url, server) =
            local.block_on(&runtime, async move { spawn_server(server_state) });

        Self {
            runtime,
            local,
            base_url,
            server,
            state,
        }
    }

    /// Collection URL, e.g. `http://127.0.0.1:PORT/api/users`.
    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    /// Reqwest adapter pointed at this endpoint.
    pub fn api(&self) -> Arc<HttpUsersApi> {
        Arc::new(HttpUsersApi::new(self.base_url()).expect("reqwest client"))
    }

    /// Drive a client future alongside the server.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.local.block_on(&self.runtime, future)
    }

    /// Replace the stored users. Ids continue after the largest seeded id.
    pub fn seed(&self, users: Vec<Value>) {
        let mut store = self.state.store();
        store.last_id = users
            .iter()
            .filter_map(|user| user.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0);
        store.users = users;
    }

    pub fn fail_list_with(&self, status: u16) {
        self.state.store().list_failure = Some(status);
    }

    pub fn fail_create_with(&self, status: u16) {
        self.state.store().create_failure = Some(status);
    }

    pub fn list_calls(&self) -> usize {
        self.state.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.state.create_calls.load(Ordering::SeqCst)
    }

    /// Bodies received by `POST /api/users`, in arrival order.
    pub fn created_payloads(&self) -> Vec<Value> {
        self.state.store().created_payloads.clone()
    }
}

impl Drop for FakeUsersEndpoint {
    fn drop(&mut self) {
        let server = self.server.clone();
        self.local.block_on(&self.runtime, async move {
            server.stop(true).await;
        });
    }
}

/// JSON user in wire shape.
pub fn user_json(id: i64, name: &str, email: &str, account_type: u8) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": email,
        "accountType": account_type,
    })
}

fn spawn_server(state: web::Data<FakeState>) -> (Url, ServerHandle) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake endpoint");
    let addr = listener.local_addr().expect("fake endpoint address");

    let server = HttpServer::new(move || {
        App::new().app_data(state.clone()).service(
            web::scope("/api/users")
                .route("", web::get().to(list_users))
                .route("", web::post().to(create_user))
                .route("/{id}", web::get().to(get_user))
                .route("/{id}", web::put().to(update_user))
                .route("/{id}", web::delete().to(delete_user)),
        )
    })
    .disable_signals()
    .workers(1)
    .listen(listener)
    .expect("listen on fake endpoint")
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);

    let base_url = Url::parse(&format!("http://{addr}/api/users")).expect("fake endpoint URL");
    (base_url, handle)
}

fn failure(status: u16) -> HttpResponse {
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(code).json(json!({ "error": "injected failure" }))
}

fn not_found(id: i64) -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": format!("user {id} not found") }))
}

fn has_id(user: &Value, id: i64) -> bool {
    user.get("id").and_then(Value::as_i64) == Some(id)
}

async fn list_users(state: web::Data<FakeState>) -> HttpResponse {
    state.list_calls.fetch_add(1, Ordering::SeqCst);
    let store = state.store();
    match store.list_failure {
        Some(status) => failure(status),
        None => HttpResponse::Ok().json(&store.users),
    }
}

async fn get_user(state: web::Data<FakeState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    let store = state.store();
    match store.users.iter().find(|user| has_id(user, id)) {
        Some(user) => HttpResponse::Ok().json(user),
        None => not_found(id),
    }
}

async fn create_user(state: web::Data<FakeState>, body: web::Json<Value>) -> HttpResponse {
    state.create_calls.fetch_add(1, Ordering::SeqCst);
    let mut store = state.store();
    let payload = body.into_inner();
    store.created_payloads.push(payload.clone());
    if let Some(status) = store.create_failure {
        return failure(status);
    }

    store.last_id += 1;
    let mut created = payload;
    if let Some(fields) = created.as_object_mut() {
        fields.insert("id".to_owned(), json!(store.last_id));
    }
    store.users.push(created.clone());
    HttpResponse::Created().json(created)
}

async fn update_user(
    state: web::Data<FakeState>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> HttpResponse {
    let id = path.into_inner();
    let mut store = state.store();
    let Some(slot) = store.users.iter_mut().find(|user| has_id(user, id)) else {
        return not_found(id);
    };
    *slot = body.into_inner();
    HttpResponse::Ok().json(&*slot)
}

async fn delete_user(state: web::Data<FakeState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    let mut store = state.store();
    let before = store.users.len();
    store.users.retain(|user| !has_id(user, id));
    if store.users.len() == before {
        return not_found(id);
    }
    HttpResponse::NoContent().finish()
}
