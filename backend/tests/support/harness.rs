//! Live server harness for behaviour tests.
//!
//! The harness owns a single-threaded Tokio runtime plus a `LocalSet` because
//! Actix uses `spawn_local` internally. Dropping the `WorldFixture` stops the
//! server even when a step panics.

use std::cell::RefCell;
use std::collections::HashMap;
use std::net::TcpListener;
use std::rc::Rc;
use std::sync::Arc;

use actix_session::SessionMiddleware;
use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::{Key, SameSite, time::Duration as CookieDuration};
use actix_web::dev::ServerHandle;
use actix_web::http::{Method, header};
use actix_web::{App, HttpServer, web};
use awc::Client;
use groups_backend::Trace;
use groups_backend::domain::DemoRosterSeeder;
use groups_backend::inbound::http::configure_api;
use groups_backend::inbound::http::state::HttpState;
use groups_backend::outbound::memory::InMemoryStore;
use serde_json::Value;
use tokio::runtime::Runtime;
use tokio::task::LocalSet;

pub(crate) const DEMO_PASSWORD: &str = "password";

pub(crate) struct GroupsWorld {
    pub(crate) runtime: Runtime,
    pub(crate) local: LocalSet,
    pub(crate) base_url: String,
    pub(crate) server: ServerHandle,
    pub(crate) cookies: HashMap<String, String>,
    pub(crate) group_set_id: Option<String>,
    pub(crate) group_id: Option<String>,
    pub(crate) last_status: Option<u16>,
    pub(crate) last_body: Option<Value>,
}

pub(crate) type SharedWorld = Rc<RefCell<GroupsWorld>>;

pub(crate) struct WorldFixture {
    world: SharedWorld,
}

impl WorldFixture {
    pub(crate) fn world(&self) -> SharedWorld {
        self.world.clone()
    }
}

impl Drop for WorldFixture {
    fn drop(&mut self) {
        let ctx = self.world.borrow();
        let server = ctx.server.clone();
        ctx.local.block_on(&ctx.runtime, async move {
            server.stop(true).await;
        });
    }
}

/// Run `operation` on the world's runtime. The future must not borrow the world.
pub(crate) fn with_world_async<R, F>(world: &SharedWorld, operation: impl FnOnce(String) -> F) -> R
where
    F: std::future::Future<Output = R>,
{
    let ctx = world.borrow();
    let base_url = ctx.base_url.clone();
    ctx.local.block_on(&ctx.runtime, operation(base_url))
}

fn test_session_middleware(key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".to_owned())
        .cookie_path("/".to_owned())
        .cookie_secure(false)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(PersistentSession::default().session_ttl(CookieDuration::hours(2)))
        .build()
}

async fn spawn_server(http_state: HttpState) -> Result<(String, ServerHandle), String> {
    let key = Key::generate();
    let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
    let addr = listener.local_addr().map_err(|err| err.to_string())?;
    let http_data = web::Data::new(http_state);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(http_data.clone())
            .wrap(Trace)
            .service(
                web::scope("/api/v1")
                    .wrap(test_session_middleware(key.clone()))
                    .configure(configure_api),
            )
    })
    .disable_signals()
    .workers(1)
    .listen(listener)
    .map_err(|err| err.to_string())?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);

    Ok((format!("http://{addr}"), handle))
}

/// Start a server over an in-memory store seeded with the demo roster.
pub(crate) fn world() -> WorldFixture {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let local = LocalSet::new();

    let (base_url, server) = local
        .block_on(&runtime, async {
            let store = Arc::new(InMemoryStore::new());
            DemoRosterSeeder::new(store.clone())
                .seed(DEMO_PASSWORD)
                .await
                .expect("demo roster seeds");
            let state =
                HttpState::from_repositories(store.clone(), store.clone(), store.clone(), store);
            spawn_server(state).await
        })
        .expect("server should start");

    WorldFixture {
        world: Rc::new(RefCell::new(GroupsWorld {
            runtime,
            local,
            base_url,
            server,
            cookies: HashMap::new(),
            group_set_id: None,
            group_id: None,
            last_status: None,
            last_body: None,
        })),
    }
}

/// Sign `username` in and remember their session cookie.
pub(crate) fn sign_in(world: &SharedWorld, username: &str) {
    let name = username.to_owned();
    let cookie = with_world_async(world, |base_url| async move {
        let response = Client::default()
            .post(format!("{base_url}/api/v1/login"))
            .send_json(&serde_json::json!({ "username": name, "password": DEMO_PASSWORD }))
            .await
            .expect("login request");
        assert_eq!(response.status().as_u16(), 200, "login should succeed");
        response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::to_owned)
            .expect("session cookie")
    });
    world
        .borrow_mut()
        .cookies
        .insert(username.to_owned(), cookie);
}

/// Send a JSON request as `username` and record the outcome in the world.
pub(crate) fn request_as(
    world: &SharedWorld,
    username: &str,
    method: Method,
    path: &str,
    payload: Option<Value>,
) {
    let cookie = world.borrow().cookies.get(username).cloned();
    let path = path.to_owned();
    let (status, body) = with_world_async(world, |base_url| async move {
        let mut request = Client::default().request(method, format!("{base_url}/api/v1{path}"));
        if let Some(cookie) = cookie {
            request = request.insert_header((header::COOKIE, cookie));
        }
        let mut response = match payload {
            Some(payload) => request.send_json(&payload).await.expect("request"),
            None => request.send().await.expect("request"),
        };
        let status = response.status().as_u16();
        let bytes = response.body().await.expect("response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    });

    let mut ctx = world.borrow_mut();
    ctx.last_status = Some(status);
    ctx.last_body = Some(body);
}
