use std::net::SocketAddr;

use anyhow::{Context, Result};

use beacon_api::app::{app, AppState};
use beacon_api::auth::hash_password;
use beacon_api::database::models::Tenant;

pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
}

/// Serve the router in-process on an unused port, backed by the memory
/// stores so the suite runs without a database. Each test gets its own
/// server and state.
pub async fn start_server() -> Result<TestServer> {
    let state = AppState::memory();
    let router = app(state.clone());

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("failed to bind test listener")?;

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("test server");
    });

    Ok(TestServer {
        base_url: format!("http://{}", addr),
        state,
    })
}

/// Insert a tenant with a real Argon2id hash so login works end to end.
pub async fn seed_tenant(state: &AppState, email: &str, password: &str) -> Tenant {
    let hash = hash_password(password).expect("hashing failed");
    state
        .tenants
        .create("Test Tenant", email, &hash)
        .await
        .expect("tenant insert failed")
}

/// POST /auth/login and return the session cookie pair ("name=token")
/// from the Set-Cookie header.
pub async fn login(server: &TestServer, email: &str, password: &str) -> Result<String> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await?;

    anyhow::ensure!(
        res.status() == reqwest::StatusCode::OK,
        "login failed with status {}",
        res.status()
    );

    let set_cookie = res
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .context("login response missing Set-Cookie")?
        .to_str()?;

    let pair = set_cookie
        .split(';')
        .next()
        .context("malformed Set-Cookie")?
        .to_string();
    Ok(pair)
}
