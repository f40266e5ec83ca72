use std::path::Path;

use anyhow::{Result, anyhow};
use rand::Rng as _;
use reqwest::{
    Url,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde_json::json;
use sneakers_app::user::LoginResponse;
use sneakers_server::config::{Parser, ServerConfig};
use tempfile::TempDir;
use tracing::info;

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
}

pub fn test_config(test_name: &str, base_dir: &Path) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix_in(format!("{}_", test_name), base_dir)?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?.to_string();
    let args = &[
        "sneakers-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--listen-address",
        "127.0.0.1",
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

pub async fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let base_dir = std::env::temp_dir();
    test_config(test_name, &base_dir)
}

pub fn base_url(config: &ServerConfig) -> Url {
    // host part is fixed, so parsing cannot fail
    Url::parse(&format!("http://127.0.0.1:{}/", config.port)).unwrap()
}

pub fn extend_url(url: &Url, segment: impl ToString) -> Url {
    let mut url = url.clone();
    url.path_segments_mut()
        .unwrap()
        .pop_if_empty()
        .push(&segment.to_string());
    url
}

/// Starts server in background and waits until it answers health check
pub async fn spawn_server(args: ServerConfig) -> Result<()> {
    let health_url = base_url(&args).join("health")?;
    let state = sneakers_server::run::build_state(&args).await?;
    tokio::spawn(async move {
        let shutdown = futures::future::pending::<()>();
        if let Err(e) = sneakers_server::run::run_graceful_with_state(args, state, shutdown).await
        {
            tracing::error!("Server failed: {e}");
        }
    });

    let client = reqwest::Client::new();
    for _ in 0..50 {
        if let Ok(response) = client.get(health_url.clone()).send().await {
            if response.status().is_success() {
                return Ok(());
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    Err(anyhow!("Server did not start"))
}

pub struct TestUser {
    pub name: &'static str,
    pub email: &'static str,
    pub password: &'static str,
}

pub const TEST_USER: TestUser = TestUser {
    name: "Olivia Tester",
    email: "olivia@example.com",
    password: "password123",
};

pub async fn register_user(client: &reqwest::Client, base_url: &Url, user: &TestUser) -> Result<()> {
    let payload = json!({"name": user.name, "email": user.email, "password": user.password});
    let response = client
        .post(base_url.join("api/user/register")?)
        .json(&payload)
        .send()
        .await?;
    if response.status().as_u16() != 201 {
        return Err(anyhow!("Registration failed: {}", response.status()));
    }
    Ok(())
}

pub async fn login_user(
    client: &reqwest::Client,
    base_url: &Url,
    user: &TestUser,
) -> Result<LoginResponse> {
    let payload = json!({"email": user.email, "password": user.password});
    let response = client
        .post(base_url.join("api/user/login")?)
        .json(&payload)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(anyhow!("Login failed: {}", response.status()));
    }
    Ok(response.json().await?)
}

/// Starts server, registers and logs in test user
///
/// Returns client sending bearer token with every request
pub async fn launch_env(args: ServerConfig) -> Result<(reqwest::Client, LoginResponse)> {
    let base_url = base_url(&args);
    spawn_server(args).await?;

    let anonymous = reqwest::Client::new();
    register_user(&anonymous, &base_url, &TEST_USER).await?;
    let login = login_user(&anonymous, &base_url, &TEST_USER).await?;
    info!("Logged in as user {}", login.user.id);

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", login.access_token))?,
    );
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .build()?;
    Ok((client, login))
}

/// Inserts sneakers directly into database, before server is started
pub async fn seed_sneakers(args: &ServerConfig, count: usize) -> Result<()> {
    let pool = sneakers_dal::new_pool(&args.database_url()).await?;
    let mut transaction = pool.begin().await?;
    for i in 1..=count {
        let (name, publisher) = if i % 2 == 0 {
            (format!("adidas Model {i:03}"), "adidas")
        } else {
            (format!("Nike Model {i:03}"), "Nike")
        };
        sqlx::query(
            "INSERT INTO sneakers (name, shoe_designer, publisher, publication_year, type, price, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, datetime(), datetime())",
        )
        .bind(&name)
        .bind("Designer")
        .bind(publisher)
        .bind(1950 + i as i64)
        .bind(if i % 3 == 0 { "Running" } else { "Lifestyle" })
        .bind(((i * 7919) % 1000) as f64 * 1000.0)
        .execute(&mut *transaction)
        .await?;
    }
    transaction.commit().await?;
    pool.close().await;
    info!("Seeded {count} sneakers");
    Ok(())
}
