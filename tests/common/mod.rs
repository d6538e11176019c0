#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use tokio::sync::OnceCell;

const CREATE_USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
    id       SERIAL PRIMARY KEY,
    name     TEXT NOT NULL,
    login    TEXT NOT NULL,
    password TEXT NOT NULL
)";

static SCHEMA: OnceCell<()> = OnceCell::const_new();

/// Server process bound to a free port; killed when dropped
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn(database_url: &str) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_users-api"));
        cmd.env("API_ADDRESS", format!("127.0.0.1:{}", port))
            .env("DATABASE_URL", database_url)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Starts a server against DATABASE_URL, or returns None when no database is
/// configured so the calling test can skip.
pub async fn start_server() -> Result<Option<TestServer>> {
    let _ = dotenvy::dotenv();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            eprintln!("DATABASE_URL not set, skipping integration test");
            return Ok(None);
        }
    };

    // Tests in one binary run concurrently; create the table only once
    SCHEMA.get_or_try_init(|| ensure_schema(&database_url)).await?;

    let server = TestServer::spawn(&database_url)?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(Some(server))
}

async fn ensure_schema(database_url: &str) -> Result<()> {
    let pool = sqlx::PgPool::connect(database_url)
        .await
        .context("failed to connect to test database")?;
    sqlx::query(CREATE_USERS_TABLE).execute(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Login that will not collide with rows left by earlier runs
pub fn unique_login(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

/// Pulls the id out of "User {id} was saved"
pub fn saved_id(confirmation: &str) -> Result<i32> {
    confirmation
        .strip_prefix("User ")
        .and_then(|rest| rest.strip_suffix(" was saved"))
        .context("unexpected confirmation text")?
        .parse()
        .with_context(|| format!("id not numeric in {:?}", confirmation))
}
