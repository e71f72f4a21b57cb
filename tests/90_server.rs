use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

/// The real binary on a free port, killed on drop
struct TestServer {
    base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let child = Command::new(env!("CARGO_BIN_EXE_sweet-pea"))
            .env("APP_ENV", "development")
            .env("SWEETPEA_HOST", "127.0.0.1")
            .env("SWEETPEA_PORT", port.to_string())
            .env("DATABASE_URL", "")
            .env("SESSION_SECRET", "smoke-test-secret")
            .env_remove("SWEETPEA_ADMIN_USERNAME")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("failed to spawn server binary")?;

        Ok(Self { base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[tokio::test]
async fn binary_serves_home_page_and_health() -> Result<()> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(15)).await?;

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    let home = client.get(format!("{}/", server.base_url)).send().await?;
    assert_eq!(home.status(), StatusCode::OK);
    assert!(home.text().await?.contains("Sweet Pea"));

    let portal = client.get(format!("{}/portal/", server.base_url)).send().await?;
    assert_eq!(portal.status(), StatusCode::FORBIDDEN);

    let health: serde_json::Value = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(health["success"], true);
    Ok(())
}
