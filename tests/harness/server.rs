//! TestServer - True end-to-end test harness
//!
//! Spawns the actual steelblock binary on a random port with a config file in
//! a temporary directory, pointed at a `MockProvider`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tempfile::TempDir;

use super::provider::MockProvider;

/// Test harness that spawns the steelblock binary on a random port
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    child: Child,
    /// Temp directory for the config file (cleaned up on drop)
    _temp_dir: TempDir,
    /// Path to the config file
    pub config_path: PathBuf,
}

impl TestServer {
    /// Start a server talking to the given provider
    pub async fn start(provider: &MockProvider) -> Result<Self> {
        let config = provider.config();
        Self::start_with_toml(&format!(
            "[provider]\napi_key = {:?}\nbase_url = {:?}\ntimeout_secs = {}\n",
            config.api_key.unwrap_or_default(),
            config.base_url,
            config.timeout_secs
        ))
        .await
    }

    /// Start a server with a raw TOML config
    pub async fn start_with_toml(toml: &str) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("steelblock.toml");
        std::fs::write(&config_path, toml)?;

        // Find a random available port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let binary_path = PathBuf::from(env!("CARGO_BIN_EXE_steelblock"));

        // Spawn the server process
        let child = Command::new(&binary_path)
            .arg("--bind")
            .arg(addr.to_string())
            .arg("--config")
            .arg(&config_path)
            .env_remove("OPENAI_API_KEY")
            .env_remove("STEELBLOCK_PROVIDER__API_KEY")
            .env_remove("STEELBLOCK_PROVIDER__BASE_URL")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                anyhow::anyhow!("Failed to spawn steelblock binary at {:?}: {}", binary_path, e)
            })?;

        let client = Client::builder().timeout(Duration::from_secs(20)).build()?;

        // Poll until server is ready (max 5 seconds to handle resource contention)
        let mut ready = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        let mut server = Self {
            addr,
            client,
            child,
            _temp_dir: temp_dir,
            config_path,
        };

        if !ready {
            let _ = server.child.kill();
            anyhow::bail!("Server failed to start within 5 seconds");
        }

        Ok(server)
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await?)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Kill the server process
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
