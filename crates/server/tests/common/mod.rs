//! # Common Test Utilities
//!
//! `TestApp` spawns the real server on a random port. The AI provider points at
//! an `httpmock::MockServer`, and the blob store is a temporary directory.

// Not every test file uses every helper.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use docsheet_server::{config::get_config, router::create_router, state::build_app_state};
use httpmock::MockServer;
use reqwest::Client;
use std::{net::SocketAddr, path::Path};
use tempfile::TempDir;
use tokio::{net::TcpListener, task::JoinHandle};

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub data_dir: TempDir,
    _config_dir: TempDir,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application server and returns a `TestApp` instance.
    pub async fn spawn() -> Result<Self> {
        // `try_init` is used to prevent panic if the logger is already initialized.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let mock_server = MockServer::start_async().await;
        let data_dir = TempDir::new()?;
        let config_dir = TempDir::new()?;
        let config_path = config_dir.path().join("config.yml");
        std::fs::write(
            &config_path,
            format!(
                r#"
use_case: documents
storage:
  backend: local
  local_root: "{root}"
providers:
  standard:
    provider: openai
    api_url: "{url}"
    model_name: mock-standard
  advanced:
    provider: openai
    api_url: "{url}"
    model_name: mock-advanced
"#,
                root = data_dir.path().display(),
                url = mock_server.url("/v1/chat/completions"),
            ),
        )?;

        let config_path = config_path.to_string_lossy().to_string();
        let config = get_config(Some(&config_path))?;
        let app_state = build_app_state(config)?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            data_dir,
            _config_dir: config_dir,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Writes a document into the blob store directory.
    pub fn add_document(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.data_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn blob_path(&self, name: &str) -> std::path::PathBuf {
        self.data_dir.path().join(Path::new(name))
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A chat completion body with the given assistant content.
pub fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
}
