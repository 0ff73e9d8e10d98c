use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tokio::time::sleep;

/// Write a small document and return its path and bytes
pub fn create_test_document(dir: &Path, filename: &str) -> Result<(PathBuf, Vec<u8>)> {
    let content = format!("Test document {} content\n", filename).into_bytes();
    let file_path = dir.join(filename);
    fs::write(&file_path, &content)
        .with_context(|| format!("Failed to create test file: {:?}", file_path))?;
    Ok((file_path, content))
}

pub async fn wait_for_server(url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let health_url = format!("{}/health", url);

    println!("Waiting for server to be ready...");
    for i in 0..30 {
        match client.get(&health_url).send().await {
            Ok(response) if response.status().is_success() => {
                println!("Server is ready!");
                return Ok(());
            }
            _ => {
                if i < 29 {
                    sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    anyhow::bail!("Server did not become ready within 30 seconds");
}

/// Runs the client binary with its own data directory
pub struct ClientRunner {
    pub binary: PathBuf,
    pub server_url: String,
}

impl ClientRunner {
    /// Run a subcommand and return its stdout; fails on a non-zero exit
    pub fn run(&self, data_dir: &Path, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--server")
            .arg(&self.server_url)
            .arg("--data-dir")
            .arg(data_dir)
            .args(args)
            .output()
            .with_context(|| format!("Failed to run client binary: {:?}", self.binary))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "client {} failed:\nSTDOUT: {}\nSTDERR: {}",
                args.first().copied().unwrap_or_default(),
                stdout,
                stderr
            );
        }
        Ok(stdout)
    }

    /// Run a subcommand that is expected to fail
    pub fn run_expect_failure(&self, data_dir: &Path, args: &[&str]) -> Result<()> {
        match self.run(data_dir, args) {
            Ok(stdout) => anyhow::bail!("Expected failure but got: {}", stdout),
            Err(_) => Ok(()),
        }
    }
}

/// Value after `prefix` on the first line that starts with it
pub fn line_value<'a>(stdout: &'a str, prefix: &str) -> Option<&'a str> {
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix(prefix))
        .map(str::trim)
}

/// File id from `... File id: <n>` in the upload output
pub fn parse_file_id(stdout: &str) -> Result<i64> {
    stdout
        .lines()
        .find_map(|line| line.rsplit_once("File id: "))
        .and_then(|(_, id)| id.trim().parse().ok())
        .with_context(|| format!("No file id in upload output: {}", stdout))
}

pub fn cleanup_dir(dir: &Path) -> Result<()> {
    let keep_data = std::env::var("KEEP_TEST_DATA").unwrap_or_else(|_| "false".to_string());
    if keep_data == "true" {
        println!("\n⚠️  Keeping test data (KEEP_TEST_DATA=true): {:?}", dir);
        return Ok(());
    }

    println!("\n🧹 Cleaning up: {:?}", dir);
    if dir.exists() {
        fs::remove_dir_all(dir)
            .with_context(|| format!("Failed to remove directory: {:?}", dir))?;
    }
    Ok(())
}
