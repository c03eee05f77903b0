use async_trait::async_trait;
use ferrous_nftset_domain::DomainError;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Runs one invocation of the `nft` binary and returns its stdout.
#[async_trait]
pub trait NftExecutor: Send + Sync {
    async fn run(&self, args: &[&str], stdin: Option<&str>) -> Result<String, DomainError>;
}

/// Spawns the real `nft` process.
pub struct ProcessExecutor {
    binary: String,
}

impl ProcessExecutor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new("nft")
    }
}

#[async_trait]
impl NftExecutor for ProcessExecutor {
    async fn run(&self, args: &[&str], stdin: Option<&str>) -> Result<String, DomainError> {
        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            DomainError::EngineConnect(format!("Failed to spawn {}: {}", self.binary, e))
        })?;

        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes()).await.map_err(|e| {
                    DomainError::EngineCommand(format!("Failed to write nft batch: {}", e))
                })?;
                // Closing stdin lets nft see EOF.
                drop(pipe);
            }
        }

        let output = child.wait_with_output().await.map_err(|e| {
            DomainError::EngineCommand(format!("Failed to wait for {}: {}", self.binary, e))
        })?;

        debug!(args = ?args, status = %output.status, "nft command finished");

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::EngineCommand(format!(
                "{} {} exited with {}: {}",
                self.binary,
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| DomainError::InvalidEngineResponse(format!("nft output is not UTF-8: {}", e)))
    }
}
