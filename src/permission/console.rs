//! Terminal consent prompt for camera access

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use tokio::sync::oneshot;
use tracing::warn;

use super::{AuthorizationOutcome, Capability, PermissionFacility};

/// How the desktop build answers permission requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentPolicy {
    /// Prompt on the terminal every time
    #[default]
    Ask,
    Allow,
    Deny,
}

/// Permission facility backed by the terminal
pub struct ConsolePermission {
    policy: ConsentPolicy,
}

impl ConsolePermission {
    pub fn new(policy: ConsentPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl PermissionFacility for ConsolePermission {
    async fn request(&self, capability: Capability) -> AuthorizationOutcome {
        match self.policy {
            ConsentPolicy::Allow => AuthorizationOutcome::Granted,
            ConsentPolicy::Deny => AuthorizationOutcome::Denied,
            ConsentPolicy::Ask => {
                let stdin = std::io::stdin();
                match ask(capability.as_str(), move || stdin.lock()).await {
                    Ok(line) => parse_answer(&line),
                    Err(e) => {
                        warn!("Could not read consent answer: {}", e);
                        AuthorizationOutcome::Denied
                    }
                }
            }
        }
    }
}

/// Prompt on stderr and read one line on a detached thread
///
/// A stdin read cannot be interrupted, so it must not run on the blocking
/// pool: runtime shutdown would wait for it after Ctrl-C.
async fn ask<R, F>(capability: &'static str, input: F) -> std::io::Result<String>
where
    R: BufRead,
    F: FnOnce() -> R + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("consent-prompt".to_string())
        .spawn(move || {
            let _ = tx.send(prompt(capability, input()));
        })?;

    rx.await
        .unwrap_or_else(|_| Err(std::io::Error::other("consent prompt thread exited")))
}

fn prompt(capability: &str, mut input: impl BufRead) -> std::io::Result<String> {
    let mut stderr = std::io::stderr();
    write!(stderr, "Allow {} access? [y/N] ", capability)?;
    stderr.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line)
}

/// Anything other than an explicit yes is a denial
fn parse_answer(line: &str) -> AuthorizationOutcome {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => AuthorizationOutcome::Granted,
        _ => AuthorizationOutcome::Denied,
    }
}
