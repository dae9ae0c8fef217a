use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::AuthError;

/// Collects an authorization code from the user.
///
/// Given the consent URL, the implementation shows it however it likes and
/// returns once the user has supplied the code.
#[async_trait]
pub trait CodePrompt: Send + Sync {
    async fn authorization_code(&self, auth_url: &str) -> Result<String, AuthError>;
}

/// Any synchronous `Fn(&str) -> Result<String, AuthError>` is a prompt.
#[async_trait]
impl<F> CodePrompt for F
where
    F: Fn(&str) -> Result<String, AuthError> + Send + Sync,
{
    async fn authorization_code(&self, auth_url: &str) -> Result<String, AuthError> {
        self(auth_url)
    }
}

/// Prints the consent URL to stdout and reads the code from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

#[async_trait]
impl CodePrompt for StdinPrompt {
    async fn authorization_code(&self, auth_url: &str) -> Result<String, AuthError> {
        let mut stdout = tokio::io::stdout();
        let banner = format!(
            "Go to the following link in your browser:\n{auth_url}\n\nEnter verification code: "
        );
        stdout
            .write_all(banner.as_bytes())
            .await
            .map_err(|e| AuthError::Prompt(e.to_string()))?;
        stdout.flush().await.map_err(|e| AuthError::Prompt(e.to_string()))?;

        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| AuthError::Prompt(e.to_string()))?;

        if read == 0 {
            return Err(AuthError::Prompt("stdin closed before a code was entered".into()));
        }
        Ok(line.trim().to_string())
    }
}
