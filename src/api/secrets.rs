/// Narrow seam for credential retrieval, resolved once at startup.
/// A failure here is fatal to the whole process: no cycle runs without
/// brokerage credentials.
pub trait SecretStore: Send + Sync {
    fn get_secret(&self, name: &str) -> crate::Result<String>;
}

/// Secret store backed by process environment variables. Deployments
/// that keep credentials in a managed secret store inject them into the
/// environment before launch.
pub struct EnvSecretStore;

impl SecretStore for EnvSecretStore {
    fn get_secret(&self, name: &str) -> crate::Result<String> {
        std::env::var(name).map_err(|_| format!("secret {} not set in environment", name).into())
    }
}
