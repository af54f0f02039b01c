// Persisted credential slot

/// Durable storage for the single operator secret. Nothing else reads or
/// writes the persisted slot.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> anyhow::Result<Option<String>>;

    fn save(&self, secret: &str) -> anyhow::Result<()>;

    fn clear(&self) -> anyhow::Result<()>;
}
