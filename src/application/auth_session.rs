// Auth session - Validates the operator secret and gates protected views
use crate::application::credential_store::CredentialStore;
use crate::application::scale_backend::{BackendError, ScaleBackend};
use crate::domain::credential::{Credential, CredentialStatus};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// Shared session handle. Created once at startup and cloned into every
/// component that needs the secret.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    backend: Arc<dyn ScaleBackend>,
    store: Arc<dyn CredentialStore>,
    credential: watch::Sender<Credential>,
    validating: Mutex<HashSet<String>>,
    // Bumped on logout; validations started under an older value are dropped
    generation: AtomicU64,
}

/// Registers a secret as being validated until dropped.
struct ValidationGuard<'a> {
    validating: &'a Mutex<HashSet<String>>,
    secret: String,
}

impl<'a> ValidationGuard<'a> {
    fn acquire(validating: &'a Mutex<HashSet<String>>, secret: &str) -> Option<Self> {
        let inserted = validating
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(secret.to_string());

        inserted.then(|| Self {
            validating,
            secret: secret.to_string(),
        })
    }
}

impl Drop for ValidationGuard<'_> {
    fn drop(&mut self) {
        self.validating
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.secret);
    }
}

impl AuthSession {
    pub fn new(backend: Arc<dyn ScaleBackend>, store: Arc<dyn CredentialStore>) -> Self {
        let (credential, _) = watch::channel(Credential::default());
        Self {
            inner: Arc::new(SessionInner {
                backend,
                store,
                credential,
                validating: Mutex::new(HashSet::new()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Current secret; empty unless the session is valid.
    pub fn secret(&self) -> String {
        self.inner.credential.borrow().secret.clone()
    }

    pub fn status(&self) -> CredentialStatus {
        self.inner.credential.borrow().status
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.credential.borrow().is_authenticated()
    }

    pub fn subscribe(&self) -> watch::Receiver<Credential> {
        self.inner.credential.subscribe()
    }

    /// Re-validate a previously persisted secret. Only an explicit rejection
    /// purges it; a transport failure leaves it stored for the next start.
    pub async fn restore(&self) -> CredentialStatus {
        if self.status() != CredentialStatus::Unknown {
            return self.status();
        }

        let stored = match self.inner.store.load() {
            Ok(Some(secret)) if !secret.is_empty() => secret,
            Ok(_) => return self.status(),
            Err(e) => {
                tracing::warn!("Could not load stored credential: {:#}", e);
                return self.status();
            }
        };

        let Some(_guard) = ValidationGuard::acquire(&self.inner.validating, &stored) else {
            return self.status();
        };

        tracing::debug!("Validating stored credential");
        let generation = self.begin_validation();
        let result = self.inner.backend.check_password(&stored).await;
        self.apply_validation(stored, result, false, generation)
    }

    /// Validate and persist a new secret. Empty input and an already valid
    /// session are no-ops.
    pub async fn login(&self, candidate: &str) -> CredentialStatus {
        let status = self.status();
        if candidate.is_empty() || status == CredentialStatus::Valid {
            return status;
        }

        let Some(_guard) = ValidationGuard::acquire(&self.inner.validating, candidate) else {
            tracing::debug!("Validation for this secret already in flight");
            return status;
        };

        let generation = self.begin_validation();
        let result = self.inner.backend.check_password(candidate).await;
        self.apply_validation(candidate.to_string(), result, true, generation)
    }

    /// Forget the secret everywhere. A validation still in flight is
    /// discarded when it completes.
    pub fn logout(&self) {
        let inner = &self.inner;
        inner.credential.send_modify(|credential| {
            inner.generation.fetch_add(1, Ordering::SeqCst);
            if let Err(e) = inner.store.clear() {
                tracing::warn!("Could not clear stored credential: {:#}", e);
            }
            *credential = Credential::default();
        });
        tracing::info!("Logged out");
    }

    // Decided under the watch lock so it cannot interleave with logout.
    fn apply_validation(
        &self,
        secret: String,
        result: Result<(), BackendError>,
        persist: bool,
        generation: u64,
    ) -> CredentialStatus {
        let inner = &self.inner;
        inner.credential.send_if_modified(|credential| {
            if inner.generation.load(Ordering::SeqCst) != generation {
                tracing::debug!("Session was reset during validation, dropping result");
                return false;
            }
            if credential.status == CredentialStatus::Valid {
                tracing::debug!("Session already valid, dropping late validation result");
                return false;
            }

            let next = match result {
                Ok(()) => {
                    if persist {
                        if let Err(e) = inner.store.save(&secret) {
                            tracing::warn!("Could not persist credential: {:#}", e);
                        }
                    }
                    tracing::info!("Credential accepted");
                    Credential {
                        secret,
                        status: CredentialStatus::Valid,
                    }
                }
                Err(e) if e.is_rejection() => {
                    tracing::warn!("Credential rejected: {}", e);
                    if let Err(e) = inner.store.clear() {
                        tracing::warn!("Could not clear stored credential: {:#}", e);
                    }
                    Credential {
                        secret: String::new(),
                        status: CredentialStatus::Invalid,
                    }
                }
                Err(e) => {
                    tracing::warn!("Credential check failed, keeping stored secret: {}", e);
                    Credential {
                        secret: String::new(),
                        status: CredentialStatus::Invalid,
                    }
                }
            };

            let changed = *credential != next;
            *credential = next;
            changed
        });

        self.status()
    }

    /// Mark the session as checking and return the generation the result
    /// will be applied against.
    fn begin_validation(&self) -> u64 {
        let inner = &self.inner;
        let mut generation = 0;
        inner.credential.send_if_modified(|credential| {
            generation = inner.generation.load(Ordering::SeqCst);
            let changed = credential.status != CredentialStatus::Checking;
            credential.status = CredentialStatus::Checking;
            changed
        });
        generation
    }
}
