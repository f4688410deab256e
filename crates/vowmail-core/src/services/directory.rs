/// External collaborator interfaces: guest/wedding lookups and RSVP token
/// regeneration. The pipeline reads these records and writes back exactly
/// one field, the invite-sent timestamp.
use crate::error::VowmailError;
use crate::models::{Guest, Wedding};
use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_wedding(&self, wedding_id: &str) -> Result<Option<Wedding>, VowmailError>;

    async fn find_guest(&self, guest_id: &str) -> Result<Option<Guest>, VowmailError>;

    /// Stamps the invite-sent timestamp on the guest record.
    async fn mark_invite_sent(&self, guest_id: &str) -> Result<(), VowmailError>;
}

#[async_trait]
pub trait TokenService: Send + Sync {
    /// Regenerates the guest's single-use RSVP secret, invalidating any
    /// prior one. The raw value is used only transiently to build a link
    /// and is never stored in plaintext.
    async fn regenerate_secret(&self, guest_id: &str)
    -> Result<(Guest, String), VowmailError>;
}

/// In-memory directory for tests and local runs. Implements both collaborator
/// traits; secrets are stored hashed, never in plaintext.
pub struct InMemoryDirectory {
    weddings: tokio::sync::Mutex<HashMap<String, Wedding>>,
    guests: tokio::sync::Mutex<HashMap<String, Guest>>,
    secret_hashes: tokio::sync::Mutex<HashMap<String, String>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            weddings: tokio::sync::Mutex::new(HashMap::new()),
            guests: tokio::sync::Mutex::new(HashMap::new()),
            secret_hashes: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    pub async fn insert_wedding(&self, wedding: Wedding) {
        self.weddings.lock().await.insert(wedding.id.clone(), wedding);
    }

    pub async fn insert_guest(&self, guest: Guest) {
        self.guests.lock().await.insert(guest.id.clone(), guest);
    }

    pub async fn remove_wedding(&self, wedding_id: &str) {
        self.weddings.lock().await.remove(wedding_id);
    }

    /// Hash of the current secret for a guest, if one has been issued.
    pub async fn secret_hash(&self, guest_id: &str) -> Option<String> {
        self.secret_hashes.lock().await.get(guest_id).cloned()
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn find_wedding(&self, wedding_id: &str) -> Result<Option<Wedding>, VowmailError> {
        Ok(self.weddings.lock().await.get(wedding_id).cloned())
    }

    async fn find_guest(&self, guest_id: &str) -> Result<Option<Guest>, VowmailError> {
        Ok(self.guests.lock().await.get(guest_id).cloned())
    }

    async fn mark_invite_sent(&self, guest_id: &str) -> Result<(), VowmailError> {
        let mut guests = self.guests.lock().await;
        let guest = guests
            .get_mut(guest_id)
            .ok_or_else(|| VowmailError::GuestNotFound(guest_id.to_string()))?;
        guest.invite_sent_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl TokenService for InMemoryDirectory {
    async fn regenerate_secret(
        &self,
        guest_id: &str,
    ) -> Result<(Guest, String), VowmailError> {
        let guest = self
            .find_guest(guest_id)
            .await?
            .ok_or_else(|| VowmailError::GuestNotFound(guest_id.to_string()))?;

        let raw_secret = uuid::Uuid::new_v4().simple().to_string();
        let hash = hex_sha256(&raw_secret);

        // Overwriting the hash invalidates any previously issued secret
        self.secret_hashes
            .lock()
            .await
            .insert(guest_id.to_string(), hash);

        Ok((guest, raw_secret))
    }
}

fn hex_sha256(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}
