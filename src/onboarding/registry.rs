//! Live wizards, one per user, with a shared completion channel.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::debug;

use super::model::OnboardingCompleted;
use super::wizard::OnboardingWizard;
use crate::store::OnboardingStore;

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 64;

struct Slot {
    wizard: Arc<Mutex<OnboardingWizard>>,
    touched: Instant,
}

pub struct WizardRegistry {
    store: Arc<dyn OnboardingStore>,
    wizards: RwLock<HashMap<String, Slot>>,
    tx: broadcast::Sender<OnboardingCompleted>,
}

impl WizardRegistry {
    pub fn new(store: Arc<dyn OnboardingStore>) -> Arc<Self> {
        Self::with_capacity(store, DEFAULT_BROADCAST_CAPACITY)
    }

    pub fn with_capacity(store: Arc<dyn OnboardingStore>, capacity: usize) -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Arc::new(Self {
            store,
            wizards: RwLock::new(HashMap::new()),
            tx,
        })
    }

    /// Subscribe to completion events from every wizard.
    pub fn subscribe(&self) -> broadcast::Receiver<OnboardingCompleted> {
        self.tx.subscribe()
    }

    /// The user's wizard, started fresh on the welcome step if none exists.
    pub async fn get_or_create(&self, user_id: &str) -> Arc<Mutex<OnboardingWizard>> {
        let mut wizards = self.wizards.write().await;
        let slot = wizards.entry(user_id.to_string()).or_insert_with(|| {
            debug!(user_id, "Starting onboarding wizard");
            Slot {
                wizard: Arc::new(Mutex::new(OnboardingWizard::with_events(
                    user_id,
                    Arc::clone(&self.store),
                    self.tx.clone(),
                ))),
                touched: Instant::now(),
            }
        });
        slot.touched = Instant::now();
        Arc::clone(&slot.wizard)
    }

    /// The user's live wizard, if any. Counts as activity.
    pub async fn get(&self, user_id: &str) -> Option<Arc<Mutex<OnboardingWizard>>> {
        let mut wizards = self.wizards.write().await;
        let slot = wizards.get_mut(user_id)?;
        slot.touched = Instant::now();
        Some(Arc::clone(&slot.wizard))
    }

    /// Drop the user's wizard. Returns whether one existed.
    pub async fn remove(&self, user_id: &str) -> bool {
        self.wizards.write().await.remove(user_id).is_some()
    }

    /// Drop wizards untouched for at least `max_idle`. Wizards that are
    /// locked or have a commit in flight are kept. Returns how many were
    /// dropped.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut wizards = self.wizards.write().await;
        let before = wizards.len();
        wizards.retain(|user_id, slot| {
            if slot.touched.elapsed() < max_idle {
                return true;
            }
            let busy = slot
                .wizard
                .try_lock()
                .map(|w| w.submission_in_flight())
                .unwrap_or(true);
            if !busy {
                debug!(user_id = %user_id, "Evicting idle onboarding wizard");
            }
            busy
        });
        before - wizards.len()
    }

    /// Number of live wizards.
    pub async fn len(&self) -> usize {
        self.wizards.read().await.len()
    }
}
