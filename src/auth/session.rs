//! Reconciles the external identity session with the internal profile
//! record and answers capability queries.
//!
//! One synchronizer is created per application instance and injected where
//! needed; there is no process-global session state. Profile creation and
//! role upgrades for a given identity are serialized through a per-key
//! async mutex, so a sign-in racing a seller signup for the same identity
//! can never produce two profiles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{watch, RwLock};
use tracing::debug;

use crate::auth::identity::Identity;
use crate::models::{Role, SellerInfo, UserProfile};
use crate::store::{NewProfile, ProfileStore};
use crate::utils::error::{AppError, AppResult};

/// Per-identity-key mutual exclusion. Handed to everything that writes
/// profiles so concurrent signups for the same identity serialize.
#[derive(Clone, Default)]
pub struct IdentityLocks {
    inner: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl IdentityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, uid: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().expect("identity lock map poisoned");
        map.entry(uid.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

/// What observers see: the current identity and, once the fetch or create
/// has completed, the matching profile.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub profile: Option<UserProfile>,
}

struct SessionInner {
    identity: Option<Identity>,
    profile: Option<UserProfile>,
    /// Bumped on every identity change. A profile fetch that completes for
    /// an older epoch is discarded instead of clobbering newer state.
    epoch: u64,
}

pub struct SessionSynchronizer {
    profiles: Arc<dyn ProfileStore>,
    locks: IdentityLocks,
    inner: RwLock<SessionInner>,
    notify: watch::Sender<SessionSnapshot>,
}

impl SessionSynchronizer {
    pub fn new(profiles: Arc<dyn ProfileStore>, locks: IdentityLocks) -> Self {
        let (notify, _) = watch::channel(SessionSnapshot::default());
        Self {
            profiles,
            locks,
            inner: RwLock::new(SessionInner {
                identity: None,
                profile: None,
                epoch: 0,
            }),
            notify,
        }
    }

    /// Observe session changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.notify.subscribe()
    }

    /// Handles a sign-in or sign-out reported by the identity provider.
    ///
    /// On sign-in the matching profile is fetched, or created with the
    /// default `user` role when absent. If another identity change lands
    /// while the fetch is in flight, the stale result is discarded.
    pub async fn on_identity_change(&self, identity: Option<Identity>) -> AppResult<()> {
        let epoch = {
            let mut inner = self.inner.write().await;
            inner.epoch += 1;
            inner.identity = identity.clone();
            inner.profile = None;
            inner.epoch
        };
        self.publish().await;

        let Some(identity) = identity else {
            return Ok(());
        };

        let lock = self.locks.lock_for(&identity.uid);
        let _guard = lock.lock().await;

        let profile = match self.profiles.find_by_uid(&identity.uid).await? {
            Some(profile) => {
                self.profiles.touch_login(&identity.uid).await?;
                profile
            }
            None => {
                debug!(uid = %identity.uid, "No profile for identity, creating one");
                self.profiles
                    .create(NewProfile {
                        firebase_uid: identity.uid.clone(),
                        email: identity.email.clone(),
                        display_name: identity.display_name.clone(),
                        role: Role::User,
                        profile_picture: None,
                        seller_info: None,
                    })
                    .await?
            }
        };

        {
            let mut inner = self.inner.write().await;
            if inner.epoch != epoch {
                debug!(uid = %identity.uid, "Discarding superseded profile fetch");
                return Ok(());
            }
            inner.profile = Some(profile);
        }
        self.publish().await;
        Ok(())
    }

    /// Explicit seller signup. Runs under the same per-identity lock as
    /// the sign-in auto-create, so whichever write lands second sees the
    /// first one's profile and upgrades it instead of duplicating it.
    pub async fn create_seller_profile(
        &self,
        identity: &Identity,
        info: SellerInfo,
    ) -> AppResult<UserProfile> {
        let lock = self.locks.lock_for(&identity.uid);
        let _guard = lock.lock().await;

        let profile = match self.profiles.find_by_uid(&identity.uid).await? {
            Some(_) => self
                .profiles
                .upgrade_to_seller(&identity.uid, info)
                .await?
                .ok_or_else(|| {
                    AppError::Internal("Profile disappeared during seller signup".to_string())
                })?,
            None => {
                self.profiles
                    .create(NewProfile {
                        firebase_uid: identity.uid.clone(),
                        email: identity.email.clone(),
                        display_name: identity.display_name.clone(),
                        role: Role::Seller,
                        profile_picture: None,
                        seller_info: Some(info),
                    })
                    .await?
            }
        };

        {
            let mut inner = self.inner.write().await;
            let current = inner.identity.as_ref().map(|i| i.uid.as_str());
            if current == Some(identity.uid.as_str()) {
                inner.profile = Some(profile.clone());
            }
        }
        self.publish().await;
        Ok(profile)
    }

    /// Escalates the currently authenticated profile to seller.
    pub async fn upgrade_to_seller(&self, info: SellerInfo) -> AppResult<UserProfile> {
        let uid = {
            let inner = self.inner.read().await;
            match (&inner.identity, &inner.profile) {
                (Some(identity), Some(_)) => identity.uid.clone(),
                _ => {
                    return Err(AppError::Auth(
                        "No authenticated profile to upgrade".to_string(),
                    ))
                }
            }
        };

        let lock = self.locks.lock_for(&uid);
        let _guard = lock.lock().await;

        let profile = self
            .profiles
            .upgrade_to_seller(&uid, info)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No profile for identity '{uid}'")))?;

        {
            let mut inner = self.inner.write().await;
            if inner.identity.as_ref().map(|i| i.uid.as_str()) == Some(uid.as_str()) {
                inner.profile = Some(profile.clone());
            }
        }
        self.publish().await;
        Ok(profile)
    }

    /// True only when both the identity and the profile are present. A
    /// lingering identity whose profile fetch is still in flight reports
    /// not-authenticated rather than erroring.
    pub async fn is_authenticated(&self) -> bool {
        let inner = self.inner.read().await;
        inner.identity.is_some() && inner.profile.is_some()
    }

    pub async fn has_role(&self, role: Role) -> bool {
        let inner = self.inner.read().await;
        inner.profile.as_ref().map_or(false, |p| p.role == role)
    }

    pub async fn has_any_role(&self, roles: &[Role]) -> bool {
        let inner = self.inner.read().await;
        inner
            .profile
            .as_ref()
            .map_or(false, |p| roles.contains(&p.role))
    }

    pub async fn can_create_events(&self) -> bool {
        self.has_any_role(&[Role::Seller, Role::Admin]).await
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.read().await;
        SessionSnapshot {
            identity: inner.identity.clone(),
            profile: inner.profile.clone(),
        }
    }

    async fn publish(&self) {
        let snapshot = self.snapshot().await;
        self.notify.send_replace(snapshot);
    }
}
