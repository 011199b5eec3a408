use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock, TryLockError};

use serde::Serialize;
use tracing::{debug, info, warn};
use wcfrpc_proto::UserInfo;

use crate::client::RpcClient;
use crate::error::{ClientError, Result};
use crate::identity::{classify, Identity, IdentityKind};

/// Where the directory gets its data.
pub trait ContactSource: Send + Sync {
    /// The full contact list, unclassified.
    fn fetch_contacts(&self) -> Result<Vec<Identity>>;

    /// Profile of the logged-in account.
    fn fetch_user_info(&self) -> Result<UserInfo>;
}

impl ContactSource for RpcClient {
    fn fetch_contacts(&self) -> Result<Vec<Identity>> {
        Ok(self.contacts()?.into_iter().map(Identity::from).collect())
    }

    fn fetch_user_info(&self) -> Result<UserInfo> {
        self.user_info()
    }
}

/// Result of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Present,
    Absent,
    /// The partition has never been populated.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DirectoryStats {
    pub peers: usize,
    pub groups: usize,
    pub channels: usize,
}

impl DirectoryStats {
    pub fn total(&self) -> usize {
        self.peers + self.groups + self.channels
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Another refresh was running; nothing was done.
    Busy,
    Refreshed(DirectoryStats),
}

/// The logged-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelfProfile {
    pub wxid: String,
    pub name: String,
    pub mobile: String,
    pub home: String,
    /// `home/wxid/FileStorage`
    pub file_storage_path: PathBuf,
}

impl SelfProfile {
    /// `None` when the host did not report an account id.
    pub fn from_user_info(info: UserInfo) -> Option<Self> {
        if info.wxid.is_empty() {
            return None;
        }
        let file_storage_path = PathBuf::from(&info.home)
            .join(&info.wxid)
            .join("FileStorage");
        Some(Self {
            wxid: info.wxid,
            name: info.name,
            mobile: info.mobile,
            home: info.home,
            file_storage_path,
        })
    }
}

#[derive(Default)]
struct Partitions {
    peers: HashMap<String, Identity>,
    groups: HashMap<String, Identity>,
    channels: HashMap<String, Identity>,
}

impl Partitions {
    fn from_contacts(contacts: Vec<Identity>) -> Self {
        let mut partitions = Self::default();
        for contact in contacts {
            if let Some(kind) = contact.kind() {
                partitions
                    .get_mut(kind)
                    .insert(contact.wxid.clone(), contact);
            }
        }
        partitions
    }

    fn get(&self, kind: IdentityKind) -> &HashMap<String, Identity> {
        match kind {
            IdentityKind::Peer => &self.peers,
            IdentityKind::Group => &self.groups,
            IdentityKind::Channel => &self.channels,
        }
    }

    fn get_mut(&mut self, kind: IdentityKind) -> &mut HashMap<String, Identity> {
        match kind {
            IdentityKind::Peer => &mut self.peers,
            IdentityKind::Group => &mut self.groups,
            IdentityKind::Channel => &mut self.channels,
        }
    }

    fn stats(&self) -> DirectoryStats {
        DirectoryStats {
            peers: self.peers.len(),
            groups: self.groups.len(),
            channels: self.channels.len(),
        }
    }
}

/// Cached, classified contact list.
///
/// Readers share the cache; a refresh replaces all three partitions in one
/// write section. At most one refresh runs at a time and a second caller
/// gets [`RefreshOutcome::Busy`] instead of waiting.
pub struct Directory {
    source: Arc<dyn ContactSource>,
    partitions: RwLock<Partitions>,
    refresh_gate: Mutex<()>,
    profile: RwLock<Option<SelfProfile>>,
    profile_gate: Mutex<()>,
}

impl Directory {
    pub fn new(source: Arc<dyn ContactSource>) -> Self {
        Self {
            source,
            partitions: RwLock::new(Partitions::default()),
            refresh_gate: Mutex::new(()),
            profile: RwLock::new(None),
            profile_gate: Mutex::new(()),
        }
    }

    /// Cache-only lookup.
    pub fn lookup(&self, id: &str, kind: IdentityKind) -> Lookup {
        let partitions = self.read();
        let partition = partitions.get(kind);
        if partition.is_empty() {
            Lookup::Unknown
        } else if partition.contains_key(id) {
            Lookup::Present
        } else {
            Lookup::Absent
        }
    }

    /// Re-fetch the contact list unless a refresh is already running.
    pub fn refresh(&self) -> Result<RefreshOutcome> {
        let _gate = match self.refresh_gate.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                warn!("directory refresh already running; giving up");
                return Ok(RefreshOutcome::Busy);
            }
        };

        let contacts = self.source.fetch_contacts()?;
        let fetched = contacts.len();
        let partitions = Partitions::from_contacts(contacts);
        let stats = partitions.stats();

        *self.write() = partitions;
        info!(
            fetched,
            peers = stats.peers,
            groups = stats.groups,
            channels = stats.channels,
            "directory refreshed"
        );
        Ok(RefreshOutcome::Refreshed(stats))
    }

    /// Lookup, refreshing once if the partition is unpopulated.
    ///
    /// May still return `Unknown` when the refresh was busy or the host has
    /// no contacts of that kind.
    pub fn resolve(&self, id: &str, kind: IdentityKind) -> Result<Lookup> {
        match self.lookup(id, kind) {
            Lookup::Unknown => {}
            known => return Ok(known),
        }
        let outcome = self.refresh()?;
        debug!(id, %kind, ?outcome, "refreshed directory for lookup");
        Ok(self.lookup(id, kind))
    }

    /// Whether `id` is a known `kind`.
    ///
    /// Lossy: "could not determine" and refresh failures both read as
    /// `false`. Use [`Directory::require`] to tell them apart.
    pub fn is(&self, id: &str, kind: IdentityKind) -> bool {
        match self.resolve(id, kind) {
            Ok(lookup) => lookup == Lookup::Present,
            Err(err) => {
                debug!(id, %kind, error = %err, "directory lookup failed");
                false
            }
        }
    }

    /// Like [`Directory::is`], but `Unknown` is an `Indeterminate` error.
    pub fn require(&self, id: &str, kind: IdentityKind) -> Result<bool> {
        match self.resolve(id, kind)? {
            Lookup::Present => Ok(true),
            Lookup::Absent => Ok(false),
            Lookup::Unknown => Err(ClientError::Indeterminate {
                id: id.to_string(),
                kind,
            }),
        }
    }

    pub fn get(&self, id: &str) -> Option<Identity> {
        let kind = classify(id)?;
        self.read().get(kind).get(id).cloned()
    }

    pub fn peers(&self) -> Vec<Identity> {
        self.list(IdentityKind::Peer)
    }

    pub fn groups(&self) -> Vec<Identity> {
        self.list(IdentityKind::Group)
    }

    pub fn channels(&self) -> Vec<Identity> {
        self.list(IdentityKind::Channel)
    }

    /// Cached entries of `kind`, sorted by id.
    pub fn list(&self, kind: IdentityKind) -> Vec<Identity> {
        let mut entries: Vec<Identity> = self.read().get(kind).values().cloned().collect();
        entries.sort_by(|a, b| a.wxid.cmp(&b.wxid));
        entries
    }

    pub fn fetch_peers(&self) -> Result<Vec<Identity>> {
        self.fetch(IdentityKind::Peer)
    }

    pub fn fetch_groups(&self) -> Result<Vec<Identity>> {
        self.fetch(IdentityKind::Group)
    }

    pub fn fetch_channels(&self) -> Result<Vec<Identity>> {
        self.fetch(IdentityKind::Channel)
    }

    /// Entries of `kind` straight from the source; the cache is untouched.
    pub fn fetch(&self, kind: IdentityKind) -> Result<Vec<Identity>> {
        Ok(self
            .source
            .fetch_contacts()?
            .into_iter()
            .filter(|contact| contact.kind() == Some(kind))
            .collect())
    }

    pub fn stats(&self) -> DirectoryStats {
        self.read().stats()
    }

    /// Cached profile, fetched on first use.
    ///
    /// `None` when the host does not report an account (not logged in).
    pub fn self_profile(&self) -> Result<Option<SelfProfile>> {
        if let Some(profile) = self.profile_read().clone() {
            return Ok(Some(profile));
        }
        self.load_profile()
    }

    /// Re-fetch the profile. `None` if another update is running or the
    /// host reported no account.
    pub fn update_self_profile(&self) -> Result<Option<SelfProfile>> {
        let _gate = match self.profile_gate.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                debug!("profile update already running; giving up");
                return Ok(None);
            }
        };
        self.load_profile()
    }

    fn load_profile(&self) -> Result<Option<SelfProfile>> {
        let profile = SelfProfile::from_user_info(self.source.fetch_user_info()?);
        match &profile {
            Some(profile) => {
                debug!(wxid = %profile.wxid, "self profile loaded");
                *self.profile.write().unwrap_or_else(PoisonError::into_inner) =
                    Some(profile.clone());
            }
            None => debug!("host reported no account"),
        }
        Ok(profile)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Partitions> {
        self.partitions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Partitions> {
        self.partitions.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn profile_read(&self) -> std::sync::RwLockReadGuard<'_, Option<SelfProfile>> {
        self.profile.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
