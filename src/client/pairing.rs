//! The per-installation sync key and how a second device adopts it.
//!
//! A primary device shows `<origin>/#k=<key>` (as a link or QR code); the
//! secondary opens it, [`PairingStore::apply_incoming_if_present`] stores the
//! key and clears the fragment. The key is only ever held locally and sent
//! as a request header.

use std::{
    fs, io,
    path::PathBuf,
};

use crate::tenant::TenantKey;

const FRAGMENT_KEY: &str = "k=";

/// Where the secret lives between runs.
pub trait SecretPersistence {
    fn load(&self) -> io::Result<Option<String>>;
    fn store(&mut self, secret: &str) -> io::Result<()>;
}

/// Secret kept in a single text file.
#[derive(Debug, Clone)]
pub struct FileSecret {
    path: PathBuf,
}

impl FileSecret {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SecretPersistence for FileSecret {
    fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let raw = raw.trim();
                Ok((!raw.is_empty()).then(|| raw.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn store(&mut self, secret: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, secret)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySecret {
    value: Option<String>,
}

impl SecretPersistence for MemorySecret {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.value.clone())
    }

    fn store(&mut self, secret: &str) -> io::Result<()> {
        self.value = Some(secret.to_string());
        Ok(())
    }
}

pub struct PairingStore<P: SecretPersistence> {
    persistence: P,
}

impl<P: SecretPersistence> PairingStore<P> {
    pub fn new(persistence: P) -> Self {
        Self { persistence }
    }

    pub fn into_inner(self) -> P {
        self.persistence
    }

    /// Persisted key, or a freshly generated one that is persisted first.
    /// A stored value too short to be a key is replaced.
    pub fn get_or_create(&mut self) -> io::Result<TenantKey> {
        if let Some(key) = self
            .persistence
            .load()?
            .as_deref()
            .and_then(TenantKey::parse)
        {
            return Ok(key);
        }
        let key = TenantKey::generate();
        self.persistence.store(key.expose())?;
        Ok(key)
    }

    /// Adopts the key carried by a `#k=<urlencoded>` fragment.
    ///
    /// On success the key is persisted, `fragment` is cleared and `true` is
    /// returned. Anything else, including a decoded key shorter than the
    /// minimum, leaves both the stored key and `fragment` untouched.
    pub fn apply_incoming_if_present(&mut self, fragment: &mut String) -> io::Result<bool> {
        let body = fragment.strip_prefix('#').unwrap_or(fragment.as_str());
        let Some(encoded) = body.strip_prefix(FRAGMENT_KEY) else {
            return Ok(false);
        };
        let Some(key) = urlencoding::decode(encoded)
            .ok()
            .and_then(|decoded| TenantKey::parse(&decoded))
        else {
            return Ok(false);
        };
        self.persistence.store(key.expose())?;
        fragment.clear();
        Ok(true)
    }

    /// Link a second device opens to adopt this device's key.
    pub fn pairing_link(&mut self, origin: &str) -> io::Result<String> {
        let key = self.get_or_create()?;
        Ok(format!(
            "{}/#{FRAGMENT_KEY}{}",
            origin.trim_end_matches('/'),
            urlencoding::encode(key.expose())
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_stable() {
        let mut store = PairingStore::new(MemorySecret::default());
        let first = store.get_or_create().unwrap();
        let second = store.get_or_create().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn short_persisted_value_is_replaced() {
        let mut mem = MemorySecret::default();
        mem.store("short").unwrap();
        let mut store = PairingStore::new(mem);
        let key = store.get_or_create().unwrap();
        assert!(key.expose().len() >= 16);
        assert_eq!(store.into_inner().load().unwrap().as_deref(), Some(key.expose()));
    }

    #[test]
    fn adopts_encoded_key_and_clears_fragment() {
        let mut store = PairingStore::new(MemorySecret::default());
        let mut fragment = "#k=shared%20key%2F0123456789".to_string();
        assert!(store.apply_incoming_if_present(&mut fragment).unwrap());
        assert!(fragment.is_empty());
        assert_eq!(store.get_or_create().unwrap().expose(), "shared key/0123456789");
    }

    #[test]
    fn ignores_fragments_without_a_usable_key() {
        let mut store = PairingStore::new(MemorySecret::default());
        let original = store.get_or_create().unwrap();

        for raw in ["", "#", "#section", "#k=tooshort", "#x=0123456789abcdefgh", "#k=%FF%FE%FD%FC%FB%FA%F9%F8%F7%F6%F5%F4%F3%F2%F1%F0"] {
            let mut fragment = raw.to_string();
            assert!(!store.apply_incoming_if_present(&mut fragment).unwrap(), "{raw}");
            assert_eq!(fragment, raw);
        }
        assert_eq!(store.get_or_create().unwrap(), original);
    }

    #[test]
    fn link_round_trips_through_a_second_device() {
        let mut primary = PairingStore::new(MemorySecret::default());
        let link = primary.pairing_link("https://log.example.com/").unwrap();
        assert!(link.starts_with("https://log.example.com/#k="));

        let mut fragment = link[link.find('#').unwrap()..].to_string();
        let mut secondary = PairingStore::new(MemorySecret::default());
        assert!(secondary.apply_incoming_if_present(&mut fragment).unwrap());
        assert_eq!(
            secondary.get_or_create().unwrap(),
            primary.get_or_create().unwrap()
        );
    }
}
