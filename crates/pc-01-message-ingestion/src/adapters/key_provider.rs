use std::fmt;

use shared_crypto::BoxSecretKey;
use zeroize::Zeroizing;

use crate::ports::outbound::KeyProvider;

/// Key provider holding one fixed secret key.
///
/// The bytes are wiped when the provider is dropped.
pub struct StaticKeyProvider {
    key: Zeroizing<Vec<u8>>,
}

impl StaticKeyProvider {
    /// Wrap raw key bytes. Length is checked at decryption time.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: Zeroizing::new(key.into()),
        }
    }

    pub fn from_secret(secret: &BoxSecretKey) -> Self {
        Self::new(secret.as_bytes().to_vec())
    }
}

impl KeyProvider for StaticKeyProvider {
    fn local_private_key(&self) -> &[u8] {
        &self.key
    }
}

impl fmt::Debug for StaticKeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticKeyProvider(..)")
    }
}
