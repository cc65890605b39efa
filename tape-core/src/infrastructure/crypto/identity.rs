use crate::foundation::util::encoding::parse_hex_32bytes;
use crate::foundation::{Hash32, Result, TapeError};
use ed25519_dalek::{Signature, Signer as _, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

/// Opaque signing capability: an encoded identity plus a detached signature over bytes.
pub trait Signer: Send + Sync {
    fn identity(&self) -> &[u8];
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
}

/// Identity carried as `creator` in proposals, envelopes and seek requests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedIdentity {
    pub msp_id: String,
    pub public_key: Hash32,
}

#[derive(Clone)]
pub struct Ed25519Signer {
    identity: Vec<u8>,
    key: SigningKey,
}

impl Ed25519Signer {
    pub fn from_seed(msp_id: &str, seed: [u8; 32]) -> Result<Self> {
        let key = SigningKey::from_bytes(&seed);
        let identity =
            bincode::serialize(&SerializedIdentity { msp_id: msp_id.to_string(), public_key: key.verifying_key().to_bytes() })?;
        Ok(Self { identity, key })
    }

    pub fn from_hex_seed(msp_id: &str, seed_hex: &str) -> Result<Self> {
        let seed = parse_hex_32bytes(seed_hex)
            .map_err(|err| TapeError::CryptoError { operation: "load signer seed".to_string(), details: err.to_string() })?;
        Self::from_seed(msp_id, seed)
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }
}

impl Signer for Ed25519Signer {
    fn identity(&self) -> &[u8] {
        &self.identity
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        Ok(self.key.sign(message).to_bytes().to_vec())
    }
}

pub fn decode_identity(identity: &[u8]) -> Result<SerializedIdentity> {
    Ok(bincode::deserialize(identity)?)
}

/// Checks `signature` over `message` against the key inside an encoded identity.
pub fn verify_signature(identity: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
    let crypto_err = |details: String| TapeError::CryptoError { operation: "verify signature".to_string(), details };
    let identity = decode_identity(identity)?;
    let key = VerifyingKey::from_bytes(&identity.public_key).map_err(|err| crypto_err(err.to_string()))?;
    let signature = Signature::from_slice(signature).map_err(|err| crypto_err(err.to_string()))?;
    key.verify_strict(message, &signature).map_err(|err| crypto_err(err.to_string()))
}
