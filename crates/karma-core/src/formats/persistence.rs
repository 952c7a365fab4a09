//! # Snapshot Format
//!
//! Binary serialization for a ledger's transfer history.
//!
//! Format: Header (5 bytes) + postcard-serialized `Vec<KarmaTransfer>`.
//! - 4 bytes: Magic ("KRMA")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded, and every
//! decoded transfer is checked against the ledger invariants (normalized,
//! distinct giver and receiver), since deserialization bypasses the
//! constructors that normally enforce them.

use crate::{KarmaError, KarmaTransfer, UserId, primitives};

/// Maximum accepted snapshot size.
///
/// Validated before any decoding to prevent allocation-based DoS.
pub const MAX_SNAPSHOT_SIZE: usize = 256 * 1024 * 1024; // 256 MB

/// Header length in bytes.
const HEADER_LEN: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The snapshot header precedes all transfer data.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), KarmaError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(KarmaError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(KarmaError::SerializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KarmaError> {
        if bytes.len() < HEADER_LEN {
            return Err(KarmaError::SerializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a transfer history to bytes (header + payload).
pub fn ledger_to_bytes(transfers: &[KarmaTransfer]) -> Result<Vec<u8>, KarmaError> {
    let payload = postcard::to_stdvec(transfers)
        .map_err(|e| KarmaError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&SnapshotHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize a transfer history from bytes.
pub fn ledger_from_bytes(bytes: &[u8]) -> Result<Vec<KarmaTransfer>, KarmaError> {
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(KarmaError::SerializationError(format!(
            "Snapshot size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    let transfers: Vec<KarmaTransfer> = postcard::from_bytes(&bytes[HEADER_LEN..])
        .map_err(|e| {
            KarmaError::SerializationError(format!("Failed to decode transfers: {}", e))
        })?;

    for (index, transfer) in transfers.iter().enumerate() {
        validate_transfer(transfer).map_err(|reason| {
            KarmaError::SerializationError(format!("Transfer {}: {}", index, reason))
        })?;
    }

    Ok(transfers)
}

fn validate_transfer(transfer: &KarmaTransfer) -> Result<(), &'static str> {
    if !is_normalized(transfer.giver()) {
        return Err("giver is not a normalized identifier");
    }
    if !is_normalized(transfer.receiver()) {
        return Err("receiver is not a normalized identifier");
    }
    if transfer.giver() == transfer.receiver() {
        return Err("self transfer");
    }
    Ok(())
}

fn is_normalized(id: &UserId) -> bool {
    UserId::normalize(id.as_str()).as_ref() == Some(id)
}

/// BLAKE3 hash of a snapshot's bytes, hex encoded (64 characters).
///
/// Only available with the `crypto-hash` feature.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn snapshot_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

// =============================================================================
// TESTS
// =============================================================================
