use crate::foundation::TxId;

/// Deterministically maps a transaction to one of `shards` integrator workers.
pub fn shard_for(tx_id: &TxId, shards: usize) -> usize {
    if shards <= 1 {
        return 0;
    }
    let hash = blake3::hash(tx_id.as_ref());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    (u64::from_le_bytes(prefix) % shards as u64) as usize
}
