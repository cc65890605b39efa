//! Client identity and transaction building.

pub mod builder;
pub mod identity;

pub use builder::{
    compute_tx_id, decode_proposal, decode_seek, decode_transaction, DefaultTransactionBuilder, ProposalPayload, SeekPayload,
    TransactionBuilder, TransactionPayload,
};
pub use identity::{decode_identity, verify_signature, Ed25519Signer, SerializedIdentity, Signer};
