use crate::foundation::{ChaincodeId, ChannelId, NodeName, TxId, STATUS_SUCCESS};
use serde::{Deserialize, Serialize};

/// A transaction to be driven through the pipeline. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub seq: u64,
    pub tx_id: TxId,
    pub channel: ChannelId,
    pub chaincode: ChaincodeId,
    pub creator: Vec<u8>,
    pub nonce: Vec<u8>,
    pub payload: Vec<u8>,
}

/// One proposal per (transaction, endorser) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedProposal {
    pub seq: u64,
    pub tx_id: TxId,
    pub endorser: NodeName,
    pub proposal_bytes: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    pub endorser_identity: Vec<u8>,
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Raw answer of an endorser to a proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub status: u32,
    pub message: String,
    pub endorsement: Option<Endorsement>,
}

impl ProposalResponse {
    pub fn success(endorsement: Endorsement) -> Self {
        Self { status: STATUS_SUCCESS, message: String::new(), endorsement: Some(endorsement) }
    }

    pub fn rejected(status: u32, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), endorsement: None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EndorsementOutcome {
    Endorsed(Endorsement),
    Rejected { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndorsementResult {
    pub seq: u64,
    pub tx_id: TxId,
    pub endorser: NodeName,
    pub outcome: EndorsementOutcome,
}

impl EndorsementResult {
    /// Classifies a raw response. Anything other than a success status carrying an endorsement is a rejection.
    pub fn from_response(proposal: &SignedProposal, response: ProposalResponse) -> Self {
        let outcome = match (response.status, response.endorsement) {
            (STATUS_SUCCESS, Some(endorsement)) => EndorsementOutcome::Endorsed(endorsement),
            (STATUS_SUCCESS, None) => EndorsementOutcome::Rejected { reason: "success status without endorsement".to_string() },
            (status, _) => EndorsementOutcome::Rejected { reason: format!("status {}: {}", status, response.message) },
        };
        Self { seq: proposal.seq, tx_id: proposal.tx_id, endorser: proposal.endorser.clone(), outcome }
    }

    pub fn is_endorsed(&self) -> bool {
        matches!(self.outcome, EndorsementOutcome::Endorsed(_))
    }
}

/// Fully assembled, signed transaction ready for ordering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub seq: u64,
    pub tx_id: TxId,
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeekPosition {
    Newest,
    Oldest,
    Specified(u64),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekInfo {
    pub channel: ChannelId,
    pub start: SeekPosition,
    pub stop: SeekPosition,
}

/// Signed subscription request sent first on a deliver stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekRequest {
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationCode {
    Valid,
    MvccReadConflict,
    EndorsementPolicyFailure,
    BadPayload,
}

impl ValidationCode {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationCode::Valid)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredTransaction {
    pub tx_id: TxId,
    pub validation: ValidationCode,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredBlock {
    pub channel: ChannelId,
    pub number: u64,
    pub transactions: Vec<FilteredTransaction>,
}

/// Messages a committer sends on a deliver stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliverResponse {
    Status(u32),
    FilteredBlock(FilteredBlock),
}

/// A filtered block tagged with the committer that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressedBlock {
    pub committer: NodeName,
    pub block: FilteredBlock,
}
