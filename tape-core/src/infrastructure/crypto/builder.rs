use crate::domain::{Endorsement, Envelope, SeekInfo, SeekPosition, SeekRequest, SignedProposal, TransactionRequest};
use crate::foundation::{ChaincodeId, ChannelId, NodeName, Result, TapeError, TxId};
use crate::infrastructure::crypto::identity::Signer;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const NONCE_SIZE: usize = 24;

/// Ledger wire-format construction consumed by the pipeline stages.
pub trait TransactionBuilder: Send + Sync {
    fn new_request(&self, seq: u64) -> Result<TransactionRequest>;
    fn sign_proposal(&self, request: &TransactionRequest, endorser: &NodeName) -> Result<SignedProposal>;
    /// `endorsements` must hold the complete required set.
    fn build_envelope(&self, seq: u64, tx_id: TxId, endorsements: &[(NodeName, Endorsement)]) -> Result<Envelope>;
    /// Signed deliver request starting at the newest block and never stopping.
    fn seek_newest(&self) -> Result<SeekRequest>;
}

/// Body of a proposal as signed by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalPayload {
    pub tx_id: TxId,
    pub channel: ChannelId,
    pub chaincode: ChaincodeId,
    pub creator: Vec<u8>,
    pub nonce: Vec<u8>,
    pub input: Vec<u8>,
}

/// Body of an envelope: the agreed response payload plus every endorsement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPayload {
    pub tx_id: TxId,
    pub channel: ChannelId,
    pub creator: Vec<u8>,
    pub response_payload: Vec<u8>,
    pub endorsements: Vec<Endorsement>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekPayload {
    pub creator: Vec<u8>,
    pub info: SeekInfo,
}

/// Transaction id: blake3 over nonce followed by the creator identity.
pub fn compute_tx_id(nonce: &[u8], creator: &[u8]) -> TxId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(nonce);
    hasher.update(creator);
    TxId::new(*hasher.finalize().as_bytes())
}

pub fn decode_proposal(bytes: &[u8]) -> Result<ProposalPayload> {
    Ok(bincode::deserialize(bytes)?)
}

pub fn decode_transaction(bytes: &[u8]) -> Result<TransactionPayload> {
    Ok(bincode::deserialize(bytes)?)
}

pub fn decode_seek(bytes: &[u8]) -> Result<SeekPayload> {
    Ok(bincode::deserialize(bytes)?)
}

/// Bincode-encoded builder for one channel/chaincode invocation.
pub struct DefaultTransactionBuilder {
    signer: Arc<dyn Signer>,
    channel: ChannelId,
    chaincode: ChaincodeId,
    input: Vec<u8>,
}

impl DefaultTransactionBuilder {
    pub fn new(signer: Arc<dyn Signer>, channel: ChannelId, chaincode: ChaincodeId, args: &[String]) -> Result<Self> {
        let input = bincode::serialize(args)?;
        Ok(Self { signer, channel, chaincode, input })
    }
}

impl TransactionBuilder for DefaultTransactionBuilder {
    fn new_request(&self, seq: u64) -> Result<TransactionRequest> {
        let mut nonce = vec![0u8; NONCE_SIZE];
        rand::thread_rng()
            .try_fill_bytes(&mut nonce)
            .map_err(|err| TapeError::RequestBuildFailed { seq, details: format!("nonce: {err}") })?;
        let creator = self.signer.identity().to_vec();
        let tx_id = compute_tx_id(&nonce, &creator);
        Ok(TransactionRequest {
            seq,
            tx_id,
            channel: self.channel.clone(),
            chaincode: self.chaincode.clone(),
            creator,
            nonce,
            payload: self.input.clone(),
        })
    }

    fn sign_proposal(&self, request: &TransactionRequest, endorser: &NodeName) -> Result<SignedProposal> {
        let signing_failed =
            |details: String| TapeError::SigningFailed { tx_id: request.tx_id.to_string(), endorser: endorser.to_string(), details };
        let proposal_bytes = bincode::serialize(&ProposalPayload {
            tx_id: request.tx_id,
            channel: request.channel.clone(),
            chaincode: request.chaincode.clone(),
            creator: request.creator.clone(),
            nonce: request.nonce.clone(),
            input: request.payload.clone(),
        })
        .map_err(|err| signing_failed(err.to_string()))?;
        let signature = self.signer.sign(&proposal_bytes).map_err(|err| signing_failed(err.to_string()))?;
        Ok(SignedProposal { seq: request.seq, tx_id: request.tx_id, endorser: endorser.clone(), proposal_bytes, signature })
    }

    fn build_envelope(&self, seq: u64, tx_id: TxId, endorsements: &[(NodeName, Endorsement)]) -> Result<Envelope> {
        let build_failed = |details: String| TapeError::EnvelopeBuildFailed { tx_id: tx_id.to_string(), details };
        let Some((_, first)) = endorsements.first() else {
            return Err(build_failed("no endorsements".to_string()));
        };
        if let Some((name, _)) = endorsements.iter().find(|(_, e)| e.payload != first.payload) {
            return Err(build_failed(format!("response payload from {name} does not match")));
        }
        let payload = bincode::serialize(&TransactionPayload {
            tx_id,
            channel: self.channel.clone(),
            creator: self.signer.identity().to_vec(),
            response_payload: first.payload.clone(),
            endorsements: endorsements.iter().map(|(_, e)| e.clone()).collect(),
        })
        .map_err(|err| build_failed(err.to_string()))?;
        let signature = self.signer.sign(&payload).map_err(|err| build_failed(err.to_string()))?;
        Ok(Envelope { seq, tx_id, payload, signature })
    }

    fn seek_newest(&self) -> Result<SeekRequest> {
        let payload = bincode::serialize(&SeekPayload {
            creator: self.signer.identity().to_vec(),
            info: SeekInfo { channel: self.channel.clone(), start: SeekPosition::Newest, stop: SeekPosition::Specified(u64::MAX) },
        })?;
        let signature = self.signer.sign(&payload)?;
        Ok(SeekRequest { payload, signature })
    }
}
