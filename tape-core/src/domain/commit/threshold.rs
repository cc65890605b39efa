use crate::foundation::{Result, TapeError};

/// Minimum number of distinct committers that must report a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitThreshold {
    required: usize,
    committers: usize,
}

impl CommitThreshold {
    pub fn new(required: usize, committers: usize) -> Result<Self> {
        if required == 0 || required > committers {
            return Err(TapeError::InvalidThreshold { threshold: required, committers });
        }
        Ok(Self { required, committers })
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn committers(&self) -> usize {
        self.committers
    }
}
