//! Canned environment for testing.
//!
//! `MockEnv` answers every external data query with `"BEEB"` and status `0`
//! unless an answer was overridden, reports `0` for every count and time,
//! records external data requests, and keeps the last return data it was
//! given. It does not check phases; the VM rejects external data requests
//! during execute on its own.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use oracle_primitives::{DataSourceId, ExternalId, RawRequest, ValidatorIndex};

use crate::error::HostError;
use crate::traits::Env;

/// Data returned for any external data query without an override.
pub const MOCK_EXTERNAL_DATA: &[u8] = b"BEEB";

#[derive(Debug, Default)]
struct MockLedger {
    requests: Vec<RawRequest>,
    return_data: Option<Vec<u8>>,
}

/// In-memory `Env` with fixed answers.
#[derive(Debug)]
pub struct MockEnv {
    span_size: i64,
    calldata: Vec<u8>,
    /// Overridden answers keyed by `(eid, vid)`: `(status, data)`.
    answers: BTreeMap<(ExternalId, ValidatorIndex), (i64, Vec<u8>)>,
    ledger: Mutex<MockLedger>,
}

impl MockEnv {
    /// Create a mock with the given span size and empty calldata.
    pub fn new(span_size: i64) -> Self {
        Self {
            span_size,
            calldata: Vec::new(),
            answers: BTreeMap::new(),
            ledger: Mutex::new(MockLedger::default()),
        }
    }

    pub fn with_calldata(mut self, calldata: &[u8]) -> Self {
        self.calldata = calldata.to_vec();
        self
    }

    /// Override the answer of validator `vid` to request `eid`.
    pub fn with_answer(mut self, eid: ExternalId, vid: ValidatorIndex, status: i64, data: &[u8]) -> Self {
        self.answers.insert((eid, vid), (status, data.to_vec()));
        self
    }

    /// External data requests recorded so far.
    pub fn requests(&self) -> Vec<RawRequest> {
        self.ledger.lock().requests.clone()
    }

    /// The last return data set, if any.
    pub fn return_data(&self) -> Option<Vec<u8>> {
        self.ledger.lock().return_data.clone()
    }

    fn answer(&self, eid: ExternalId, vid: ValidatorIndex) -> (i64, Vec<u8>) {
        self.answers
            .get(&(eid, vid))
            .cloned()
            .unwrap_or_else(|| (0, MOCK_EXTERNAL_DATA.to_vec()))
    }
}

impl Default for MockEnv {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl Env for MockEnv {
    fn get_span_size(&self) -> i64 {
        self.span_size
    }

    fn get_calldata(&self) -> Vec<u8> {
        self.calldata.clone()
    }

    fn set_return_data(&self, data: &[u8]) -> Result<(), HostError> {
        self.ledger.lock().return_data = Some(data.to_vec());
        Ok(())
    }

    fn get_ask_count(&self) -> i64 {
        0
    }

    fn get_min_count(&self) -> i64 {
        0
    }

    fn get_prepare_time(&self) -> i64 {
        0
    }

    fn get_execute_time(&self) -> Result<i64, HostError> {
        Ok(0)
    }

    fn get_ans_count(&self) -> Result<i64, HostError> {
        Ok(0)
    }

    fn ask_external_data(
        &self,
        eid: ExternalId,
        did: DataSourceId,
        data: &[u8],
    ) -> Result<(), HostError> {
        self.ledger.lock().requests.push(RawRequest {
            external_id: eid,
            data_source_id: did,
            calldata: data.to_vec(),
        });
        Ok(())
    }

    fn get_external_data_status(
        &self,
        eid: ExternalId,
        vid: ValidatorIndex,
    ) -> Result<i64, HostError> {
        Ok(self.answer(eid, vid).0)
    }

    fn get_external_data(
        &self,
        eid: ExternalId,
        vid: ValidatorIndex,
    ) -> Result<Vec<u8>, HostError> {
        match self.answer(eid, vid) {
            (0, data) => Ok(data),
            _ => Err(HostError::unavailable_external_data()),
        }
    }
}
