//! Production environment: the request ledger of one oracle request.
//!
//! An oracle request runs its script twice. [`OracleEnv::prepare`] builds
//! the environment for the prepare run, which records the external data the
//! script asks for. [`OracleEnv::execute`] builds the execute-run
//! environment from the prepared one, carrying the recorded requests forward
//! and attaching the validators' reports. The execute run reads those
//! reports and sets the return data.

use parking_lot::Mutex;
use tracing::debug;

use oracle_primitives::{
    DataSourceId, ExecutionPhase, ExternalId, RawReport, RawRequest, ValidatorIndex,
};

use crate::error::HostError;
use crate::traits::Env;
use crate::types::{EnvConfig, OracleRequest};

const LOG_TARGET: &str = "oracle::env";

/// Status reported for a validator that sent no report at all.
pub const STATUS_NOT_REPORTED: i64 = -1;

#[derive(Debug, Default)]
struct Ledger {
    requests: Vec<RawRequest>,
    return_data: Option<Vec<u8>>,
}

/// The environment of one phase of one oracle request.
#[derive(Debug)]
pub struct OracleEnv {
    request: OracleRequest,
    config: EnvConfig,
    phase: ExecutionPhase,
    execute_time: i64,
    /// One entry per validator; `None` when the validator did not report.
    reports: Vec<Option<Vec<RawReport>>>,
    ledger: Mutex<Ledger>,
}

impl OracleEnv {
    /// Environment for the prepare run of `request`.
    pub fn prepare(request: OracleRequest, config: EnvConfig) -> Self {
        Self {
            request,
            config,
            phase: ExecutionPhase::Prepare,
            execute_time: 0,
            reports: Vec::new(),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    /// Environment for the execute run following `prepared`.
    ///
    /// `reports[i]` holds validator `i`'s answers, or `None` if that
    /// validator did not report.
    pub fn execute(
        prepared: &OracleEnv,
        execute_time: i64,
        reports: Vec<Option<Vec<RawReport>>>,
    ) -> Self {
        let ledger = Ledger {
            requests: prepared.raw_requests(),
            return_data: None,
        };
        Self {
            request: prepared.request.clone(),
            config: prepared.config.clone(),
            phase: ExecutionPhase::Execute,
            execute_time,
            reports,
            ledger: Mutex::new(ledger),
        }
    }

    /// The phase this environment serves.
    pub fn phase(&self) -> ExecutionPhase {
        self.phase
    }

    /// External data requests recorded so far, in request order.
    pub fn raw_requests(&self) -> Vec<RawRequest> {
        self.ledger.lock().requests.clone()
    }

    /// The return data, once the execute run has set it.
    pub fn return_data(&self) -> Option<Vec<u8>> {
        self.ledger.lock().return_data.clone()
    }

    fn require_execute(&self) -> Result<(), HostError> {
        if self.phase.is_prepare() {
            return Err(HostError::wrong_period_action());
        }
        Ok(())
    }

    fn check_span(&self, len: usize) -> Result<(), HostError> {
        if len > self.config.span_size {
            return Err(HostError::span_too_small());
        }
        Ok(())
    }

    fn report(&self, eid: ExternalId, vid: ValidatorIndex) -> Result<Option<&RawReport>, HostError> {
        self.require_execute()?;
        let answers = usize::try_from(vid)
            .ok()
            .and_then(|vid| self.reports.get(vid))
            .ok_or_else(HostError::bad_validator_index)?;
        if !self.ledger.lock().requests.iter().any(|r| r.external_id == eid) {
            return Err(HostError::bad_external_id());
        }
        let Some(answers) = answers else {
            return Ok(None);
        };
        answers
            .iter()
            .find(|r| r.external_id == eid)
            .map(Some)
            .ok_or_else(HostError::bad_external_id)
    }
}

impl Env for OracleEnv {
    fn get_span_size(&self) -> i64 {
        i64::try_from(self.config.span_size).unwrap_or(i64::MAX)
    }

    fn get_calldata(&self) -> Vec<u8> {
        self.request.calldata.clone()
    }

    fn set_return_data(&self, data: &[u8]) -> Result<(), HostError> {
        self.require_execute()?;
        self.check_span(data.len())?;
        let mut ledger = self.ledger.lock();
        if ledger.return_data.is_some() {
            return Err(HostError::repeat_set_return_data());
        }
        debug!(target: LOG_TARGET, len = data.len(), "return data set");
        ledger.return_data = Some(data.to_vec());
        Ok(())
    }

    fn get_ask_count(&self) -> i64 {
        self.request.ask_count
    }

    fn get_min_count(&self) -> i64 {
        self.request.min_count
    }

    fn get_prepare_time(&self) -> i64 {
        self.request.prepare_time
    }

    fn get_execute_time(&self) -> Result<i64, HostError> {
        self.require_execute()?;
        Ok(self.execute_time)
    }

    fn get_ans_count(&self) -> Result<i64, HostError> {
        self.require_execute()?;
        let answered = self.reports.iter().filter(|r| r.is_some()).count();
        Ok(i64::try_from(answered).unwrap_or(i64::MAX))
    }

    fn ask_external_data(
        &self,
        eid: ExternalId,
        did: DataSourceId,
        data: &[u8],
    ) -> Result<(), HostError> {
        if !self.phase.is_prepare() {
            return Err(HostError::wrong_period_action());
        }
        self.check_span(data.len())?;
        let mut ledger = self.ledger.lock();
        if ledger.requests.len() >= self.config.max_raw_requests {
            return Err(HostError::too_many_external_data());
        }
        if ledger.requests.iter().any(|r| r.external_id == eid) {
            return Err(HostError::duplicate_external_id());
        }
        debug!(target: LOG_TARGET, eid, did, len = data.len(), "external data requested");
        ledger.requests.push(RawRequest {
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
        Ok(self
            .report(eid, vid)?
            .map_or(STATUS_NOT_REPORTED, |r| i64::from(r.exit_code)))
    }

    fn get_external_data(
        &self,
        eid: ExternalId,
        vid: ValidatorIndex,
    ) -> Result<Vec<u8>, HostError> {
        match self.report(eid, vid)? {
            Some(report) if report.is_available() => Ok(report.data.clone()),
            _ => Err(HostError::unavailable_external_data()),
        }
    }
}
