//! Transaction submission.
//!
//! Submission is at-most-once: the submitter never retries. Whether a failed
//! transaction can be sent again depends on the contract (creating the same
//! asset twice is a conflict, not a transient fault), so that decision is left
//! to the caller, guided by [`ledger_core::ErrorKind::is_transient`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use ledger_core::{ContractInterface, Error, Result, TransactionRequest};

use crate::session::Contract;

/// Submits transactions under a deadline.
#[derive(Debug, Clone)]
pub struct Submitter {
    timeout: Duration,
    interface: Option<Arc<ContractInterface>>,
}

impl Submitter {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interface: None,
        }
    }

    /// Checks requests against `interface` before they leave the client.
    pub fn with_interface(mut self, interface: ContractInterface) -> Self {
        self.interface = Some(Arc::new(interface));
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `request` against `contract` and returns the committed payload.
    pub async fn submit(
        &self,
        contract: &Contract<'_>,
        request: &TransactionRequest,
    ) -> Result<Vec<u8>> {
        if let Some(interface) = &self.interface {
            interface.check(request)?;
        }

        tracing::info!(
            channel = contract.channel(),
            contract = contract.name(),
            transaction = request.name(),
            args = request.args().len(),
            "submitting transaction"
        );
        let started = Instant::now();

        match tokio::time::timeout(self.timeout, contract.link().submit(request)).await {
            Ok(Ok(payload)) => {
                tracing::debug!(
                    transaction = request.name(),
                    bytes = payload.len(),
                    elapsed = ?started.elapsed(),
                    "transaction committed"
                );
                Ok(payload)
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    transaction = request.name(),
                    kind = %e.kind(),
                    error = %e,
                    "transaction failed"
                );
                Err(e)
            }
            Err(_) => {
                tracing::warn!(
                    transaction = request.name(),
                    timeout = ?self.timeout,
                    "transaction timed out"
                );
                Err(Error::Timeout {
                    operation: format!("submit {}", request.name()),
                    after: self.timeout,
                })
            }
        }
    }
}
