//! The submit-and-report workflow.
//!
//! One run walks
//!
//! ```text
//! Start → Connected → Bound → Submitted → Decoded → Reported → Closed(success)
//! ```
//!
//! and any step may instead end in `Closed(failure)`. The session is acquired
//! through [`SessionManager::with_session`], so it is closed on every path.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ledger_core::{
    ConnectionOptions, ContractInterface, Entity, Error, ErrorKind, NetworkDescriptor,
    TransactionRequest,
};

use crate::session::{Session, SessionManager};
use crate::submit::Submitter;

/// Where to send a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub channel: String,
    pub contract: String,
    pub request: TransactionRequest,
}

impl Invocation {
    pub fn new(
        channel: impl Into<String>,
        contract: impl Into<String>,
        request: TransactionRequest,
    ) -> Self {
        Self {
            channel: channel.into(),
            contract: contract.into(),
            request,
        }
    }
}

/// A workflow step that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Connect,
    BindChannel,
    BindContract,
    Submit,
    Decode,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Connect => "connect",
            Step::BindChannel => "bind channel",
            Step::BindContract => "bind contract",
            Step::Submit => "submit",
            Step::Decode => "decode",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conclusion {
    Success,
    Failure,
}

/// Progress markers recorded in a run trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Connected,
    Bound,
    Submitted,
    Decoded,
    Reported,
    Closed(Conclusion),
}

/// A run that stopped at `step`.
#[derive(Debug, thiserror::Error)]
#[error("{step} failed [{}]", .error.kind())]
pub struct Failure {
    pub step: Step,
    #[source]
    pub error: Error,
    /// Stages reached, ending with `Closed(Failure)`.
    pub trace: Vec<Stage>,
}

impl Failure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// A completed run.
#[derive(Debug)]
pub struct Outcome<E> {
    pub entity: E,
    /// Stages reached, ending with `Closed(Success)`.
    pub trace: Vec<Stage>,
    pub elapsed: Duration,
}

#[derive(Debug)]
struct Plan {
    descriptor: NetworkDescriptor,
    options: ConnectionOptions,
    submitter: Submitter,
    invocation: Invocation,
}

impl Plan {
    async fn drive<E: Entity>(
        &self,
        session: &mut Session,
        trace: &mut Vec<Stage>,
    ) -> Result<E, (Step, Error)> {
        session
            .connect(&self.descriptor, &self.options)
            .await
            .map_err(|e| (Step::Connect, e))?;
        trace.push(Stage::Connected);

        let channel = session
            .channel(&self.invocation.channel)
            .await
            .map_err(|e| (Step::BindChannel, e))?;
        let contract = channel
            .contract(&self.invocation.contract)
            .await
            .map_err(|e| (Step::BindContract, e))?;
        trace.push(Stage::Bound);

        let payload = self
            .submitter
            .submit(&contract, &self.invocation.request)
            .await
            .map_err(|e| (Step::Submit, e))?;
        trace.push(Stage::Submitted);

        let entity = E::decode(&payload).map_err(|e| (Step::Decode, e))?;
        trace.push(Stage::Decoded);

        tracing::info!(
            transaction = %self.invocation.request,
            "transaction has been submitted: {}",
            entity
        );
        trace.push(Stage::Reported);
        Ok(entity)
    }
}

/// Connects, submits one transaction, decodes and reports the result.
#[derive(Debug)]
pub struct Workflow {
    manager: SessionManager,
    plan: Plan,
}

impl Workflow {
    /// Submits under the deadline configured in `options`.
    pub fn new(
        manager: SessionManager,
        descriptor: NetworkDescriptor,
        options: ConnectionOptions,
        invocation: Invocation,
    ) -> Self {
        let submitter = Submitter::new(options.submit_timeout());
        Self {
            manager,
            plan: Plan {
                descriptor,
                options,
                submitter,
                invocation,
            },
        }
    }

    /// Checks the request against `interface` before submitting it.
    pub fn with_interface(mut self, interface: ContractInterface) -> Self {
        self.plan.submitter = self.plan.submitter.with_interface(interface);
        self
    }

    /// Runs the workflow once.
    pub async fn run<E: Entity + 'static>(self) -> Result<Outcome<E>, Failure> {
        let started = Instant::now();
        let plan = Arc::new(self.plan);
        tracing::debug!(
            channel = %plan.invocation.channel,
            contract = %plan.invocation.contract,
            transaction = plan.invocation.request.name(),
            "starting workflow"
        );

        let result = self
            .manager
            .with_session(move |session| {
                Box::pin(async move {
                    let mut trace = vec![Stage::Start];
                    match plan.drive::<E>(session, &mut trace).await {
                        Ok(entity) => Ok((entity, trace)),
                        Err((step, error)) => Err(Failure { step, error, trace }),
                    }
                })
            })
            .await;

        match result {
            Ok((entity, mut trace)) => {
                trace.push(Stage::Closed(Conclusion::Success));
                Ok(Outcome {
                    entity,
                    trace,
                    elapsed: started.elapsed(),
                })
            }
            Err(mut failure) => {
                failure.trace.push(Stage::Closed(Conclusion::Failure));
                tracing::error!(
                    step = %failure.step,
                    kind = %failure.kind(),
                    error = %failure.error,
                    "workflow failed"
                );
                Err(failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display_names_step_and_kind() {
        let failure = Failure {
            step: Step::BindChannel,
            error: Error::channel_not_found("nochannel"),
            trace: vec![Stage::Start, Stage::Connected],
        };
        assert_eq!(failure.to_string(), "bind channel failed [NotFoundError]");
        assert_eq!(failure.kind(), ErrorKind::NotFound);
        let source = std::error::Error::source(&failure).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("channel `nochannel` not found"));
    }
}
