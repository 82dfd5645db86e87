//! Ordered deployment of the contract pair.
//!
//! The run is a linear state machine:
//!
//! ```text
//! Start -> FeeEstimated -> Submitted{0} -> Confirmed{0} -> Submitted{1} -> Confirmed{1} -> Done
//! ```
//!
//! Any step may abort the run. Nothing is rolled back: a contract confirmed before the
//! failure stays deployed.

use std::time::Duration;

use crate::{
    AccountSigner, ArtifactSource, ChainClient, ContractDeployer, DeployContext, DeployError,
    DeployedContract, DeploymentSpec, fee::estimate_fee,
};

/// Progress of a sequencer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Start,
    FeeEstimated,
    /// The creation transaction of the `index`-th contract was accepted by the node.
    Submitted { index: usize },
    /// The `index`-th contract is mined and has an address.
    Confirmed { index: usize },
    Done,
    Aborted,
}

/// Deploys `Starknet` then `Proxy`, one at a time.
pub struct DeploymentSequencer<'a, C, S, A> {
    ctx: DeployContext<'a, C, S, A>,
    confirmation_timeout: Option<Duration>,
    specs: Vec<DeploymentSpec>,
    deployments: Vec<DeployedContract>,
    state: SequencerState,
}

impl<'a, C, S, A> DeploymentSequencer<'a, C, S, A>
where
    C: ChainClient + Sync,
    S: AccountSigner + Sync,
    A: ArtifactSource,
{
    pub fn new(ctx: DeployContext<'a, C, S, A>, confirmation_timeout: Option<Duration>) -> Self {
        Self {
            ctx,
            confirmation_timeout,
            specs: vec![DeploymentSpec::starknet(), DeploymentSpec::proxy()],
            deployments: Vec::new(),
            state: SequencerState::Start,
        }
    }

    /// The contracts this sequencer deploys, in order.
    pub fn specs(&self) -> &[DeploymentSpec] {
        &self.specs
    }

    /// Records of the current (or last) run, including a failed deployment if any.
    pub fn deployments(&self) -> &[DeployedContract] {
        &self.deployments
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Deploy every contract in order and return their records.
    ///
    /// Stops at the first failure; later contracts are never attempted.
    pub async fn run(&mut self) -> Result<Vec<DeployedContract>, DeployError> {
        self.deployments.clear();
        self.state = SequencerState::Start;

        match self.advance().await {
            Ok(()) => {
                self.transition(SequencerState::Done);
                Ok(self.deployments.clone())
            }
            Err(e) => {
                self.transition(SequencerState::Aborted);
                Err(e)
            }
        }
    }

    async fn advance(&mut self) -> Result<(), DeployError> {
        let fee = estimate_fee(self.ctx.client).await?;
        self.transition(SequencerState::FeeEstimated);

        let deployer = ContractDeployer::new(self.ctx, self.confirmation_timeout);

        for (index, spec) in self.specs.clone().iter().enumerate() {
            let mut deployment = deployer.submit(spec, &fee).await?;
            self.transition(SequencerState::Submitted { index });

            // Recorded even when confirmation fails.
            let confirmed = deployer.confirm(&mut deployment).await;
            self.deployments.push(deployment);
            confirmed?;

            self.transition(SequencerState::Confirmed { index });
        }

        Ok(())
    }

    fn transition(&mut self, state: SequencerState) {
        tracing::debug!(from = ?self.state, to = ?state, "Sequencer state changed");
        self.state = state;
    }
}
