//! Fee estimation for deployment transactions.

use alloy_core::primitives::U256;

use crate::{ChainClient, DeployError};

/// Gas limit attached to every contract-creation transaction.
pub const DEPLOY_GAS_LIMIT: u64 = 4_200_000;

/// Multiplier applied to the observed gas price, as a `numerator / denominator` pair.
pub const FEE_MULTIPLIER_NUMERATOR: u64 = 12;
pub const FEE_MULTIPLIER_DENOMINATOR: u64 = 10;

/// Tip used when the node does not suggest one (1 gwei).
pub const DEFAULT_PRIORITY_FEE_PER_GAS: u128 = 1_000_000_000;

/// Fee data reported by the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeData {
    /// Current gas price (base fee per gas) in wei.
    pub gas_price: u128,
    /// Node-suggested priority fee, when the node exposes one.
    pub max_priority_fee_per_gas: Option<u128>,
}

/// Fee settings shared by every deployment of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeParameters {
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

impl FeeParameters {
    /// Derive deployment fee parameters from observed fee data.
    ///
    /// `max_fee_per_gas` is `floor(gas_price * 12 / 10)`, computed over 256 bits so
    /// large prices never lose precision; it saturates at `u128::MAX`.
    pub fn from_fee_data(fee_data: &FeeData) -> Self {
        let max_fee_per_gas = bounded_max_fee(fee_data.gas_price);
        let max_priority_fee_per_gas = fee_data
            .max_priority_fee_per_gas
            .unwrap_or(DEFAULT_PRIORITY_FEE_PER_GAS)
            .min(max_fee_per_gas);

        Self {
            gas_limit: DEPLOY_GAS_LIMIT,
            max_fee_per_gas,
            max_priority_fee_per_gas,
        }
    }

    /// Worst-case cost of one deployment under these parameters, in wei.
    pub fn max_cost(&self) -> U256 {
        U256::from(self.gas_limit) * U256::from(self.max_fee_per_gas)
    }
}

fn bounded_max_fee(gas_price: u128) -> u128 {
    let scaled = U256::from(gas_price) * U256::from(FEE_MULTIPLIER_NUMERATOR)
        / U256::from(FEE_MULTIPLIER_DENOMINATOR);
    scaled.saturating_to()
}

/// Query the network once and derive the fee parameters for this run.
pub async fn estimate_fee<C: ChainClient>(client: &C) -> Result<FeeParameters, DeployError> {
    let fee_data = client
        .fee_data()
        .await
        .map_err(|source| DeployError::Network {
            action: "fetching fee data".to_string(),
            source,
        })?;

    let fee = FeeParameters::from_fee_data(&fee_data);

    tracing::info!(
        gas_price = fee_data.gas_price,
        max_fee_per_gas = fee.max_fee_per_gas,
        max_priority_fee_per_gas = fee.max_priority_fee_per_gas,
        gas_limit = fee.gas_limit,
        "Fetched network fee data"
    );

    Ok(fee)
}
