// web-server/src/chain.rs
//! NFT balance reads from the edition drop contract.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::wallet::parse_address;
use common::WalletConfig;
use ethers::contract::{abigen, ContractError};
use ethers::providers::{Http, Provider};
use ethers::types::U256;
use reqwest::header::{HeaderMap, HeaderValue};
use thiserror::Error;
use url::Url;

abigen!(
    EditionDropContract,
    r#"[
        function balanceOf(address account, uint256 id) external view returns (uint256)
    ]"#,
);

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("balanceOf call failed: {0}")]
    Contract(#[from] ContractError<Provider<Http>>),
    #[error("failed to build RPC client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("invalid RPC URL: {0}")]
    RpcUrl(#[from] url::ParseError),
    #[error("invalid client id header: {0}")]
    ClientId(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Reads how many copies of a token an address holds
#[async_trait]
pub trait BalanceReader: Send + Sync {
    async fn balance_of(&self, owner: &str, token_id: u64) -> Result<U256, ChainError>;
}

/// ERC-1155 edition drop contract reached through an RPC node
#[derive(Clone)]
pub struct EditionDrop {
    contract: EditionDropContract<Provider<Http>>,
}

impl EditionDrop {
    pub fn new(config: &WalletConfig, timeout: Duration) -> Result<Self, ChainError> {
        let mut headers = HeaderMap::new();
        if !config.client_id.is_empty() {
            let value = HeaderValue::from_str(&config.client_id)
                .map_err(|e| ChainError::ClientId(e.to_string()))?;
            headers.insert("x-client-id", value);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        let provider = Provider::new(Http::new_with_client(Url::parse(&config.rpc_url)?, http));

        let address = parse_address(&config.edition_drop_address)
            .map_err(|_| ChainError::InvalidAddress(config.edition_drop_address.clone()))?;

        Ok(Self {
            contract: EditionDropContract::new(address, Arc::new(provider)),
        })
    }
}

#[async_trait]
impl BalanceReader for EditionDrop {
    async fn balance_of(&self, owner: &str, token_id: u64) -> Result<U256, ChainError> {
        let owner = parse_address(owner).map_err(|_| ChainError::InvalidAddress(owner.to_string()))?;
        let balance = self
            .contract
            .balance_of(owner, U256::from(token_id))
            .call()
            .await?;
        Ok(balance)
    }
}
