use super::{ChainClient, ChainError, TxReceipt, TxRequest};
use async_trait::async_trait;
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use log::{debug, info};
use std::sync::Arc;

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// RPC-backed chain client. Transactions are signed locally and awaited
/// for `confirmations` blocks before returning.
#[derive(Clone)]
pub struct EthersChainClient {
    client: Arc<SignerClient>,
    confirmations: usize,
}

impl EthersChainClient {
    pub async fn connect(
        rpc_url: &str,
        wallet: LocalWallet,
        expected_chain_id: u64,
        confirmations: usize,
    ) -> Result<Self, ChainError> {
        let provider =
            Provider::<Http>::try_from(rpc_url).map_err(|e| ChainError::Rpc(e.to_string()))?;

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?
            .as_u64();

        if chain_id != expected_chain_id {
            return Err(ChainError::Rpc(format!(
                "RPC serves chain {} but config expects {}",
                chain_id, expected_chain_id
            )));
        }

        info!("🔗 Connected to chain {}", chain_id);

        let wallet = wallet.with_chain_id(chain_id);
        Ok(Self {
            client: Arc::new(SignerMiddleware::new(provider, wallet)),
            confirmations: confirmations.max(1),
        })
    }
}

#[async_trait]
impl ChainClient for EthersChainClient {
    fn address(&self) -> Address {
        self.client.address()
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let tx: TypedTransaction = TransactionRequest::new()
            .from(self.address())
            .to(to)
            .data(data)
            .into();

        self.client
            .call(&tx, None)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<TxReceipt, ChainError> {
        let request = TransactionRequest::new()
            .to(tx.to)
            .data(tx.data)
            .value(tx.value);

        let pending = self
            .client
            .send_transaction(request, None)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        let tx_hash = pending.tx_hash();
        debug!("⏳ Waiting for {:?}", tx_hash);

        let receipt = pending
            .confirmations(self.confirmations)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?
            .ok_or(ChainError::Dropped(tx_hash))?;

        if receipt.status != Some(U64::from(1)) {
            return Err(ChainError::Reverted(tx_hash));
        }

        Ok(TxReceipt {
            tx_hash,
            block_number: receipt.block_number.map(|b| b.as_u64()),
            gas_used: receipt.gas_used,
        })
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError> {
        self.client
            .get_balance(owner, None)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }
}
