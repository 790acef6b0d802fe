use async_trait::async_trait;
use ethers::prelude::*;
use ethers::types::transaction::eip712::TypedData;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("signing failed: {0}")]
pub struct SigningError(pub String);

/// Produces EIP-712 signatures for relay orders.
#[async_trait]
pub trait OrderSigner: Send + Sync {
    fn address(&self) -> Address;

    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Signature, SigningError>;
}

#[derive(Debug, Clone)]
pub struct WalletSigner {
    wallet: LocalWallet,
}

impl WalletSigner {
    pub fn new(private_key: &str, chain_id: u64) -> anyhow::Result<Self> {
        let key = private_key.trim();
        let wallet: LocalWallet = key.strip_prefix("0x").unwrap_or(key).parse()?;
        Ok(Self {
            wallet: wallet.with_chain_id(chain_id),
        })
    }

    pub fn wallet(&self) -> LocalWallet {
        self.wallet.clone()
    }
}

#[async_trait]
impl OrderSigner for WalletSigner {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Signature, SigningError> {
        self.wallet
            .sign_typed_data(payload)
            .await
            .map_err(|e| SigningError(e.to_string()))
    }
}

/// 65-byte `r || s || v` hex, the form the relay expects.
pub fn signature_hex(signature: &Signature) -> String {
    format!("0x{}", hex::encode(signature.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::transaction::eip712::Eip712;

    // Well-known development key, never funded.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[tokio::test]
    async fn signs_typed_data_recoverably() {
        let signer = WalletSigner::new(DEV_KEY, 56).unwrap();
        assert_eq!(
            signer.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().unwrap()
        );

        let payload: TypedData = serde_json::from_value(serde_json::json!({
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "chainId", "type": "uint256" }
                ],
                "Ping": [{ "name": "value", "type": "uint256" }]
            },
            "primaryType": "Ping",
            "domain": { "name": "test", "chainId": 56 },
            "message": { "value": "7" }
        }))
        .unwrap();

        let signature = signer.sign_typed_data(&payload).await.unwrap();
        let digest = payload.encode_eip712().unwrap();
        assert_eq!(signature.recover(H256::from(digest)).unwrap(), signer.address());

        let hex = signature_hex(&signature);
        assert_eq!(hex.len(), 2 + 130);
    }
}
