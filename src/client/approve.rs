use super::types::{AllowanceResponse, ApproveTransaction};
use super::{ApiHttp, RateLimiter, RelayError};
use crate::chain::TxRequest;
use crate::execution::errors::SwapError;
use crate::wallet::AllowanceSource;
use async_trait::async_trait;
use ethers::types::{Address, U256};
use std::sync::Arc;

pub const DEFAULT_APPROVE_URL: &str = "https://api.1inch.dev/swap/v6.0";

/// Vendor-hosted allowance lookups and approval calldata.
#[derive(Clone)]
pub struct ApproveApiClient {
    http: ApiHttp,
    chain_id: u64,
    spender: Address,
}

impl ApproveApiClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        chain_id: u64,
        spender: Address,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, RelayError> {
        Ok(Self {
            http: ApiHttp::new(base_url, api_key, limiter)?,
            chain_id,
            spender,
        })
    }

    pub async fn get_allowance(&self, token: Address, owner: Address) -> Result<U256, RelayError> {
        let path = format!("/{}/approve/allowance", self.chain_id);
        let request = self.http.get(&path).query(&[
            ("tokenAddress", format!("{:?}", token)),
            ("walletAddress", format!("{:?}", owner)),
        ]);
        let response: AllowanceResponse = self.http.send_json(request).await?;
        Ok(response.allowance)
    }

    pub async fn get_approval_transaction_data(
        &self,
        token: Address,
        amount: U256,
    ) -> Result<TxRequest, RelayError> {
        let path = format!("/{}/approve/transaction", self.chain_id);
        let request = self.http.get(&path).query(&[
            ("tokenAddress", format!("{:?}", token)),
            ("amount", amount.to_string()),
        ]);
        let response: ApproveTransaction = self.http.send_json(request).await?;

        Ok(TxRequest {
            to: response.to,
            data: response.data,
            value: response.value.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl AllowanceSource for ApproveApiClient {
    fn spender(&self) -> Address {
        self.spender
    }

    async fn allowance(&self, token: Address, owner: Address) -> Result<U256, SwapError> {
        self.get_allowance(token, owner)
            .await
            .map_err(SwapError::AllowanceApi)
    }

    async fn approval_transaction(
        &self,
        token: Address,
        amount: U256,
    ) -> Result<TxRequest, SwapError> {
        self.get_approval_transaction_data(token, amount)
            .await
            .map_err(SwapError::AllowanceApi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USDT: &str = "0x55d398326f99059ff775485246999027b3197955";

    fn client(server: &MockServer) -> ApproveApiClient {
        ApproveApiClient::new(
            &server.uri(),
            "key",
            56,
            "0x111111125421cA6dc452d289314280a0f8842A65".parse().unwrap(),
            Arc::new(RateLimiter::unlimited()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn reads_allowance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/56/approve/allowance"))
            .and(query_param("tokenAddress", USDT))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "allowance": "12345" })),
            )
            .mount(&server)
            .await;

        let allowance = client(&server)
            .allowance(USDT.parse().unwrap(), Address::repeat_byte(0xaa))
            .await
            .unwrap();
        assert_eq!(allowance, U256::from(12345));
    }

    #[tokio::test]
    async fn builds_approval_transaction() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/56/approve/transaction"))
            .and(query_param("amount", "777"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": "0x095ea7b3",
                "gasPrice": "1000000000",
                "to": USDT,
                "value": "0"
            })))
            .mount(&server)
            .await;

        let tx = client(&server)
            .approval_transaction(USDT.parse().unwrap(), U256::from(777))
            .await
            .unwrap();
        assert_eq!(tx.to, USDT.parse::<Address>().unwrap());
        assert_eq!(&tx.data[..], &[0x09, 0x5e, 0xa7, 0xb3]);
        assert!(tx.value.is_zero());
    }
}
