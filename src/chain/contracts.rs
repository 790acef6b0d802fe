use super::{ChainClient, ChainError, TxRequest};
use ethers::abi::{AbiDecode, AbiEncode};
use ethers::contract::abigen;
use ethers::types::{Address, U256};

// ==================================================
// ABI GENERATION
// ==================================================

abigen!(
    Erc20,
    r#"[
        function allowance(address owner, address spender) view returns (uint256)
        function approve(address spender, uint256 amount) returns (bool)
        function balanceOf(address owner) view returns (uint256)
    ]"#
);

abigen!(
    WrappedNative,
    r#"[
        function deposit() payable
        function withdraw(uint256 wad)
    ]"#
);

// ==================================================
// CALLDATA
// ==================================================

pub fn approve_tx(token: Address, spender: Address, amount: U256) -> TxRequest {
    TxRequest::call(token, ApproveCall { spender, amount }.encode())
}

pub fn deposit_tx(wrapped_native: Address, amount: U256) -> TxRequest {
    TxRequest::call(wrapped_native, DepositCall::default().encode()).with_value(amount)
}

pub fn withdraw_tx(wrapped_native: Address, amount: U256) -> TxRequest {
    TxRequest::call(wrapped_native, WithdrawCall { wad: amount }.encode())
}

// ==================================================
// READS
// ==================================================

pub async fn read_allowance(
    chain: &dyn ChainClient,
    token: Address,
    owner: Address,
    spender: Address,
) -> Result<U256, ChainError> {
    let data = AllowanceCall { owner, spender }.encode();
    let raw = chain.call(token, data.into()).await?;
    U256::decode(raw).map_err(|e| ChainError::Abi(e.to_string()))
}

pub async fn read_balance(
    chain: &dyn ChainClient,
    token: Address,
    owner: Address,
) -> Result<U256, ChainError> {
    let data = BalanceOfCall { owner }.encode();
    let raw = chain.call(token, data.into()).await?;
    U256::decode(raw).map_err(|e| ChainError::Abi(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_calldata_uses_erc20_selector() {
        let token: Address = "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c".parse().unwrap();
        let spender: Address = "0x111111125421cA6dc452d289314280a0f8842A65".parse().unwrap();
        let tx = approve_tx(token, spender, U256::from(42u64));

        assert_eq!(tx.to, token);
        assert!(tx.value.is_zero());
        assert_eq!(&tx.data[..4], &[0x09, 0x5e, 0xa7, 0xb3]);

        match Erc20Calls::decode(&tx.data).unwrap() {
            Erc20Calls::Approve(call) => {
                assert_eq!(call.spender, spender);
                assert_eq!(call.amount, U256::from(42u64));
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn deposit_carries_value_and_withdraw_does_not() {
        let wrapped: Address = "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c".parse().unwrap();
        let amount = U256::exp10(15) * 5;

        let deposit = deposit_tx(wrapped, amount);
        assert_eq!(deposit.value, amount);
        assert_eq!(&deposit.data[..], &[0xd0, 0xe3, 0x0d, 0xb0]);

        let withdraw = withdraw_tx(wrapped, amount);
        assert!(withdraw.value.is_zero());
        assert!(matches!(
            WrappedNativeCalls::decode(&withdraw.data).unwrap(),
            WrappedNativeCalls::Withdraw(WithdrawCall { wad }) if wad == amount
        ));
    }
}
