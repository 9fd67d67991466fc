//! Relay contract ABI and EIP-712 request types, via alloy's `sol!` macro.

use alloy::primitives::Address;
use alloy::sol;
use alloy::sol_types::{eip712_domain, Eip712Domain};

/// EIP-712 domain name of relayed transactions.
pub const DOMAIN_SEPARATOR_NAME: &str = "GSN Relayed Transaction";

sol! {
    interface IPaymaster {
        function getRelayHub() external view returns (address);
        function getTrustedForwarder() external view returns (address);
        function versionPaymaster() external view returns (string memory);
    }

    interface IRelayHub {
        function balanceOf(address target) external view returns (uint256);
    }

    interface IForwarder {
        function getNonce(address from) external view returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    struct RelayData {
        uint256 maxFeePerGas;
        uint256 maxPriorityFeePerGas;
        uint256 transactionCalldataGasUsed;
        address relayWorker;
        address paymaster;
        address forwarder;
        bytes paymasterData;
        uint256 clientId;
    }

    /// Signed form of a relayed call. The forward request fields are
    /// flattened into the struct the forwarder registers.
    #[derive(Debug, PartialEq, Eq)]
    struct RelayRequest {
        address from;
        address to;
        uint256 value;
        uint256 gas;
        uint256 nonce;
        bytes data;
        uint256 validUntilTime;
        RelayData relayData;
    }
}

/// Signing domain of relay requests verified by `forwarder`.
pub fn relay_domain(chain_id: u64, forwarder: Address) -> Eip712Domain {
    eip712_domain! {
        name: DOMAIN_SEPARATOR_NAME,
        version: "3",
        chain_id: chain_id,
        verifying_contract: forwarder,
    }
}
