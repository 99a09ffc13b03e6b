use alloy::primitives::{address, Address};
use alloy::sol;

/// Multicall3 is deployed at the same address on every supported chain.
pub const MULTICALL3_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    interface ISymmio {
        function balanceOf(address user) external view returns (uint256);
        function allocatedBalanceOfPartyA(address partyA) external view returns (uint256);
        function allocatedBalanceOfPartyB(address partyB, address partyA) external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls) external payable returns (Result[] memory returnData);
    }
}
