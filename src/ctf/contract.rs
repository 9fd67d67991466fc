//! CaptureTheFlag contract ABI.

use alloy::sol;

sol! {
    interface ICaptureTheFlag {
        /// Emitted on every capture with the holder before and after.
        #[derive(Debug, PartialEq, Eq)]
        event FlagCaptured(address previousHolder, address currentHolder);

        function captureTheFlag() external;

        function currentHolder() external view returns (address);
    }
}
