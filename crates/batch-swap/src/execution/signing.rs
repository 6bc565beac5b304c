//! Signing client: one typed-data signature request per attempt.
//!
//! The wallet may suspend indefinitely waiting for the user. Rejection maps
//! to `SwapError::UserRejected` and is never retried.

use alloy::primitives::{Address, Signature};
use tracing::{debug, info};

use crate::errors::SwapError;
use crate::execution::classifier::classify;
use crate::execution::payload::Eip712Payload;
use crate::execution::wallet::WalletSession;

/// Request a signature over `payload` and check it recovers to `signer`.
///
/// A signature from a different account would be rejected on-chain as
/// `InvalidSignature`; catching it here avoids spending gas on it.
pub async fn sign_payload<W>(
    wallet: &W,
    payload: &Eip712Payload,
    signer: Address,
) -> Result<Signature, SwapError>
where
    W: WalletSession + ?Sized,
{
    let digest = payload.signing_hash();
    debug!(%signer, %digest, tokens = payload.message.tokens.len(), "requesting typed-data signature");

    let signature = match wallet.sign_typed_data(payload).await {
        Ok(sig) => sig,
        Err(failure) => {
            let err = classify(&failure);
            if err == SwapError::UserRejected {
                info!(%signer, "signature request declined");
            }
            return Err(err);
        }
    };

    let recovered = signature
        .recover_address_from_prehash(&digest)
        .map_err(|e| SwapError::ProviderError {
            message: format!("wallet returned an unrecoverable signature: {e}"),
        })?;

    if recovered != signer {
        return Err(SwapError::ProviderError {
            message: format!("wallet signed with {recovered}, expected {signer}"),
        });
    }

    Ok(signature)
}
