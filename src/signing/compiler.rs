//! Transaction Compiler
//!
//! Attaches a signature returned for a [`SigningPreimage`] and compiles the
//! result into a broadcast-ready blob and its transaction ID.

use crate::codec::{BinaryCodec, Definitions};
use crate::crypto::der::{DerEncoder, RawSignature};
use crate::crypto::hashes::{ensure_signed, transaction_id, HashingEngine};
use crate::error::SignerResult;
use crate::signing::preimage::{SigningMode, SigningPreimage};
use crate::types::{SignedTransaction, Signer, SignerWrapper, Transaction};

/// Place a DER signature on the transaction.
///
/// Single signing sets `TxnSignature`. Multisigning replaces `Signers` with
/// one entry for the bound account.
pub fn attach_signature(
    tx: &mut Transaction,
    mode: &SigningMode,
    public_key: &str,
    signature_hex: &str,
) {
    match mode {
        SigningMode::Single => {
            tx.txn_signature = Some(signature_hex.to_string());
        }
        SigningMode::Multisign { account } => {
            tx.signers = Some(vec![SignerWrapper {
                signer: Signer {
                    account: account.clone(),
                    signing_pub_key: public_key.to_string(),
                    txn_signature: signature_hex.to_string(),
                },
            }]);
        }
    }
}

/// Encode a signed transaction and compute its ID.
pub fn compile(
    codec: &dyn BinaryCodec,
    hasher: &dyn HashingEngine,
    tx: &Transaction,
    definitions: Option<&Definitions>,
) -> SignerResult<SignedTransaction> {
    ensure_signed(tx)?;
    let tx_blob = codec.encode_with(tx, definitions)?;
    let hash = transaction_id(hasher, &tx_blob)?;
    Ok(SignedTransaction { tx_blob, hash })
}

/// Everything needed to turn a raw `(r, s)` into a signed transaction.
pub struct SignatureAssembly<'a> {
    pub codec: &'a dyn BinaryCodec,
    pub hasher: &'a dyn HashingEngine,
    pub der: &'a dyn DerEncoder,
    pub definitions: Option<&'a Definitions>,
}

impl SignatureAssembly<'_> {
    /// DER-encode, attach and compile. `tx` is the transaction the preimage was built from.
    pub fn assemble(
        &self,
        mut tx: Transaction,
        preimage: &SigningPreimage,
        public_key: &str,
        signature: &RawSignature,
    ) -> SignerResult<SignedTransaction> {
        let der_hex = self.der.encode_hex(signature)?;
        attach_signature(&mut tx, &preimage.mode, public_key, &der_hex);
        compile(self.codec, self.hasher, &tx, self.definitions)
    }
}
