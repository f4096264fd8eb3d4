//! Signing Integration Tests
//!
//! End-to-end runs of the remote signing pipeline:
//! - Single and multisign output shapes
//! - Rejection before the remote signer is contacted
//! - Transaction IDs recomputed from the blob
//! - Verification against a real key

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers_core::types::U256;
use sha2::{Digest, Sha512};
use xrpl_remote_signer::crypto::der::decode_der_hex;
use xrpl_remote_signer::wallet::address::classic_address_to_x_address;
use xrpl_remote_signer::{
    hash_signed_tx, BackendError, BinaryCodec, Definitions, ErrorCode, LocalKeySigner,
    MultisignSelector, RemoteSignature, RemoteSigner, RemoteXrplWallet, SignerConfig, SignerError,
    Transaction, XrplBinaryCodec,
};

// MARK: - Helpers

const PUBLIC_KEY: &str = "0330E7FC9D56BB25D6893BA3F317AE5BCF33B3291BD63DB32654A313222F7FD020";
const ACCOUNT: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
const DESTINATION: &str = "rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe";

const STUB_R: &str = "C9D1B6E2F2D4D1A93F0F5EAC3DE1B6C3B4E5F6A7B8C9D0E1F2A3B4C5D6E7F809";
const STUB_S: &str = "1F2E3D4C5B6A79880F1E2D3C4B5A69788796A5B4C3D2E1F00F1E2D3C4B5A6978";

/// Returns fixed scalars and records every digest it was asked to sign.
#[derive(Default)]
struct StubSigner {
    calls: AtomicUsize,
    digests: Mutex<Vec<[u8; 32]>>,
}

#[async_trait]
impl RemoteSigner for StubSigner {
    async fn sign_digest(&self, digest: &[u8; 32]) -> Result<RemoteSignature, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.digests.lock().unwrap().push(*digest);
        Ok(RemoteSignature::new(STUB_R, STUB_S))
    }
}

fn minimal_payment() -> Transaction {
    Transaction::from_json(&format!(
        r#"{{"TransactionType":"Payment","Account":"{ACCOUNT}","Destination":"{DESTINATION}","Amount":"1000000"}}"#
    ))
    .unwrap()
}

fn txn_id(blob: &str) -> String {
    let mut data = b"TXN\0".to_vec();
    data.extend_from_slice(&hex::decode(blob).unwrap());
    hex::encode_upper(&Sha512::digest(&data)[..32])
}

fn stub_wallet() -> (Arc<StubSigner>, RemoteXrplWallet) {
    let signer = Arc::new(StubSigner::default());
    let wallet = RemoteXrplWallet::new(PUBLIC_KEY, signer.clone()).unwrap();
    (signer, wallet)
}

// MARK: - Single signing

#[tokio::test]
async fn test_minimal_payment_end_to_end() {
    let (signer, wallet) = stub_wallet();
    let tx = minimal_payment();

    let first = wallet.sign(&tx, false, None).await.unwrap();
    let second = wallet.sign(&tx, false, None).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(signer.calls.load(Ordering::SeqCst), 2);

    let decoded = XrplBinaryCodec::default().decode(&first.tx_blob).unwrap();
    let der = decoded.txn_signature.as_deref().unwrap();
    let raw = decode_der_hex(der).unwrap();
    assert_eq!(raw.r, U256::from_str_radix(STUB_R, 16).unwrap());
    assert_eq!(raw.s, U256::from_str_radix(STUB_S, 16).unwrap());
    assert_eq!(der, der.to_uppercase());

    assert_eq!(first.hash, txn_id(&first.tx_blob));
    assert_eq!(first.hash.len(), 64);
}

#[tokio::test]
async fn test_digest_covers_signing_payload() {
    let (signer, wallet) = stub_wallet();
    let signed = wallet.sign(&minimal_payment(), false, None).await.unwrap();

    let codec = XrplBinaryCodec::default();
    let mut decoded = codec.decode(&signed.tx_blob).unwrap();
    decoded.txn_signature = None;
    let payload = codec.encode_for_signing(&decoded, None).unwrap();

    let digests = signer.digests.lock().unwrap();
    assert_eq!(digests.len(), 1);
    assert_eq!(digests[0][..], Sha512::digest(&payload)[..32]);
}

#[tokio::test]
async fn test_hash_of_decoded_blob_matches() {
    let (_, wallet) = stub_wallet();
    let codec = XrplBinaryCodec::default();

    for selector in [MultisignSelector::Single, MultisignSelector::Multisign] {
        let signed = wallet.sign(&minimal_payment(), selector, None).await.unwrap();
        let decoded = codec.decode(&signed.tx_blob).unwrap();
        assert_eq!(hash_signed_tx(&codec, &decoded).unwrap(), signed.hash);
        assert_eq!(hash_signed_tx(&codec, &signed.tx_blob).unwrap(), signed.hash);
    }
}

// OfferCreate from the ledger codec's published README example
const OFFER_BLOB: &str = "120007220000000024000195F964400000170A53AC2065D5460561EC9DE000000000000000000000000000494C53000000000092D705968936C419CE614BF264B5EEB1CEA47FF468400000000000000A7321028472865AF4CB32AA285834B57576B7290AA8C31B459047DB27E16F418D6A71667447304502202ABE08D5E78D1E74A4C18F2714F64E87B8BD57444AFA5733109EB3C077077520022100DB335EE97386E4C0591CAC024D50E9230D8F171EEB901B5E5E4BD6D1E0AEF98C811439408A69F0895E62149CFCC006FB89FA7D1E6E5D";
const OFFER_HASH: &str = "232E91912789EA1419679A4AA920C22CFC7C6B601751D6CBE89898C26D7F4394";

#[test]
fn test_published_transaction_id() {
    let codec = XrplBinaryCodec::default();
    assert_eq!(hash_signed_tx(&codec, OFFER_BLOB).unwrap(), OFFER_HASH);

    let decoded = codec.decode(OFFER_BLOB).unwrap();
    assert_eq!(decoded.transaction_type, "OfferCreate");
    assert_eq!(hash_signed_tx(&codec, &decoded).unwrap(), OFFER_HASH);
}

#[tokio::test]
async fn test_types_beyond_payment_sign_end_to_end() {
    let (signer, wallet) = stub_wallet();
    let codec = XrplBinaryCodec::default();

    let check = Transaction::from_json(&format!(
        r#"{{"TransactionType":"CheckCreate","Account":"{ACCOUNT}","Destination":"{DESTINATION}",
            "SendMax":"100000000","InvoiceID":"{}","Fee":"12","Sequence":4}}"#,
        "6F1DFD1D0FE8A32E40E1F2C05CF1C15545BAB56B617F9C6C2D63A6B704BEF59B"
    ))
    .unwrap();
    let mint = Transaction::from_json(&format!(
        r#"{{"TransactionType":"NFTokenMint","Account":"{ACCOUNT}","NFTokenTaxon":0,
            "URI":"697066733A2F2F6D696E74","Fee":"12","Sequence":5}}"#
    ))
    .unwrap();

    for tx in [check, mint] {
        let signed = wallet.sign(&tx, false, None).await.unwrap();
        let mut decoded = codec.decode(&signed.tx_blob).unwrap();
        assert!(decoded.txn_signature.is_some());
        decoded.txn_signature = None;
        decoded.signing_pub_key = None;
        assert_eq!(decoded, tx);
    }
    assert_eq!(signer.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_hashing_unsigned_fails() {
    let codec = XrplBinaryCodec::default();
    let err = hash_signed_tx(&codec, &minimal_payment()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert!(err.to_string().contains("must be signed"));
}

// MARK: - Multisigning

#[tokio::test]
async fn test_multisign_modes_are_exclusive() {
    let (_, wallet) = stub_wallet();
    let codec = XrplBinaryCodec::default();

    let single = codec
        .decode(&wallet.sign(&minimal_payment(), false, None).await.unwrap().tx_blob)
        .unwrap();
    assert!(single.signers.is_none());
    assert_eq!(single.signing_pub_key.as_deref(), Some(PUBLIC_KEY));

    let multi = codec
        .decode(&wallet.sign(&minimal_payment(), true, None).await.unwrap().tx_blob)
        .unwrap();
    assert_eq!(multi.signing_pub_key.as_deref(), Some(""));
    assert!(multi.txn_signature.is_none());
    let signers = multi.signers.unwrap();
    assert_eq!(signers.len(), 1);
    assert_eq!(signers[0].signer.account, ACCOUNT);
}

#[tokio::test]
async fn test_multisign_x_address_binds_classic_account() {
    let (signer, wallet) = stub_wallet();
    let x_address = classic_address_to_x_address(DESTINATION, None, false).unwrap();

    let via_x = wallet.sign(&minimal_payment(), x_address.as_str(), None).await.unwrap();
    let via_classic = wallet.sign(&minimal_payment(), DESTINATION, None).await.unwrap();
    assert_eq!(via_x, via_classic);

    let digests = signer.digests.lock().unwrap();
    assert_eq!(digests[0], digests[1]);
}

// MARK: - Rejection

#[tokio::test]
async fn test_already_signed_is_rejected_without_remote_call() {
    let (signer, wallet) = stub_wallet();

    let signed = minimal_payment().with_field("TxnSignature", "30060201010201").unwrap();
    let multisigned = minimal_payment()
        .with_field(
            "Signers",
            serde_json::json!([{"Signer": {
                "Account": DESTINATION,
                "SigningPubKey": PUBLIC_KEY,
                "TxnSignature": "3006020101020101"
            }}]),
        )
        .unwrap();

    for tx in [signed, multisigned] {
        let err = wallet.sign(&tx, false, None).await.unwrap_err();
        assert!(matches!(err, SignerError::Validation(_)));
        assert!(err.to_string().contains("TxnSignature"));
    }
    assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_codec_failure_aborts_before_remote_call() {
    let (signer, wallet) = stub_wallet();
    let no_payments = Definitions::from_json(
        r#"{
            "FIELDS": [["TransactionType", {"nth": 2, "isVLEncoded": false, "isSerialized": true,
                                            "isSigningField": true, "type": "UInt16"}]],
            "TRANSACTION_TYPES": {"AccountSet": 3}
        }"#,
    )
    .unwrap();

    let err = wallet.sign(&minimal_payment(), false, Some(&no_payments)).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::EncodingError);
    assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_out_of_range_signature_is_encoding_error() {
    struct ZeroSigner;

    #[async_trait]
    impl RemoteSigner for ZeroSigner {
        async fn sign_digest(&self, _digest: &[u8; 32]) -> Result<RemoteSignature, BackendError> {
            Ok(RemoteSignature::new("0", "1"))
        }
    }

    let wallet = RemoteXrplWallet::new(PUBLIC_KEY, Arc::new(ZeroSigner)).unwrap();
    let err = wallet.sign(&minimal_payment(), false, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::EncodingError);
}

// MARK: - Verification

#[tokio::test]
async fn test_local_key_signatures_verify() {
    let signer = Arc::new(LocalKeySigner::random());
    let config = SignerConfig::from_json_str(r#"{"der_strategy": "manual", "scalar_format": "hex"}"#).unwrap();
    let wallet = RemoteXrplWallet::from_config(&signer.public_key_hex(), signer.clone(), &config).unwrap();

    for selector in [MultisignSelector::Single, MultisignSelector::Multisign] {
        let signed = wallet.sign(&minimal_payment(), selector, None).await.unwrap();
        assert!(wallet.verify_transaction(&signed.tx_blob).unwrap());
    }

    let stranger = RemoteXrplWallet::new(PUBLIC_KEY, signer).unwrap();
    let signed = wallet.sign(&minimal_payment(), false, None).await.unwrap();
    assert!(!stranger.verify_transaction(&signed.tx_blob).unwrap());
}

#[tokio::test]
async fn test_concurrent_signing_shares_wallet() {
    let signer = Arc::new(LocalKeySigner::random());
    let wallet = Arc::new(RemoteXrplWallet::new(&signer.public_key_hex(), signer).unwrap());

    let mut handles = Vec::new();
    for sequence in 1..=4u32 {
        let wallet = wallet.clone();
        handles.push(tokio::spawn(async move {
            let tx = minimal_payment().with_field("Sequence", sequence).unwrap();
            wallet.sign(&tx, false, None).await.unwrap()
        }));
    }

    let mut hashes = Vec::new();
    for handle in handles {
        let signed = handle.await.unwrap();
        assert!(wallet.verify_transaction(&signed.tx_blob).unwrap());
        hashes.push(signed.hash);
    }
    hashes.sort();
    hashes.dedup();
    assert_eq!(hashes.len(), 4);
}
