//! Wallet Module
//!
//! A ledger account whose key lives behind a remote signer. The wallet owns
//! the public key and derived address, and drives the signing pipeline:
//! canonicalize, build the pre-image, ask the remote signer for `(r, s)`,
//! DER-encode, attach and compile.

pub mod address;

use std::fmt;
use std::sync::Arc;

use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1};
use tracing::{debug, info};

use crate::codec::{BinaryCodec, Definitions, XrplBinaryCodec};
use crate::crypto::der::{DerEncoder, DerStrategy, ScalarFormat};
use crate::crypto::hashes::{hash_signed_tx_with, HashingEngine, Sha512HalfEngine, SignedTxInput};
use crate::error::{SignerError, SignerResult};
use crate::signing::{RemoteSigner, SignatureAssembly, SigningMode, SigningPreimage};
use crate::tx::{Canonicalizer, SchemaValidator, TransactionValidator};
use crate::types::{SignedTransaction, Transaction};
use crate::utils::config::{Network, SignerConfig};
use crate::utils::logging::{redact_address, redact_hash};

use address::{
    classic_address_to_x_address, decode_public_key, derive_classic_address, resolve_classic_address,
};

/// Chooses between a direct signature and a multisignature contribution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MultisignSelector {
    #[default]
    Single,
    /// Multisign as this wallet's own address.
    Multisign,
    /// Multisign as the given classic or X-address.
    MultisignAs(String),
}

impl From<bool> for MultisignSelector {
    fn from(multisign: bool) -> Self {
        if multisign {
            Self::Multisign
        } else {
            Self::Single
        }
    }
}

impl From<&str> for MultisignSelector {
    fn from(address: &str) -> Self {
        Self::MultisignAs(address.to_string())
    }
}

impl From<String> for MultisignSelector {
    fn from(address: String) -> Self {
        Self::MultisignAs(address)
    }
}

/// Wallet backed by a remote signer.
#[derive(Clone)]
pub struct RemoteXrplWallet {
    public_key: String,
    verifying_key: PublicKey,
    classic_address: String,
    network: Network,
    scalar_format: ScalarFormat,
    signer: Arc<dyn RemoteSigner>,
    codec: Arc<dyn BinaryCodec>,
    hasher: Arc<dyn HashingEngine>,
    der: Arc<dyn DerEncoder>,
    canonicalizer: Canonicalizer,
}

impl fmt::Debug for RemoteXrplWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteXrplWallet")
            .field("public_key", &self.public_key)
            .field("classic_address", &self.classic_address)
            .field("network", &self.network)
            .field("scalar_format", &self.scalar_format)
            .finish_non_exhaustive()
    }
}

impl RemoteXrplWallet {
    /// Build a wallet for a compressed secp256k1 public key (hex).
    pub fn new(public_key: &str, signer: Arc<dyn RemoteSigner>) -> SignerResult<Self> {
        let bytes = decode_public_key(public_key)?;
        let verifying_key = PublicKey::from_slice(&bytes).map_err(|e| {
            SignerError::validation(format!("public key is not a secp256k1 point: {}", e))
        })?;
        let public_key = hex::encode_upper(&bytes);
        let classic_address = derive_classic_address(&public_key)?;

        Ok(Self {
            public_key,
            verifying_key,
            classic_address,
            network: Network::Mainnet,
            scalar_format: ScalarFormat::Auto,
            signer,
            codec: Arc::new(XrplBinaryCodec::default()),
            hasher: Arc::new(Sha512HalfEngine),
            der: DerStrategy::default().encoder(),
            canonicalizer: Canonicalizer::default(),
        })
    }

    /// Build a wallet with strategies taken from `config`.
    ///
    /// A configured definitions file restricts the transaction types and
    /// fields both the codec and the schema validator accept.
    pub fn from_config(
        public_key: &str,
        signer: Arc<dyn RemoteSigner>,
        config: &SignerConfig,
    ) -> SignerResult<Self> {
        config.validate()?;
        let mut wallet = Self::new(public_key, signer)?;
        wallet.network = config.network;
        wallet.scalar_format = config.scalar_format;
        wallet.der = config.der_strategy.encoder();

        let mut canonicalizer = wallet.canonicalizer.clone().with_normalizer(config.normalizer);
        if let Some(path) = &config.definitions_path {
            let definitions = Definitions::from_file(path)?;
            canonicalizer = canonicalizer.with_validator(Arc::new(SchemaValidator::new(definitions.clone())));
            wallet.codec = Arc::new(XrplBinaryCodec::new(definitions));
        }
        wallet.canonicalizer = canonicalizer;
        Ok(wallet)
    }

    pub fn with_codec(mut self, codec: Arc<dyn BinaryCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn HashingEngine>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_der_encoder(mut self, der: Arc<dyn DerEncoder>) -> Self {
        self.der = der;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn TransactionValidator>) -> Self {
        self.canonicalizer = self.canonicalizer.with_validator(validator);
        self
    }

    pub fn with_canonicalizer(mut self, canonicalizer: Canonicalizer) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }

    pub fn with_scalar_format(mut self, format: ScalarFormat) -> Self {
        self.scalar_format = format;
        self
    }

    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// Uppercase hex public key
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn classic_address(&self) -> &str {
        &self.classic_address
    }

    /// Account address in classic form.
    pub fn address(&self) -> &str {
        &self.classic_address
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn x_address(&self, tag: Option<u32>, test: bool) -> SignerResult<String> {
        classic_address_to_x_address(&self.classic_address, tag, test)
    }

    /// X-address for the configured network.
    pub fn network_x_address(&self, tag: Option<u32>) -> SignerResult<String> {
        self.x_address(tag, self.network.is_test())
    }

    /// Sign `tx` through the remote signer.
    ///
    /// `tx` itself is left untouched. Everything up to the pre-image is checked
    /// before the remote signer is contacted, and remote failures come back as
    /// [`SignerError::SigningService`] without a retry.
    pub async fn sign(
        &self,
        tx: &Transaction,
        selector: impl Into<MultisignSelector>,
        definitions: Option<&Definitions>,
    ) -> SignerResult<SignedTransaction> {
        let mut working = self.canonicalizer.canonicalize(tx)?;
        let mode = self.signing_mode(selector.into())?;

        working.signing_pub_key = Some(if mode.is_multisign() {
            String::new()
        } else {
            self.public_key.clone()
        });

        let preimage = SigningPreimage::build(
            self.codec.as_ref(),
            self.hasher.as_ref(),
            &working,
            mode,
            definitions,
        )?;
        debug!(
            account = %redact_address(&self.classic_address),
            signer = ?preimage.mode.signer_account().map(redact_address),
            digest = %redact_hash(&preimage.digest_hex()),
            "requesting remote signature"
        );

        let response = self
            .signer
            .sign_digest(&preimage.digest)
            .await
            .map_err(SignerError::SigningService)?;
        let raw = response.to_raw(self.scalar_format)?;

        let assembly = SignatureAssembly {
            codec: self.codec.as_ref(),
            hasher: self.hasher.as_ref(),
            der: self.der.as_ref(),
            definitions,
        };
        let signed = assembly.assemble(working, &preimage, &self.public_key, &raw)?;

        info!(
            account = %redact_address(&self.classic_address),
            multisign = preimage.mode.is_multisign(),
            hash = %redact_hash(&signed.hash),
            "transaction signed"
        );
        Ok(signed)
    }

    /// Transaction ID of a signed transaction or blob, using this wallet's codec.
    pub fn hash_signed_tx<'a>(&self, tx: impl Into<SignedTxInput<'a>>) -> SignerResult<String> {
        hash_signed_tx_with(self.hasher.as_ref(), self.codec.as_ref(), tx)
    }

    /// Check the signature this wallet's key contributed to `tx`.
    ///
    /// Looks at `TxnSignature` when the top-level key is ours, otherwise at the
    /// `Signers` entry carrying our key. Returns `false` when no such signature
    /// exists or it does not verify. High-S signatures are not normalized and
    /// therefore fail.
    pub fn verify_transaction<'a>(&self, tx: impl Into<SignedTxInput<'a>>) -> SignerResult<bool> {
        let tx = match tx.into() {
            SignedTxInput::Transaction(tx) => tx.clone(),
            SignedTxInput::Blob(blob) => self.codec.decode(blob)?,
        };

        let (mode, signature_hex) = match self.own_signature(&tx) {
            Some(found) => found,
            None => return Ok(false),
        };

        let preimage =
            SigningPreimage::build(self.codec.as_ref(), self.hasher.as_ref(), &tx, mode, None)?;
        let der = hex::decode(signature_hex.trim())?;
        let signature = match Signature::from_der(&der) {
            Ok(signature) => signature,
            Err(_) => return Ok(false),
        };

        let message = Message::from_digest(preimage.digest);
        let verified = Secp256k1::verification_only()
            .verify_ecdsa(&message, &signature, &self.verifying_key)
            .is_ok();
        debug!(verified, digest = %redact_hash(&preimage.digest_hex()), "signature checked");
        Ok(verified)
    }

    fn own_signature(&self, tx: &Transaction) -> Option<(SigningMode, String)> {
        let is_ours = |key: &str| key.eq_ignore_ascii_case(&self.public_key);

        if let (Some(signature), Some(key)) = (&tx.txn_signature, &tx.signing_pub_key) {
            if is_ours(key) {
                return Some((SigningMode::Single, signature.clone()));
            }
        }

        tx.signers.as_ref()?.iter().find_map(|entry| {
            is_ours(&entry.signer.signing_pub_key).then(|| {
                (
                    SigningMode::Multisign {
                        account: entry.signer.account.clone(),
                    },
                    entry.signer.txn_signature.clone(),
                )
            })
        })
    }

    fn signing_mode(&self, selector: MultisignSelector) -> SignerResult<SigningMode> {
        Ok(match selector {
            MultisignSelector::Single => SigningMode::Single,
            MultisignSelector::Multisign => SigningMode::Multisign {
                account: self.classic_address.clone(),
            },
            MultisignSelector::MultisignAs(address) => SigningMode::Multisign {
                account: resolve_classic_address(&address)?,
            },
        })
    }
}
