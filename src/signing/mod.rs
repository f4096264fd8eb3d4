//! External Signature Compilation
//!
//! The signing key lives behind a remote service, so signing is split in three:
//! 1. Build the signing pre-image and its digest
//! 2. Obtain `(r, s)` for the digest from a [`RemoteSigner`]
//! 3. Compile the DER signature into the final signed transaction

pub mod compiler;
pub mod preimage;
pub mod remote;

pub use compiler::{attach_signature, compile, SignatureAssembly};
pub use preimage::{SigningMode, SigningPreimage};
pub use remote::{LocalKeySigner, RemoteSignature, RemoteSigner};
