#![deny(missing_docs)]
#![doc(html_root_url = "https://docs.rs/asset-rangeproofs/0.1.0")]

//! Aggregated Bulletproofs range proofs over per-asset generators.
//!
//! A prover commits to up to
//! [`RangeProofConfig::max_input_values`](config::RangeProofConfig) 64-bit
//! values and proves they are in range.  All blinding factors are derived
//! from a [`Nonce`], which lets the holder of that nonce later recover the
//! first committed value together with a short embedded message.
//! Verification is batched: any number of proofs for the same asset are
//! checked with a single multiscalar multiplication.
//!
//! ```
//! # extern crate asset_rangeproofs;
//! # extern crate curve25519_dalek;
//! use asset_rangeproofs::{AssetId, Nonce, RangeProofEngine, RecoveryRequest};
//! use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
//! use curve25519_dalek::scalar::Scalar;
//!
//! # fn main() {
//! let engine = RangeProofEngine::default();
//! let asset = AssetId::from_label(b"doc-asset");
//! let nonce = Nonce::from(RISTRETTO_BASEPOINT_POINT * Scalar::from(7u64));
//!
//! let proof = engine.prove(&[1000], &nonce, b"memo", &asset).unwrap();
//! assert!(engine.verify(&[(0, proof.clone())], &asset));
//!
//! let recovered = engine.recover(&[RecoveryRequest::new(0, &proof, nonce)], &asset);
//! assert_eq!(recovered[0].amount, 1000);
//! assert_eq!(recovered[0].message, b"memo".to_vec());
//! # }
//! ```

extern crate byteorder;
extern crate core;
extern crate digest;
extern crate rand;
extern crate sha3;

extern crate clear_on_drop;
extern crate curve25519_dalek;
extern crate merlin;
extern crate once_cell;
extern crate subtle;

#[macro_use]
extern crate serde_derive;
extern crate serde;

#[macro_use]
extern crate failure;

#[macro_use]
extern crate log;

#[cfg(test)]
extern crate bincode;
#[cfg(test)]
extern crate rand_chacha;

mod util;

pub mod config;
mod errors;
mod generators;
mod inner_product_proof;
mod nonce;
mod range_proof;
mod transcript;

pub use config::RangeProofConfig;
pub use errors::ProofError;
pub use generators::{AssetId, Generators, GeneratorsFactory};
pub use inner_product_proof::InnerProductProof;
pub use nonce::Nonce;
pub use range_proof::{RangeProof, RangeProofEngine, RecoveredValue, RecoveryRequest};
