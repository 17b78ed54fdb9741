//! Range proof timing tool
//!
//! Usage:
//! cargo run --bin rangeproof_bench --release -- --values 4 --batch 8 --samples 10
//! RUST_LOG=debug cargo run --bin rangeproof_bench --release -- --values 1 --message "hello"

extern crate asset_rangeproofs;
extern crate clap;
extern crate curve25519_dalek;
extern crate env_logger;
extern crate failure;
#[macro_use]
extern crate log;
extern crate rand;

use std::time::{Duration, Instant};

use asset_rangeproofs::{
    AssetId, Nonce, RangeProof, RangeProofConfig, RangeProofEngine, RecoveryRequest,
};
use clap::{App, Arg};
use curve25519_dalek::ristretto::RistrettoPoint;
use rand::Rng;

fn main() -> Result<(), failure::Error> {
    env_logger::init();

    let matches = App::new("Range Proof Benchmark")
        .version("0.1")
        .about("Times proving, batch verification and recovery of range proofs")
        .arg(Arg::with_name("values")
            .short("m")
            .long("values")
            .value_name("M")
            .help("Number of values per proof (default: 1)")
            .takes_value(true))
        .arg(Arg::with_name("batch")
            .short("b")
            .long("batch")
            .value_name("K")
            .help("Number of proofs verified together (default: 4)")
            .takes_value(true))
        .arg(Arg::with_name("samples")
            .short("s")
            .long("samples")
            .value_name("N")
            .help("Number of samples (default: 10)")
            .takes_value(true))
        .arg(Arg::with_name("message")
            .long("message")
            .value_name("TEXT")
            .help("Message embedded in every proof")
            .takes_value(true))
        .arg(Arg::with_name("asset")
            .long("asset")
            .value_name("LABEL")
            .help("Asset label the generators are derived from")
            .takes_value(true))
        .get_matches();

    let m = parse_or(&matches, "values", 1);
    let batch = parse_or(&matches, "batch", 4).max(1);
    let samples = parse_or(&matches, "samples", 10).max(1);
    let message = matches.value_of("message").unwrap_or("").as_bytes().to_vec();
    let asset = AssetId::from_label(matches.value_of("asset").unwrap_or("bench").as_bytes());

    let engine = RangeProofEngine::new(RangeProofConfig {
        max_input_values: m.max(1),
        ..RangeProofConfig::default()
    })?;

    println!("\nConfiguration: values={}, batch={}, samples={}", m, batch, samples);
    println!(
        "Inner-product rounds per proof: {}",
        RangeProofEngine::inner_product_rounds(m)
    );

    let mut rng = rand::thread_rng();
    let mut prove_time = Duration::new(0, 0);
    let mut verify_time = Duration::new(0, 0);
    let mut recover_time = Duration::new(0, 0);
    let mut proof_size = 0;

    for sample in 0..samples {
        let mut nonces = Vec::with_capacity(batch);
        let mut proofs: Vec<(usize, RangeProof)> = Vec::with_capacity(batch);

        for i in 0..batch {
            let nonce = Nonce::from(RistrettoPoint::random(&mut rng));
            let values: Vec<u64> = (0..m).map(|_| rng.gen()).collect();

            let start = Instant::now();
            let proof = engine.prove(&values, &nonce, &message, &asset)?;
            prove_time += start.elapsed();

            proof_size = proof.serialized_size();
            nonces.push(nonce);
            proofs.push((i, proof));
        }

        let start = Instant::now();
        engine.try_verify(&proofs, &asset)?;
        verify_time += start.elapsed();

        let requests: Vec<RecoveryRequest> = proofs
            .iter()
            .zip(nonces.iter())
            .map(|((i, proof), nonce)| RecoveryRequest::new(*i, proof, *nonce))
            .collect();
        let start = Instant::now();
        let recovered = engine.recover(&requests, &asset);
        recover_time += start.elapsed();

        if recovered.len() != batch {
            warn!("sample {}: recovered {} of {} proofs", sample, recovered.len(), batch);
        }
        debug!("sample {} done", sample);
    }

    let proofs_total = (samples * batch) as u32;
    println!("Proof size:        {} bytes", proof_size);
    println!("Prove (per proof): {:?}", prove_time / proofs_total);
    println!("Verify (batch):    {:?}", verify_time / samples as u32);
    println!("Recover (per proof): {:?}", recover_time / proofs_total);

    Ok(())
}

fn parse_or(matches: &clap::ArgMatches, name: &str, default: usize) -> usize {
    matches
        .value_of(name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
