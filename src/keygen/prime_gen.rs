use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use crossbeam_channel::bounded;
use lazy_static::lazy_static;
use num_bigint::{BigInt, BigUint, RandBigInt, ToBigInt, ToBigUint};
use num_traits::{One, Zero};
use rand::rngs::ThreadRng;
use rand::Rng;
use tracing::debug;
use crate::keygen::error::KeyError;

const SIEVE_LIMIT: usize = 2000;

lazy_static! {
    static ref SMALL_PRIMES: Vec<u32> = {
        let mut composite = vec![false; SIEVE_LIMIT];
        let mut primes = Vec::new();
        for i in 2..SIEVE_LIMIT {
            if composite[i] { continue; }
            primes.push(i as u32);
            for j in (i * i..SIEVE_LIMIT).step_by(i) { composite[j] = true; }
        }
        primes
    };
}

pub fn miller_rabin<R: Rng + ?Sized>(n: &BigUint, rounds: u32, rng: &mut R) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u32);
    if *n < two { return false; }
    if *n == two || *n == BigUint::from(3u32) { return true; }
    if !n.bit(0) { return false; }
    let n_minus_one = n - &one;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;
    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one { continue; }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one { continue 'witness; }
        }
        return false;
    }
    true
}

/// Trial division by the primes below 2000, then Miller-Rabin.
pub fn is_probable_prime<R: Rng + ?Sized>(n: &BigUint, rounds: u32, rng: &mut R) -> bool {
    if n.bits() > 11 {
        for p in SMALL_PRIMES.iter() {
            if (n % *p).is_zero() { return false; }
        }
    }
    miller_rabin(n, rounds, rng)
}

/// Runs `candidate` on `threads` workers until one of them yields a value.
/// The remaining workers stop at their next iteration.
pub fn find_parallel<F>(threads: usize, candidate: F) -> Result<BigUint, KeyError>
    where F: Fn(&mut ThreadRng) -> Option<BigUint> + Sync {
    let threads = threads.max(1);
    let found = AtomicBool::new(false);
    let (tx, rx) = bounded(threads);
    let res = thread::scope(|scope| {
        for _ in 0..threads {
            let tx = tx.clone();
            let found = &found;
            let candidate = &candidate;
            scope.spawn(move || {
                let mut rng = rand::thread_rng();
                let mut tries: u64 = 0;
                while !found.load(Ordering::Relaxed) {
                    tries += 1;
                    if let Some(value) = candidate(&mut rng) {
                        found.store(true, Ordering::Relaxed);
                        let _ = tx.send((value, tries));
                        break;
                    }
                }
            });
        }
        drop(tx);
        let res = rx.recv();
        found.store(true, Ordering::Relaxed);
        res
    });
    match res {
        Ok((value, tries)) => {
            debug!("found {} bit candidate after {} tries", value.bits(), tries);
            Ok(value)
        }
        Err(_) => Err(KeyError::GenerationFailure("candidate search stopped without a result".to_string()))
    }
}

/// Random prime of exactly `bits` bits with the two top bits set, so that the
/// product of two such primes has exactly `2 * bits` bits. `accept` filters
/// primes further (e.g. coprimality with the public exponent).
pub fn generate_prime<A>(bits: u64, rounds: u32, threads: usize, accept: A) -> Result<BigUint, KeyError>
    where A: Fn(&BigUint) -> bool + Sync {
    if bits < 2 {
        return Err(KeyError::GenerationFailure(format!("cannot generate a {} bit prime", bits)));
    }
    find_parallel(threads, |rng| {
        let mut test = rng.gen_biguint(bits);
        test.set_bit(bits - 1, true);
        test.set_bit(bits - 2, true);
        test.set_bit(0, true);
        if is_probable_prime(&test, rounds, rng) && accept(&test) { Some(test) } else { None }
    })
}

fn extended_euclid(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    if b.is_zero() {
        return (a.clone(), BigInt::one(), BigInt::zero());
    }
    let (d, x2, y2) = extended_euclid(b, &(a % b));
    let y = x2 - (a / b) * &y2;
    (d, y2, y)
}

/// `a^-1 mod m`, or `None` when `a` and `m` share a factor.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    if m.is_zero() { return None; }
    let (a, m) = (a.to_bigint()?, m.to_bigint()?);
    let (d, x, _) = extended_euclid(&a, &m);
    if !d.is_one() { return None; }
    ((x % &m + &m) % &m).to_biguint()
}
