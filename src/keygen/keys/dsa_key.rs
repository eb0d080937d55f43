use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use crate::keygen::error::KeyError;
use crate::keygen::keys::{KeyAlgorithm, VERSION_MARKER};
use crate::keygen::prime_gen::{find_parallel, generate_prime, is_probable_prime};

/// DSA domain parameters and key pair, each an unsigned big-endian byte string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DsaKeyMaterial {
    pub p: Vec<u8>,
    pub q: Vec<u8>,
    pub g: Vec<u8>,
    pub y: Vec<u8>,
    pub x: Vec<u8>,
}

/// Bit length of the subprime `q` for a modulus of `bits` bits.
pub fn subprime_bits(bits: u32) -> Result<u64, KeyError> {
    match bits {
        512..=1024 if bits % 64 == 0 => Ok(160),
        2048 => Ok(224),
        3072 => Ok(256),
        _ => Err(KeyError::GenerationFailure(format!(
            "DSA key size {} not supported, expected 512..=1024 in steps of 64, 2048 or 3072", bits))),
    }
}

impl DsaKeyMaterial {
    pub fn generate(bits: u32, rounds: u32, threads: usize) -> Result<Self, KeyError> {
        let n = subprime_bits(bits)?;
        let l = bits as u64;
        let one = BigUint::one();
        let q = generate_prime(n, rounds, threads, |_| true)?;
        let two_q = &q << 1u32;
        // p = X - (X mod 2q) + 1, so q | p - 1
        let p = find_parallel(threads, |rng| {
            let mut x = rng.gen_biguint(l);
            x.set_bit(l - 1, true);
            let c = &x % &two_q;
            let p = x - c + BigUint::one();
            if p.bits() == l && is_probable_prime(&p, rounds, rng) { Some(p) } else { None }
        })?;
        let p_minus_one = &p - &one;
        let exponent = &p_minus_one / &q;
        let two = BigUint::from(2u32);
        let mut rng = rand::thread_rng();
        let g = loop {
            let h = rng.gen_biguint_range(&two, &p_minus_one);
            let g = h.modpow(&exponent, &p);
            if g > one { break g; }
        };
        let x = rng.gen_biguint_range(&one, &q);
        let y = g.modpow(&x, &p);
        let key = Self {
            p: p.to_bytes_be(),
            q: q.to_bytes_be(),
            g: g.to_bytes_be(),
            y: y.to_bytes_be(),
            x: x.to_bytes_be(),
        };
        key.verify().map_err(|e| KeyError::GenerationFailure(e.to_string()))?;
        Ok(key)
    }

    /// `[version, p, q, g, y, x]`, the OpenSSL DSAPrivateKey order.
    pub fn private_fields(&self) -> Vec<Vec<u8>> {
        vec![
            VERSION_MARKER.to_vec(),
            self.p.clone(),
            self.q.clone(),
            self.g.clone(),
            self.y.clone(),
            self.x.clone(),
        ]
    }

    /// `["ssh-dss", p, q, g, y]`
    pub fn public_fields(&self) -> Vec<Vec<u8>> {
        vec![
            KeyAlgorithm::Dsa.ssh_name().as_bytes().to_vec(),
            self.p.clone(),
            self.q.clone(),
            self.g.clone(),
            self.y.clone(),
        ]
    }

    pub fn from_private_fields(fields: Vec<Vec<u8>>) -> Result<Self, KeyError> {
        let [version, p, q, g, y, x]: [Vec<u8>; 6] = fields.try_into().map_err(|f: Vec<Vec<u8>>| {
            KeyError::ParseError(format!("DSA private key needs 6 integers, got {}", f.len()))
        })?;
        if !BigUint::from_bytes_be(&version).is_zero() {
            return Err(KeyError::ParseError("unsupported DSA private key version".to_string()));
        }
        Ok(Self { p, q, g, y, x })
    }

    pub fn verify(&self) -> Result<(), KeyError> {
        let int = |b: &Vec<u8>| BigUint::from_bytes_be(b);
        let (p, q, g, y, x) = (int(&self.p), int(&self.q), int(&self.g), int(&self.y), int(&self.x));
        let one = BigUint::one();
        if q <= one || p <= q || !((&p - &one) % &q).is_zero() {
            return Err(KeyError::FormatError("DSA q does not divide p - 1".to_string()));
        }
        if g <= one || g >= p || !g.modpow(&q, &p).is_one() {
            return Err(KeyError::FormatError("DSA generator has wrong order".to_string()));
        }
        if x.is_zero() || x >= q || g.modpow(&x, &p) != y {
            return Err(KeyError::FormatError("DSA public value is not g^x mod p".to_string()));
        }
        Ok(())
    }
}
