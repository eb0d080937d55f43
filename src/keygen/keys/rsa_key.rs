use num::Integer;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use crate::keygen::error::KeyError;
use crate::keygen::keys::{KeyAlgorithm, VERSION_MARKER};
use crate::keygen::prime_gen::{generate_prime, mod_inverse};

pub const RSA_MIN_BITS: u32 = 512;
pub const RSA_MAX_BITS: u32 = 16384;
pub const RSA_PUBLIC_EXPONENT: u32 = 65537;

/// RSA private key parameters, each an unsigned big-endian byte string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RsaKeyMaterial {
    pub modulus: Vec<u8>,
    pub public_exponent: Vec<u8>,
    pub private_exponent: Vec<u8>,
    pub p: Vec<u8>,
    pub q: Vec<u8>,
    pub d_exp_p: Vec<u8>,
    pub d_exp_q: Vec<u8>,
    pub q_inverse: Vec<u8>,
}

pub fn check_bits(bits: u32) -> Result<(), KeyError> {
    if bits < RSA_MIN_BITS || bits > RSA_MAX_BITS || bits % 8 != 0 {
        return Err(KeyError::GenerationFailure(format!(
            "RSA key size {} not supported, expected a multiple of 8 in {}..={}", bits, RSA_MIN_BITS, RSA_MAX_BITS)));
    }
    Ok(())
}

impl RsaKeyMaterial {
    pub fn generate(bits: u32, rounds: u32, threads: usize) -> Result<Self, KeyError> {
        check_bits(bits)?;
        let e = BigUint::from(RSA_PUBLIC_EXPONENT);
        let one = BigUint::one();
        let coprime = |p: &BigUint| (p - &one).gcd(&e).is_one();
        let bits_p = ((bits + 1) / 2) as u64;
        let bits_q = (bits / 2) as u64;
        let (mut p, mut q) = loop {
            let p = generate_prime(bits_p, rounds, threads, &coprime)?;
            let q = generate_prime(bits_q, rounds, threads, &coprime)?;
            if p != q { break (p, q); }
        };
        if p < q { std::mem::swap(&mut p, &mut q); }
        let n = &p * &q;
        if n.bits() != bits as u64 {
            return Err(KeyError::GenerationFailure(format!("modulus has {} bits, expected {}", n.bits(), bits)));
        }
        let (p1, q1) = (&p - &one, &q - &one);
        let f = &p1 * &q1;
        let d = mod_inverse(&e, &f)
            .ok_or_else(|| KeyError::GenerationFailure("public exponent is not invertible".to_string()))?;
        let q_inv = mod_inverse(&q, &p)
            .ok_or_else(|| KeyError::GenerationFailure("q is not invertible modulo p".to_string()))?;
        let key = Self {
            modulus: n.to_bytes_be(),
            public_exponent: e.to_bytes_be(),
            private_exponent: d.to_bytes_be(),
            d_exp_p: (&d % &p1).to_bytes_be(),
            d_exp_q: (&d % &q1).to_bytes_be(),
            p: p.to_bytes_be(),
            q: q.to_bytes_be(),
            q_inverse: q_inv.to_bytes_be(),
        };
        key.verify().map_err(|e| KeyError::GenerationFailure(e.to_string()))?;
        Ok(key)
    }

    /// `[version, n, e, d, p, q, dP, dQ, qInv]`, the PKCS#1 RSAPrivateKey order.
    pub fn private_fields(&self) -> Vec<Vec<u8>> {
        vec![
            VERSION_MARKER.to_vec(),
            self.modulus.clone(),
            self.public_exponent.clone(),
            self.private_exponent.clone(),
            self.p.clone(),
            self.q.clone(),
            self.d_exp_p.clone(),
            self.d_exp_q.clone(),
            self.q_inverse.clone(),
        ]
    }

    /// `["ssh-rsa", e, n]`
    pub fn public_fields(&self) -> Vec<Vec<u8>> {
        vec![
            KeyAlgorithm::Rsa.ssh_name().as_bytes().to_vec(),
            self.public_exponent.clone(),
            self.modulus.clone(),
        ]
    }

    pub fn from_private_fields(fields: Vec<Vec<u8>>) -> Result<Self, KeyError> {
        let [version, modulus, public_exponent, private_exponent, p, q, d_exp_p, d_exp_q, q_inverse]: [Vec<u8>; 9] =
            fields.try_into().map_err(|f: Vec<Vec<u8>>| {
                KeyError::ParseError(format!("RSA private key needs 9 integers, got {}", f.len()))
            })?;
        if !BigUint::from_bytes_be(&version).is_zero() {
            return Err(KeyError::ParseError("unsupported RSA private key version".to_string()));
        }
        Ok(Self { modulus, public_exponent, private_exponent, p, q, d_exp_p, d_exp_q, q_inverse })
    }

    pub fn verify(&self) -> Result<(), KeyError> {
        let int = |b: &Vec<u8>| BigUint::from_bytes_be(b);
        let (n, e, d) = (int(&self.modulus), int(&self.public_exponent), int(&self.private_exponent));
        let (p, q) = (int(&self.p), int(&self.q));
        let one = BigUint::one();
        if p <= one || q <= one || &p * &q != n {
            return Err(KeyError::FormatError("RSA modulus is not p * q".to_string()));
        }
        let (p1, q1) = (&p - &one, &q - &one);
        if !((&d * &e) % (&p1 * &q1)).is_one() {
            return Err(KeyError::FormatError("RSA exponents do not match".to_string()));
        }
        if int(&self.d_exp_p) != &d % &p1 || int(&self.d_exp_q) != &d % &q1
            || !((int(&self.q_inverse) * &q) % &p).is_one() {
            return Err(KeyError::FormatError("RSA CRT parameters do not match".to_string()));
        }
        Ok(())
    }
}
