use tracing::info;
use crate::keygen::error::KeyError;
use crate::keygen::keys::{DsaKeyMaterial, KeyAlgorithm, KeyMaterial, RsaKeyMaterial};

/// Backend producing fresh key material for an algorithm and bit length.
pub trait KeySource {
    fn generate(&self, algorithm: KeyAlgorithm, bits: u32) -> Result<KeyMaterial, KeyError>;
}

impl<S: KeySource + ?Sized> KeySource for &S {
    fn generate(&self, algorithm: KeyAlgorithm, bits: u32) -> Result<KeyMaterial, KeyError> {
        (**self).generate(algorithm, bits)
    }
}

/// Prime search over `rand::thread_rng()` on a pool of worker threads.
#[derive(Debug, Clone)]
pub struct SystemKeySource {
    pub rounds: u32,
    pub threads: usize,
}

impl SystemKeySource {
    pub fn new(rounds: u32, threads: usize) -> Self {
        Self { rounds, threads }
    }
}

impl KeySource for SystemKeySource {
    fn generate(&self, algorithm: KeyAlgorithm, bits: u32) -> Result<KeyMaterial, KeyError> {
        Ok(match algorithm {
            KeyAlgorithm::Rsa => KeyMaterial::Rsa(RsaKeyMaterial::generate(bits, self.rounds, self.threads)?),
            KeyAlgorithm::Dsa => KeyMaterial::Dsa(DsaKeyMaterial::generate(bits, self.rounds, self.threads)?),
        })
    }
}

pub struct KeyPairGenerator<S: KeySource> {
    source: S,
}

impl<S: KeySource> KeyPairGenerator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// `bits <= 0` selects the algorithm default.
    pub fn generate(&self, algorithm: KeyAlgorithm, bits: i64) -> Result<KeyMaterial, KeyError> {
        let bits = if bits <= 0 {
            algorithm.default_bits()
        } else {
            u32::try_from(bits).map_err(|_| KeyError::GenerationFailure(format!("key size {} is too large", bits)))?
        };
        let material = self.source.generate(algorithm, bits)?;
        if material.algorithm() != algorithm {
            return Err(KeyError::FormatError(format!(
                "requested {} key, backend produced {}", algorithm, material.algorithm())));
        }
        info!("generated {} bit {} key", bits, algorithm);
        Ok(material)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use crate::keygen::keys::{dsa_key, rsa_key};
    use super::*;

    /// Returns the same material every time and records each request.
    pub(crate) struct FixedKeySource {
        pub material: KeyMaterial,
        pub requests: Mutex<Vec<(KeyAlgorithm, u32)>>,
    }

    impl FixedKeySource {
        pub(crate) fn new(material: KeyMaterial) -> Self {
            Self { material, requests: Mutex::new(vec![]) }
        }

        pub(crate) fn rsa() -> Self {
            Self::new(KeyMaterial::Rsa(rsa_key::tests::textbook_key()))
        }

        pub(crate) fn dsa() -> Self {
            Self::new(KeyMaterial::Dsa(dsa_key::tests::textbook_key()))
        }
    }

    impl KeySource for FixedKeySource {
        fn generate(&self, algorithm: KeyAlgorithm, bits: u32) -> Result<KeyMaterial, KeyError> {
            self.requests.lock().unwrap().push((algorithm, bits));
            Ok(self.material.clone())
        }
    }

    #[test]
    fn test_default_bits() {
        let source = FixedKeySource::dsa();
        let generator = KeyPairGenerator::new(&source);
        generator.generate(KeyAlgorithm::Dsa, 0).unwrap();
        generator.generate(KeyAlgorithm::Dsa, -5).unwrap();
        generator.generate(KeyAlgorithm::Dsa, 2048).unwrap();
        assert_eq!(*source.requests.lock().unwrap(),
                   vec![(KeyAlgorithm::Dsa, 1024), (KeyAlgorithm::Dsa, 1024), (KeyAlgorithm::Dsa, 2048)]);
    }

    #[test]
    fn test_too_large() {
        let generator = KeyPairGenerator::new(FixedKeySource::rsa());
        assert!(matches!(generator.generate(KeyAlgorithm::Rsa, 1 << 40), Err(KeyError::GenerationFailure(_))));
    }

    #[test]
    fn test_algorithm_mismatch() {
        let generator = KeyPairGenerator::new(FixedKeySource::rsa());
        assert!(matches!(generator.generate(KeyAlgorithm::Dsa, 0), Err(KeyError::FormatError(_))));
    }

    #[test]
    fn test_system_source_rejects_size() {
        let generator = KeyPairGenerator::new(SystemKeySource::new(20, 1));
        assert!(matches!(generator.generate(KeyAlgorithm::Rsa, 100), Err(KeyError::GenerationFailure(_))));
        assert!(matches!(generator.generate(KeyAlgorithm::Dsa, 4096), Err(KeyError::GenerationFailure(_))));
    }
}
