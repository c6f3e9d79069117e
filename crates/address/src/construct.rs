use crate::error::{Error, ErrorKind};
use crate::{AddressMode, HashAlgorithm};
use std::str::FromStr;

impl FromStr for HashAlgorithm {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha512" | "sha-512" => Ok(HashAlgorithm::Sha512),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "blake3" => Ok(HashAlgorithm::Blake3),
            "xxh3" | "xxh3-128" => Ok(HashAlgorithm::Xxh3),
            _ => exn::bail!(ErrorKind::InvalidConfiguration(format!("unsupported hash algorithm: {s}"))),
        }
    }
}

impl FromStr for AddressMode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "content" => Ok(AddressMode::Content),
            "path" => Ok(AddressMode::Path),
            _ => exn::bail!(ErrorKind::InvalidConfiguration(format!("unsupported addressing mode: {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::{AddressMode, HashAlgorithm};
    use rstest::rstest;

    #[rstest]
    #[case("sha512", HashAlgorithm::Sha512)]
    #[case("SHA-512", HashAlgorithm::Sha512)]
    #[case("sha256", HashAlgorithm::Sha256)]
    #[case("Sha-256", HashAlgorithm::Sha256)]
    #[case("blake3", HashAlgorithm::Blake3)]
    #[case("xxh3", HashAlgorithm::Xxh3)]
    #[case("XXH3-128", HashAlgorithm::Xxh3)]
    fn test_algorithm_from_str(#[case] test: &str, #[case] expected: HashAlgorithm) {
        assert_eq!(test.parse::<HashAlgorithm>().unwrap(), expected);
    }

    #[rstest]
    #[case("md5")]
    #[case("blake2b")]
    #[case("")]
    fn test_algorithm_from_str_invalid(#[case] test: &str) {
        let err = test.parse::<HashAlgorithm>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidConfiguration(_)));
    }

    #[rstest]
    #[case("content", AddressMode::Content)]
    #[case("PATH", AddressMode::Path)]
    fn test_mode_from_str(#[case] test: &str, #[case] expected: AddressMode) {
        assert_eq!(test.parse::<AddressMode>().unwrap(), expected);
    }

    #[test]
    fn test_mode_from_str_invalid() {
        assert!("filename".parse::<AddressMode>().is_err());
    }
}
