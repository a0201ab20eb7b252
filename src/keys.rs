use crate::types::Account;
use alloy::signers::local::PrivateKeySigner;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("failed to read private keys file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("the private keys file {0:?} is empty, please add private keys")]
    Empty(PathBuf),
    #[error("failed to parse private keys file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    // The key itself is never echoed back.
    #[error("invalid private key at position {0}")]
    Invalid(usize),
}

/// Loads the accounts to fund transfers from, in file order.
///
/// The file holds a JSON array of hex private keys, e.g.
/// `["0xabc...", "0xdef..."]`.
pub fn load_accounts<P: AsRef<Path>>(path: P) -> Result<Vec<Account>, KeyError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| KeyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_accounts(&contents).map_err(|e| match e {
        KeyError::Empty(_) => KeyError::Empty(path.to_path_buf()),
        KeyError::Parse { source, .. } => KeyError::Parse {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

pub fn parse_accounts(contents: &str) -> Result<Vec<Account>, KeyError> {
    let contents = contents.trim();
    if contents.is_empty() {
        return Err(KeyError::Empty(PathBuf::new()));
    }

    let keys: Vec<String> = serde_yaml::from_str(contents).map_err(|source| KeyError::Parse {
        path: PathBuf::new(),
        source,
    })?;
    if keys.is_empty() {
        return Err(KeyError::Empty(PathBuf::new()));
    }

    keys.iter()
        .enumerate()
        .map(|(i, key)| {
            PrivateKeySigner::from_str(key.trim())
                .map(Account::new)
                .map_err(|_| KeyError::Invalid(i + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: &str = "0x0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
    const KEY_B: &str = "fedcba9876543210fedcba9876543210fedcba9876543210fedcba9876543210";

    #[test]
    fn test_parses_keys_in_order() {
        let contents = format!(r#"["{}", "{}"]"#, KEY_A, KEY_B);
        let accounts = parse_accounts(&contents).unwrap();
        assert_eq!(accounts.len(), 2);

        let a = PrivateKeySigner::from_str(KEY_A).unwrap();
        assert_eq!(accounts[0].address, a.address());
        assert_ne!(accounts[0].address, accounts[1].address);
    }

    #[test]
    fn test_empty_file_rejected() {
        assert!(matches!(parse_accounts("  \n"), Err(KeyError::Empty(_))));
        assert!(matches!(parse_accounts("[]"), Err(KeyError::Empty(_))));
    }

    #[test]
    fn test_invalid_key_reported_by_position() {
        let contents = format!(r#"["{}", "0x1234"]"#, KEY_A);
        let err = parse_accounts(&contents).unwrap_err();
        assert!(matches!(err, KeyError::Invalid(2)));
        assert!(!err.to_string().contains("1234"));
    }

    #[test]
    fn test_malformed_file_rejected() {
        assert!(matches!(
            parse_accounts("{not: [a, list"),
            Err(KeyError::Parse { .. })
        ));
    }
}
