/// Checks a plaintext password against a customer's stored credential hash.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, password: &str, password_hash: &str) -> bool;
}

/// Stored customer hashes are bcrypt.
pub struct BcryptVerifier;

impl CredentialVerifier for BcryptVerifier {
    fn verify(&self, password: &str, password_hash: &str) -> bool {
        match bcrypt::verify(password, password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!("Unreadable credential hash: {}", e);
                false
            }
        }
    }
}

/// Accepts exactly one password regardless of hash.
pub struct MockCredentialVerifier {
    pub accepted_password: String,
}

impl CredentialVerifier for MockCredentialVerifier {
    fn verify(&self, password: &str, _password_hash: &str) -> bool {
        password == self.accepted_password
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bcrypt_verifier() {
        let hash = bcrypt::hash("hunter2", 4).unwrap();
        assert!(BcryptVerifier.verify("hunter2", &hash));
        assert!(!BcryptVerifier.verify("hunter3", &hash));
        assert!(!BcryptVerifier.verify("hunter2", "not-a-bcrypt-hash"));
    }
}
