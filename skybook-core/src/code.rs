use rand::Rng;

pub const CODE_PREFIX: &str = "TICKET-";
pub const CODE_LENGTH: usize = 6;
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A fresh `TICKET-XXXXXX` candidate. Uniqueness is the caller's job.
pub fn generate_code() -> String {
    generate_code_with(&mut rand::thread_rng())
}

pub fn generate_code_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let body: String = (0..CODE_LENGTH)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect();
    format!("{}{}", CODE_PREFIX, body)
}

/// Standardized code of the `position`-th (1-based) ticket of a group booking.
pub fn group_member_code(group_code: &str, position: usize) -> String {
    format!("{}-{}", group_code, position)
}

/// Accepts `TICKET-XXXXXX` and `TICKET-XXXXXX-N` (N a positive integer, no leading zero).
pub fn is_valid_code(code: &str) -> bool {
    let Some(rest) = code.strip_prefix(CODE_PREFIX) else {
        return false;
    };
    if rest.len() < CODE_LENGTH || !rest.is_char_boundary(CODE_LENGTH) {
        return false;
    }
    let (body, suffix) = rest.split_at(CODE_LENGTH);
    if !body.bytes().all(|b| CODE_CHARSET.contains(&b)) {
        return false;
    }
    if suffix.is_empty() {
        return true;
    }
    match suffix.strip_prefix('-') {
        Some(position) => {
            !position.is_empty()
                && !position.starts_with('0')
                && position.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_codes_are_well_formed() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let code = generate_code_with(&mut rng);
            assert_eq!(code.len(), CODE_PREFIX.len() + CODE_LENGTH);
            assert!(is_valid_code(&code), "{}", code);
        }
    }

    #[test]
    fn test_group_member_codes() {
        assert_eq!(group_member_code("TICKET-AB12CD", 1), "TICKET-AB12CD-1");
        assert!(is_valid_code(&group_member_code("TICKET-AB12CD", 12)));
    }

    #[test]
    fn test_code_format() {
        assert!(is_valid_code("TICKET-AB12CD"));
        assert!(is_valid_code("TICKET-AB12CD-3"));
        assert!(!is_valid_code("TICKET-ab12cd"));
        assert!(!is_valid_code("TICKET-AB12C"));
        assert!(!is_valid_code("TICKET-AB12CDE"));
        assert!(!is_valid_code("TICKET-AB12CD-"));
        assert!(!is_valid_code("TICKET-AB12CD-0"));
        assert!(!is_valid_code("TICKET-AB12CD-x"));
        assert!(!is_valid_code("BOOKING-AB12CD"));
        assert!(!is_valid_code("TICKET-ÄB12CD"));
    }
}
