use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 9;

/// Join code students type to enter a test. Stored uppercase, matched
/// case-insensitively on lookup.
pub(crate) fn generate_test_code() -> String {
    let mut rng = rand::thread_rng();
    let mut output = String::with_capacity(CODE_LEN);
    for _ in 0..CODE_LEN {
        let index = rng.gen_range(0..ALPHABET.len());
        output.push(ALPHABET[index] as char);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_nine_uppercase_alphanumerics() {
        for _ in 0..50 {
            let code = generate_test_code();
            assert_eq!(code.len(), 9);
            assert!(code.chars().all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit()));
        }
    }
}
