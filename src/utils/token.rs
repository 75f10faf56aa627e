use rand::Rng;

/// 32 random bytes, hex-encoded. Used for invitation tokens and ticket
/// codes; must never be sequential or otherwise guessable.
pub fn secure_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Shorter per-ticket entry code.
pub fn ticket_code() -> String {
    let bytes: [u8; 8] = rand::thread_rng().gen();
    hex::encode(bytes).to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tokens_are_unique_and_long() {
        let tokens: HashSet<String> = (0..100).map(|_| secure_token()).collect();
        assert_eq!(tokens.len(), 100);
        assert!(tokens.iter().all(|t| t.len() == 64));
    }
}
