use rand::{Rng, rng};

const RUNES_ALPHA_NUMBER: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// math_rand_alpha_number generates a mathematical random alphabet and number sequence of the
/// requested length. Used for track and local resource identifiers.
pub fn math_rand_alpha_number(n: usize) -> String {
    generate_random_string(n, RUNES_ALPHA_NUMBER)
}

/// generate_random_string picks `n` runes uniformly from `runes`.
pub fn generate_random_string(n: usize, runes: &[u8]) -> String {
    let mut rng = rng();

    (0..n)
        .map(|_| {
            let idx = rng.random_range(0..runes.len());
            runes[idx] as char
        })
        .collect()
}
