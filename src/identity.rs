use sha2::{Digest, Sha256};

const ID_MODULUS: u64 = 10_000_000_000;

/// Derive the canonical numeric id for a record.
///
/// Title and url are trimmed and lowercased before hashing, so the same page scraped twice
/// always lands on the same id. The SHA-256 hex digest is stripped of its letters and the
/// remaining decimal digits are read as one number, reduced modulo 10^10.
pub fn generate_id(title: &str, url: &str) -> u64 {
    let title = title.trim().to_lowercase();
    let url = url.trim().to_lowercase();

    let digest = Sha256::digest(format!("{title}|{url}").as_bytes());
    let hex = format!("{digest:x}");

    hex.chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0, |acc, digit| (acc * 10 + u64::from(digit)) % ID_MODULUS)
}

#[cfg(test)]
mod tests {
    use super::generate_id;

    #[test]
    fn id_is_deterministic() {
        let a = generate_id("The Matrix", "http://x/1");
        let b = generate_id("The Matrix", "http://x/1");
        assert_eq!(a, b);
    }

    #[test]
    fn id_ignores_case_and_surrounding_whitespace() {
        let a = generate_id("The Matrix", "http://x/1");
        let b = generate_id(" the matrix ", "HTTP://X/1");
        assert_eq!(a, b);
    }

    #[test]
    fn id_fits_in_ten_digits() {
        for (title, url) in [
            ("Inception", "https://1337x.to/movie/1/inception/"),
            ("Heat", "https://1337x.to/movie/2/heat/"),
            ("", ""),
        ] {
            assert!(generate_id(title, url) < 10_000_000_000);
        }
    }

    #[test]
    fn different_urls_give_different_ids() {
        let a = generate_id("Heat", "https://1337x.to/movie/2/heat/");
        let b = generate_id("Heat", "https://1337x.to/movie/3/heat/");
        assert_ne!(a, b);
    }
}
