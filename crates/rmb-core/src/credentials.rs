//! Credential generation for new registrations.

use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};

pub const DEFAULT_PASSWORD_LENGTH: usize = 12;

/// Random alphanumeric password drawn from the OS CSPRNG.
pub fn generate_password(length: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Derive a login username from the sender's display name and external id.
///
/// Lowercased, space-stripped first 8 characters of the display name (or
/// `"user"` when there is nothing usable), then `_` and the last 6 characters
/// of the external id. Pure and best-effort: collisions are possible and not
/// checked here.
pub fn generate_username(external_id: &str, display_name: Option<&str>) -> String {
    let stripped: String = display_name
        .unwrap_or_default()
        .to_lowercase()
        .chars()
        .filter(|c| *c != ' ')
        .collect();

    let base: String = if stripped.is_empty() {
        "user".to_string()
    } else {
        stripped.chars().take(8).collect()
    };

    format!("{base}_{}", tail_chars(external_id, 6))
}

fn tail_chars(s: &str, n: usize) -> String {
    let len = s.chars().count();
    s.chars().skip(len.saturating_sub(n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_from_spaced_display_name() {
        assert_eq!(
            generate_username("12345678", Some("Ana Maria")),
            "anamaria_345678"
        );
    }

    #[test]
    fn username_truncates_long_display_names() {
        assert_eq!(
            generate_username("987654321", Some("Maximiliano Perez")),
            "maximili_654321"
        );
    }

    #[test]
    fn username_falls_back_when_display_name_missing() {
        assert_eq!(generate_username("12345678", None), "user_345678");
        assert_eq!(generate_username("12345678", Some("")), "user_345678");
        assert_eq!(generate_username("12345678", Some("   ")), "user_345678");
    }

    #[test]
    fn username_handles_short_external_ids() {
        assert_eq!(generate_username("42", Some("Bob")), "bob_42");
    }

    #[test]
    fn password_has_requested_length_and_charset() {
        for len in [0usize, 1, 12, 64] {
            let pw = generate_password(len);
            assert_eq!(pw.chars().count(), len);
            assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()), "bad: {pw}");
        }
    }

    #[test]
    fn passwords_are_not_constant() {
        // Astronomically unlikely to collide; catches a broken RNG hookup.
        assert_ne!(generate_password(32), generate_password(32));
    }
}
