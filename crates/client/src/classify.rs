//! Response classification for the refresh subsystem
//!
//! Distinguishes an expired access credential (recoverable via refresh)
//! from a genuine authorization denial (terminal) and everything else
//! (not this subsystem's concern). The replay flag makes a second 401 on
//! the same request terminal, which is the guard against refresh loops.

/// What a response means to the refresh subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Expired access credential, first occurrence — recover via refresh.
    CredentialExpired,
    /// Forbidden, or expired again after a replay — surface to the caller.
    AuthorizationDenied,
    /// Any other status, success or not — pass through untouched.
    Unrelated,
}

/// Classify a response status for a request that has (or has not) already
/// been replayed once.
///
/// 401 on a fresh request is `CredentialExpired`; 401 on a replayed
/// request means the new token was also rejected, so it is terminal. 403
/// never touches the coordinator or the credential store.
pub fn classify(status: u16, replayed: bool) -> Outcome {
    match status {
        401 if !replayed => Outcome::CredentialExpired,
        401 | 403 => Outcome::AuthorizationDenied,
        _ => Outcome::Unrelated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_401_is_expired() {
        assert_eq!(classify(401, false), Outcome::CredentialExpired);
    }

    #[test]
    fn replayed_401_is_terminal() {
        assert_eq!(classify(401, true), Outcome::AuthorizationDenied);
    }

    #[test]
    fn forbidden_is_denied_regardless_of_replay() {
        assert_eq!(classify(403, false), Outcome::AuthorizationDenied);
        assert_eq!(classify(403, true), Outcome::AuthorizationDenied);
    }

    #[test]
    fn success_and_server_errors_pass_through() {
        assert_eq!(classify(200, false), Outcome::Unrelated);
        assert_eq!(classify(204, true), Outcome::Unrelated);
        assert_eq!(classify(404, false), Outcome::Unrelated);
        assert_eq!(classify(429, false), Outcome::Unrelated);
        assert_eq!(classify(500, false), Outcome::Unrelated);
        assert_eq!(classify(503, true), Outcome::Unrelated);
    }
}
