//! Request URL construction and Codeforces API signing.
//!
//! Signed requests carry `apiKey`, `time` and
//! `apiSig = rand + sha512hex("{rand}/{method}?{sorted params}#{secret}")`.

use rand::Rng;
use sha2::{Digest, Sha512};

#[derive(Clone)]
pub enum Signer {
    Unsigned,
    Signed { api_key: String, secret: String },
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signer::Unsigned => write!(f, "Unsigned"),
            Signer::Signed { api_key, .. } => f
                .debug_struct("Signed")
                .field("api_key", api_key)
                .finish_non_exhaustive(),
        }
    }
}

impl Signer {
    /// Signed only when both key and secret are set.
    pub fn from_credentials(api_key: Option<String>, secret: Option<String>) -> Self {
        match (api_key, secret) {
            (Some(api_key), Some(secret)) if !api_key.is_empty() && !secret.is_empty() => {
                Signer::Signed { api_key, secret }
            }
            _ => Signer::Unsigned,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Signer::Signed { .. })
    }

    pub fn sign(&self, base_url: &str, method: &str, params: &[(&str, &str)]) -> String {
        let now = chrono::Utc::now().timestamp();
        let rand = rand::thread_rng().gen_range(100_000..=999_999);
        self.sign_with(base_url, method, params, now, rand)
    }

    /// Deterministic form of [`Signer::sign`].
    pub fn sign_with(
        &self,
        base_url: &str,
        method: &str,
        params: &[(&str, &str)],
        unix_time: i64,
        rand: u32,
    ) -> String {
        let base = format!("{}/{method}", base_url.trim_end_matches('/'));
        let mut pairs: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.to_string(), urlencoding::encode(v).into_owned()))
            .collect();

        let (api_key, secret) = match self {
            Signer::Unsigned => {
                if pairs.is_empty() {
                    return base;
                }
                return format!("{base}?{}", join(&pairs));
            }
            Signer::Signed { api_key, secret } => (api_key, secret),
        };

        pairs.push(("apiKey".to_string(), urlencoding::encode(api_key).into_owned()));
        pairs.push(("time".to_string(), unix_time.to_string()));

        let mut sorted = pairs.clone();
        sorted.sort();
        let source = format!("{rand}/{method}?{}#{secret}", join(&sorted));
        let signature = hex::encode(Sha512::digest(source.as_bytes()));

        format!("{base}?{}&apiSig={rand}{signature}", join(&pairs))
    }
}

fn join(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}
