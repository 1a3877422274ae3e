//! Resolve an order's billing block to an existing store.
//!
//! Strategies run in a fixed order and the first one that accepts wins:
//!
//! 1. exact normalized company name
//! 2. fuzzy company name, accepted at or above the configured threshold
//! 3. case-insensitive email
//! 4. phone, compared on digits only
//!
//! Every tie (several stores sharing a name, email, phone, or top fuzzy
//! score) resolves to the lowest store id, so a given database state always
//! produces the same match.
//!
//! Fuzzy candidates are read from the repository once per matcher and then
//! kept current through [`StoreMatcher::remember_store`].

use orderdesk_core::{
    normalize_company_name, phone_digits, BillingInfo, OrderRepository, StoreCandidate,
    StoreRecord, DEFAULT_FUZZY_THRESHOLD,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    ExactName,
    FuzzyName,
    Email,
    Phone,
    None,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMethod::ExactName => write!(f, "exact_name"),
            MatchMethod::FuzzyName => write!(f, "fuzzy_name"),
            MatchMethod::Email => write!(f, "email"),
            MatchMethod::Phone => write!(f, "phone"),
            MatchMethod::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    pub store_id: Option<i64>,
    pub method: MatchMethod,
    /// Similarity score; only set for [`MatchMethod::FuzzyName`].
    pub confidence: Option<f64>,
}

impl MatchResult {
    fn found(store_id: i64, method: MatchMethod) -> Self {
        Self {
            store_id: Some(store_id),
            method,
            confidence: None,
        }
    }

    #[must_use]
    pub fn none() -> Self {
        Self {
            store_id: None,
            method: MatchMethod::None,
            confidence: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatcherConfig {
    /// Minimum [`similarity`] for a fuzzy name match, in `[0, 1]`.
    pub fuzzy_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

/// Similarity of two normalized company names in `[0, 1]`.
///
/// Tokens are sorted before comparison so word order does not matter, then
/// scored with Jaro-Winkler. The pair is ordered before scoring, which makes
/// the function symmetric.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = sorted_tokens(a);
    let b = sorted_tokens(b);
    let (first, second) = if a <= b { (&a, &b) } else { (&b, &a) };
    strsim::jaro_winkler(first, second)
}

fn sorted_tokens(name: &str) -> String {
    let mut tokens: Vec<&str> = name.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

pub struct StoreMatcher {
    config: MatcherConfig,
    candidates: Option<Vec<StoreCandidate>>,
}

impl StoreMatcher {
    #[must_use]
    pub fn new(config: MatcherConfig) -> Self {
        Self {
            config,
            candidates: None,
        }
    }

    /// Add a store written after the candidate list was loaded, such as a
    /// lead created earlier in the run.
    pub fn remember_store(&mut self, id: i64, normalized_name: &str) {
        if let Some(candidates) = self.candidates.as_mut() {
            if !candidates.iter().any(|c| c.id == id) {
                candidates.push(StoreCandidate {
                    id,
                    normalized_name: normalized_name.to_string(),
                });
            }
        }
    }

    async fn candidates<R: OrderRepository>(
        &mut self,
        repo: &mut R,
    ) -> Result<&[StoreCandidate], R::Error> {
        if self.candidates.is_none() {
            let loaded = repo.list_store_candidates().await?;
            tracing::debug!(candidates = loaded.len(), "loaded fuzzy match candidates");
            self.candidates = Some(loaded);
        }
        Ok(self.candidates.as_deref().unwrap_or_default())
    }

    /// Run the strategies in order against `repo`.
    ///
    /// Strategies whose input field is blank are skipped.
    ///
    /// # Errors
    ///
    /// Propagates any repository error unchanged.
    pub async fn match_store<R: OrderRepository>(
        &mut self,
        repo: &mut R,
        billing: &BillingInfo,
    ) -> Result<MatchResult, R::Error> {
        let normalized = billing
            .company
            .as_deref()
            .map(normalize_company_name)
            .filter(|n| !n.is_empty());

        if let Some(name) = normalized.as_deref() {
            let exact = repo.find_stores_by_normalized_name(name).await?;
            if let Some(id) = lowest_id(&exact) {
                return Ok(MatchResult::found(id, MatchMethod::ExactName));
            }

            let threshold = self.config.fuzzy_threshold;
            let best = best_fuzzy(name, self.candidates(repo).await?);
            if let Some((id, score)) = best {
                if score >= threshold {
                    return Ok(MatchResult {
                        store_id: Some(id),
                        method: MatchMethod::FuzzyName,
                        confidence: Some(score),
                    });
                }
                tracing::debug!(
                    company = name,
                    best_store_id = id,
                    score,
                    threshold,
                    "fuzzy name below threshold"
                );
            }
        }

        if let Some(email) = billing.email.as_deref() {
            let by_email = repo.find_stores_by_email(&email.to_lowercase()).await?;
            if let Some(id) = lowest_id(&by_email) {
                return Ok(MatchResult::found(id, MatchMethod::Email));
            }
        }

        let digits = billing.phone.as_deref().map(phone_digits);
        if let Some(digits) = digits.filter(|d| !d.is_empty()) {
            let by_phone = repo.find_stores_by_phone_digits(&digits).await?;
            if let Some(id) = lowest_id(&by_phone) {
                return Ok(MatchResult::found(id, MatchMethod::Phone));
            }
        }

        Ok(MatchResult::none())
    }
}

fn lowest_id(stores: &[StoreRecord]) -> Option<i64> {
    stores.iter().map(|s| s.id).min()
}

/// Highest-scoring candidate, ties broken by lowest id.
#[allow(clippy::float_cmp)]
fn best_fuzzy(name: &str, candidates: &[StoreCandidate]) -> Option<(i64, f64)> {
    let mut best: Option<(i64, f64)> = None;

    for candidate in candidates {
        if candidate.normalized_name.is_empty() {
            continue;
        }
        let score = similarity(name, &candidate.normalized_name);
        best = match best {
            Some((best_id, best_score))
                if best_score > score || (best_score == score && best_id < candidate.id) =>
            {
                Some((best_id, best_score))
            }
            _ => Some((candidate.id, score)),
        };
    }

    best
}

#[cfg(test)]
#[path = "matcher_test.rs"]
mod tests;
