//! # SKU Resolver
//!
//! Resolves an incoming SKU string to a canonical design code. Native
//! SKUs match a fixed regex directly; legacy SKUs go through a
//! maintained mapping table with exact/prefix/suffix/regex match types,
//! in that priority order. Resolutions are memoized the same way the
//! reference document assembler memoizes resolved photos: an
//! `Arc<RwLock<HashMap<...>>>` keyed on the input, invalidated whenever
//! the mapping table changes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;

use crate::error::{CoreError, CoreResult};

/// `^([A-Z]{4})([a-z])?-([0-9]{5})$`
fn native_pattern() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z]{4})([a-z])?-([0-9]{5})$").unwrap())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchType {
    Exact,
    Prefix,
    Suffix,
    Regex,
}

impl MatchType {
    fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "exact" => Ok(MatchType::Exact),
            "prefix" => Ok(MatchType::Prefix),
            "suffix" => Ok(MatchType::Suffix),
            "regex" => Ok(MatchType::Regex),
            other => Err(CoreError::InvalidMatchType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LegacyMapping {
    pub pattern: String,
    pub match_type: MatchType,
    pub canonical_code: String,
    pub config_number: Option<u32>,
    pub priority: i32,
    compiled: Option<Regex>,
}

impl LegacyMapping {
    pub fn new(
        pattern: impl Into<String>,
        match_type: MatchType,
        canonical_code: impl Into<String>,
        config_number: Option<u32>,
        priority: i32,
    ) -> CoreResult<Self> {
        let pattern = pattern.into();
        let compiled = if match_type == MatchType::Regex {
            Some(
                Regex::new(&pattern)
                    .map_err(|e| CoreError::CanonicalCodeMalformed(e.to_string()))?,
            )
        } else {
            None
        };
        Ok(Self {
            pattern,
            match_type,
            canonical_code: canonical_code.into(),
            config_number,
            priority,
            compiled,
        })
    }

    fn matches(&self, sku: &str) -> bool {
        match self.match_type {
            MatchType::Exact => sku == self.pattern,
            MatchType::Prefix => sku.starts_with(&self.pattern),
            MatchType::Suffix => sku.ends_with(&self.pattern),
            MatchType::Regex => self.compiled.as_ref().is_some_and(|re| re.is_match(sku)),
        }
    }
}

/// The result of resolving a SKU string.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub canonical_code: String,
    pub revision: Option<char>,
    pub is_legacy: bool,
    pub canonical_sku: String,
    pub original_sku: String,
    pub config_number: Option<u32>,
}

#[derive(Default)]
pub struct SkuResolver {
    mappings: RwLock<Vec<LegacyMapping>>,
    cache: Arc<RwLock<HashMap<String, Option<Resolution>>>>,
}

impl SkuResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a legacy mapping. Rejects a duplicate `(pattern, match_type)`
    /// key and invalidates the resolution cache.
    pub fn add_mapping(&self, mapping: LegacyMapping) -> CoreResult<()> {
        let mut mappings = self.mappings.write();
        if mappings
            .iter()
            .any(|m| m.pattern == mapping.pattern && m.match_type == mapping.match_type)
        {
            return Err(CoreError::DuplicateMapping {
                pattern: mapping.pattern,
                match_type: format!("{:?}", mapping.match_type),
            });
        }
        mappings.push(mapping);
        self.cache.write().clear();
        Ok(())
    }

    pub fn add_mapping_str(
        &self,
        pattern: impl Into<String>,
        match_type: &str,
        canonical_code: impl Into<String>,
        config_number: Option<u32>,
        priority: i32,
    ) -> CoreResult<()> {
        let match_type = MatchType::parse(match_type)?;
        let mapping = LegacyMapping::new(pattern, match_type, canonical_code, config_number, priority)?;
        self.add_mapping(mapping)
    }

    /// Resolve `sku` to a canonical design code. Native SKUs are
    /// resolved directly against the fixed regex; anything else is
    /// looked up in the legacy mapping table, in
    /// exact > prefix > suffix > regex priority, with the lowest
    /// `priority` value winning within a match type.
    pub fn resolve(&self, sku: &str) -> CoreResult<Option<Resolution>> {
        if let Some(cached) = self.cache.read().get(sku) {
            return Ok(cached.clone());
        }

        let resolution = self.resolve_uncached(sku);
        self.cache.write().insert(sku.to_string(), resolution.clone());
        Ok(resolution)
    }

    fn resolve_uncached(&self, sku: &str) -> Option<Resolution> {
        if let Some(caps) = native_pattern().captures(sku) {
            let code = caps.get(1).unwrap().as_str().to_string();
            let revision = caps.get(2).map(|m| m.as_str().chars().next().unwrap());
            let config_number = caps.get(3).and_then(|m| m.as_str().parse::<u32>().ok());
            return Some(Resolution {
                canonical_code: code,
                revision,
                is_legacy: false,
                canonical_sku: sku.to_string(),
                original_sku: sku.to_string(),
                config_number,
            });
        }

        let mappings = self.mappings.read();
        for match_type in [MatchType::Exact, MatchType::Prefix, MatchType::Suffix, MatchType::Regex] {
            let mut candidates: Vec<&LegacyMapping> = mappings
                .iter()
                .filter(|m| m.match_type == match_type && m.matches(sku))
                .collect();
            if candidates.is_empty() {
                continue;
            }
            candidates.sort_by_key(|m| m.priority);
            let winner = candidates[0];
            let revision: Option<char> = None;
            let rev_suffix = revision.map(String::from).unwrap_or_default();
            return Some(Resolution {
                canonical_code: winner.canonical_code.clone(),
                revision,
                is_legacy: true,
                canonical_sku: format!("{}{}-LEGAC", winner.canonical_code, rev_suffix),
                original_sku: sku.to_string(),
                config_number: winner.config_number,
            });
        }

        None
    }
}
