//! Invalidation rules
//!
//! Cross-resource cascades declared as data: one row per resource.

use super::route::path_segments;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationRule {
    /// Path segment after `/api`, e.g. `service-fees`.
    pub resource: &'static str,
    /// Prefix of named operations, e.g. `service_fee` in `service_fee_update`.
    pub singular: &'static str,
    pub collection: &'static [&'static str],
    pub item: &'static [&'static str],
    pub cascade: &'static [&'static str],
}

impl InvalidationRule {
    /// Collection patterns followed by the cascade, duplicates removed.
    pub fn collection_patterns(&self) -> Vec<String> {
        merge(self.collection, self.cascade)
    }

    /// Item patterns followed by the cascade, duplicates removed.
    pub fn item_patterns(&self) -> Vec<String> {
        merge(self.item, self.cascade)
    }
}

fn merge(own: &[&str], cascade: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(own.len() + cascade.len());
    for pattern in own.iter().chain(cascade) {
        if !out.iter().any(|p| p == pattern) {
            out.push(pattern.to_string());
        }
    }
    out
}

pub fn default_rules() -> Vec<InvalidationRule> {
    vec![
        InvalidationRule {
            resource: "meters",
            singular: "meter",
            collection: &["meters*"],
            item: &["meters*", "meter:*", "meter_balance:*", "meter_consumption:*"],
            cascade: &["properties*"],
        },
        InvalidationRule {
            resource: "properties",
            singular: "property",
            collection: &["properties*"],
            item: &["properties*", "property:*"],
            cascade: &["meters*"],
        },
        InvalidationRule {
            resource: "tariffs",
            singular: "tariff",
            collection: &["tariffs*"],
            item: &["tariffs*", "tariff:*"],
            cascade: &[],
        },
        InvalidationRule {
            resource: "service-fees",
            singular: "service_fee",
            collection: &["service-fees*"],
            item: &["service-fees*", "service-fee:*"],
            cascade: &[],
        },
        InvalidationRule {
            resource: "users",
            singular: "user",
            collection: &["users*"],
            item: &["users*", "user:*"],
            cascade: &[],
        },
        InvalidationRule {
            resource: "payments",
            singular: "payment",
            collection: &["payment*"],
            item: &["payment*"],
            cascade: &["meter*"],
        },
    ]
}

/// Patterns for a mutated route: the collection route yields collection
/// patterns, anything deeper yields item patterns.
pub fn patterns_for_path(rules: &[InvalidationRule], path: &str) -> Vec<String> {
    let segments: Vec<&str> = path_segments(path).collect();
    let (Some(&"api"), Some(resource)) = (segments.first(), segments.get(1)) else {
        return Vec::new();
    };

    match rules.iter().find(|rule| rule.resource == *resource) {
        Some(rule) if segments.len() == 2 => rule.collection_patterns(),
        Some(rule) => rule.item_patterns(),
        None => Vec::new(),
    }
}

/// Patterns for a named operation such as `meter_topup` or `service_fee_update`.
pub fn patterns_for_operation(rules: &[InvalidationRule], operation: &str) -> Vec<String> {
    let Some((singular, action)) = operation.rsplit_once('_') else {
        return Vec::new();
    };

    match rules.iter().find(|rule| rule.singular == singular) {
        Some(rule) if action == "create" => rule.collection_patterns(),
        Some(rule) if !action.is_empty() => rule.item_patterns(),
        _ => Vec::new(),
    }
}
