//! Seen-offer store.
//!
//! Remembers every offer identity reported during the life of the process so
//! the same listing is announced at most once. Entries are never evicted.

use std::collections::HashSet;

use crate::models::Offer;

/// Identities already reported, with the snapshot that introduced each.
#[derive(Debug, Default, Clone)]
pub struct SeenOffers {
    /// Identities in `order`
    index: HashSet<String>,
    /// Snapshots in insertion order
    order: Vec<Offer>,
}

impl SeenOffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the offer if its identity is unseen.
    ///
    /// Returns `true` the first time an identity is offered and `false` on
    /// every later call with the same identity.
    pub fn is_new(&mut self, offer: &Offer) -> bool {
        if !self.index.insert(offer.identity.clone()) {
            return false;
        }
        self.order.push(offer.clone());
        true
    }

    /// Whether an identity was already reported.
    pub fn contains(&self, identity: &str) -> bool {
        self.index.contains(identity)
    }

    /// The last `n` offers inserted, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Offer> {
        let start = self.order.len().saturating_sub(n);
        self.order[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_offer(id: &str) -> Offer {
        Offer {
            identity: id.to_string(),
            title: format!("Offer {id}"),
            price: 100,
            link: format!("https://example.com/lots/{id}"),
            category: "Test".into(),
            seller_online: true,
        }
    }

    #[test]
    fn test_new_identity_once() {
        let mut seen = SeenOffers::new();
        let offer = make_offer("001");

        assert!(seen.is_new(&offer));
        assert!(!seen.is_new(&offer));
        assert!(!seen.is_new(&offer));
        assert_eq!(seen.len(), 1);
        assert!(seen.contains("001"));
    }

    #[test]
    fn test_same_identity_different_snapshot_is_not_new() {
        let mut seen = SeenOffers::new();
        let first = make_offer("001");
        let mut changed = make_offer("001");
        changed.title = "Changed".into();

        assert!(seen.is_new(&first));
        assert!(!seen.is_new(&changed));
        assert_eq!(seen.recent(1)[0].title, "Offer 001");
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_interleaved_sequence() {
        let mut seen = SeenOffers::new();
        let ids = ["a", "b", "a", "c", "b", "a", "d"];
        let results: Vec<bool> = ids.iter().map(|id| seen.is_new(&make_offer(id))).collect();

        assert_eq!(results, vec![true, true, false, true, false, false, true]);
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_recent_in_insertion_order() {
        let mut seen = SeenOffers::new();
        for id in ["001", "002", "003", "004"] {
            seen.is_new(&make_offer(id));
        }

        let recent: Vec<String> = seen.recent(2).into_iter().map(|o| o.identity).collect();
        assert_eq!(recent, vec!["003", "004"]);
        assert_eq!(seen.recent(10).len(), 4);
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_empty() {
        let seen = SeenOffers::new();
        assert!(seen.is_empty());
        assert!(seen.recent(5).is_empty());
    }
}
