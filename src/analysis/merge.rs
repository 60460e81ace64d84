use super::types::{AnalysisOutcome, DetectedItem};

/// Deduplicates the findings of two outcomes into one.
///
/// Items with the same case-insensitive name and the same category are
/// collapsed, keeping the higher-confidence one at the position of the
/// first occurrence. The calls ran concurrently, so the merged processing
/// time is the longer of the two rather than their sum.
pub fn merge_outcomes(first: &AnalysisOutcome, second: &AnalysisOutcome) -> AnalysisOutcome {
    let items = merge_items(first.items.iter().chain(second.items.iter()).cloned());
    let success = first.success || second.success;

    let error = if success {
        None
    } else {
        let messages: Vec<&str> = [&first.error, &second.error]
            .into_iter()
            .filter_map(|e| e.as_deref())
            .collect();
        Some(if messages.is_empty() {
            "Analysis failed".to_string()
        } else {
            messages.join("; ")
        })
    };

    AnalysisOutcome {
        success,
        items,
        processing_time: first.processing_time.max(second.processing_time),
        completed_at: first.completed_at.max(second.completed_at),
        error,
    }
}

pub fn merge_items(items: impl IntoIterator<Item = DetectedItem>) -> Vec<DetectedItem> {
    let mut accepted: Vec<DetectedItem> = Vec::new();

    for item in items {
        match accepted.iter_mut().find(|kept| kept.is_same_finding(&item)) {
            Some(kept) => {
                if item.confidence > kept.confidence {
                    *kept = item;
                }
            }
            None => accepted.push(item),
        }
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn outcome(items: Vec<DetectedItem>, millis: u64) -> AnalysisOutcome {
        AnalysisOutcome::succeeded(items, Duration::from_millis(millis))
    }

    #[test]
    fn test_keeps_higher_confidence_duplicate() {
        let google = outcome(vec![DetectedItem::new("Cat", "Animal", 0.8)], 10);
        let amazon = outcome(vec![DetectedItem::new("cat", "Animal", 0.9)], 20);

        let merged = merge_outcomes(&google, &amazon);
        assert_eq!(merged.items.len(), 1);
        assert_eq!(merged.items[0].confidence, 0.9);
        assert_eq!(merged.items[0].name, "cat");
    }

    #[test]
    fn test_lower_confidence_duplicate_is_dropped() {
        let google = outcome(vec![DetectedItem::new("Cat", "Animal", 0.95)], 10);
        let amazon = outcome(vec![DetectedItem::new("CAT", "Animal", 0.5)], 10);

        let merged = merge_outcomes(&google, &amazon);
        assert_eq!(merged.items, vec![DetectedItem::new("Cat", "Animal", 0.95)]);
    }

    #[test]
    fn test_different_category_is_not_a_duplicate() {
        let google = outcome(
            vec![
                DetectedItem::new("Apple", "Food", 0.7),
                DetectedItem::new("Tree", "Plant", 0.6),
            ],
            10,
        );
        let amazon = outcome(
            vec![
                DetectedItem::new("apple", "Brand", 0.4),
                DetectedItem::new("tree", "Plant", 0.8),
            ],
            10,
        );

        let merged = merge_outcomes(&google, &amazon);
        let names: Vec<(&str, &str)> = merged
            .items
            .iter()
            .map(|i| (i.name.as_str(), i.category.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![("Apple", "Food"), ("tree", "Plant"), ("apple", "Brand")]
        );
    }

    #[test]
    fn test_processing_time_is_max_and_success_is_or() {
        let google = outcome(vec![], 120);
        let amazon = AnalysisOutcome::failed("throttled", Duration::from_millis(300));

        let merged = merge_outcomes(&google, &amazon);
        assert_eq!(merged.processing_time, Duration::from_millis(300));
        assert!(merged.success);
        assert!(merged.error.is_none());
    }

    #[test]
    fn test_both_failed_keeps_messages() {
        let google = AnalysisOutcome::failed("bad key", Duration::ZERO);
        let amazon = AnalysisOutcome::failed("throttled", Duration::ZERO);

        let merged = merge_outcomes(&google, &amazon);
        assert!(!merged.success);
        assert_eq!(merged.error.as_deref(), Some("bad key; throttled"));
    }
}
