//! Document height measurement.

use serde::{Deserialize, Serialize};

/// The six height metrics the reporter considers.
///
/// Browsers disagree on which of these tracks content height, so the
/// reporter takes the largest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentMetrics {
    /// `document.documentElement.clientHeight`.
    pub root_client: f64,
    /// `document.documentElement.scrollHeight`.
    pub root_scroll: f64,
    /// `document.documentElement.offsetHeight`.
    pub root_offset: f64,
    /// `document.body.clientHeight`.
    pub body_client: f64,
    /// `document.body.scrollHeight`.
    pub body_scroll: f64,
    /// `document.body.offsetHeight`.
    pub body_offset: f64,
}

impl DocumentMetrics {
    /// Metrics where every value is `height`.
    pub const fn uniform(height: f64) -> Self {
        Self {
            root_client: height,
            root_scroll: height,
            root_offset: height,
            body_client: height,
            body_scroll: height,
            body_offset: height,
        }
    }

    /// Largest finite metric, or `None` if no metric is finite and positive.
    pub fn height(&self) -> Option<f64> {
        [
            self.root_client,
            self.root_scroll,
            self.root_offset,
            self.body_client,
            self.body_scroll,
            self.body_offset,
        ]
        .into_iter()
        .filter(|h| h.is_finite() && *h > 0.0)
        .reduce(f64::max)
    }
}

/// Source of fresh document metrics.
pub trait DocumentMeasure {
    /// Measure the document now.
    fn measure(&self) -> DocumentMetrics;
}

impl DocumentMeasure for DocumentMetrics {
    fn measure(&self) -> DocumentMetrics {
        *self
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn takes_the_largest_metric() {
        let metrics = DocumentMetrics {
            root_client: 600.0,
            body_scroll: 1_240.5,
            body_offset: 1_200.0,
            ..DocumentMetrics::default()
        };
        assert_eq!(metrics.height(), Some(1_240.5));
    }

    #[test]
    fn ignores_non_finite_metrics() {
        let metrics =
            DocumentMetrics { root_scroll: f64::NAN, body_client: 700.0, ..DocumentMetrics::default() };
        assert_eq!(metrics.height(), Some(700.0));
        assert_eq!(DocumentMetrics::default().height(), None);
    }

    fn metric() -> impl Strategy<Value = f64> {
        prop_oneof![
            8 => -100.0f64..5_000.0,
            1 => Just(f64::NAN),
            1 => Just(f64::INFINITY),
        ]
    }

    proptest! {
        #[test]
        fn prop_height_is_a_positive_finite_metric(values in prop::array::uniform6(metric())) {
            let [root_client, root_scroll, root_offset, body_client, body_scroll, body_offset] =
                values;
            let metrics = DocumentMetrics {
                root_client,
                root_scroll,
                root_offset,
                body_client,
                body_scroll,
                body_offset,
            };

            let usable: Vec<f64> =
                values.iter().copied().filter(|h| h.is_finite() && *h > 0.0).collect();
            match metrics.height() {
                Some(height) => {
                    prop_assert!(height.is_finite() && height > 0.0);
                    prop_assert!(values.contains(&height));
                    prop_assert!(usable.iter().all(|h| *h <= height));
                },
                None => prop_assert!(usable.is_empty()),
            }
        }
    }
}
