//! Aggregate rating figures for a product page.

use royshop_core::Rating;

use crate::gateway::Review;

/// Rating summary over a set of reviews.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReviewStats {
    /// Mean rating rounded to one decimal, `0.0` without reviews.
    pub average: f64,
    pub total: usize,
    /// Count per star, index 0 is one star.
    pub distribution: [usize; 5],
}

impl ReviewStats {
    #[must_use]
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut distribution = [0usize; 5];
        let mut sum = 0u64;

        for review in reviews {
            let stars = review.rating.stars();
            sum += u64::from(stars);
            if let Some(slot) = distribution.get_mut(usize::from(stars) - 1) {
                *slot += 1;
            }
        }

        let total = reviews.len();
        #[allow(clippy::cast_precision_loss)] // review counts stay far below 2^52
        let average = if total == 0 {
            0.0
        } else {
            (sum as f64 / total as f64 * 10.0).round() / 10.0
        };

        Self {
            average,
            total,
            distribution,
        }
    }

    /// Number of reviews with exactly `rating` stars.
    #[must_use]
    pub fn count_for(&self, rating: Rating) -> usize {
        self.distribution
            .get(usize::from(rating.stars()) - 1)
            .copied()
            .unwrap_or(0)
    }

    /// Share of reviews with `rating` stars, in percent.
    #[must_use]
    pub fn percent_for(&self, rating: Rating) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let percent = self.count_for(rating) as f64 * 100.0 / self.total as f64;
        percent
    }
}

/// The `limit` newest reviews. Input is expected newest first.
#[must_use]
pub fn recent(reviews: &[Review], limit: usize) -> &[Review] {
    reviews.split_at(limit.min(reviews.len())).0
}

/// Reviews with exactly `rating` stars.
pub fn by_rating(reviews: &[Review], rating: Rating) -> impl Iterator<Item = &Review> {
    reviews.iter().filter(move |r| r.rating == rating)
}
