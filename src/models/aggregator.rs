//! Confidence-weighted voting for the multi-model ensemble

use crate::models::labels::SentimentLabel;
use crate::types::prediction::{EnsembleResult, NormalizedPrediction};

/// Multiplier applied when every surviving model agrees.
pub const UNANIMITY_BONUS: f64 = 1.1;

/// Ceiling for a boosted confidence.
pub const MAX_CONFIDENCE: f64 = 0.99;

/// Accumulated weight for one label.
#[derive(Debug, Clone)]
struct LabelVote {
    label: SentimentLabel,
    weight: f64,
    confidences: Vec<f64>,
}

/// Combines per-model predictions into one ensemble result.
#[derive(Debug, Clone)]
pub struct VoteAggregator {
    unanimity_bonus: f64,
    max_confidence: f64,
}

impl VoteAggregator {
    /// Create an aggregator with the standard bonus and ceiling.
    pub fn new() -> Self {
        Self {
            unanimity_bonus: UNANIMITY_BONUS,
            max_confidence: MAX_CONFIDENCE,
        }
    }

    /// Aggregate predictions given in model-invocation order.
    ///
    /// Returns `None` when there is nothing to vote on. A single prediction is
    /// returned unchanged. Otherwise each label's weight is the sum of the
    /// confidences voting for it; the heaviest label wins, and on an exact tie
    /// the label that was voted for first wins. The final confidence is the
    /// mean over the winning voters only, boosted when the vote is unanimous.
    pub fn aggregate(&self, predictions: &[NormalizedPrediction]) -> Option<EnsembleResult> {
        match predictions {
            [] => None,
            [single] => Some(EnsembleResult {
                label: single.label.clone(),
                confidence: single.confidence,
            }),
            _ => {
                let votes = Self::tally(predictions);
                let unanimous = votes.len() == 1;

                let winner = votes
                    .into_iter()
                    .reduce(|best, vote| if vote.weight > best.weight { vote } else { best })?;

                let mut confidence =
                    winner.confidences.iter().sum::<f64>() / winner.confidences.len() as f64;

                if unanimous {
                    confidence = (confidence * self.unanimity_bonus).min(self.max_confidence);
                }

                Some(EnsembleResult {
                    label: winner.label,
                    confidence,
                })
            }
        }
    }

    /// Sum confidences per label, keeping first-seen order.
    fn tally(predictions: &[NormalizedPrediction]) -> Vec<LabelVote> {
        let mut votes: Vec<LabelVote> = Vec::new();

        for prediction in predictions {
            match votes.iter_mut().find(|v| v.label == prediction.label) {
                Some(vote) => {
                    vote.weight += prediction.confidence;
                    vote.confidences.push(prediction.confidence);
                }
                None => votes.push(LabelVote {
                    label: prediction.label.clone(),
                    weight: prediction.confidence,
                    confidences: vec![prediction.confidence],
                }),
            }
        }

        votes
    }
}

impl Default for VoteAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(label: SentimentLabel, confidence: f64) -> NormalizedPrediction {
        NormalizedPrediction::new(label, confidence)
    }

    #[test]
    fn test_empty_predictions() {
        let aggregator = VoteAggregator::new();
        assert!(aggregator.aggregate(&[]).is_none());
    }

    #[test]
    fn test_single_prediction_unchanged() {
        let aggregator = VoteAggregator::new();
        let result = aggregator
            .aggregate(&[vote(SentimentLabel::Neutral, 0.97)])
            .unwrap();

        assert_eq!(result.label, SentimentLabel::Neutral);
        assert_eq!(result.confidence, 0.97);
    }

    #[test]
    fn test_unanimous_bonus() {
        let aggregator = VoteAggregator::new();
        let result = aggregator
            .aggregate(&[
                vote(SentimentLabel::Positive, 0.8),
                vote(SentimentLabel::Positive, 0.9),
            ])
            .unwrap();

        // mean 0.85 * 1.1 = 0.935
        assert_eq!(result.label, SentimentLabel::Positive);
        assert!((result.confidence - 0.935).abs() < 1e-9);
    }

    #[test]
    fn test_unanimous_bonus_capped() {
        let aggregator = VoteAggregator::new();
        let result = aggregator
            .aggregate(&[
                vote(SentimentLabel::Negative, 0.95),
                vote(SentimentLabel::Negative, 0.99),
                vote(SentimentLabel::Negative, 1.0),
            ])
            .unwrap();

        assert_eq!(result.label, SentimentLabel::Negative);
        assert_eq!(result.confidence, MAX_CONFIDENCE);
    }

    #[test]
    fn test_split_vote_weighted() {
        let aggregator = VoteAggregator::new();
        let result = aggregator
            .aggregate(&[
                vote(SentimentLabel::Positive, 0.9),
                vote(SentimentLabel::Negative, 0.95),
                vote(SentimentLabel::Positive, 0.6),
            ])
            .unwrap();

        // Positive weight 1.5 beats Negative 0.95; confidence = mean(0.9, 0.6)
        assert_eq!(result.label, SentimentLabel::Positive);
        assert!((result.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_beats_headcount() {
        let aggregator = VoteAggregator::new();
        let result = aggregator
            .aggregate(&[
                vote(SentimentLabel::Positive, 0.3),
                vote(SentimentLabel::Positive, 0.3),
                vote(SentimentLabel::Negative, 0.9),
            ])
            .unwrap();

        // No bonus: the vote was split
        assert_eq!(result.label, SentimentLabel::Negative);
        assert!((result.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_tie_goes_to_first_voted_label() {
        let aggregator = VoteAggregator::new();

        let result = aggregator
            .aggregate(&[
                vote(SentimentLabel::Negative, 0.5),
                vote(SentimentLabel::Positive, 0.5),
            ])
            .unwrap();
        assert_eq!(result.label, SentimentLabel::Negative);

        let result = aggregator
            .aggregate(&[
                vote(SentimentLabel::Positive, 0.5),
                vote(SentimentLabel::Negative, 0.5),
            ])
            .unwrap();
        assert_eq!(result.label, SentimentLabel::Positive);
    }

    #[test]
    fn test_passthrough_labels_vote() {
        let aggregator = VoteAggregator::new();
        let result = aggregator
            .aggregate(&[
                vote(SentimentLabel::normalize("mixed"), 0.7),
                vote(SentimentLabel::normalize("Mixed"), 0.6),
                vote(SentimentLabel::Neutral, 0.8),
            ])
            .unwrap();

        assert_eq!(result.label.as_str(), "Mixed");
        assert!((result.confidence - 0.65).abs() < 1e-9);
    }
}
