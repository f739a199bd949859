//! Comment sentiment labelling.
//!
//! Scoring sits behind the [`SentimentScorer`] trait. The default [`VaderScorer`] asks the
//! VADER analyzer from the `vader_sentiment` crate for the compound polarity of each
//! comment, so emoticons, capitalization and punctuation count the way VADER counts them.
//!
//! [`LexiconScorer`] is an alternative for comments written in Spanish, which VADER's
//! English lexicon mostly ignores. Every known word contributes its valence, intensifiers
//! strengthen the next word, a negation within the three preceding words flips and
//! dampens it, and words after a contrastive "pero"/"but" outweigh the ones before it. The
//! raw sum `s` is normalized to a compound score in [-1, 1] as `s / sqrt(s² + 15)`.
//!
//! Labels are computed on demand and never written back to the store.

use crate::{
    core::{OrderId, order::list_commented_orders},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::{collections::HashMap, fmt};
use tracing::debug;
use vader_sentiment::SentimentIntensityAnalyzer;

/// Normalization constant of the compound score.
const ALPHA: f64 = 15.0;
/// Added to a word's magnitude by a preceding intensifier.
const BOOSTER_INCREMENT: f64 = 0.293;
/// Factor applied to a negated word.
const NEGATION_SCALAR: f64 = -0.74;
/// Added to the magnitude per exclamation mark, up to four of them.
const EXCLAMATION_INCREMENT: f64 = 0.292;
/// How many preceding words are searched for a negation.
const NEGATION_WINDOW: usize = 3;

const LEXICON: &[(&str, f64)] = &[
    // Spanish, positive
    ("excelente", 3.2),
    ("excelentes", 3.2),
    ("delicioso", 3.0),
    ("deliciosa", 3.0),
    ("deliciosos", 3.0),
    ("deliciosas", 3.0),
    ("rico", 2.3),
    ("rica", 2.3),
    ("ricos", 2.3),
    ("ricas", 2.3),
    ("sabroso", 2.5),
    ("sabrosos", 2.5),
    ("bueno", 1.9),
    ("buena", 1.9),
    ("buenos", 1.9),
    ("buenas", 1.9),
    ("bien", 1.5),
    ("mejor", 2.0),
    ("genial", 3.0),
    ("perfecto", 2.8),
    ("perfecta", 2.8),
    ("increíble", 2.8),
    ("encantó", 2.9),
    ("encantaron", 2.9),
    ("amable", 2.0),
    ("amables", 2.0),
    ("puntual", 1.8),
    ("puntuales", 1.8),
    ("recomendable", 2.2),
    ("recomiendo", 2.0),
    ("gracias", 1.9),
    ("feliz", 2.2),
    ("satisfecho", 2.0),
    ("satisfecha", 2.0),
    ("fresco", 1.3),
    ("frescos", 1.3),
    ("abundante", 1.5),
    // Spanish, negative
    ("malo", -2.5),
    ("mala", -2.5),
    ("malos", -2.5),
    ("mal", -2.5),
    ("peor", -2.9),
    ("pésimo", -3.3),
    ("pésima", -3.3),
    ("terrible", -3.4),
    ("horrible", -3.4),
    ("frío", -1.2),
    ("fría", -1.2),
    ("fríos", -1.2),
    ("frías", -1.2),
    ("tarde", -1.0),
    ("retraso", -1.6),
    ("impuntual", -2.0),
    ("grosero", -2.6),
    ("grosera", -2.6),
    ("sucio", -2.1),
    ("caro", -1.1),
    ("insípido", -2.0),
    ("insípida", -2.0),
    ("crudo", -1.5),
    ("quemado", -1.8),
    ("quemados", -1.8),
    ("decepcionante", -2.5),
    ("queja", -1.8),
    ("faltó", -1.2),
    ("faltaron", -1.2),
    ("triste", -2.1),
    // English
    ("excellent", 3.2),
    ("delicious", 3.0),
    ("great", 3.1),
    ("good", 1.9),
    ("best", 3.2),
    ("perfect", 2.8),
    ("amazing", 2.8),
    ("love", 3.2),
    ("loved", 2.9),
    ("friendly", 2.2),
    ("recommend", 1.5),
    ("thanks", 1.9),
    ("happy", 2.7),
    ("bad", -2.5),
    ("worst", -3.1),
    ("awful", -3.1),
    ("cold", -1.0),
    ("late", -1.0),
    ("delay", -1.4),
    ("rude", -2.0),
    ("dirty", -2.0),
    ("expensive", -1.1),
    ("disappointing", -2.2),
    ("complaint", -1.8),
    ("sad", -2.1),
];

const NEGATIONS: &[&str] = &[
    "no", "nunca", "jamás", "ni", "tampoco", "sin", "not", "never", "nor", "without", "isn",
    "wasn", "don", "didn", "doesn",
];

const BOOSTERS: &[&str] = &[
    "muy",
    "super",
    "súper",
    "bastante",
    "tan",
    "totalmente",
    "extremadamente",
    "very",
    "really",
    "so",
    "extremely",
    "totally",
];

const CONTRASTS: &[&str] = &["pero", "but"];

/// Sentiment of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentimentLabel {
    /// Compound score at or above the threshold
    Positive,
    /// Compound score at or below the negated threshold
    Negative,
    /// Anything in between
    Neutral,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
        })
    }
}

/// Maps a compound score to a label.
#[must_use]
pub fn classify(compound: f64, threshold: f64) -> SentimentLabel {
    if compound >= threshold {
        SentimentLabel::Positive
    } else if compound <= -threshold {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Anything that turns free text into a compound score in [-1, 1].
pub trait SentimentScorer {
    /// Compound polarity of `text`.
    fn compound(&self, text: &str) -> f64;
}

/// Which scorer the sentiment analysis uses, selected in `[analytics]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorerKind {
    /// [`VaderScorer`]
    #[default]
    Vader,
    /// [`LexiconScorer`]
    Lexicon,
}

impl ScorerKind {
    /// Builds the scorer this kind names.
    #[must_use]
    pub fn build(self) -> Box<dyn SentimentScorer> {
        match self {
            Self::Vader => Box::new(VaderScorer::new()),
            Self::Lexicon => Box::new(LexiconScorer::new()),
        }
    }
}

/// Compound score from the VADER analyzer.
pub struct VaderScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl VaderScorer {
    /// Scorer backed by VADER's bundled lexicon.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SentimentScorer for VaderScorer {
    fn compound(&self, text: &str) -> f64 {
        self.analyzer
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0)
    }
}

/// Valence-lexicon scorer for short Spanish or English comments.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    valences: HashMap<&'static str, f64>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self {
            valences: LEXICON.iter().copied().collect(),
        }
    }
}

impl LexiconScorer {
    /// Scorer with the bundled lexicon.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn word_valence(&self, words: &[String], index: usize) -> Option<f64> {
        let mut valence = *self.valences.get(words[index].as_str())?;

        if index > 0 && BOOSTERS.contains(&words[index - 1].as_str()) {
            valence += BOOSTER_INCREMENT.copysign(valence);
        }

        let window_start = index.saturating_sub(NEGATION_WINDOW);
        if words[window_start..index]
            .iter()
            .any(|word| NEGATIONS.contains(&word.as_str()))
        {
            valence *= NEGATION_SCALAR;
        }

        Some(valence)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn normalize(sum: f64) -> f64 {
    (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0)
}

impl SentimentScorer for LexiconScorer {
    fn compound(&self, text: &str) -> f64 {
        let words = tokenize(text);
        let contrast = words
            .iter()
            .position(|word| CONTRASTS.contains(&word.as_str()));

        let mut sum = 0.0;
        for index in 0..words.len() {
            let Some(valence) = self.word_valence(&words, index) else {
                continue;
            };
            sum += match contrast {
                Some(at) if index < at => valence * 0.5,
                Some(at) if index > at => valence * 1.5,
                _ => valence,
            };
        }

        if sum != 0.0 {
            let exclamations = text.chars().filter(|&c| c == '!').count().min(4);
            #[allow(clippy::cast_precision_loss)] // at most four
            let emphasis = EXCLAMATION_INCREMENT * exclamations as f64;
            sum += emphasis.copysign(sum);
        }

        normalize(sum)
    }
}

/// Sentiment of one commented order.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentSentiment {
    /// Order identifier
    pub id: OrderId,
    /// Requester name
    pub requester_name: String,
    /// Comment text
    pub comment: String,
    /// Compound score
    pub compound: f64,
    /// Label derived from the compound score
    pub label: SentimentLabel,
}

/// Labels every comment in the store. Nothing is persisted.
pub async fn analyze_comments<S: SentimentScorer + ?Sized>(
    db: &DatabaseConnection,
    scorer: &S,
    threshold: f64,
) -> Result<Vec<CommentSentiment>> {
    let commented = list_commented_orders(db).await?;
    if commented.is_empty() {
        return Err(Error::Analytics {
            analysis: "Sentiment analysis",
            message: "no order has a comment yet".to_string(),
        });
    }

    let results: Vec<CommentSentiment> = commented
        .into_iter()
        .map(|order| {
            let compound = scorer.compound(&order.comment);
            CommentSentiment {
                id: order.id,
                requester_name: order.requester_name,
                comment: order.comment,
                compound,
                label: classify(compound, threshold),
            }
        })
        .collect();

    let count = |label: SentimentLabel| results.iter().filter(|r| r.label == label).count();
    debug!(
        comments = results.len(),
        positive = count(SentimentLabel::Positive),
        negative = count(SentimentLabel::Negative),
        neutral = count(SentimentLabel::Neutral),
        "Labelled comments"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{core::order::set_comment, test_utils::*};

    fn label(text: &str) -> SentimentLabel {
        classify(LexiconScorer::new().compound(text), 0.05)
    }

    #[test]
    fn test_labels_for_typical_comments() {
        assert_eq!(
            label("Excelente servicio, muy rico todo"),
            SentimentLabel::Positive
        );
        assert_eq!(
            label("La comida llegó fría y tarde"),
            SentimentLabel::Negative
        );
        assert_eq!(label("Llegaron a las 6"), SentimentLabel::Neutral);
        assert_eq!(label("The tacos were great"), SentimentLabel::Positive);
    }

    #[test]
    fn test_negation_flips_polarity() {
        assert_eq!(label("no estuvo bueno"), SentimentLabel::Negative);
        assert_eq!(label("nunca llegaron tarde"), SentimentLabel::Positive);
    }

    #[test]
    fn test_booster_and_exclamation_strengthen_score() {
        let scorer = LexiconScorer::new();
        let plain = scorer.compound("bueno");
        assert!(scorer.compound("muy bueno") > plain);
        assert!(scorer.compound("bueno!!") > plain);
        assert!(scorer.compound("malo!!") < scorer.compound("malo"));
    }

    #[test]
    fn test_contrast_weights_the_second_clause() {
        assert_eq!(
            label("Buena comida pero llegaron tarde y fríos"),
            SentimentLabel::Negative
        );
    }

    #[test]
    fn test_compound_is_bounded() {
        let scorer = LexiconScorer::new();
        let text = "excelente ".repeat(50);
        let compound = scorer.compound(&text);
        assert!(compound <= 1.0);
        assert!(compound > 0.99);
        assert_eq!(scorer.compound(""), 0.0);
    }

    fn vader_label(text: &str) -> SentimentLabel {
        classify(VaderScorer::new().compound(text), 0.05)
    }

    #[test]
    fn test_vader_labels_english_comments() {
        assert_eq!(vader_label("Service was terrific"), SentimentLabel::Positive);
        assert_eq!(vader_label("Nice people, tasty tacos"), SentimentLabel::Positive);
        assert_eq!(vader_label("The food was terrible"), SentimentLabel::Negative);
        assert_eq!(vader_label("The tacos were not good"), SentimentLabel::Negative);
        assert_eq!(vader_label("The order arrived on Saturday"), SentimentLabel::Neutral);
    }

    #[test]
    fn test_vader_reads_emoticons_and_emphasis() {
        let scorer = VaderScorer::new();
        assert_eq!(vader_label("meh :("), SentimentLabel::Negative);
        assert_eq!(vader_label("see you then :)"), SentimentLabel::Positive);
        assert!(scorer.compound("GREAT tacos!!!") > scorer.compound("great tacos"));
    }

    #[test]
    fn test_scorer_kind_builds_matching_scorer() {
        let spanish = "Excelente servicio";
        assert!(ScorerKind::Lexicon.build().compound(spanish) > 0.05);
        assert_eq!(
            ScorerKind::Vader.build().compound("Service was terrific"),
            VaderScorer::new().compound("Service was terrific")
        );
        assert_eq!(ScorerKind::default(), ScorerKind::Vader);
    }

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(classify(0.05, 0.05), SentimentLabel::Positive);
        assert_eq!(classify(-0.05, 0.05), SentimentLabel::Negative);
        assert_eq!(classify(0.049, 0.05), SentimentLabel::Neutral);
        assert_eq!(classify(-0.049, 0.05), SentimentLabel::Neutral);
    }

    struct FixedScorer(f64);

    impl SentimentScorer for FixedScorer {
        fn compound(&self, _text: &str) -> f64 {
            self.0
        }
    }

    #[tokio::test]
    async fn test_analyze_comments_only_reads_commented_orders() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_order(&db, "Silent").await?;
        let happy = create_test_order(&db, "Happy").await?;
        let upset = create_test_order(&db, "Upset").await?;
        set_comment(&db, happy.order_id(), Some("Todo delicioso, gracias!")).await?;
        set_comment(&db, upset.order_id(), Some("Pésimo, llegaron tarde")).await?;

        let results = analyze_comments(&db, &LexiconScorer::new(), 0.05).await?;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, happy.order_id());
        assert_eq!(results[0].requester_name, "Happy");
        assert_eq!(results[0].label, SentimentLabel::Positive);
        assert_eq!(results[1].id, upset.order_id());
        assert_eq!(results[1].label, SentimentLabel::Negative);
        Ok(())
    }

    #[tokio::test]
    async fn test_analyze_comments_uses_threshold() -> Result<()> {
        let db = setup_test_db().await?;
        let order = create_test_order(&db, "Meh").await?;
        set_comment(&db, order.order_id(), Some("ok")).await?;

        let results = analyze_comments(&db, &FixedScorer(0.1), 0.2).await?;
        assert_eq!(results[0].compound, 0.1);
        assert_eq!(results[0].label, SentimentLabel::Neutral);
        Ok(())
    }

    #[tokio::test]
    async fn test_no_comments_is_analytics_error() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_order(&db, "Silent").await?;

        let result = analyze_comments(&db, &LexiconScorer::new(), 0.05).await;
        assert!(matches!(result, Err(Error::Analytics { .. })));
        Ok(())
    }
}
