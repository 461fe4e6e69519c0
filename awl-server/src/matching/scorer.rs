//! Confidence model
//!
//! Scores a catalog candidate against a local title. The score starts at the
//! weight of the strategy that found the candidate and collects bonuses for
//! title agreement, release year and format, capped at 1.0.

use super::normalizer::clean_title;
use crate::models::{CatalogEntry, MediaFormat};

/// Minimum confidence for a candidate to count as a match
pub const MIN_CONFIDENCE: f64 = 0.5;

const EXACT_TITLE_BONUS: f64 = 0.3;
const PARTIAL_TITLE_BONUS: f64 = 0.2;
const EXACT_YEAR_BONUS: f64 = 0.2;
const ADJACENT_YEAR_BONUS: f64 = 0.1;
const FORMAT_BONUS: f64 = 0.1;

/// Title agreement between the cleaned input and the candidate's titles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleAgreement {
    Exact,
    Partial,
    None,
}

/// Compare the cleaned local title against English and romanized titles
///
/// Case-insensitive. Blank candidate titles never agree.
pub fn title_agreement(raw_title: &str, candidate: &CatalogEntry) -> TitleAgreement {
    let local = clean_title(raw_title).to_lowercase();
    if local.is_empty() {
        return TitleAgreement::None;
    }

    let titles: Vec<String> = candidate.known_titles().map(str::to_lowercase).collect();

    if titles.iter().any(|t| *t == local) {
        TitleAgreement::Exact
    } else if titles
        .iter()
        .any(|t| t.contains(local.as_str()) || local.contains(t.as_str()))
    {
        TitleAgreement::Partial
    } else {
        TitleAgreement::None
    }
}

fn year_bonus(year: Option<i32>, candidate_year: Option<i32>) -> f64 {
    match (year, candidate_year) {
        (Some(y), Some(c)) if y == c => EXACT_YEAR_BONUS,
        (Some(y), Some(c)) if (y - c).abs() == 1 => ADJACENT_YEAR_BONUS,
        _ => 0.0,
    }
}

fn format_bonus(raw_title: &str, format: Option<MediaFormat>) -> f64 {
    let mentions_movie = raw_title.to_lowercase().contains("movie");
    match format {
        Some(MediaFormat::Movie) if mentions_movie => FORMAT_BONUS,
        Some(MediaFormat::Tv) if !mentions_movie => FORMAT_BONUS,
        _ => 0.0,
    }
}

/// Confidence in [0, 1] that `candidate` is the show titled `raw_title`
pub fn score_candidate(
    raw_title: &str,
    year: Option<i32>,
    candidate: &CatalogEntry,
    strategy_weight: f64,
) -> f64 {
    let mut confidence = strategy_weight.max(0.0);

    confidence += match title_agreement(raw_title, candidate) {
        TitleAgreement::Exact => EXACT_TITLE_BONUS,
        TitleAgreement::Partial => PARTIAL_TITLE_BONUS,
        TitleAgreement::None => 0.0,
    };
    confidence += year_bonus(year, candidate.season_year);
    confidence += format_bonus(raw_title, candidate.format);

    confidence.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_exact_title_and_year_saturates() {
        let entry = CatalogEntry::new(16498, "Shingeki no Kyojin")
            .with_english("Attack on Titan")
            .with_year(2013)
            .with_format(MediaFormat::Tv);
        assert!(approx(score_candidate("Attack on Titan", Some(2013), &entry, 1.0), 1.0));
    }

    #[test]
    fn test_bonuses_accumulate_from_weight() {
        // 0.5 weight + 0.3 exact (romaji, case-insensitive) = 0.8
        let entry = CatalogEntry::new(457, "Mushishi");
        assert!(approx(score_candidate("MUSHISHI", None, &entry, 0.5), 0.8));
    }

    #[test]
    fn test_partial_title_is_exclusive_with_exact() {
        let entry = CatalogEntry::new(1, "Mushishi Zoku Shou");
        assert_eq!(title_agreement("Mushishi", &entry), TitleAgreement::Partial);
        assert!(approx(score_candidate("Mushishi", None, &entry, 0.5), 0.7));

        // Input containing the candidate also counts
        let entry = CatalogEntry::new(2, "Mushishi");
        assert_eq!(
            title_agreement("Mushishi Special Edition", &entry),
            TitleAgreement::Partial
        );
    }

    #[test]
    fn test_title_compared_after_cleaning() {
        let entry = CatalogEntry::new(3, "Yuru Camp");
        assert_eq!(title_agreement("Eiga Yuru Camp", &entry), TitleAgreement::Exact);
    }

    #[test]
    fn test_blank_candidate_title_never_matches() {
        let mut entry = CatalogEntry::new(4, "");
        entry.title_english = Some(String::new());
        assert_eq!(title_agreement("Anything", &entry), TitleAgreement::None);
    }

    #[test]
    fn test_year_bonus() {
        assert!(approx(year_bonus(Some(2013), Some(2013)), 0.2));
        assert!(approx(year_bonus(Some(2013), Some(2014)), 0.1));
        assert!(approx(year_bonus(Some(2013), Some(2012)), 0.1));
        assert!(approx(year_bonus(Some(2013), Some(2015)), 0.0));
        assert!(approx(year_bonus(None, Some(2013)), 0.0));
        assert!(approx(year_bonus(Some(2013), None), 0.0));
    }

    #[test]
    fn test_format_bonus() {
        assert!(approx(format_bonus("K-On! Movie", Some(MediaFormat::Movie)), 0.1));
        assert!(approx(format_bonus("K-On! Movie", Some(MediaFormat::Tv)), 0.0));
        assert!(approx(format_bonus("K-On!", Some(MediaFormat::Tv)), 0.1));
        assert!(approx(format_bonus("K-On!", Some(MediaFormat::Movie)), 0.0));
        assert!(approx(format_bonus("K-On!", Some(MediaFormat::Ova)), 0.0));
        assert!(approx(format_bonus("K-On!", None), 0.0));
    }

    #[test]
    fn test_unrelated_candidate_keeps_weight() {
        let entry = CatalogEntry::new(5, "Cowboy Bebop").with_year(1998);
        assert!(approx(score_candidate("Totally Unknown Xyzzy123", Some(1899), &entry, 0.7), 0.7));
    }
}
