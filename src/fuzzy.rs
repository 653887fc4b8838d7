//! Edit-distance matching for fuzzy name lookups.

pub(crate) fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Levenshtein distance, giving up early once every cell of a row exceeds
/// `max_dist` (the returned value is then `max_dist + 1`).
pub(crate) fn levenshtein_with_max(value: &str, needle: &[char], max_dist: usize) -> usize {
    let n = needle.len();
    if n == 0 {
        return value.chars().count();
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];

    for (i, c) in value.chars().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for j in 1..=n {
            let cost = usize::from(c != needle[j - 1]);
            let d = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            curr[j] = d;
            row_min = row_min.min(d);
        }

        if row_min > max_dist {
            return max_dist + 1;
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Accumulates candidates and keeps only those at the minimal distance.
#[derive(Debug)]
pub(crate) struct FuzzyMatcher<T> {
    needle: Vec<char>,
    threshold: f64,
    best: Option<f64>,
    matches: Vec<T>,
}

impl<T: PartialEq> FuzzyMatcher<T> {
    pub(crate) fn new(query: &str, threshold: f64) -> Self {
        Self {
            needle: normalize_key(query).chars().collect(),
            threshold,
            best: None,
            matches: Vec::new(),
        }
    }

    /// Scores `text` (a label or identifier) for the candidate `item`.
    pub(crate) fn offer(&mut self, text: &str, item: T) {
        let key = normalize_key(text);
        let longest = key.chars().count().max(self.needle.len()).max(1);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let budget = (self.threshold * longest as f64).floor() as usize;
        let dist = levenshtein_with_max(&key, &self.needle, budget);
        if dist > budget {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let score = dist as f64 / longest as f64;
        if score > self.threshold {
            return;
        }
        match self.best {
            Some(best) if score > best + f64::EPSILON => {}
            Some(best) if (score - best).abs() <= f64::EPSILON => {
                if !self.matches.contains(&item) {
                    self.matches.push(item);
                }
            }
            _ => {
                self.best = Some(score);
                self.matches.clear();
                self.matches.push(item);
            }
        }
    }

    pub(crate) fn finish(self) -> Vec<T> {
        self.matches
    }
}
