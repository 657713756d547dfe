//! Random short-id guesses.
//!
//! A candidate is a fixed-length string sampled uniformly from an alphabet.
//! Each call draws from the calling thread's own generator, so workers never
//! share sampling state.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Effect, Transience};

/// Lowercase hexadecimal digits, the alphabet git abbreviates object ids with.
pub const HEX_ALPHABET: &str = "0123456789abcdef";

/// Git's default abbreviation length for small repositories.
pub const DEFAULT_LENGTH: usize = 7;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CandidateError {
    #[error("alphabet is empty")]
    EmptyAlphabet,

    #[error("alphabet repeats symbol {0:?}")]
    DuplicateSymbol(char),

    #[error("candidate length must be at least 1")]
    ZeroLength,

    #[error("symbol {0:?} is not in the alphabet")]
    ForeignSymbol(char),
}

impl CandidateError {
    pub fn transience(&self) -> Transience {
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}

/// Ordered set of distinct symbols a candidate is drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<char>,
}

impl Alphabet {
    pub fn new(symbols: &str) -> Result<Self, CandidateError> {
        let mut seen: Vec<char> = Vec::with_capacity(symbols.len());
        for symbol in symbols.chars() {
            if seen.contains(&symbol) {
                return Err(CandidateError::DuplicateSymbol(symbol));
            }
            seen.push(symbol);
        }
        if seen.is_empty() {
            return Err(CandidateError::EmptyAlphabet);
        }
        Ok(Self { symbols: seen })
    }

    pub fn hex() -> Self {
        Self {
            symbols: HEX_ALPHABET.chars().collect(),
        }
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: char) -> bool {
        self.symbols.contains(&symbol)
    }

    /// Accept `text` as a candidate if every symbol belongs to this alphabet.
    pub fn parse(&self, text: &str) -> Result<Candidate, CandidateError> {
        if text.is_empty() {
            return Err(CandidateError::ZeroLength);
        }
        match text.chars().find(|c| !self.contains(*c)) {
            Some(symbol) => Err(CandidateError::ForeignSymbol(symbol)),
            None => Ok(Candidate(text.to_string())),
        }
    }
}

/// A predicted short id. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Candidate(String);

impl Candidate {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of symbols (not bytes).
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Candidate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    alphabet: Alphabet,
    length: usize,
}

impl CandidateGenerator {
    pub fn new(alphabet: Alphabet, length: usize) -> Result<Self, CandidateError> {
        if length == 0 {
            return Err(CandidateError::ZeroLength);
        }
        Ok(Self { alphabet, length })
    }

    pub fn hex() -> Self {
        Self {
            alphabet: Alphabet::hex(),
            length: DEFAULT_LENGTH,
        }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Sample a candidate from the current thread's generator.
    pub fn generate(&self) -> Candidate {
        self.generate_with(&mut rand::rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Candidate {
        let symbols = self.alphabet.symbols();
        let text = (0..self.length)
            .map(|_| symbols[rng.random_range(0..symbols.len())])
            .collect();
        Candidate(text)
    }
}

impl Default for CandidateGenerator {
    fn default() -> Self {
        Self::hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generated_candidates_stay_inside_alphabet() {
        let generator = CandidateGenerator::hex();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..2_000 {
            let candidate = generator.generate_with(&mut rng);
            assert_eq!(candidate.len(), DEFAULT_LENGTH);
            assert!(
                candidate.as_str().chars().all(|c| generator.alphabet().contains(c)),
                "unexpected symbol in {candidate}"
            );
        }
    }

    #[test]
    fn thread_local_generation_respects_length() {
        let generator = CandidateGenerator::new(Alphabet::new("ab").unwrap(), 1).unwrap();
        for _ in 0..100 {
            let candidate = generator.generate();
            assert!(candidate.as_str() == "a" || candidate.as_str() == "b");
        }
    }

    #[test]
    fn every_symbol_is_reachable() {
        let generator = CandidateGenerator::new(Alphabet::hex(), 1).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..1_000 {
            seen.insert(generator.generate_with(&mut rng).to_string());
        }
        assert_eq!(seen.len(), 16);
    }

    #[test]
    fn alphabet_rejects_duplicates_and_empty() {
        assert_eq!(Alphabet::new(""), Err(CandidateError::EmptyAlphabet));
        assert_eq!(
            Alphabet::new("abca"),
            Err(CandidateError::DuplicateSymbol('a'))
        );
        assert_eq!(Alphabet::new(HEX_ALPHABET).unwrap(), Alphabet::hex());
    }

    #[test]
    fn parse_checks_membership() {
        let hex = Alphabet::hex();
        assert_eq!(hex.parse("c0ffee1").unwrap().as_str(), "c0ffee1");
        assert_eq!(hex.parse("c0ffeeG"), Err(CandidateError::ForeignSymbol('G')));
        assert_eq!(hex.parse(""), Err(CandidateError::ZeroLength));
    }

    #[test]
    fn zero_length_is_rejected() {
        let err = CandidateGenerator::new(Alphabet::hex(), 0).unwrap_err();
        assert_eq!(err, CandidateError::ZeroLength);
    }
}
