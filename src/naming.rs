//! Pluggable name generators.
//!
//! Every symbol kind owns an independent [`NameGenerator`], so collisions only need
//! to be avoided within one kind, matching the separate class, field and method
//! namespaces of the class-file format. The strategy is a closed set
//! ([`NamingMode`]) chosen once from configuration.
//!
//! | Mode | Output |
//! |------|--------|
//! | [`NamingMode::SequentialPrefixed`] | `m1`, `m2`, ... |
//! | [`NamingMode::SequentialAlphabetic`] | `a` ... `z`, `aa`, `ab`, ... |
//! | [`NamingMode::RandomShort`] | four random lowercase letters |
//! | [`NamingMode::RandomLong`] | 8 to 15 random lowercase letters |
//! | [`NamingMode::SingleChar`] | `a` ... `z`, then `m27`, `m28`, ... |
//!
//! Deterministic modes are driven by a monotonic counter and never repeat. Random
//! modes retry against the set of names the generator already issued.

use std::{collections::HashSet, sync::Mutex};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config::{NamingConfig, NamingMode},
    model::{SymbolId, SymbolKind},
    Error, Result,
};

const ALPHABET_SIZE: u64 = 26;
const SHORT_LENGTH: usize = 4;
const SHORT_CAPACITY: usize = 26 * 26 * 26 * 26;
const LONG_LENGTH_MIN: usize = 8;
const LONG_LENGTH_MAX: usize = 15;

struct GeneratorState {
    counter: u64,
    issued: HashSet<String>,
    rng: StdRng,
}

/// Name generator for one symbol kind.
///
/// The generator is shared between worker threads; its counter and collision
/// oracle live behind a mutex.
pub struct NameGenerator {
    kind: SymbolKind,
    mode: NamingMode,
    prefix: String,
    state: Mutex<GeneratorState>,
}

impl NameGenerator {
    /// Creates a generator.
    ///
    /// # Arguments
    ///
    /// * `kind` - The symbol kind this generator names
    /// * `mode` - The naming strategy
    /// * `prefix` - Prefix for [`NamingMode::SequentialPrefixed`] and the
    ///   [`NamingMode::SingleChar`] fallback
    /// * `seed` - Seed for the random modes; `None` uses OS entropy
    #[must_use]
    pub fn new(kind: SymbolKind, mode: NamingMode, prefix: &str, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        NameGenerator {
            kind,
            mode,
            prefix: prefix.to_string(),
            state: Mutex::new(GeneratorState {
                counter: 0,
                issued: HashSet::new(),
                rng,
            }),
        }
    }

    /// The symbol kind this generator names.
    #[must_use]
    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    /// The naming strategy.
    #[must_use]
    pub fn mode(&self) -> NamingMode {
        self.mode
    }

    /// Number of names issued so far.
    #[must_use]
    pub fn issued(&self) -> u64 {
        lock!(self.state).counter
    }

    /// Produces a fresh name for `symbol`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NamespaceExhausted`] once [`NamingMode::RandomShort`] has
    /// issued every four-letter name.
    pub fn generate_name(&self, symbol: &SymbolId) -> Result<String> {
        let mut state = lock!(self.state);

        let name = match self.mode {
            NamingMode::SequentialPrefixed => {
                state.counter += 1;
                format!("{}{}", self.prefix, state.counter)
            }
            NamingMode::SequentialAlphabetic => {
                state.counter += 1;
                alphabetic_name(state.counter)
            }
            NamingMode::SingleChar => {
                state.counter += 1;
                if state.counter <= ALPHABET_SIZE {
                    alphabetic_name(state.counter)
                } else {
                    format!("{}{}", self.prefix, state.counter)
                }
            }
            NamingMode::RandomShort => {
                if state.issued.len() >= SHORT_CAPACITY {
                    return Err(Error::NamespaceExhausted { kind: self.kind });
                }
                let name = loop {
                    let candidate = random_letters(&mut state.rng, SHORT_LENGTH);
                    if state.issued.insert(candidate.clone()) {
                        break candidate;
                    }
                };
                state.counter += 1;
                name
            }
            NamingMode::RandomLong => {
                let name = loop {
                    let length = state.rng.gen_range(LONG_LENGTH_MIN..=LONG_LENGTH_MAX);
                    let candidate = random_letters(&mut state.rng, length);
                    if state.issued.insert(candidate.clone()) {
                        break candidate;
                    }
                };
                state.counter += 1;
                name
            }
        };

        log::trace!("{} {} -> {}", self.kind, symbol, name);
        Ok(name)
    }
}

/// One-indexed bijective base-26 encoding: 1 -> `a`, 26 -> `z`, 27 -> `aa`.
///
/// Index 0 has no encoding and yields an empty string.
#[must_use]
pub fn alphabetic_name(mut index: u64) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        index -= 1;
        letters.push(b'a' + (index % ALPHABET_SIZE) as u8);
        index /= ALPHABET_SIZE;
    }
    letters.reverse();
    letters.into_iter().map(char::from).collect()
}

fn random_letters(rng: &mut StdRng, length: usize) -> String {
    (0..length)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect()
}

/// The per-kind generator set of one run.
pub struct NameGenerators {
    /// Class names
    pub class: NameGenerator,
    /// Field names
    pub field: NameGenerator,
    /// Method names
    pub method: NameGenerator,
    /// Local variable names, for the external local renamer
    pub local: NameGenerator,
}

impl NameGenerators {
    /// Creates one generator per kind from the naming configuration.
    ///
    /// Each kind derives its own random stream from the seed, so the kinds do
    /// not perturb each other.
    #[must_use]
    pub fn new(config: &NamingConfig) -> Self {
        let seed_for = |offset: u64| config.seed.map(|s| s.wrapping_add(offset));
        let mode = config.mode;

        NameGenerators {
            class: NameGenerator::new(SymbolKind::Class, mode, &config.class_prefix, seed_for(0)),
            field: NameGenerator::new(SymbolKind::Field, mode, &config.field_prefix, seed_for(1)),
            method: NameGenerator::new(SymbolKind::Method, mode, &config.method_prefix, seed_for(2)),
            local: NameGenerator::new(SymbolKind::Local, mode, &config.local_prefix, seed_for(3)),
        }
    }

    /// The generator responsible for `kind`.
    #[must_use]
    pub fn for_kind(&self, kind: SymbolKind) -> &NameGenerator {
        match kind {
            SymbolKind::Class => &self.class,
            SymbolKind::Field => &self.field,
            SymbolKind::Method => &self.method,
            SymbolKind::Local => &self.local,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn symbol() -> SymbolId {
        SymbolId::method("p/A", "foo", "()V")
    }

    fn take(generator: &NameGenerator, count: usize) -> Vec<String> {
        (0..count)
            .map(|_| generator.generate_name(&symbol()).unwrap())
            .collect()
    }

    #[test]
    fn alphabetic_is_bijective_base_26() {
        assert_eq!(alphabetic_name(1), "a");
        assert_eq!(alphabetic_name(26), "z");
        assert_eq!(alphabetic_name(27), "aa");
        assert_eq!(alphabetic_name(52), "az");
        assert_eq!(alphabetic_name(53), "ba");
        assert_eq!(alphabetic_name(702), "zz");
        assert_eq!(alphabetic_name(703), "aaa");
    }

    #[test]
    fn sequential_alphabetic_first_27() {
        let generator = NameGenerator::new(SymbolKind::Method, NamingMode::SequentialAlphabetic, "", None);
        let names = take(&generator, 27);

        let mut expected: Vec<String> = (b'a'..=b'z').map(|c| char::from(c).to_string()).collect();
        expected.push("aa".to_string());
        assert_eq!(names, expected);
        assert!(names
            .iter()
            .all(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_lowercase())));
    }

    #[test]
    fn sequential_prefixed() {
        let generator = NameGenerator::new(SymbolKind::Class, NamingMode::SequentialPrefixed, "a", None);
        assert_eq!(take(&generator, 3), vec!["a1", "a2", "a3"]);
        assert_eq!(generator.issued(), 3);
    }

    #[test]
    fn single_char_falls_back_to_prefix() {
        let generator = NameGenerator::new(SymbolKind::Field, NamingMode::SingleChar, "f", None);
        let names = take(&generator, 28);
        assert_eq!(names[0], "a");
        assert_eq!(names[25], "z");
        assert_eq!(names[26], "f27");
        assert_eq!(names[27], "f28");
        assert_eq!(names.iter().collect::<HashSet<_>>().len(), 28);
    }

    #[test]
    fn random_short_is_unique() {
        let generator = NameGenerator::new(SymbolKind::Method, NamingMode::RandomShort, "", Some(42));
        let names = take(&generator, 5000);
        assert_eq!(names.iter().collect::<HashSet<_>>().len(), 5000);
        assert!(names
            .iter()
            .all(|n| n.len() == 4 && n.chars().all(|c| c.is_ascii_lowercase())));
    }

    #[test]
    fn random_long_is_unique() {
        let generator = NameGenerator::new(SymbolKind::Method, NamingMode::RandomLong, "", None);
        let names = take(&generator, 2000);
        assert_eq!(names.iter().collect::<HashSet<_>>().len(), 2000);
        assert!(names.iter().all(|n| (8..=15).contains(&n.len())));
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let first = NameGenerator::new(SymbolKind::Class, NamingMode::RandomLong, "", Some(7));
        let second = NameGenerator::new(SymbolKind::Class, NamingMode::RandomLong, "", Some(7));
        assert_eq!(take(&first, 10), take(&second, 10));
    }

    #[test]
    fn kinds_have_independent_counters() {
        let generators = NameGenerators::new(&NamingConfig::default());
        let class = generators.class.generate_name(&SymbolId::class("p/A")).unwrap();
        let method = generators.method.generate_name(&symbol()).unwrap();
        let field = generators
            .for_kind(SymbolKind::Field)
            .generate_name(&SymbolId::field("p/A", "x", "I"))
            .unwrap();
        assert_eq!(class, "c1");
        assert_eq!(method, "m1");
        assert_eq!(field, "f1");
        assert_eq!(generators.local.issued(), 0);
    }
}
