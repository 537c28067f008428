//! Configuration for the renaming engine.
//!
//! This module provides the typed configuration consumed by the mapping phase:
//! per-kind rename toggles, naming-mode selection, package scope and keep rules.
//! The mapping manager only sees it through the [`RenamePolicy`] trait, so callers
//! with their own policy source can plug it in directly.

use glob::{MatchOptions, Pattern, PatternError};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{model::internal_name, Error, Result};

/// Naming strategy, chosen once at startup and applied to every symbol kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum NamingMode {
    /// Prefix followed by an incrementing integer: `a1`, `a2`, ...
    #[default]
    #[strum(to_string = "sequential-prefixed", serialize = "sequential", serialize = "prefix")]
    SequentialPrefixed,
    /// One-indexed bijective base-26: `a` ... `z`, `aa`, `ab`, ...
    #[strum(to_string = "sequential-alphabetic", serialize = "alphabetic")]
    SequentialAlphabetic,
    /// Random four-letter lowercase names
    #[strum(to_string = "random-short", serialize = "short")]
    RandomShort,
    /// Random lowercase names of length 8 to 15
    #[strum(to_string = "random-long", serialize = "long", serialize = "random")]
    RandomLong,
    /// Single letters `a` ... `z`, then prefixed names
    #[strum(to_string = "single-char", serialize = "single")]
    SingleChar,
}

impl NamingMode {
    /// Returns true for the modes that draw names from a random source.
    #[must_use]
    pub fn is_random(self) -> bool {
        matches!(self, NamingMode::RandomShort | NamingMode::RandomLong)
    }
}

/// Naming settings shared by the per-kind generators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// The naming strategy.
    pub mode: NamingMode,
    /// Prefix for class names (prefixed modes).
    pub class_prefix: String,
    /// Prefix for field names (prefixed modes).
    pub field_prefix: String,
    /// Prefix for method names (prefixed modes).
    pub method_prefix: String,
    /// Prefix for local variable names (prefixed modes).
    pub local_prefix: String,
    /// Seed for the random modes; `None` draws from the OS entropy source.
    pub seed: Option<u64>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            mode: NamingMode::SequentialPrefixed,
            class_prefix: "c".to_string(),
            field_prefix: "f".to_string(),
            method_prefix: "m".to_string(),
            local_prefix: "v".to_string(),
            seed: None,
        }
    }
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A glob over internal names, compiled once.
///
/// Dotted sources are converted to internal form first. `*` and `?` stop at
/// `/`, `**` spans package segments and must form a whole segment. A pattern
/// that fails to compile matches nothing and is reported by
/// [`ObfuscationConfig::validate`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NamePattern {
    source: String,
    compiled: std::result::Result<Pattern, PatternError>,
}

impl NamePattern {
    /// Compiles a pattern.
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            compiled: Pattern::new(&internal_name(source)),
        }
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if the pattern compiled and matches `name`.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.compiled
            .as_ref()
            .is_ok_and(|pattern| pattern.matches_with(name, MATCH_OPTIONS))
    }

    /// The compile error, if the pattern is invalid.
    #[must_use]
    pub fn error(&self) -> Option<&PatternError> {
        self.compiled.as_ref().err()
    }
}

impl Clone for NamePattern {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            compiled: match &self.compiled {
                Ok(pattern) => Ok(pattern.clone()),
                Err(err) => Err(PatternError {
                    pos: err.pos,
                    msg: err.msg,
                }),
            },
        }
    }
}

impl PartialEq for NamePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for NamePattern {}

impl From<String> for NamePattern {
    fn from(source: String) -> Self {
        Self::new(&source)
    }
}

impl From<&str> for NamePattern {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<NamePattern> for String {
    fn from(pattern: NamePattern) -> Self {
        pattern.source
    }
}

/// Keep rule for fields or methods.
///
/// `owner` is a class pattern, `name` a single-segment pattern and `descriptor`,
/// when present, must match the member descriptor exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRule {
    /// Class pattern of the declaring class
    pub owner: NamePattern,
    /// Member name pattern
    pub name: NamePattern,
    /// Exact descriptor; `None` matches any descriptor
    #[serde(default)]
    pub descriptor: Option<String>,
}

impl MemberRule {
    /// Creates a rule matching every descriptor.
    #[must_use]
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: NamePattern::new(owner),
            name: NamePattern::new(name),
            descriptor: None,
        }
    }

    /// Restricts the rule to one descriptor.
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: &str) -> Self {
        self.descriptor = Some(descriptor.to_string());
        self
    }

    fn matches(&self, owner: &str, name: &str, descriptor: &str) -> bool {
        self.owner.matches(owner)
            && self.name.matches(name)
            && self.descriptor.as_deref().map_or(true, |d| d == descriptor)
    }
}

/// Symbols permanently exempt from renaming.
///
/// Class patterns use internal or dotted names, see [`NamePattern`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepRules {
    /// Class patterns
    pub classes: Vec<NamePattern>,
    /// Field rules
    pub fields: Vec<MemberRule>,
    /// Method rules
    pub methods: Vec<MemberRule>,
}

impl KeepRules {
    /// Returns true if a class pattern matches the class.
    #[must_use]
    pub fn keeps_class(&self, class: &str) -> bool {
        self.classes.iter().any(|p| p.matches(class))
    }

    /// Every pattern of every rule.
    fn patterns(&self) -> impl Iterator<Item = &NamePattern> {
        self.classes.iter().chain(
            self.fields
                .iter()
                .chain(&self.methods)
                .flat_map(|rule| [&rule.owner, &rule.name]),
        )
    }

    /// Returns true if a field rule matches.
    #[must_use]
    pub fn keeps_field(&self, owner: &str, name: &str, descriptor: &str) -> bool {
        self.fields
            .iter()
            .any(|r| r.matches(owner, name, descriptor))
    }

    /// Returns true if a method rule matches.
    #[must_use]
    pub fn keeps_method(&self, owner: &str, name: &str, descriptor: &str) -> bool {
        self.methods
            .iter()
            .any(|r| r.matches(owner, name, descriptor))
    }
}

/// Configuration for one obfuscation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObfuscationConfig {
    /// Rename classes.
    pub rename_classes: bool,
    /// Rename fields.
    pub rename_fields: bool,
    /// Rename methods.
    pub rename_methods: bool,
    /// Naming strategy and prefixes.
    pub naming: NamingConfig,
    /// Only classes inside this package (and its sub-packages) are eligible.
    pub package_scope: Option<String>,
    /// Move renamed classes into the default package (`p/A -> c1`) instead of
    /// keeping their package path (`p/A -> p/c1`).
    pub flatten_packages: bool,
    /// Keep rules.
    pub keep: KeepRules,
    /// Run discovery and the member pass on the rayon thread pool. With a seed set
    /// the member pass stays sequential.
    pub parallel: bool,
    /// Log every individual mapping decision at `info` level.
    pub verbose: bool,
}

impl Default for ObfuscationConfig {
    fn default() -> Self {
        Self {
            rename_classes: true,
            rename_fields: true,
            rename_methods: true,
            naming: NamingConfig::default(),
            package_scope: None,
            flatten_packages: true,
            keep: KeepRules::default(),
            parallel: true,
            verbose: false,
        }
    }
}

impl ObfuscationConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a configuration from JSON. Missing keys take their default value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the text is not a valid configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| Error::Configuration(format!("unreadable configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the naming mode.
    #[must_use]
    pub fn with_mode(mut self, mode: NamingMode) -> Self {
        self.naming.mode = mode;
        self
    }

    /// Sets the class, field and method prefixes.
    #[must_use]
    pub fn with_prefixes(mut self, class: &str, field: &str, method: &str) -> Self {
        self.naming.class_prefix = class.to_string();
        self.naming.field_prefix = field.to_string();
        self.naming.method_prefix = method.to_string();
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.naming.seed = Some(seed);
        self
    }

    /// Restricts renaming to one package.
    #[must_use]
    pub fn with_package_scope(mut self, package: &str) -> Self {
        self.package_scope = Some(package.to_string());
        self
    }

    /// Adds a class keep pattern.
    #[must_use]
    pub fn keep_class(mut self, pattern: &str) -> Self {
        self.keep.classes.push(NamePattern::new(pattern));
        self
    }

    /// Adds a field keep rule.
    #[must_use]
    pub fn keep_field(mut self, rule: MemberRule) -> Self {
        self.keep.fields.push(rule);
        self
    }

    /// Adds a method keep rule.
    #[must_use]
    pub fn keep_method(mut self, rule: MemberRule) -> Self {
        self.keep.methods.push(rule);
        self
    }

    /// Enables or disables the parallel member pass.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Logs every mapping decision at `info` level instead of `debug`.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Checks the configuration for settings that make a run impossible.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when a prefixed naming mode has an empty
    /// prefix, a name prefix contains characters that are illegal in JVM names, or
    /// a keep pattern does not compile.
    pub fn validate(&self) -> Result<()> {
        let prefixes = [
            ("class", &self.naming.class_prefix),
            ("field", &self.naming.field_prefix),
            ("method", &self.naming.method_prefix),
            ("local", &self.naming.local_prefix),
        ];

        for (kind, prefix) in prefixes {
            if prefix.is_empty()
                && matches!(
                    self.naming.mode,
                    NamingMode::SequentialPrefixed | NamingMode::SingleChar
                )
            {
                return Err(Error::Configuration(format!(
                    "{kind} prefix must not be empty in {} mode",
                    self.naming.mode
                )));
            }
            if prefix.contains(['.', ';', '[', '/', '<', '>']) {
                return Err(Error::Configuration(format!(
                    "{kind} prefix '{prefix}' contains characters that are illegal in names"
                )));
            }
        }

        for pattern in self.keep.patterns() {
            if let Some(error) = pattern.error() {
                return Err(Error::Configuration(format!(
                    "invalid keep pattern '{}': {} at position {}",
                    pattern.as_str(),
                    error.msg,
                    error.pos
                )));
            }
        }

        Ok(())
    }
}

/// Rename policy consumed by the mapping manager.
pub trait RenamePolicy: Send + Sync {
    /// Classes may be renamed.
    fn rename_classes(&self) -> bool;
    /// Fields may be renamed.
    fn rename_fields(&self) -> bool;
    /// Methods may be renamed.
    fn rename_methods(&self) -> bool;
    /// The class lies inside the configured package scope.
    fn in_scope(&self, class: &str) -> bool;
    /// The class is exempt from renaming.
    fn should_keep_class(&self, class: &str) -> bool;
    /// The field is exempt from renaming.
    fn should_keep_field(&self, owner: &str, name: &str, descriptor: &str) -> bool;
    /// The method is exempt from renaming.
    fn should_keep_method(&self, owner: &str, name: &str, descriptor: &str) -> bool;
    /// Log individual mapping decisions.
    fn verbose(&self) -> bool {
        false
    }
}

impl RenamePolicy for ObfuscationConfig {
    fn rename_classes(&self) -> bool {
        self.rename_classes
    }

    fn rename_fields(&self) -> bool {
        self.rename_fields
    }

    fn rename_methods(&self) -> bool {
        self.rename_methods
    }

    fn in_scope(&self, class: &str) -> bool {
        let Some(scope) = &self.package_scope else {
            return true;
        };
        let scope = internal_name(scope);
        let scope = scope.trim_end_matches('/');
        if scope.is_empty() {
            return true;
        }
        class
            .strip_prefix(scope)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    fn should_keep_class(&self, class: &str) -> bool {
        self.keep.keeps_class(class)
    }

    fn should_keep_field(&self, owner: &str, name: &str, descriptor: &str) -> bool {
        self.keep.keeps_field(owner, name, descriptor)
    }

    fn should_keep_method(&self, owner: &str, name: &str, descriptor: &str) -> bool {
        self.keep.keeps_method(owner, name, descriptor)
    }

    fn verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards() {
        let matches = |pattern: &str, name: &str| NamePattern::new(pattern).matches(name);
        assert!(matches("com/example/**", "com/example/a/B"));
        assert!(matches("com.example.**", "com/example/B"));
        assert!(matches("com/example/*", "com/example/B"));
        assert!(!matches("com/example/*", "com/example/a/B"));
        assert!(matches("com/*/Main", "com/app/Main"));
        assert!(matches("get?", "getX"));
        assert!(!matches("get?", "getXY"));
        assert!(!matches("p/A", "p/AB"));
        assert!(matches("p/Outer$*", "p/Outer$Inner"));
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        let pattern = NamePattern::new("com/**Impl");
        assert!(pattern.error().is_some());
        assert!(!pattern.matches("com/FooImpl"));

        let config = ObfuscationConfig::default().keep_class("com/**Impl");
        assert!(matches!(config.validate(), Err(Error::Configuration(ref m)) if m.contains("com/**Impl")));

        let config = ObfuscationConfig::default().keep_method(MemberRule::new("p/**x", "run"));
        assert!(config.validate().is_err());

        assert!(ObfuscationConfig::from_json(r#"{"keep": {"classes": ["a/**b"]}}"#).is_err());
    }

    #[test]
    fn keep_rules() {
        let config = ObfuscationConfig::default()
            .keep_class("com.example.api.**")
            .keep_method(MemberRule::new("**", "main").with_descriptor("([Ljava/lang/String;)V"))
            .keep_field(MemberRule::new("p/*", "serialVersionUID"));

        assert!(config.should_keep_class("com/example/api/Client"));
        assert!(!config.should_keep_class("com/example/impl/Client"));
        assert!(config.should_keep_method("p/Main", "main", "([Ljava/lang/String;)V"));
        assert!(!config.should_keep_method("p/Main", "main", "()V"));
        assert!(config.should_keep_field("p/A", "serialVersionUID", "J"));
        assert!(!config.should_keep_field("q/A", "serialVersionUID", "J"));
    }

    #[test]
    fn package_scope() {
        let config = ObfuscationConfig::default().with_package_scope("com.example");
        assert!(config.in_scope("com/example/Foo"));
        assert!(config.in_scope("com/example/sub/Foo"));
        assert!(!config.in_scope("com/examples/Foo"));
        assert!(!config.in_scope("Foo"));
        assert!(ObfuscationConfig::default().in_scope("Foo"));
    }

    #[test]
    fn naming_mode_names() {
        assert_eq!("alphabetic".parse::<NamingMode>().unwrap(), NamingMode::SequentialAlphabetic);
        assert_eq!("Random-Short".parse::<NamingMode>().unwrap(), NamingMode::RandomShort);
        assert!("bogus".parse::<NamingMode>().is_err());
        assert_eq!(NamingMode::SingleChar.to_string(), "single-char");
    }

    #[test]
    fn validation() {
        assert!(ObfuscationConfig::default().validate().is_ok());

        let config = ObfuscationConfig::default().with_prefixes("", "f", "m");
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let config = ObfuscationConfig::default()
            .with_mode(NamingMode::SequentialAlphabetic)
            .with_prefixes("", "", "");
        assert!(config.validate().is_ok());

        let config = ObfuscationConfig::default().with_prefixes("a.b", "f", "m");
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_roundtrip_with_defaults() {
        let config = ObfuscationConfig::from_json(
            r#"{"naming": {"mode": "random-long", "seed": 7}, "keep": {"classes": ["p/Main"]}}"#,
        )
        .unwrap();
        assert_eq!(config.naming.mode, NamingMode::RandomLong);
        assert_eq!(config.naming.seed, Some(7));
        assert_eq!(config.naming.class_prefix, "c");
        assert!(config.rename_methods);
        assert!(config.should_keep_class("p/Main"));

        assert!(ObfuscationConfig::from_json("{\"naming\": 3}").is_err());
    }
}
