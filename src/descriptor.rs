//! JVM field and method descriptor handling.
//!
//! Descriptors are never renamed themselves; only the class names embedded in them
//! follow the class mapping. This module parses descriptors into [`JavaType`] values
//! for the human-oriented mapping formats and rewrites their class references
//! for the formats that store descriptors in the obfuscated namespace.
//!
//! # Examples
//!
//! ```rust
//! use classcloak::descriptor::{parse_method_descriptor, remap_descriptor};
//!
//! let desc = parse_method_descriptor("(I[Ljava/lang/String;)Lp/A;")?;
//! assert_eq!(desc.java_parameters(), "int,java.lang.String[]");
//! assert_eq!(desc.java_return(), "p.A");
//!
//! let remapped = remap_descriptor("(Lp/A;)V", |name| (name == "p/A").then(|| "a1".to_string()));
//! assert_eq!(remapped, "(La1;)V");
//! # Ok::<(), classcloak::Error>(())
//! ```

use std::{fmt, iter::Peekable, str::Chars};

use crate::{model::dotted_name, Result};

/// A JVM value type as written in a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JavaType {
    /// One of the eight primitive types, by descriptor character
    Primitive(char),
    /// A class type, by internal name
    Object(String),
    /// An array of the inner type
    Array(Box<JavaType>),
}

impl JavaType {
    /// Renders the type the way Java source code spells it.
    #[must_use]
    pub fn java_name(&self) -> String {
        match self {
            JavaType::Primitive(c) => primitive_name(*c).to_string(),
            JavaType::Object(name) => dotted_name(name),
            JavaType::Array(inner) => format!("{}[]", inner.java_name()),
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Primitive(c) => write!(f, "{c}"),
            JavaType::Object(name) => write!(f, "L{name};"),
            JavaType::Array(inner) => write!(f, "[{inner}"),
        }
    }
}

/// A parsed method descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Parameter types in declaration order
    pub parameters: Vec<JavaType>,
    /// Return type; `None` for `void`
    pub return_type: Option<JavaType>,
}

impl MethodDescriptor {
    /// Parameter list in Java source form, comma separated without spaces.
    #[must_use]
    pub fn java_parameters(&self) -> String {
        self.parameters
            .iter()
            .map(JavaType::java_name)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Return type in Java source form.
    #[must_use]
    pub fn java_return(&self) -> String {
        self.return_type
            .as_ref()
            .map_or_else(|| "void".to_string(), JavaType::java_name)
    }
}

fn primitive_name(c: char) -> &'static str {
    match c {
        'B' => "byte",
        'C' => "char",
        'D' => "double",
        'F' => "float",
        'I' => "int",
        'J' => "long",
        'S' => "short",
        'Z' => "boolean",
        _ => "void",
    }
}

fn parse_type(chars: &mut Peekable<Chars<'_>>, source: &str) -> Result<JavaType> {
    let mut dimensions = 0;
    while chars.peek() == Some(&'[') {
        chars.next();
        dimensions += 1;
    }

    let base = match chars.next() {
        Some(c @ ('B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z')) => JavaType::Primitive(c),
        Some('L') => {
            let mut name = String::new();
            loop {
                match chars.next() {
                    Some(';') => break,
                    Some(c) => name.push(c),
                    None => return Err(malformed_error!("Unterminated class type in '{}'", source)),
                }
            }
            if name.is_empty() {
                return Err(malformed_error!("Empty class name in '{}'", source));
            }
            JavaType::Object(name)
        }
        Some(c) => return Err(malformed_error!("Invalid type tag '{}' in '{}'", c, source)),
        None => return Err(malformed_error!("Truncated descriptor '{}'", source)),
    };

    let mut ty = base;
    for _ in 0..dimensions {
        ty = JavaType::Array(Box::new(ty));
    }
    Ok(ty)
}

/// Parses a field descriptor such as `I` or `[Ljava/lang/String;`.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] if the descriptor is invalid or has trailing data.
pub fn parse_field_descriptor(descriptor: &str) -> Result<JavaType> {
    let mut chars = descriptor.chars().peekable();
    let ty = parse_type(&mut chars, descriptor)?;
    if chars.next().is_some() {
        return Err(malformed_error!("Trailing data in field descriptor '{}'", descriptor));
    }
    Ok(ty)
}

/// Parses a method descriptor such as `(ILjava/lang/String;)V`.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] if the descriptor is invalid or has trailing data.
pub fn parse_method_descriptor(descriptor: &str) -> Result<MethodDescriptor> {
    let mut chars = descriptor.chars().peekable();
    if chars.next() != Some('(') {
        return Err(malformed_error!("Method descriptor '{}' must start with '('", descriptor));
    }

    let mut parameters = Vec::new();
    loop {
        match chars.peek() {
            Some(')') => {
                chars.next();
                break;
            }
            Some(_) => parameters.push(parse_type(&mut chars, descriptor)?),
            None => return Err(malformed_error!("Unterminated parameter list in '{}'", descriptor)),
        }
    }

    let return_type = if chars.peek() == Some(&'V') {
        chars.next();
        None
    } else {
        Some(parse_type(&mut chars, descriptor)?)
    };

    if chars.next().is_some() {
        return Err(malformed_error!("Trailing data in method descriptor '{}'", descriptor));
    }

    Ok(MethodDescriptor {
        parameters,
        return_type,
    })
}

/// Rewrites every class reference of a field or method descriptor through `lookup`.
///
/// Class names for which `lookup` returns `None` are kept unchanged. The descriptor
/// is not validated; unterminated class references are copied verbatim.
pub fn remap_descriptor<F>(descriptor: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(descriptor.len());
    let mut chars = descriptor.chars();

    while let Some(c) = chars.next() {
        result.push(c);
        if c != 'L' {
            continue;
        }

        let mut name = String::new();
        let mut terminated = false;
        for n in chars.by_ref() {
            if n == ';' {
                terminated = true;
                break;
            }
            name.push(n);
        }

        match lookup(&name) {
            Some(mapped) if terminated => result.push_str(&mapped),
            _ => result.push_str(&name),
        }
        if terminated {
            result.push(';');
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn field_descriptors() {
        assert_eq!(parse_field_descriptor("I").unwrap().java_name(), "int");
        assert_eq!(
            parse_field_descriptor("[[Ljava/util/List;").unwrap().java_name(),
            "java.util.List[][]"
        );
        assert_eq!(
            parse_field_descriptor("Lp/A;").unwrap(),
            JavaType::Object("p/A".to_string())
        );
        assert!(matches!(parse_field_descriptor("IZ"), Err(Error::Malformed { .. })));
        assert!(matches!(parse_field_descriptor("Lp/A"), Err(Error::Malformed { .. })));
        assert!(matches!(parse_field_descriptor(""), Err(Error::Malformed { .. })));
    }

    #[test]
    fn method_descriptors() {
        let desc = parse_method_descriptor("()V").unwrap();
        assert!(desc.parameters.is_empty());
        assert_eq!(desc.java_return(), "void");

        let desc = parse_method_descriptor("(JZ[B)Ljava/lang/Object;").unwrap();
        assert_eq!(desc.java_parameters(), "long,boolean,byte[]");
        assert_eq!(desc.java_return(), "java.lang.Object");

        assert!(parse_method_descriptor("V").is_err());
        assert!(parse_method_descriptor("(I").is_err());
        assert!(parse_method_descriptor("()VV").is_err());
    }

    #[test]
    fn display_roundtrips_descriptor_text() {
        let text = "[Lp/A;";
        assert_eq!(parse_field_descriptor(text).unwrap().to_string(), text);
    }

    #[test]
    fn remapping() {
        let lookup = |name: &str| match name {
            "p/A" => Some("a1".to_string()),
            "p/B" => Some("a2".to_string()),
            _ => None,
        };
        assert_eq!(
            remap_descriptor("(Lp/A;I[Lp/B;)Ljava/lang/String;", lookup),
            "(La1;I[La2;)Ljava/lang/String;"
        );
        assert_eq!(remap_descriptor("J", lookup), "J");
        assert_eq!(remap_descriptor("(Lp/A", lookup), "(Lp/A");
    }
}
