//! ProGuard `mapping.txt` writer.
//!
//! ```text
//! p.A -> a1:
//!     int count -> f1
//!     void foo(java.lang.String) -> m1
//! ```

use std::io::Write;

use crate::{
    descriptor::{parse_field_descriptor, parse_method_descriptor},
    export::{ExportView, FieldRow, MethodRow, UNKNOWN_TYPE},
    model::dotted_name,
    Result,
};

pub(crate) fn write<W: Write>(view: &ExportView, out: &mut W) -> Result<()> {
    for class in &view.classes {
        writeln!(
            out,
            "{} -> {}:",
            dotted_name(class),
            dotted_name(view.class_name(class))
        )?;
        for field in view.fields_of(class) {
            writeln!(out, "    {}", field_line(field))?;
        }
        for method in view.methods_of(class) {
            writeln!(out, "    {}", method_line(method))?;
        }
    }
    Ok(())
}

pub(crate) fn field_line(field: &FieldRow) -> String {
    let java_type = field
        .descriptor
        .as_deref()
        .and_then(|d| parse_field_descriptor(d).ok())
        .map_or_else(|| UNKNOWN_TYPE.to_string(), |t| t.java_name());
    format!("{} {} -> {}", java_type, field.name, field.obfuscated)
}

/// `returnType name(params)` in Java source form; the raw descriptor if it does
/// not parse.
pub(crate) fn method_signature(method: &MethodRow) -> String {
    match parse_method_descriptor(&method.descriptor) {
        Ok(descriptor) => format!(
            "{} {}({})",
            descriptor.java_return(),
            method.name,
            descriptor.java_parameters()
        ),
        Err(_) => format!("{}{}", method.name, method.descriptor),
    }
}

fn method_line(method: &MethodRow) -> String {
    format!("{} -> {}", method_signature(method), method.obfuscated)
}

#[cfg(test)]
mod tests {
    use crate::{
        export::{MappingExporter, MappingFormat},
        mapping::MappingStore,
    };

    #[test]
    fn class_blocks_with_typed_members() {
        let store = MappingStore::new();
        store.map_class("p/B", "a2");
        store.map_class("p/A", "a1");
        store.map_field("p/A", "count", "I", "f1");
        store.map_field("p/A", "names", "[Ljava/lang/String;", "f2");
        store.map_method("p/A", "foo", "(ILp/B;)V", "m1");
        store.map_method("p/A", "bar", "()Ljava/util/List;", "m2");

        let text = MappingExporter::new()
            .render(&store, MappingFormat::ProGuard)
            .unwrap();
        assert_eq!(
            text,
            "p.A -> a1:\n\
             \x20   int count -> f1\n\
             \x20   java.lang.String[] names -> f2\n\
             \x20   java.util.List bar() -> m2\n\
             \x20   void foo(int,p.B) -> m1\n\
             p.B -> a2:\n"
        );
    }
}
