use crate::diagnostics::error::RuntimeError;
use crate::runtime::namespace::Namespace;
use crate::runtime::native_function::NativeFunction;
use crate::runtime::tag::Tag;
use crate::runtime::value::Value;

fn check_arity(args: &[Value], expected: usize, name: &str) -> Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(RuntimeError::WrongArity {
            callable: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

/// The root namespace every compiled program links beneath.
///
/// Carries `print` and the primitive type markers, which compiled code
/// passes to `register_implementation` to attach protocol
/// implementations to host primitives.
pub fn base_namespace() -> Result<Namespace, RuntimeError> {
    let ns = Namespace::root("core");

    ns.define(
        "print",
        Value::Function(NativeFunction::new("print", |args| {
            check_arity(&args, 1, "print")?;
            println!("{}", args[0].to_display_text());
            Ok(Value::Nil)
        })),
    )?;

    ns.define("Number", Value::TypeMarker(Tag::Number))?;
    ns.define("String", Value::TypeMarker(Tag::Text))?;
    ns.define("Boolean", Value::TypeMarker(Tag::Boolean))?;
    ns.define("Function", Value::TypeMarker(Tag::Function))?;
    ns.define("Date", Value::TypeMarker(Tag::Date))?;

    Ok(ns)
}
