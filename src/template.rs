//! Program composition
//!
//! Builds the composed program for one execution from a fixed template
//! with named placeholders, never by ad hoc concatenation. User source
//! text enters as template *data* (spliced verbatim, never parsed as
//! template text); structured values are serialized to JSON exactly once
//! and embedded as Python string literals decoded with `json.loads`
//! inside the program, so booleans, nulls and string escapes survive the
//! language boundary.

use handlebars::Handlebars;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::payload::CallPayload;

/// Function-call program: splice the user source, then a guarded call
/// that prints exactly one envelope JSON line in every outcome.
const CALL_TEMPLATE: &str = r#"from math import *
from json import loads, dumps

{{{source}}}

try:
    if "blackbox" not in globals():
        print(dumps({"error": "function `blackbox` not defined"}))
    else:
        result = blackbox(**loads({{{kwargs}}}))
        print(dumps({"result": result}))
except Exception as e:
    print(dumps({"error": str(e)}))
"#;

/// Pipeline program: splice the external `run` routine, bind the full
/// payload to `data`, print the JSON-encoded return value. No guard at
/// this layer; faults propagate to the executor fault path.
const PIPELINE_TEMPLATE: &str = r#"{{{runner}}}

from json import loads, dumps

data = loads({{{payload}}})
print(dumps(run(data)))
"#;

/// A fixed program template with named placeholders
struct ProgramTemplate {
    name: String,
    registry: Handlebars<'static>,
}

impl ProgramTemplate {
    /// Register a template; every placeholder binding is mandatory
    fn new(name: impl Into<String>, template: &str) -> Result<Self> {
        let name = name.into();
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);

        registry
            .register_template_string(&name, template)
            .map_err(|e| Error::Template(format!("Invalid template: {}", e)))?;

        Ok(ProgramTemplate { name, registry })
    }

    /// Render the template with the given bindings
    fn render<T: Serialize>(&self, bindings: &T) -> Result<String> {
        Ok(self.registry.render(&self.name, bindings)?)
    }
}

#[derive(Serialize)]
struct CallBindings {
    source: String,
    kwargs: String,
}

#[derive(Serialize)]
struct PipelineBindings {
    runner: String,
    payload: String,
}

/// Compose the function-call program for one payload
pub fn compose_call(payload: &CallPayload) -> Result<String> {
    let template = ProgramTemplate::new("call", CALL_TEMPLATE)?;
    let kwargs = python_json_literal(&Value::Object(payload.kwargs.clone()))?;

    template.render(&CallBindings {
        source: payload.source.clone(),
        kwargs,
    })
}

/// Compose the pipeline program from the runner source and the payload
pub fn compose_pipeline(runner: &str, payload: &Value) -> Result<String> {
    let template = ProgramTemplate::new("pipeline", PIPELINE_TEMPLATE)?;
    let data = python_json_literal(payload)?;

    template.render(&PipelineBindings {
        runner: runner.to_string(),
        payload: data,
    })
}

/// Serialize a value to JSON and quote the result as a Python string
/// literal. JSON string escaping is a subset of Python's, so the literal
/// means the same bytes on both sides; `json.loads` in the composed
/// program turns it back into the original value.
fn python_json_literal(value: &Value) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(serde_json::to_string(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::ENTRY_FUNCTION;
    use serde_json::{json, Map};

    fn call_payload(source: &str, kwargs: Value) -> CallPayload {
        let kwargs = match kwargs {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        CallPayload {
            source: source.to_string(),
            kwargs,
        }
    }

    #[test]
    fn test_call_program_splices_source_verbatim() {
        let payload = call_payload("def blackbox(x): return x + 1", json!({"x": 4}));
        let program = compose_call(&payload).unwrap();

        assert!(program.contains("def blackbox(x): return x + 1"));
        assert!(program.starts_with("from math import *"));
        assert!(program.contains(r#"loads("{\"x\":4}")"#));
    }

    #[test]
    fn test_call_program_guards_the_entry_function() {
        let payload = call_payload("x = 1", json!({}));
        let program = compose_call(&payload).unwrap();

        assert!(program.contains(&format!(r#"if "{}" not in globals()"#, ENTRY_FUNCTION)));
        assert!(program.contains(r#"{"error": "function `blackbox` not defined"}"#));
        assert!(program.contains(r#"loads("{}")"#));
    }

    #[test]
    fn test_template_syntax_in_user_source_is_not_expanded() {
        // User source is bound data; braces in it must come through untouched.
        let payload = call_payload("def blackbox(): return '{{ not a placeholder }}'", json!({}));
        let program = compose_call(&payload).unwrap();

        assert!(program.contains("'{{ not a placeholder }}'"));
    }

    #[test]
    fn test_kwargs_literal_round_trips() {
        let kwargs = json!({
            "text": "he said \"hi\"\nbye",
            "flag": true,
            "nothing": null,
            "n": 4.5
        });
        let literal = python_json_literal(&kwargs).unwrap();

        // One quoted literal whose decoded content is the kwargs JSON.
        let decoded: String = serde_json::from_str(&literal).unwrap();
        let value: Value = serde_json::from_str(&decoded).unwrap();
        assert_eq!(value, kwargs);
    }

    #[test]
    fn test_composition_is_deterministic() {
        let payload = call_payload(
            "def blackbox(a, b): return a + b",
            json!({"b": 2, "a": 1}),
        );
        let first = compose_call(&payload).unwrap();
        let second = compose_call(&payload).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_pipeline_program_shape() {
        let runner = "def run(data):\n    return data[\"a\"] + data[\"b\"]";
        let program = compose_pipeline(runner, &json!({"a": 2, "b": 3})).unwrap();

        assert!(program.starts_with(runner));
        assert!(program.contains(r#"data = loads("{\"a\":2,\"b\":3}")"#));
        assert!(program.trim_end().ends_with("print(dumps(run(data)))"));
    }
}
