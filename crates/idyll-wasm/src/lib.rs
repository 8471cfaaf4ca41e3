//! WASM bindings for the Idyll compiler.
//!
//! Exposes `compile()` and `compileWith()` to JavaScript via wasm-bindgen.
//! Returns the document tree as plain nested JS arrays, or throws an object
//! `{ row, column, message }` on a parse error.

use idyll_lexer::LexerOptions;
use idyll_parser::{Document, ParseError, Parser};
use wasm_bindgen::prelude::*;

/// Compile Idyll source to its AST with default lexer options.
///
/// Returns `[[name, props, children], ...]`. Throws `{ row, column, message }`
/// if the source is malformed.
#[wasm_bindgen]
pub fn compile(source: &str) -> Result<JsValue, JsValue> {
    match compile_document(source, &LexerOptions::default()) {
        Ok(doc) => to_js(&doc),
        Err(e) => Err(error_object(&e)?),
    }
}

/// Compile with lexer options given as a JS object, e.g.
/// `{ fenceMinBackticks: 4, strictFences: true }`. Missing keys keep their
/// defaults; `undefined` or `null` means all defaults.
#[wasm_bindgen(js_name = compileWith)]
pub fn compile_with(source: &str, options: JsValue) -> Result<JsValue, JsValue> {
    let options = if options.is_undefined() || options.is_null() {
        LexerOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|e| JsValue::from(js_sys::TypeError::new(&format!("Invalid options: {e}"))))?
    };

    match compile_document(source, &options) {
        Ok(doc) => to_js(&doc),
        Err(e) => Err(error_object(&e)?),
    }
}

/// Get the compiler version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Lex and parse, independent of the JS boundary.
pub fn compile_document(source: &str, options: &LexerOptions) -> Result<Document, ParseError> {
    Parser::parse_with(source, options)
}

fn to_js(doc: &Document) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(doc).map_err(JsValue::from)
}

/// Build the thrown `{ row, column, message }` object.
fn error_object(err: &ParseError) -> Result<JsValue, JsValue> {
    let (row, column) = error_position(err).map_err(|e| JsError::new(&e))?;

    let obj = js_sys::Object::new();
    js_sys::Reflect::set(&obj, &"row".into(), &row.into())
        .map_err(|_| JsError::new("Failed to set row property"))?;
    js_sys::Reflect::set(&obj, &"column".into(), &column.into())
        .map_err(|_| JsError::new("Failed to set column property"))?;
    js_sys::Reflect::set(&obj, &"message".into(), &err.message.as_str().into())
        .map_err(|_| JsError::new("Failed to set message property"))?;
    Ok(obj.into())
}

/// Row and column as JS numbers.
fn error_position(err: &ParseError) -> Result<(u32, u32), String> {
    let row = u32::try_from(err.row).map_err(|_| format!("Error row {} out of range", err.row))?;
    let column = u32::try_from(err.column)
        .map_err(|_| format!("Error column {} out of range", err.column))?;
    Ok((row, column))
}
