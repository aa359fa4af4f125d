//! Tera with the scaffolding functions registered.
//!
//! | function                           | effect                                    |
//! |------------------------------------|-------------------------------------------|
//! | `argEq(arg="mode", value="prod")`  | `true` when the argument equals `value`   |
//! | `static()`                         | write the file only if it does not exist  |
//! | `setOutputName(name="cmd/x.go")`   | write to `name` instead                   |
//! | `writeIf(arg="mode", value="prod")`| write only when the argument equals value |
//!
//! The last three return `false` and record their effect on the
//! [`RenderSession`] of the template being rendered. Call them from a tag so
//! nothing is printed:
//!
//! ```text
//! {% if static() %}{% endif %}
//! {% if setOutputName(name="cmd/api/main.go") %}{% endif %}
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tera::{Context, Tera, Value};

use crate::error::{Result, StrataError};

/// Per-render side effects collected from the template's function calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSession {
    pub is_static: bool,
    pub output_path: PathBuf,
    pub write_allowed: bool,
}

impl RenderSession {
    fn new(output_path: &Path) -> Self {
        Self {
            is_static: false,
            output_path: output_path.to_path_buf(),
            write_allowed: true,
        }
    }
}

#[derive(Debug)]
pub struct RenderedTemplate {
    pub body: String,
    pub session: RenderSession,
}

/// Renders template bodies against the service's arguments.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    arguments: Arc<BTreeMap<String, String>>,
}

impl TemplateEngine {
    pub fn new(arguments: BTreeMap<String, String>) -> Self {
        Self {
            arguments: Arc::new(arguments),
        }
    }

    /// Render `body` (the template at `source`) whose default destination is `output_path`.
    ///
    /// A fresh session is used for every call.
    pub fn render(
        &self,
        source: &Path,
        body: &str,
        context: &Context,
        output_path: &Path,
    ) -> Result<RenderedTemplate> {
        let session = Arc::new(Mutex::new(RenderSession::new(output_path)));
        let name = source.to_string_lossy();

        let mut tera = self.build(Arc::clone(&session));
        let rendered = tera
            .add_raw_template(&name, body)
            .and_then(|_| tera.render(&name, context))
            .map_err(|e| StrataError::TemplateRender {
                path: source.to_path_buf(),
                source: e,
            })?;
        drop(tera);

        let session = session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        Ok(RenderedTemplate {
            body: rendered,
            session,
        })
    }

    /// Parse `body` with the scaffolding functions registered, without rendering it.
    pub fn check_syntax(&self, source: &Path, body: &str) -> Result<()> {
        let session = Arc::new(Mutex::new(RenderSession::new(source)));
        self.build(session)
            .add_raw_template(&source.to_string_lossy(), body)
            .map_err(|e| StrataError::TemplateRender {
                path: source.to_path_buf(),
                source: e,
            })
    }

    fn build(&self, session: Arc<Mutex<RenderSession>>) -> Tera {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        let arguments = Arc::clone(&self.arguments);
        tera.register_function("argEq", move |args: &HashMap<String, Value>| -> tera::Result<Value> {
            let name = string_arg(args, "argEq", "arg")?;
            let value = string_arg(args, "argEq", "value")?;
            Ok(Value::Bool(arguments.get(&name) == Some(&value)))
        });

        let state = Arc::clone(&session);
        tera.register_function("static", move |_: &HashMap<String, Value>| -> tera::Result<Value> {
            lock(&state)?.is_static = true;
            Ok(falsy())
        });

        let state = Arc::clone(&session);
        tera.register_function("setOutputName", move |args: &HashMap<String, Value>| -> tera::Result<Value> {
            let name = string_arg(args, "setOutputName", "name")?;
            lock(&state)?.output_path = PathBuf::from(name);
            Ok(falsy())
        });

        let arguments = Arc::clone(&self.arguments);
        tera.register_function("writeIf", move |args: &HashMap<String, Value>| -> tera::Result<Value> {
            let name = string_arg(args, "writeIf", "arg")?;
            let value = string_arg(args, "writeIf", "value")?;
            lock(&session)?.write_allowed = arguments.get(&name) == Some(&value);
            Ok(falsy())
        });

        tera
    }
}

fn falsy() -> Value {
    Value::Bool(false)
}

fn lock(session: &Mutex<RenderSession>) -> tera::Result<std::sync::MutexGuard<'_, RenderSession>> {
    session
        .lock()
        .map_err(|_| tera::Error::msg("render session lock poisoned"))
}

fn string_arg(args: &HashMap<String, Value>, function: &str, key: &str) -> tera::Result<String> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(tera::Error::msg(format!(
            "{function}() requires a `{key}` argument"
        ))),
        Some(other) => Ok(other.to_string()),
    }
}
