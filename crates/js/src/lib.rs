//! Elemental JavaScript host
//!
//! QuickJS runtime exposing a browser-like `document`/`Element` object model
//! over a shared [`DomTree`].

mod bindings;
mod config;
mod console;
mod error;

pub use bindings::SharedDom;
pub use config::HostConfig;
pub use error::HostError;

use std::cell::RefCell;
use std::rc::Rc;

use elemental_dom::DomTree;
use elemental_html::HtmlParser;
use rquickjs::{Context, Ctx, FromJs, Runtime, Value};

/// JavaScript runtime hosting a document
pub struct HostRuntime {
    context: Context,
    dom: SharedDom,
}

impl HostRuntime {
    /// Create a runtime hosting an empty document
    pub fn new(config: &HostConfig) -> Result<Self, HostError> {
        Self::with_document(DomTree::new(), config)
    }

    /// Create a runtime hosting an existing tree
    pub fn with_document(dom: DomTree, config: &HostConfig) -> Result<Self, HostError> {
        let runtime = Runtime::new()?;
        config.apply(&runtime);
        let context = Context::full(&runtime)?;
        let shared_dom = Rc::new(RefCell::new(dom));

        let dom_clone = shared_dom.clone();
        context
            .with(|ctx| -> Result<(), HostError> {
                console::register_console(&ctx)?;
                bindings::register_dom_api(&ctx, dom_clone).map_err(|e| match e {
                    rquickjs::Error::Exception => capture_exception(&ctx),
                    other => other.into(),
                })
            })
            .map_err(|e| {
                log::error!("Failed to register DOM API: {}", e);
                e
            })?;

        log::info!("host runtime ready ({} nodes)", shared_dom.borrow().len());

        Ok(Self {
            context,
            dom: shared_dom,
        })
    }

    /// Parse a document and host it
    pub fn from_html(html: &str, config: &HostConfig) -> Result<Self, HostError> {
        let dom = HtmlParser::new().parse_document(html)?;
        Self::with_document(dom, config)
    }

    /// Get a reference to the DOM tree
    pub fn dom(&self) -> &SharedDom {
        &self.dom
    }

    /// Run `f` with access to the host context
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Ctx<'_>) -> R,
    {
        self.context.with(f)
    }

    /// Evaluate JavaScript code and convert the result
    pub fn eval<V>(&self, code: &str) -> Result<V, HostError>
    where
        V: for<'js> FromJs<'js>,
    {
        self.context.with(|ctx| match ctx.eval::<V, _>(code) {
            Ok(value) => Ok(value),
            Err(rquickjs::Error::Exception) => Err(capture_exception(&ctx)),
            Err(err) => Err(err.into()),
        })
    }

    /// Evaluate JavaScript code without returning a value
    pub fn exec(&self, code: &str) -> Result<(), HostError> {
        self.eval::<()>(code)
    }

    /// Number of element wrappers the script side is holding on to
    pub fn wrapper_count(&self) -> Result<u32, HostError> {
        self.eval("document.__wrapperCount")
    }
}

/// Take the pending exception off the context
fn capture_exception(ctx: &Ctx<'_>) -> HostError {
    let exception: Value = ctx.catch();

    if let Some(ex) = exception.as_exception() {
        let message = ex.message().unwrap_or_else(|| "uncaught exception".to_string());
        return match ex.stack() {
            Some(stack) => HostError::with_stack(message, stack),
            None => HostError::runtime(message),
        };
    }

    HostError::runtime(format!("uncaught value: {:?}", exception))
}
