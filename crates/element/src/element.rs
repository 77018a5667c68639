//! Element handle

use std::borrow::Cow;

use rquickjs::function::This;
use rquickjs::{Ctx, FromJs, Function, IntoJs, Object, Value};

use crate::boundary::guard;
use crate::error::{DomError, Operation};

/// Handle to a host element.
///
/// The handle does not own the element: the host may release the node at
/// any time, after which operations fail with a [`DomError`]. A handle
/// holding null or undefined is valid to create and reports
/// `exists() == false`.
#[derive(Debug, Clone, PartialEq)]
pub struct Element<'js> {
    raw: Value<'js>,
}

impl<'js> Element<'js> {
    /// Wrap a host value, usually one a script returned
    pub fn from_raw(raw: Value<'js>) -> Self {
        Self { raw }
    }

    /// A handle that refers to nothing
    pub fn null(ctx: &Ctx<'js>) -> Self {
        Self::from_raw(Value::new_null(ctx.clone()))
    }

    /// The wrapped host value
    pub fn as_raw(&self) -> &Value<'js> {
        &self.raw
    }

    pub fn into_raw(self) -> Value<'js> {
        self.raw
    }

    /// Whether the handle refers to something.
    ///
    /// Only null and undefined count as absent; a handle to a node the host
    /// has since released still reports true.
    pub fn exists(&self) -> bool {
        !(self.raw.is_null() || self.raw.is_undefined())
    }

    /// Rendered text of the element and its descendants
    pub fn inner_text(&self) -> Result<String, DomError> {
        guard(self.raw.ctx(), Operation::GetInnerText, || {
            log::trace!("get innerText");
            self.host()?.get("innerText")
        })
    }

    /// Serialized markup of the element's children
    pub fn inner_html(&self) -> Result<String, DomError> {
        guard(self.raw.ctx(), Operation::GetInnerHtml, || {
            log::trace!("get innerHTML");
            self.host()?.get("innerHTML")
        })
    }

    /// Replace the element's children with parsed markup
    pub fn set_inner_html(&self, html: &str) -> Result<(), DomError> {
        guard(self.raw.ctx(), Operation::SetInnerHtml, || {
            log::trace!("set innerHTML ({} bytes)", html.len());
            self.host()?.set("innerHTML", html)
        })
    }

    /// Replace the element's children with a single text node
    pub fn set_inner_text(&self, text: &str) -> Result<(), DomError> {
        let operation = Operation::SetInnerText {
            text: Cow::Borrowed(text),
        };
        guard(self.raw.ctx(), operation, || {
            log::trace!("set innerText");
            self.host()?.set("innerText", text)
        })
    }

    /// Append `child` as the last child of this element.
    ///
    /// A child that already has a parent is moved.
    pub fn append_child(&self, child: &Element<'js>) -> Result<(), DomError> {
        guard(self.raw.ctx(), Operation::AppendChild, || {
            log::trace!("appendChild");
            let host = self.host()?;
            let append: Function = host.get("appendChild")?;
            append.call::<_, Value>((This(host), child.raw.clone()))?;
            Ok(())
        })
    }

    /// Attribute value; an absent attribute reads as an empty string
    pub fn attribute(&self, name: &str) -> Result<String, DomError> {
        let operation = Operation::GetAttribute {
            name: Cow::Borrowed(name),
        };
        guard(self.raw.ctx(), operation, || {
            log::trace!("getAttribute({})", name);
            let host = self.host()?;
            let get: Function = host.get("getAttribute")?;
            let value: Option<String> = get.call((This(host), name))?;
            Ok(value.unwrap_or_default())
        })
    }

    pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomError> {
        let operation = Operation::SetAttribute {
            name: Cow::Borrowed(name),
        };
        guard(self.raw.ctx(), operation, || {
            log::trace!("setAttribute({})", name);
            let host = self.host()?;
            let set: Function = host.get("setAttribute")?;
            set.call::<_, Value>((This(host), name, value))?;
            Ok(())
        })
    }

    /// Element children in document order.
    ///
    /// Each call takes a fresh snapshot; later changes to the element are
    /// not reflected in a previously returned list.
    pub fn children(&self) -> Result<Vec<Element<'js>>, DomError> {
        guard(self.raw.ctx(), Operation::GetChildren, || {
            log::trace!("get children");
            let collection: Object = self.host()?.get("children")?;
            let length: u32 = collection.get("length")?;

            let mut children = Vec::with_capacity(length as usize);
            for index in 0..length {
                children.push(Element::from_raw(collection.get::<_, Value>(index)?));
            }
            Ok(children)
        })
    }

    fn host(&self) -> rquickjs::Result<Object<'js>> {
        Object::from_js(self.raw.ctx(), self.raw.clone())
    }
}

impl<'js> FromJs<'js> for Element<'js> {
    fn from_js(_ctx: &Ctx<'js>, value: Value<'js>) -> rquickjs::Result<Self> {
        Ok(Self::from_raw(value))
    }
}

impl<'js> IntoJs<'js> for Element<'js> {
    fn into_js(self, _ctx: &Ctx<'js>) -> rquickjs::Result<Value<'js>> {
        Ok(self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use elemental_js::{HostConfig, HostRuntime};

    const PAGE: &str = r#"<html><body>
        <div id="root" class="box" data-empty="">Hello <b>world</b></div>
        <ul id="list"><li>one</li><li>two</li><li>three</li></ul>
    </body></html>"#;

    const NULL_TEXT_MESSAGE: &str =
        "Failed to get inner text of element - Are you sure this element exists? You can check with exists()";

    fn host() -> HostRuntime {
        HostRuntime::from_html(PAGE, &HostConfig::default()).unwrap()
    }

    fn lookup<'js>(ctx: &Ctx<'js>, id: &str) -> Element<'js> {
        ctx.eval(format!("document.getElementById('{}')", id)).unwrap()
    }

    #[test]
    fn test_exists() {
        let runtime = host();
        runtime.with(|ctx| {
            assert!(lookup(&ctx, "root").exists());
            assert!(!lookup(&ctx, "missing").exists());
            assert!(!Element::null(&ctx).exists());
            assert!(!Element::from_raw(Value::new_undefined(ctx.clone())).exists());
        });
    }

    #[test]
    fn test_null_handle_fails_every_operation() {
        let runtime = host();
        runtime.with(|ctx| {
            let null = Element::null(&ctx);
            let real = lookup(&ctx, "root");

            let err = null.inner_text().unwrap_err();
            assert_eq!(err.message(), NULL_TEXT_MESSAGE);
            assert_eq!(err.kind(), ErrorKind::DomOperationFailed);

            assert!(null.inner_html().is_err());
            assert!(null.set_inner_html("<i>x</i>").is_err());
            assert!(null.set_inner_text("x").is_err());
            assert!(null.append_child(&real).is_err());
            assert!(null.attribute("id").is_err());
            assert!(null.set_attribute("id", "x").is_err());
            assert!(null.children().is_err());

            // The failures left nothing pending on the context
            assert_eq!(real.inner_text().unwrap(), "Hello world");
        });
    }

    #[test]
    fn test_operation_descriptions_carry_arguments() {
        let runtime = host();
        runtime.with(|ctx| {
            let null = Element::null(&ctx);

            let err = null.set_inner_text("text").unwrap_err();
            assert_eq!(
                err.message(),
                "Failed to set inner text of element to 'text' - Are you sure this element exists? You can check with exists()"
            );

            let err = null.attribute("data-id").unwrap_err();
            assert!(err.message().starts_with("Failed to get attribute 'data-id'"));
            assert_eq!(err.operation().name(), "attribute");
        });
    }

    #[test]
    fn test_text_and_markup() {
        let runtime = host();
        runtime.with(|ctx| {
            let root = lookup(&ctx, "root");
            assert_eq!(root.inner_text().unwrap(), "Hello world");
            assert_eq!(root.inner_html().unwrap(), "Hello <b>world</b>");

            root.set_inner_text("a < b").unwrap();
            assert_eq!(root.inner_text().unwrap(), "a < b");
            assert_eq!(root.inner_html().unwrap(), "a &lt; b");

            root.set_inner_html("<p>x</p><p>y</p>").unwrap();
            assert_eq!(root.children().unwrap().len(), 2);
            assert_eq!(root.inner_text().unwrap(), "xy");

            root.set_inner_text("").unwrap();
            assert_eq!(root.inner_text().unwrap(), "");
            assert!(root.children().unwrap().is_empty());
        });
    }

    #[test]
    fn test_rejected_markup() {
        let runtime = host();
        runtime.with(|ctx| {
            let root = lookup(&ctx, "root");
            let err = root.set_inner_html("<p class=\"open").unwrap_err();
            assert!(err.cause().message().contains("invalid markup"));
            assert_eq!(root.inner_text().unwrap(), "Hello world");
        });
    }

    #[test]
    fn test_attributes() {
        let runtime = host();
        runtime.with(|ctx| {
            let root = lookup(&ctx, "root");

            root.set_attribute("data-id", "42").unwrap();
            assert_eq!(root.attribute("data-id").unwrap(), "42");
            assert_eq!(root.attribute("class").unwrap(), "box");

            // Absent and empty read the same
            assert_eq!(root.attribute("data-empty").unwrap(), "");
            assert_eq!(root.attribute("title").unwrap(), "");

            let err = root.set_attribute("bad name", "x").unwrap_err();
            assert!(err.cause().message().contains("not a valid attribute name"));
            assert_eq!(root.attribute("bad name").unwrap(), "");
        });
    }

    #[test]
    fn test_children_snapshot() {
        let runtime = host();
        runtime.with(|ctx| {
            let list = lookup(&ctx, "list");

            let first = list.children().unwrap();
            let texts: Vec<String> = first.iter().map(|li| li.inner_text().unwrap()).collect();
            assert_eq!(texts, ["one", "two", "three"]);

            let second = list.children().unwrap();
            assert_eq!(first, second);
            assert_ne!(first.as_ptr(), second.as_ptr());

            let item: Element = ctx.eval("document.createElement('li')").unwrap();
            item.set_inner_text("four").unwrap();
            list.append_child(&item).unwrap();

            // Earlier snapshots are unchanged
            assert_eq!(first.len(), 3);
            let third = list.children().unwrap();
            assert_eq!(third.len(), 4);
            assert_eq!(third.last(), Some(&item));
        });
    }

    #[test]
    fn test_append_moves_child() {
        let runtime = host();
        runtime.with(|ctx| {
            let root = lookup(&ctx, "root");
            let list = lookup(&ctx, "list");
            let first = list.children().unwrap().remove(0);

            root.append_child(&first).unwrap();
            assert_eq!(list.children().unwrap().len(), 2);
            assert_eq!(root.children().unwrap().last(), Some(&first));
        });
    }

    #[test]
    fn test_invalid_appends() {
        let runtime = host();
        runtime.with(|ctx| {
            let root = lookup(&ctx, "root");
            let body: Element = ctx.eval("document.body").unwrap();

            let err = root.append_child(&Element::null(&ctx)).unwrap_err();
            assert!(err.cause().message().contains("not of type 'Element'"));

            assert!(root.append_child(&body).is_err());
            assert!(root.append_child(&root).is_err());
            assert_eq!(root.inner_text().unwrap(), "Hello world");
        });
    }

    #[test]
    fn test_deeply_nested_chain() {
        const DEPTH: usize = 50_000;
        let runtime = host();
        runtime.with(|ctx| {
            let root = lookup(&ctx, "root");
            let create_span: Function = ctx.eval("(function () { return document.createElement('span'); })").unwrap();

            let mut top: Element = create_span.call(()).unwrap();
            top.set_inner_text("leaf").unwrap();
            for _ in 0..DEPTH {
                let span: Element = create_span.call(()).unwrap();
                span.append_child(&top).unwrap();
                top = span;
            }
            root.append_child(&top).unwrap();

            assert_eq!(root.inner_text().unwrap(), "Hello worldleaf");
            let html = root.inner_html().unwrap();
            assert!(html.ends_with("leaf</span></span>"));

            root.set_inner_text("flat").unwrap();
            assert_eq!(root.inner_text().unwrap(), "flat");
        });
    }

    #[test]
    fn test_released_node() {
        let runtime = host();
        runtime.with(|ctx| {
            let root = lookup(&ctx, "root");
            ctx.eval::<(), _>("document.getElementById('root').remove()").unwrap();

            assert!(root.exists());
            let err = root.inner_text().unwrap_err();
            assert_eq!(err.message(), NULL_TEXT_MESSAGE);
            assert!(err.cause().message().contains("no longer part of the document"));
            assert!(!err.stack_trace().is_empty());
        });
    }

    #[test]
    fn test_non_element_handles() {
        let runtime = host();
        runtime.with(|ctx| {
            let number = Element::from_raw(ctx.eval("42").unwrap());
            assert!(number.exists());
            assert!(number.inner_text().is_err());

            let plain = Element::from_raw(ctx.eval("({})").unwrap());
            assert!(plain.inner_html().is_err());
            assert!(plain.children().is_err());
        });
    }

    #[test]
    fn test_error_source_chain() {
        let runtime = host();
        runtime.with(|ctx| {
            let err = Element::null(&ctx).children().unwrap_err();

            let source = std::error::Error::source(&err).unwrap();
            assert_eq!(source.to_string(), err.cause().to_string());
            assert!(!err.stack_trace().is_empty());
        });
    }

    #[test]
    fn test_handle_round_trips_through_host() {
        let runtime = host();
        runtime.with(|ctx| {
            let root = lookup(&ctx, "root");
            let tag_of: Function = ctx.eval("(function (el) { return el.tagName; })").unwrap();
            let tag: String = tag_of.call((root.clone(),)).unwrap();
            assert_eq!(tag, "DIV");
            assert_eq!(root.as_raw(), &root.clone().into_raw());
        });
    }
}
