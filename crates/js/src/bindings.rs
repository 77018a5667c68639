//! Document and Element host API
//!
//! Native functions operate on node ids of the shared [`DomTree`]; the
//! bootstrap script wraps them into browser-like `document` and `Element`
//! objects. Tree and markup failures surface in scripts as exceptions.

use std::cell::RefCell;
use std::rc::Rc;

use elemental_dom::{DomTree, NodeId, Queryable, TreeError};
use elemental_html::{serialize_children, HtmlError, HtmlParser};
use rquickjs::{Ctx, Exception, Function, Object};

/// Shared reference to the DOM tree
pub type SharedDom = Rc<RefCell<DomTree>>;

/// Ids of released nodes, handed back so scripts can drop their wrappers
fn released_ids(released: Vec<NodeId>) -> Vec<u32> {
    released.into_iter().map(NodeId::as_u32).collect()
}

/// Throw a tree failure into the script as the matching exception type
fn throw_tree(ctx: &Ctx<'_>, err: TreeError) -> rquickjs::Error {
    let message = err.to_string();
    match err {
        TreeError::NodeNotFound(_) => Exception::throw_reference(ctx, &message),
        TreeError::InvalidCharacter(_) => Exception::throw_syntax(ctx, &message),
        TreeError::HierarchyRequest { .. } | TreeError::InvalidNodeType(_) => {
            Exception::throw_type(ctx, &message)
        }
    }
}

fn throw_markup(ctx: &Ctx<'_>, err: HtmlError) -> rquickjs::Error {
    Exception::throw_syntax(ctx, &format!("invalid markup: {}", err))
}

/// Register the `document` global and the `Element` constructor
pub fn register_dom_api(ctx: &Ctx<'_>, dom: SharedDom) -> rquickjs::Result<()> {
    let host = Object::new(ctx.clone())?;

    let d = dom.clone();
    host.set(
        "createElement",
        Function::new(ctx.clone(), move |tag: String| -> u32 {
            d.borrow_mut().create_element(tag).as_u32()
        })?,
    )?;

    let d = dom.clone();
    host.set(
        "elementById",
        Function::new(ctx.clone(), move |id: String| -> Option<u32> {
            d.borrow().get_element_by_id(&id).map(NodeId::as_u32)
        })?,
    )?;

    let d = dom.clone();
    host.set(
        "querySelector",
        Function::new(ctx.clone(), move |selector: String| -> Option<u32> {
            d.borrow().query_selector(&selector).map(NodeId::as_u32)
        })?,
    )?;

    let d = dom.clone();
    host.set(
        "documentElement",
        Function::new(ctx.clone(), move || -> Option<u32> {
            let dom = d.borrow();
            dom.element_children(dom.document_id())
                .ok()
                .and_then(|children| children.first().map(|id| id.as_u32()))
        })?,
    )?;

    let d = dom.clone();
    host.set(
        "body",
        Function::new(ctx.clone(), move || -> Option<u32> {
            d.borrow().get_elements_by_tag_name("body").first().map(|id| id.as_u32())
        })?,
    )?;

    let d = dom.clone();
    host.set(
        "tagName",
        Function::new(ctx.clone(), move |ctx: Ctx<'_>, id: u32| -> rquickjs::Result<String> {
            let dom = d.borrow();
            let node = dom.node(NodeId::new(id)).map_err(|e| throw_tree(&ctx, e))?;
            Ok(node.tag_name().unwrap_or_default().to_ascii_uppercase())
        })?,
    )?;

    let d = dom.clone();
    host.set(
        "innerText",
        Function::new(ctx.clone(), move |ctx: Ctx<'_>, id: u32| -> rquickjs::Result<String> {
            d.borrow().inner_text(NodeId::new(id)).map_err(|e| throw_tree(&ctx, e))
        })?,
    )?;

    let d = dom.clone();
    host.set(
        "setInnerText",
        Function::new(ctx.clone(), move |ctx: Ctx<'_>, id: u32, text: String| -> rquickjs::Result<Vec<u32>> {
            d.borrow_mut()
                .set_text_content(NodeId::new(id), &text)
                .map(released_ids)
                .map_err(|e| throw_tree(&ctx, e))
        })?,
    )?;

    let d = dom.clone();
    host.set(
        "textContent",
        Function::new(ctx.clone(), move |ctx: Ctx<'_>, id: u32| -> rquickjs::Result<String> {
            let dom = d.borrow();
            let id = NodeId::new(id);
            dom.node(id).map_err(|e| throw_tree(&ctx, e))?;
            Ok(dom.text_content(id))
        })?,
    )?;

    let d = dom.clone();
    host.set(
        "innerHtml",
        Function::new(ctx.clone(), move |ctx: Ctx<'_>, id: u32| -> rquickjs::Result<String> {
            let dom = d.borrow();
            let id = NodeId::new(id);
            dom.node(id).map_err(|e| throw_tree(&ctx, e))?;
            Ok(serialize_children(&dom, id))
        })?,
    )?;

    let d = dom.clone();
    host.set(
        "setInnerHtml",
        Function::new(ctx.clone(), move |ctx: Ctx<'_>, id: u32, html: String| -> rquickjs::Result<Vec<u32>> {
            let mut dom = d.borrow_mut();
            let id = NodeId::new(id);
            dom.node(id).map_err(|e| throw_tree(&ctx, e))?;
            let nodes = HtmlParser::new()
                .parse_fragment(&mut dom, &html)
                .map_err(|e| throw_markup(&ctx, e))?;
            dom.replace_children(id, &nodes)
                .map(released_ids)
                .map_err(|e| throw_tree(&ctx, e))
        })?,
    )?;

    let d = dom.clone();
    host.set(
        "children",
        Function::new(ctx.clone(), move |ctx: Ctx<'_>, id: u32| -> rquickjs::Result<Vec<u32>> {
            let children = d
                .borrow()
                .element_children(NodeId::new(id))
                .map_err(|e| throw_tree(&ctx, e))?;
            Ok(children.into_iter().map(NodeId::as_u32).collect())
        })?,
    )?;

    let d = dom.clone();
    host.set(
        "getAttribute",
        Function::new(ctx.clone(), move |ctx: Ctx<'_>, id: u32, name: String| -> rquickjs::Result<Option<String>> {
            d.borrow()
                .get_attribute(NodeId::new(id), &name)
                .map_err(|e| throw_tree(&ctx, e))
        })?,
    )?;

    let d = dom.clone();
    host.set(
        "setAttribute",
        Function::new(ctx.clone(), move |ctx: Ctx<'_>, id: u32, name: String, value: String| -> rquickjs::Result<()> {
            d.borrow_mut()
                .set_attribute(NodeId::new(id), &name, &value)
                .map_err(|e| throw_tree(&ctx, e))
        })?,
    )?;

    let d = dom.clone();
    host.set(
        "appendChild",
        Function::new(ctx.clone(), move |ctx: Ctx<'_>, parent: u32, child: u32| -> rquickjs::Result<()> {
            d.borrow_mut()
                .append_child(NodeId::new(parent), NodeId::new(child))
                .map_err(|e| throw_tree(&ctx, e))
        })?,
    )?;

    let d = dom;
    host.set(
        "remove",
        Function::new(ctx.clone(), move |ctx: Ctx<'_>, id: u32| -> rquickjs::Result<Vec<u32>> {
            d.borrow_mut()
                .remove_subtree(NodeId::new(id))
                .map(released_ids)
                .map_err(|e| throw_tree(&ctx, e))
        })?,
    )?;

    ctx.globals().set("__elementalHost", host)?;
    ctx.eval::<(), _>(DOM_BOOTSTRAP)?;

    Ok(())
}

/// Wraps the native host functions into `document` and `Element`
const DOM_BOOTSTRAP: &str = r#"
(function (host) {
    // One wrapper per node so identity comparisons hold
    const cache = new Map();

    function Element() {
        throw new TypeError('Illegal constructor');
    }

    function wrap(id) {
        if (id === null || id === undefined) {
            return null;
        }
        let element = cache.get(id);
        if (element === undefined) {
            element = Object.create(Element.prototype);
            Object.defineProperty(element, '__nodeId', { value: id });
            cache.set(id, element);
        }
        return element;
    }

    // Released ids are never reused, so their wrappers can go
    function forget(ids) {
        for (const id of ids) {
            cache.delete(id);
        }
    }

    function nodeIdOf(value, method) {
        if (!(value instanceof Element)) {
            throw new TypeError("Failed to execute '" + method +
                "' on 'Element': parameter 1 is not of type 'Element'.");
        }
        return value.__nodeId;
    }

    Object.defineProperties(Element.prototype, {
        tagName: {
            get() { return host.tagName(this.__nodeId); },
        },
        id: {
            get() { return host.getAttribute(this.__nodeId, 'id') ?? ''; },
            set(value) { host.setAttribute(this.__nodeId, 'id', String(value)); },
        },
        innerText: {
            get() { return host.innerText(this.__nodeId); },
            set(value) { forget(host.setInnerText(this.__nodeId, String(value))); },
        },
        textContent: {
            get() { return host.textContent(this.__nodeId); },
        },
        innerHTML: {
            get() { return host.innerHtml(this.__nodeId); },
            set(value) { forget(host.setInnerHtml(this.__nodeId, String(value))); },
        },
        children: {
            get() { return host.children(this.__nodeId).map((id) => wrap(id)); },
        },
    });

    // The native side reports an absent attribute as undefined
    Element.prototype.getAttribute = function (name) {
        return host.getAttribute(this.__nodeId, String(name)) ?? null;
    };

    Element.prototype.hasAttribute = function (name) {
        return host.getAttribute(this.__nodeId, String(name)) != null;
    };

    Element.prototype.setAttribute = function (name, value) {
        host.setAttribute(this.__nodeId, String(name), String(value));
    };

    Element.prototype.appendChild = function (child) {
        host.appendChild(this.__nodeId, nodeIdOf(child, 'appendChild'));
        return child;
    };

    Element.prototype.remove = function () {
        forget(host.remove(this.__nodeId));
    };

    const document = {
        getElementById(id) { return wrap(host.elementById(String(id))); },
        querySelector(selector) { return wrap(host.querySelector(String(selector))); },
        createElement(tag) { return wrap(host.createElement(String(tag))); },
        get body() { return wrap(host.body()); },
        get documentElement() { return wrap(host.documentElement()); },
    };

    // Number of element wrappers currently held, for diagnostics
    Object.defineProperty(document, '__wrapperCount', {
        get() { return cache.size; },
    });

    globalThis.Element = Element;
    globalThis.document = document;
})(globalThis.__elementalHost);
delete globalThis.__elementalHost;
"#;
