//! Console API implementation
//!
//! Forwards console.log, console.warn, console.error, etc. to the `log` facade.

use log::Level;
use rquickjs::convert::Coerced;
use rquickjs::function::Rest;
use rquickjs::{Ctx, Function, Object, Result};

fn join(args: Rest<Coerced<String>>) -> String {
    args.0
        .into_iter()
        .map(|arg| arg.0)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Console methods and the level each one logs at
const METHODS: [(&str, Level); 5] = [
    ("log", Level::Info),
    ("info", Level::Info),
    ("warn", Level::Warn),
    ("error", Level::Error),
    ("debug", Level::Debug),
];

/// Register the console object in the global scope
pub fn register_console(ctx: &Ctx<'_>) -> Result<()> {
    let console = Object::new(ctx.clone())?;

    for (name, level) in METHODS {
        console.set(
            name,
            Function::new(ctx.clone(), move |args: Rest<Coerced<String>>| {
                log::log!(level, "[JS] {}", join(args));
            })?,
        )?;
    }

    ctx.globals().set("console", console)
}
