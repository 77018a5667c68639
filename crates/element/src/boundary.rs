//! Host boundary
//!
//! Every element operation runs its host interaction through [`guard`], the
//! only place where host failures become [`DomError`]s.

use rquickjs::{Ctx, Value};

use crate::error::{DomError, HostFault, Operation};

/// Run a host interaction, converting any failure into a [`DomError`].
///
/// A thrown exception is taken off the context so it cannot surface in a
/// later, unrelated host call.
pub(crate) fn guard<'js, T, F>(ctx: &Ctx<'js>, operation: Operation<'_>, interaction: F) -> Result<T, DomError>
where
    F: FnOnce() -> rquickjs::Result<T>,
{
    interaction().map_err(|err| {
        let cause = fault_from(ctx, err);
        log::debug!("{} failed: {}", operation.name(), cause);
        DomError::capture(operation, cause)
    })
}

fn fault_from(ctx: &Ctx<'_>, err: rquickjs::Error) -> HostFault {
    match err {
        rquickjs::Error::Exception => fault_from_thrown(ctx.catch()),
        other => HostFault::new(None, other.to_string(), None),
    }
}

fn fault_from_thrown(thrown: Value<'_>) -> HostFault {
    if let Some(exception) = thrown.as_exception() {
        let name = thrown
            .as_object()
            .and_then(|obj| obj.get::<_, Option<String>>("name").ok().flatten());
        let message = exception.message().unwrap_or_default();
        return HostFault::new(name, message, exception.stack());
    }

    // Scripts may throw any value, not only errors
    let message = match thrown.as_string().and_then(|s| s.to_string().ok()) {
        Some(text) => text,
        None => format!("uncaught {:?} value", thrown.type_of()),
    };
    HostFault::new(None, message, None)
}
