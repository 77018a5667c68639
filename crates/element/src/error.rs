//! Element operation error types

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// Category of a [`DomError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The host could not carry out an element operation
    DomOperationFailed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::DomOperationFailed => f.write_str("DOM operation failed"),
        }
    }
}

/// The element operation that failed, with the arguments worth reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation<'a> {
    GetInnerText,
    GetInnerHtml,
    SetInnerHtml,
    SetInnerText { text: Cow<'a, str> },
    AppendChild,
    GetAttribute { name: Cow<'a, str> },
    SetAttribute { name: Cow<'a, str> },
    GetChildren,
}

impl Operation<'_> {
    /// Name of the [`Element`](crate::Element) method
    pub fn name(&self) -> &'static str {
        match self {
            Operation::GetInnerText => "inner_text",
            Operation::GetInnerHtml => "inner_html",
            Operation::SetInnerHtml => "set_inner_html",
            Operation::SetInnerText { .. } => "set_inner_text",
            Operation::AppendChild => "append_child",
            Operation::GetAttribute { .. } => "attribute",
            Operation::SetAttribute { .. } => "set_attribute",
            Operation::GetChildren => "children",
        }
    }

    /// Detach from borrowed arguments
    pub fn into_owned(self) -> Operation<'static> {
        match self {
            Operation::GetInnerText => Operation::GetInnerText,
            Operation::GetInnerHtml => Operation::GetInnerHtml,
            Operation::SetInnerHtml => Operation::SetInnerHtml,
            Operation::SetInnerText { text } => Operation::SetInnerText {
                text: Cow::Owned(text.into_owned()),
            },
            Operation::AppendChild => Operation::AppendChild,
            Operation::GetAttribute { name } => Operation::GetAttribute {
                name: Cow::Owned(name.into_owned()),
            },
            Operation::SetAttribute { name } => Operation::SetAttribute {
                name: Cow::Owned(name.into_owned()),
            },
            Operation::GetChildren => Operation::GetChildren,
        }
    }
}

impl fmt::Display for Operation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::GetInnerText => f.write_str("get inner text of element"),
            Operation::GetInnerHtml => f.write_str("get inner html of element"),
            Operation::SetInnerHtml => f.write_str("set inner html of element"),
            Operation::SetInnerText { text } => write!(f, "set inner text of element to '{}'", text),
            Operation::AppendChild => f.write_str("append child to element"),
            Operation::GetAttribute { name } => write!(f, "get attribute '{}'", name),
            Operation::SetAttribute { name } => write!(f, "set attribute '{}'", name),
            Operation::GetChildren => f.write_str("get children of element"),
        }
    }
}

/// What the host reported when an operation failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFault {
    name: Option<String>,
    message: String,
    stack: Option<String>,
}

impl HostFault {
    pub(crate) fn new(name: Option<String>, message: impl Into<String>, stack: Option<String>) -> Self {
        Self {
            name,
            message: message.into(),
            stack,
        }
    }

    /// Exception name such as `TypeError`, when the host threw an error object
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Host-provided description of the failure
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Host-side stack, when the host threw an error object that carried one
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

impl fmt::Display for HostFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}: {}", name, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for HostFault {}

/// A failed element operation
#[derive(Debug, Clone, Error)]
#[error("Failed to {operation} - Are you sure this element exists? You can check with exists()")]
pub struct DomError {
    operation: Operation<'static>,
    #[source]
    cause: HostFault,
    stack_trace: String,
}

impl DomError {
    /// Capture the current stack; only the boundary builds these
    pub(crate) fn capture(operation: Operation<'_>, cause: HostFault) -> Self {
        let mut stack_trace = Backtrace::force_capture().to_string();
        if let Some(host_stack) = cause.stack() {
            stack_trace.push_str("\nhost stack:\n");
            stack_trace.push_str(host_stack);
        }

        Self {
            operation: operation.into_owned(),
            cause,
            stack_trace,
        }
    }

    /// Always [`ErrorKind::DomOperationFailed`]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::DomOperationFailed
    }

    /// The operation that failed
    pub fn operation(&self) -> &Operation<'static> {
        &self.operation
    }

    /// Human-readable message naming the operation
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// What the host reported
    pub fn cause(&self) -> &HostFault {
        &self.cause
    }

    /// Stack captured where the failure was intercepted, followed by the host stack if any
    pub fn stack_trace(&self) -> &str {
        &self.stack_trace
    }
}
